use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::select;
use log::info;
use serde::Serialize;

use crate::errors::{CustomResult, Error};
use crate::modules::helpers::general::Helpers;
use crate::modules::models::user::User;
use crate::schema::game_titles;

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = game_titles)]
pub struct NewGameTitle {
    pub name: String,
    pub created_by: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, PartialEq, Debug, Clone)]
#[diesel(table_name = game_titles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GameTitle {
    pub id: i32,
    pub name: String,
    #[serde(skip)]
    pub created_by: Option<i32>,
    #[serde(skip)]
    pub created_at: NaiveDateTime,
}

impl GameTitle {
    /// # add a game title to the catalog
    /// names are unique, compared after trimming
    pub fn new(conn: &mut SqliteConnection, name_in: &str, creator: &User) -> CustomResult<GameTitle> {
        let name_in = Helpers::clean_name("name", name_in)?;

        if GameTitle::exists(conn, &name_in)? {
            return Err(Error::AlreadyExistsError {
                what: format!("Game title `{name_in}`"),
            });
        }

        let title = diesel::insert_into(game_titles::table)
            .values(&NewGameTitle {
                name: name_in,
                created_by: Some(creator.id),
                created_at: Utc::now().naive_utc(),
            })
            .returning(GameTitle::as_returning())
            .get_result(conn)?;

        info!(target: "models/game_title:new", "user {} added game title {}", creator.id, title.id);
        Ok(title)
    }

    pub fn exists(conn: &mut SqliteConnection, name_in: &str) -> QueryResult<bool> {
        use crate::schema::game_titles::dsl::*;
        select(exists(game_titles.filter(name.eq(name_in)))).get_result(conn)
    }

    pub fn get_by_id(conn: &mut SqliteConnection, id_in: i32) -> QueryResult<GameTitle> {
        use crate::schema::game_titles::dsl::*;

        game_titles.filter(id.eq(id_in))
            .select(GameTitle::as_select())
            .first(conn)
    }

    /// every game title, sorted by name
    pub fn get_all(conn: &mut SqliteConnection) -> QueryResult<Vec<GameTitle>> {
        use crate::schema::game_titles::dsl::*;

        game_titles.order(name.asc())
            .select(GameTitle::as_select())
            .load(conn)
    }
}
