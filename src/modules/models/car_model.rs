use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::select;
use log::info;
use serde::Serialize;

use crate::errors::{CustomResult, Error};
use crate::modules::helpers::general::Helpers;
use crate::modules::models::user::User;
use crate::schema::car_models;

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = car_models)]
pub struct NewCarModel {
    pub name: String,
    pub created_by: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, PartialEq, Debug, Clone)]
#[diesel(table_name = car_models)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CarModel {
    pub id: i32,
    pub name: String,
    #[serde(skip)]
    pub created_by: Option<i32>,
    #[serde(skip)]
    pub created_at: NaiveDateTime,
}

impl CarModel {
    pub fn new(conn: &mut SqliteConnection, name_in: &str, creator: &User) -> CustomResult<CarModel> {
        let name_in = Helpers::clean_name("name", name_in)?;

        if CarModel::exists(conn, &name_in)? {
            return Err(Error::AlreadyExistsError {
                what: format!("Car model `{name_in}`"),
            });
        }

        let car = diesel::insert_into(car_models::table)
            .values(&NewCarModel {
                name: name_in,
                created_by: Some(creator.id),
                created_at: Utc::now().naive_utc(),
            })
            .returning(CarModel::as_returning())
            .get_result(conn)?;

        info!(target: "models/car_model:new", "user {} added car model {}", creator.id, car.id);
        Ok(car)
    }

    pub fn exists(conn: &mut SqliteConnection, name_in: &str) -> QueryResult<bool> {
        use crate::schema::car_models::dsl::*;
        select(exists(car_models.filter(name.eq(name_in)))).get_result(conn)
    }

    pub fn get_by_id(conn: &mut SqliteConnection, id_in: i32) -> QueryResult<CarModel> {
        use crate::schema::car_models::dsl::*;

        car_models.filter(id.eq(id_in))
            .select(CarModel::as_select())
            .first(conn)
    }

    pub fn get_all(conn: &mut SqliteConnection) -> QueryResult<Vec<CarModel>> {
        use crate::schema::car_models::dsl::*;

        car_models.order(name.asc())
            .select(CarModel::as_select())
            .load(conn)
    }
}
