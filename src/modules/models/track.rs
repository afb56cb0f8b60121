use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::select;
use log::info;
use serde::Serialize;

use crate::errors::{CustomResult, Error};
use crate::modules::helpers::general::Helpers;
use crate::modules::models::user::User;
use crate::schema::tracks;

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = tracks)]
pub struct NewTrack {
    pub name: String,
    pub name_key: String,
    pub lap_count: i32,
    pub created_by: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, PartialEq, Debug, Clone)]
#[diesel(table_name = tracks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Track {
    pub id: i32,
    pub name: String,
    pub lap_count: i32,
    #[serde(skip)]
    pub created_by: Option<i32>,
    #[serde(skip)]
    pub created_at: NaiveDateTime,
}

impl Track {
    /************ INSERTERS ************/
    /// # add a track to the catalog
    /// the lap count is what every lap record on this track is checked
    /// against, so it has to be at least one. names are unique regardless
    /// of case.
    ///
    /// ## Arguments
    /// * `conn` - The database connection to use
    /// * `name_in` - The name of the track
    /// * `lap_count_in` - The amount of laps a session on this track has
    /// * `creator` - The user adding the track
    ///
    /// ## Returns
    /// * `Track` - The inserted track
    pub fn new(conn: &mut SqliteConnection, name_in: &str, lap_count_in: i32, creator: &User) -> CustomResult<Track> {
        let name_in = Helpers::clean_name("name", name_in)?;

        if lap_count_in < 1 {
            return Err(Error::invalid_input("lap_count", "must be a whole number of at least 1"));
        }

        if Track::exists(conn, &name_in)? {
            return Err(Error::AlreadyExistsError {
                what: format!("Track `{name_in}`"),
            });
        }

        let track = diesel::insert_into(tracks::table)
            .values(&NewTrack {
                name_key: Track::name_key(&name_in),
                name: name_in,
                lap_count: lap_count_in,
                created_by: Some(creator.id),
                created_at: Utc::now().naive_utc(),
            })
            .returning(Track::as_returning())
            .get_result(conn)?;

        info!(target: "models/track:new", "user {} added track {} ({} laps)", creator.id, track.id, track.lap_count);
        Ok(track)
    }

    /************ GETTERS ************/
    /// case insensitive lookup, `suzuka` matches `Suzuka` and `école`
    /// matches `ÉCOLE`
    pub fn exists(conn: &mut SqliteConnection, name_in: &str) -> QueryResult<bool> {
        use crate::schema::tracks::dsl::*;
        select(exists(tracks.filter(name_key.eq(Track::name_key(name_in))))).get_result(conn)
    }

    /// the unique key of a track name. sqlite's `lower()` only folds ascii,
    /// so the folding happens here.
    pub fn name_key(name_in: &str) -> String {
        name_in.trim().to_lowercase()
    }

    pub fn get_by_id(conn: &mut SqliteConnection, id_in: i32) -> QueryResult<Track> {
        use crate::schema::tracks::dsl::*;

        tracks.filter(id.eq(id_in))
            .select(Track::as_select())
            .first(conn)
    }

    pub fn get_all(conn: &mut SqliteConnection) -> QueryResult<Vec<Track>> {
        use crate::schema::tracks::dsl::*;

        tracks.order(name.asc())
            .select(Track::as_select())
            .load(conn)
    }

    /// the lap count as the aggregator wants it
    pub fn expected_laps(&self) -> usize {
        usize::try_from(self.lap_count).unwrap_or(0)
    }
}
