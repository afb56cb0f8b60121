use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::modules::models::lap_record::LapRecord;
use crate::schema::lap_times;

#[derive(Insertable, Serialize, Debug, Clone, Deserialize)]
#[diesel(table_name = lap_times)]
pub struct NewLapTime {
    pub lap_record_id: i32,
    pub lap_number: i32,
    pub time: String,
}

/// a single lap of a lap record, stored exactly as it was submitted
#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, PartialEq, Debug, Clone)]
#[diesel(belongs_to(LapRecord))]
#[diesel(table_name = lap_times)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LapTime {
    #[serde(skip)]
    pub id: i32,
    #[serde(skip)]
    pub lap_record_id: i32,
    pub lap_number: i32,
    pub time: String,
}

impl LapTime {
    pub fn new(conn: &mut SqliteConnection, new_lap: &NewLapTime) -> QueryResult<LapTime> {
        diesel::insert_into(lap_times::table)
            .values(new_lap)
            .returning(LapTime::as_returning())
            .get_result(conn)
    }

    /// # get the laps of a record
    /// ordered by lap number
    pub fn from_record(conn: &mut SqliteConnection, record: &LapRecord) -> QueryResult<Vec<LapTime>> {
        LapTime::belonging_to(record)
            .order(lap_times::lap_number.asc())
            .select(LapTime::as_select())
            .load(conn)
    }

    /// # get the laps of many records
    /// one query for all records, grouped so that the nth list belongs to
    /// the nth record
    pub fn from_records(conn: &mut SqliteConnection, records: &[LapRecord]) -> QueryResult<Vec<Vec<LapTime>>> {
        let laps = LapTime::belonging_to(records)
            .order((lap_times::lap_record_id.asc(), lap_times::lap_number.asc()))
            .select(LapTime::as_select())
            .load(conn)?;

        Ok(laps.grouped_by(records))
    }
}
