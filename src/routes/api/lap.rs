use chrono::NaiveDateTime;
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{get, post, State};
use serde::{Deserialize, Serialize};

use crate::errors::{CustomResult, Error};
use crate::macros::database_error_handler::db_handle_get_error_http;
use crate::modules::helpers::guards::auth_user::AuthUser;
use crate::modules::helpers::request::payload;
use crate::modules::models::car_model::CarModel;
use crate::modules::models::game_title::GameTitle;
use crate::modules::models::general::DbPool;
use crate::modules::models::lap_record::{LapRecord, LapSubmission, RecordFilter, RecordStats, RecordWithNames};
use crate::modules::models::lap_time::LapTime;
use crate::modules::models::track::Track;

/**************************************************************************************************/
/**************** ROUTES **************************************************************************/
/**************************************************************************************************/

/// # record a session
/// the game, car and track have to exist and the amount of lap times has to
/// match the track. nothing is stored when any lap time is rejected.
#[post("/laps", data = "<data>")]
pub fn submit(pool: &State<DbPool>, auth: AuthUser, data: Result<Json<LapSubmissionData>, json::Error<'_>>) -> CustomResult<(Status, Json<ApiLapRecord>)> {
    let data = payload(data)?;
    let conn = &mut pool.inner().get()?;

    let game_title = db_handle_get_error_http!(GameTitle::get_by_id(conn, data.game_title_id), "routes/api/lap:submit", "Game title");
    let car_model = db_handle_get_error_http!(CarModel::get_by_id(conn, data.car_model_id), "routes/api/lap:submit", "Car model");
    let track = db_handle_get_error_http!(Track::get_by_id(conn, data.track_id), "routes/api/lap:submit", "Track");

    let lap_times = data.lap_times();
    let (record, laps) = LapRecord::record(conn, &auth.user, LapSubmission {
        game_title: &game_title,
        car_model: &car_model,
        track: &track,
        lap_times: &lap_times,
        note: data.note.as_deref(),
    })?;

    let record = RecordWithNames {
        record,
        game_title: game_title.name,
        car_model: car_model.name,
        track_name: track.name,
    };

    Ok((Status::Created, Json(ApiLapRecord::new(record, laps))))
}

/// # the caller's records
/// newest first, optionally filtered on game, car and track
#[get("/laps?<game_title_id>&<car_model_id>&<track_id>")]
pub fn list(pool: &State<DbPool>, auth: AuthUser, game_title_id: Option<i32>, car_model_id: Option<i32>, track_id: Option<i32>) -> CustomResult<Json<Vec<ApiLapRecord>>> {
    let conn = &mut pool.inner().get()?;
    let filter = RecordFilter {
        game_title_id,
        car_model_id,
        track_id,
    };

    let records = db_handle_get_error_http!(LapRecord::from_user(conn, &auth.user, &filter), "routes/api/lap:list", "lap records");
    let plain: Vec<LapRecord> = records.iter().map(|record| record.record.clone()).collect();
    let laps = db_handle_get_error_http!(LapTime::from_records(conn, &plain), "routes/api/lap:list", "lap times");

    Ok(Json(
        records
            .into_iter()
            .zip(laps)
            .map(|(record, laps)| ApiLapRecord::new(record, laps))
            .collect(),
    ))
}

/// # statistics over the caller's records
#[get("/laps/stats?<game_title_id>&<car_model_id>&<track_id>")]
pub fn stats(pool: &State<DbPool>, auth: AuthUser, game_title_id: Option<i32>, car_model_id: Option<i32>, track_id: Option<i32>) -> CustomResult<Json<RecordStats>> {
    let conn = &mut pool.inner().get()?;
    let filter = RecordFilter {
        game_title_id,
        car_model_id,
        track_id,
    };

    let totals = db_handle_get_error_http!(LapRecord::totals_from_user(conn, &auth.user, &filter), "routes/api/lap:stats", "lap records");

    Ok(Json(LapRecord::get_stats_of_totals(&totals)))
}

/// # a single record
/// only its owner may see it
#[get("/laps/<id>")]
pub fn get_one(pool: &State<DbPool>, auth: AuthUser, id: i32) -> CustomResult<Json<ApiLapRecord>> {
    let conn = &mut pool.inner().get()?;

    let record = db_handle_get_error_http!(LapRecord::get_with_names(conn, id), "routes/api/lap:get_one", "Lap record");
    if record.record.user_id != auth.user.id {
        return Err(Error::ForbiddenError {
            what: "this lap record".to_string(),
        });
    }

    let laps = db_handle_get_error_http!(LapTime::from_record(conn, &record.record), "routes/api/lap:get_one", "lap times");

    Ok(Json(ApiLapRecord::new(record, laps)))
}

/**************************************************************************************************/
/**************** HELPERS *************************************************************************/
/**************************************************************************************************/

/// a submitted lap, either the bare time or an object carrying it.
/// lap numbers sent by the client are ignored, laps are numbered in the
/// order they arrive.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum LapEntry {
    Time(String),
    Numbered { time: String },
}

impl LapEntry {
    pub fn into_time(self) -> String {
        match self {
            LapEntry::Time(time) | LapEntry::Numbered { time } => time,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct LapSubmissionData {
    pub game_title_id: i32,
    pub car_model_id: i32,
    pub track_id: i32,
    pub lap_times: Vec<LapEntry>,
    pub note: Option<String>,
}

impl LapSubmissionData {
    fn lap_times(&self) -> Vec<String> {
        self.lap_times.iter().cloned().map(LapEntry::into_time).collect()
    }
}

/// # Struct representing a json response for a lap record
#[derive(Serialize, Debug)]
pub struct ApiLapRecord {
    pub id: i32,
    pub game_title_id: i32,
    pub game_title: String,
    pub car_model_id: i32,
    pub car_model: String,
    pub track_id: i32,
    pub track: String,
    pub total_time: String,
    pub total_seconds: f64,
    pub lap_count: i32,
    pub note: Option<String>,
    pub recorded_at: NaiveDateTime,
    pub laps: Vec<LapTime>,
}

impl ApiLapRecord {
    pub fn new(named: RecordWithNames, laps: Vec<LapTime>) -> ApiLapRecord {
        let record = named.record;

        ApiLapRecord {
            id: record.id,
            game_title_id: record.game_title_id,
            game_title: named.game_title,
            car_model_id: record.car_model_id,
            car_model: named.car_model,
            track_id: record.track_id,
            track: named.track_name,
            total_time: record.total_time,
            total_seconds: record.total_seconds,
            lap_count: record.lap_count,
            note: record.note,
            recorded_at: record.created_at,
            laps,
        }
    }
}
