use chrono::NaiveDateTime;
use rocket::serde::json::Json;
use rocket::{get, State};
use serde::Serialize;

use crate::errors::{CustomResult, Error};
use crate::macros::database_error_handler::db_handle_get_error_http;
use crate::modules::models::general::DbPool;
use crate::modules::models::lap_record::LapRecord;

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 500;

/// # the fastest totals of a game, car and track combination
/// public. all three ids are required, `limit` is capped at `MAX_LIMIT`.
#[get("/leaderboard?<game_title_id>&<car_model_id>&<track_id>&<limit>")]
pub fn get_leaderboard(
    pool: &State<DbPool>,
    game_title_id: Option<i32>,
    car_model_id: Option<i32>,
    track_id: Option<i32>,
    limit: Option<i64>,
) -> CustomResult<Json<Vec<ApiLeaderboardEntry>>> {
    let game_title_id = required("game_title_id", game_title_id)?;
    let car_model_id = required("car_model_id", car_model_id)?;
    let track_id = required("track_id", track_id)?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let conn = &mut pool.inner().get()?;
    let rows = db_handle_get_error_http!(
        LapRecord::leaderboard(conn, game_title_id, car_model_id, track_id, limit),
        "routes/api/leaderboard:get_leaderboard",
        "leaderboard"
    );

    Ok(Json(
        rows.into_iter()
            .zip(1..)
            .map(|((record, username), rank)| ApiLeaderboardEntry {
                rank,
                username,
                total_time: record.total_time,
                total_seconds: record.total_seconds,
                lap_count: record.lap_count,
                note: record.note,
                recorded_at: record.created_at,
            })
            .collect(),
    ))
}

fn required(field: &str, value: Option<i32>) -> CustomResult<i32> {
    value.ok_or_else(|| Error::invalid_input(field, "is required"))
}

#[derive(Serialize, Debug)]
pub struct ApiLeaderboardEntry {
    pub rank: usize,
    pub username: String,
    pub total_time: String,
    pub total_seconds: f64,
    pub lap_count: i32,
    pub note: Option<String>,
    pub recorded_at: NaiveDateTime,
}
