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
use crate::modules::models::track::Track;

/**************************************************************************************************/
/**************** ROUTES **************************************************************************/
/**************************************************************************************************/

/***** GAME TITLES *****/
#[get("/game-titles")]
pub fn list_game_titles(pool: &State<DbPool>) -> CustomResult<Json<Vec<GameTitle>>> {
    let conn = &mut pool.inner().get()?;
    let game_titles = db_handle_get_error_http!(GameTitle::get_all(conn), "routes/api/catalog:list_game_titles", "game titles");

    Ok(Json(game_titles))
}

#[post("/game-titles", data = "<data>")]
pub fn create_game_title(pool: &State<DbPool>, auth: AuthUser, data: Result<Json<NameData>, json::Error<'_>>) -> CustomResult<(Status, Json<GameTitle>)> {
    let data = payload(data)?;
    let conn = &mut pool.inner().get()?;

    let game_title = GameTitle::new(conn, &data.name, &auth.user)?;
    Ok((Status::Created, Json(game_title)))
}

/***** CAR MODELS *****/
#[get("/car-models")]
pub fn list_car_models(pool: &State<DbPool>) -> CustomResult<Json<Vec<CarModel>>> {
    let conn = &mut pool.inner().get()?;
    let car_models = db_handle_get_error_http!(CarModel::get_all(conn), "routes/api/catalog:list_car_models", "car models");

    Ok(Json(car_models))
}

#[post("/car-models", data = "<data>")]
pub fn create_car_model(pool: &State<DbPool>, auth: AuthUser, data: Result<Json<NameData>, json::Error<'_>>) -> CustomResult<(Status, Json<CarModel>)> {
    let data = payload(data)?;
    let conn = &mut pool.inner().get()?;

    let car_model = CarModel::new(conn, &data.name, &auth.user)?;
    Ok((Status::Created, Json(car_model)))
}

/***** TRACKS *****/
#[get("/tracks")]
pub fn list_tracks(pool: &State<DbPool>) -> CustomResult<Json<Vec<Track>>> {
    let conn = &mut pool.inner().get()?;
    let tracks = db_handle_get_error_http!(Track::get_all(conn), "routes/api/catalog:list_tracks", "tracks");

    Ok(Json(tracks))
}

/// # add a track
/// `lap_count` defaults to a single lap
#[post("/tracks", data = "<data>")]
pub fn create_track(pool: &State<DbPool>, auth: AuthUser, data: Result<Json<TrackData>, json::Error<'_>>) -> CustomResult<(Status, Json<ApiTrackCreated>)> {
    let data = payload(data)?;
    let lap_count = i32::try_from(data.lap_count.unwrap_or(1))
        .map_err(|_| Error::invalid_input("lap_count", "is too large"))?;

    let conn = &mut pool.inner().get()?;
    let track = Track::new(conn, &data.name, lap_count, &auth.user)?;

    Ok((
        Status::Created,
        Json(ApiTrackCreated {
            message: "Track created successfully".to_string(),
            track,
        }),
    ))
}

/**************************************************************************************************/
/**************** HELPERS *************************************************************************/
/**************************************************************************************************/

#[derive(Deserialize)]
pub struct NameData {
    pub name: String,
}

#[derive(Deserialize)]
pub struct TrackData {
    pub name: String,
    pub lap_count: Option<i64>,
}

#[derive(Serialize)]
pub struct ApiTrackCreated {
    pub message: String,
    pub track: Track,
}
