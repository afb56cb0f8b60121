use chrono::NaiveDateTime;
use log::info;
use rocket::http::Status;
use rocket::serde::json::{self, Json};
use rocket::{delete, get, post, State};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::CustomResult;
use crate::modules::helpers::guards::auth_user::AuthUser;
use crate::modules::helpers::request::payload;
use crate::modules::models::api_token::ApiToken;
use crate::modules::models::general::DbPool;
use crate::modules::models::user::User;

/**************************************************************************************************/
/**************** ROUTES **************************************************************************/
/**************************************************************************************************/

/// # create an account
#[post("/register", data = "<data>")]
pub fn register(pool: &State<DbPool>, data: Result<Json<RegisterData>, json::Error<'_>>) -> CustomResult<(Status, Json<ApiRegistered>)> {
    let data = payload(data)?;
    let conn = &mut pool.inner().get()?;

    let user = User::register(conn, &data.username, &data.email, &data.password)?;

    Ok((
        Status::Created,
        Json(ApiRegistered {
            message: "User registered successfully".to_string(),
            user,
        }),
    ))
}

/// # log in
/// exchanges an email and password for a bearer token
#[post("/login", data = "<data>")]
pub fn login(pool: &State<DbPool>, config: &State<Config>, data: Result<Json<LoginData>, json::Error<'_>>) -> CustomResult<Json<ApiLogin>> {
    let data = payload(data)?;
    let conn = &mut pool.inner().get()?;

    let user = User::authenticate(conn, &data.email, &data.password)?;
    let issued = ApiToken::issue(conn, &user, config.token_ttl())?;
    info!(target: "routes/api/user:login", "user {} logged in", user.id);

    Ok(Json(ApiLogin {
        message: "Login successful".to_string(),
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// # log out
/// revokes the token used for this request, other tokens stay valid
#[post("/logout")]
pub fn logout(pool: &State<DbPool>, auth: AuthUser) -> CustomResult<Json<ApiMessage>> {
    let conn = &mut pool.inner().get()?;
    auth.token.revoke(conn)?;
    info!(target: "routes/api/user:logout", "user {} logged out", auth.user.id);

    Ok(ApiMessage::json("Logged out"))
}

#[get("/user")]
pub fn get_current(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

/// # delete the account
/// takes the user's tokens and lap records with it
#[delete("/user")]
pub fn delete_current(pool: &State<DbPool>, auth: AuthUser) -> CustomResult<Json<ApiMessage>> {
    let conn = &mut pool.inner().get()?;
    auth.user.delete(conn)?;

    Ok(ApiMessage::json("Account deleted"))
}

/**************************************************************************************************/
/**************** HELPERS *************************************************************************/
/**************************************************************************************************/

#[derive(Deserialize)]
pub struct RegisterData {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginData {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn json(message: &str) -> Json<ApiMessage> {
        Json(ApiMessage {
            message: message.to_string(),
        })
    }
}

#[derive(Serialize)]
pub struct ApiRegistered {
    pub message: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct ApiLogin {
    pub message: String,
    pub token: String,
    pub expires_at: NaiveDateTime,
}
