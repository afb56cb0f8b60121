use chrono::Utc;
use log::error;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, State};
use serde::Serialize;

use crate::modules::diagnostic::{DiagnosticStatus, StatusCell};
use crate::modules::helpers::guards::auth_user::AuthUser;
use crate::modules::models::general::{ping, DbPool};

/// # liveness of the api and its database
/// answers 500 when the database does not respond to `SELECT 1`
#[get("/health")]
pub fn health(pool: &State<DbPool>) -> (Status, Json<ApiHealth>) {
    let checked = pool
        .inner()
        .get()
        .map_err(|error| error.to_string())
        .and_then(|mut conn| ping(&mut conn).map_err(|error| error.to_string()));
    let timestamp = Utc::now().to_rfc3339();

    match checked {
        Ok(()) => (
            Status::Ok,
            Json(ApiHealth::Healthy {
                status: "healthy",
                timestamp,
                database: "connected",
                api: "running",
            }),
        ),
        Err(reason) => {
            error!(target: "routes/api/health:health", "health check failed: {}", reason);
            (
                Status::InternalServerError,
                Json(ApiHealth::Unhealthy {
                    status: "unhealthy",
                    error: reason,
                    timestamp,
                }),
            )
        }
    }
}

/// the latest result of the periodic diagnostic
#[get("/diagnostic")]
pub fn diagnostic(_auth: AuthUser, cell: &State<StatusCell>) -> Json<DiagnosticStatus> {
    Json(cell.snapshot())
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum ApiHealth {
    Healthy {
        status: &'static str,
        timestamp: String,
        database: &'static str,
        api: &'static str,
    },
    Unhealthy {
        status: &'static str,
        error: String,
        timestamp: String,
    },
}
