//! errors raised by rocket itself, before or instead of a route, get the
//! same `{"error": ...}` body as the ones routes return

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{catch, Request};

use crate::errors::ErrorBody;

#[catch(400)]
pub fn bad_request() -> Json<ErrorBody> {
    ErrorBody::json("Bad request")
}

#[catch(401)]
pub fn unauthorized() -> Json<ErrorBody> {
    ErrorBody::json("Login required")
}

#[catch(403)]
pub fn forbidden() -> Json<ErrorBody> {
    ErrorBody::json("Forbidden")
}

#[catch(404)]
pub fn not_found(req: &Request) -> Json<ErrorBody> {
    ErrorBody::json(format!("{} not found", req.uri().path()))
}

#[catch(422)]
pub fn unprocessable() -> Json<ErrorBody> {
    ErrorBody::json("Unprocessable request payload")
}

#[catch(500)]
pub fn internal_error() -> Json<ErrorBody> {
    ErrorBody::json("Internal server error")
}

#[catch(default)]
pub fn default(status: Status, _req: &Request) -> (Status, Json<ErrorBody>) {
    (status, ErrorBody::json(status.reason().unwrap_or("Unknown error")))
}
