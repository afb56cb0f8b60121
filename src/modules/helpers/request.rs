use log::debug;
use rocket::serde::json::{self, Json};

use crate::errors::{CustomResult, Error};

/// # unwrap a json request body
/// rocket hands a body that fails to parse to the route instead of
/// answering 422, so every client mistake ends up as a 400 with a message.
///
/// ## Arguments
/// * `data` - The body as rocket parsed it
///
/// ## Returns
/// * `T` - The parsed body
pub fn payload<T>(data: Result<Json<T>, json::Error<'_>>) -> CustomResult<T> {
    match data {
        Ok(data) => Ok(data.into_inner()),
        Err(json::Error::Io(error)) => {
            debug!(target: "helpers/request:payload", "could not read body: {}", error);
            Err(Error::MalformedPayloadError {
                reason: error.to_string(),
            })
        }
        Err(json::Error::Parse(_, error)) => {
            debug!(target: "helpers/request:payload", "could not parse body: {}", error);
            Err(Error::MalformedPayloadError {
                reason: error.to_string(),
            })
        }
    }
}
