use diesel::result::DatabaseErrorKind;
use log::error;
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::{Deserialize, Serialize};
use snafu::Snafu;

use crate::modules::helpers::lap_time::LapTimeError;

pub type CustomResult<T> = Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    // request validation
    #[snafu(display("Malformed request payload: {reason}"))]
    MalformedPayloadError { reason: String },
    #[snafu(display("Invalid {field}: {reason}"))]
    InvalidInputError { field: String, reason: String },
    #[snafu(display("{source}"))]
    InvalidLapsError { source: LapTimeError },
    #[snafu(display("{what} already exists"))]
    AlreadyExistsError { what: String },
    #[snafu(display("{what} not found"))]
    NotFoundError { what: String },

    // authentication
    #[snafu(display("Login required"))]
    UnauthorizedError,
    #[snafu(display("Invalid email or password"))]
    InvalidCredentialsError,
    #[snafu(display("Not allowed to access {what}"))]
    ForbiddenError { what: String },

    // infrastructure
    #[snafu(display("Database error: {source}"))]
    DatabaseError { source: diesel::result::Error },
    #[snafu(display("Could not get a database connection: {source}"))]
    PoolError { source: diesel::r2d2::PoolError },
    #[snafu(display("Managed state `{what}` is missing"))]
    MissingStateError { what: String },
    #[snafu(display("Could not run database migrations: {reason}"))]
    MigrationError { reason: String },
    #[snafu(display("Invalid configuration value for {key}: {reason}"))]
    ConfigError { key: String, reason: String },
    #[snafu(display("Could not set up logging: {reason}"))]
    LoggingError { reason: String },
    #[snafu(display("Background job scheduler failed: {reason}"))]
    SchedulerError { reason: String },
    #[snafu(display("Server failed to launch: {reason}"))]
    LaunchError { reason: String },
}

impl Error {
    pub fn status(&self) -> Status {
        match self {
            Error::MalformedPayloadError { .. }
            | Error::InvalidInputError { .. }
            | Error::InvalidLapsError { .. }
            | Error::AlreadyExistsError { .. } => Status::BadRequest,
            Error::UnauthorizedError | Error::InvalidCredentialsError => Status::Unauthorized,
            Error::ForbiddenError { .. } => Status::Forbidden,
            Error::NotFoundError { .. } => Status::NotFound,
            Error::DatabaseError { .. }
            | Error::PoolError { .. }
            | Error::MissingStateError { .. }
            | Error::MigrationError { .. }
            | Error::ConfigError { .. }
            | Error::LoggingError { .. }
            | Error::SchedulerError { .. }
            | Error::LaunchError { .. } => Status::InternalServerError,
        }
    }

    pub fn invalid_input(field: &str, reason: &str) -> Error {
        Error::InvalidInputError {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Error::NotFoundError {
                what: "record".to_string(),
            },
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Error::AlreadyExistsError {
                    what: info.table_name().unwrap_or("entry").to_string(),
                }
            }
            error => Error::DatabaseError { source: error },
        }
    }
}

impl From<diesel::r2d2::PoolError> for Error {
    fn from(error: diesel::r2d2::PoolError) -> Self {
        Error::PoolError { source: error }
    }
}

impl From<LapTimeError> for Error {
    fn from(error: LapTimeError) -> Self {
        Error::InvalidLapsError { source: error }
    }
}

/// body of every error response
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn json(message: impl Into<String>) -> Json<ErrorBody> {
        Json(ErrorBody { error: message.into() })
    }
}

impl<'r> Responder<'r, 'static> for Error {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();

        // internal details are logged, the client gets a generic message
        let message = if status == Status::InternalServerError {
            error!(target: "errors", "{} {} failed: {}", request.method(), request.uri(), self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, ErrorBody::json(message)).respond_to(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let error: Error = LapTimeError::CountMismatch { expected: 3, actual: 1 }.into();
        assert_eq!(error.status(), Status::BadRequest);
        assert_eq!(error.to_string(), "expected 3 lap times for this track, got 1");
    }

    #[test]
    fn diesel_not_found_maps_to_404() {
        let error: Error = diesel::result::Error::NotFound.into();
        assert_eq!(error.status(), Status::NotFound);
    }

    #[test]
    fn auth_errors_are_unauthorized() {
        assert_eq!(Error::UnauthorizedError.status(), Status::Unauthorized);
        assert_eq!(Error::InvalidCredentialsError.status(), Status::Unauthorized);
        assert_eq!(
            Error::ForbiddenError { what: "lap record".to_string() }.status(),
            Status::Forbidden
        );
    }
}
