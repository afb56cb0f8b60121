use log::{error, warn};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;

use crate::errors::Error;
use crate::modules::models::api_token::ApiToken;
use crate::modules::models::general::DbPool;
use crate::modules::models::user::User;

/// the user behind the `Authorization: Bearer <token>` header of a request.
/// routes that take this guard answer 401 when the header is missing, the
/// token is unknown or it has expired.
pub struct AuthUser {
    pub user: User,
    pub token: ApiToken,
}

/// the token part of an `Authorization` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(token) = req.headers().get_one("Authorization").and_then(bearer_token) else {
            return Outcome::Error((Status::Unauthorized, Error::UnauthorizedError));
        };

        let Some(pool) = req.rocket().state::<DbPool>() else {
            error!(target: "guards/auth_user", "no database pool is managed");
            return Outcome::Error((
                Status::InternalServerError,
                Error::MissingStateError {
                    what: "DbPool".to_string(),
                },
            ));
        };

        let conn = &mut match pool.get() {
            Ok(conn) => conn,
            Err(error) => {
                error!(target: "guards/auth_user", "Error getting connection: {}", error);
                return Outcome::Error((Status::InternalServerError, Error::PoolError { source: error }));
            }
        };

        match ApiToken::resolve(conn, token) {
            Ok(Some((token, user))) => Outcome::Success(AuthUser { user, token }),
            Ok(None) => {
                warn!(target: "guards/auth_user", "rejected unknown or expired token");
                Outcome::Error((Status::Unauthorized, Error::UnauthorizedError))
            }
            Err(error) => {
                error!(target: "guards/auth_user", "Error resolving token: {}", error);
                Outcome::Error((Status::InternalServerError, Error::DatabaseError { source: error }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("bearer   abc123 "), Some("abc123"));
        assert_eq!(bearer_token("Basic abc123"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc123"), None);
    }
}
