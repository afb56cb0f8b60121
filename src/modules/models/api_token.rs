use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use log::{error, info};
use serde::Serialize;

use crate::modules::helpers::security::Security;
use crate::modules::models::user::User;
use crate::schema::{api_tokens, users};

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = api_tokens)]
pub struct NewApiToken {
    pub user_id: i32,
    pub token_hash: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, PartialEq, Debug, Clone)]
#[diesel(belongs_to(User))]
#[diesel(table_name = api_tokens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ApiToken {
    pub id: i32,
    pub user_id: i32,
    #[serde(skip)]
    pub token_hash: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

/// a freshly issued token. `token` is only ever seen here, the database keeps
/// its hash.
#[derive(Serialize, Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: NaiveDateTime,
}

impl ApiToken {
    /// # issue a token for a user
    ///
    /// ## Arguments
    /// * `conn` - The database connection to use
    /// * `user` - The owner of the token
    /// * `ttl` - How long the token stays valid
    ///
    /// ## Returns
    /// * `IssuedToken` - The plain token and its expiry
    pub fn issue(conn: &mut SqliteConnection, user: &User, ttl: Duration) -> QueryResult<IssuedToken> {
        let token = Security::generate_token();
        let now = Utc::now().naive_utc();

        let new_token = NewApiToken {
            user_id: user.id,
            token_hash: Security::hash_token(&token),
            created_at: now,
            expires_at: now + ttl,
        };

        let stored = diesel::insert_into(api_tokens::table)
            .values(&new_token)
            .returning(ApiToken::as_returning())
            .get_result(conn)
            .map_err(|error| {
                error!(target: "models/api_token:issue", "Error storing token for user {}: {}", user.id, error);
                error
            })?;

        Ok(IssuedToken {
            token,
            expires_at: stored.expires_at,
        })
    }

    /// # resolve a bearer token
    /// returns the token row and its owner when the token exists and has not
    /// expired yet.
    pub fn resolve(conn: &mut SqliteConnection, token: &str) -> QueryResult<Option<(ApiToken, User)>> {
        let now = Utc::now().naive_utc();

        api_tokens::table
            .inner_join(users::table)
            .filter(api_tokens::token_hash.eq(Security::hash_token(token)))
            .filter(api_tokens::expires_at.gt(now))
            .select((ApiToken::as_select(), User::as_select()))
            .first::<(ApiToken, User)>(conn)
            .optional()
    }

    pub fn revoke(&self, conn: &mut SqliteConnection) -> QueryResult<usize> {
        diesel::delete(api_tokens::table.filter(api_tokens::id.eq(self.id))).execute(conn)
    }

    /// remove every token that expired before now
    pub fn delete_expired(conn: &mut SqliteConnection) -> QueryResult<usize> {
        let now = Utc::now().naive_utc();
        let deleted = diesel::delete(api_tokens::table.filter(api_tokens::expires_at.le(now))).execute(conn)?;

        if deleted > 0 {
            info!(target: "models/api_token:delete_expired", "removed {} expired tokens", deleted);
        }

        Ok(deleted)
    }
}
