use std::sync::OnceLock;

use chrono::{NaiveDateTime, Utc};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::select;
use log::{error, info};
use regex::Regex;
use serde::Serialize;

use crate::errors::{CustomResult, Error};
use crate::modules::helpers::security::Security;
use crate::schema::users;

const USERNAME_PATTERN: &str = r"^[A-Za-z0-9_.-]{3,32}$";
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email_hash: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, PartialEq, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip)]
    pub email_hash: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

impl User {
    /************ INSERTERS ************/
    /// # register a new user
    /// validates the input, checks that the email and username are free and
    /// stores the user with a hashed email and password.
    ///
    /// ## Arguments
    /// * `conn` - The database connection to use
    /// * `username` - The public name shown on leaderboards
    /// * `email` - The email used to log in
    /// * `password` - The plain text password
    ///
    /// ## Returns
    /// * `User` - The inserted user
    pub fn register(conn: &mut SqliteConnection, username: &str, email: &str, password: &str) -> CustomResult<User> {
        let username = username.trim();
        validate_registration(username, email, password)?;

        let email_hash = Security::hash_email(email);
        if User::exists_with_email_hash(conn, &email_hash)? {
            return Err(Error::AlreadyExistsError {
                what: "An account with this email".to_string(),
            });
        }
        if User::exists_with_username(conn, username)? {
            return Err(Error::AlreadyExistsError {
                what: format!("Username `{username}`"),
            });
        }

        let new_user = NewUser {
            username: username.to_string(),
            email_hash,
            password_hash: Security::hash_password(password),
            created_at: Utc::now().naive_utc(),
        };

        let user = diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(conn)
            .map_err(|error| {
                error!(target: "models/user:register", "Error inserting user: {}", error);
                Error::from(error)
            })?;

        info!(target: "models/user:register", "registered user {}", user.id);
        Ok(user)
    }

    /************ GETTERS ************/
    pub fn get_by_id(conn: &mut SqliteConnection, id_in: i32) -> QueryResult<User> {
        use crate::schema::users::dsl::*;

        users.filter(id.eq(id_in))
            .select(User::as_select())
            .first(conn)
    }

    pub fn get_by_email(conn: &mut SqliteConnection, email: &str) -> QueryResult<User> {
        use crate::schema::users::dsl::*;

        users.filter(email_hash.eq(Security::hash_email(email)))
            .select(User::as_select())
            .first(conn)
    }

    pub fn exists_with_email_hash(conn: &mut SqliteConnection, hash: &str) -> QueryResult<bool> {
        use crate::schema::users::dsl::*;
        select(exists(users.filter(email_hash.eq(hash)))).get_result(conn)
    }

    pub fn exists_with_username(conn: &mut SqliteConnection, name: &str) -> QueryResult<bool> {
        use crate::schema::users::dsl::*;
        select(exists(users.filter(username.eq(name)))).get_result(conn)
    }

    /// # check a login
    /// an unknown email and a wrong password give the same error
    pub fn authenticate(conn: &mut SqliteConnection, email: &str, password: &str) -> CustomResult<User> {
        let user = match User::get_by_email(conn, email) {
            Ok(user) => user,
            Err(diesel::result::Error::NotFound) => return Err(Error::InvalidCredentialsError),
            Err(error) => return Err(error.into()),
        };

        if !Security::verify_password(password, &user.password_hash) {
            info!(target: "models/user:authenticate", "failed login for user {}", user.id);
            return Err(Error::InvalidCredentialsError);
        }

        Ok(user)
    }

    /************ REMOVERS ************/
    /// # delete the user
    /// tokens and lap records go with it through `ON DELETE CASCADE`,
    /// catalog entries stay and lose their creator.
    pub fn delete(&self, conn: &mut SqliteConnection) -> QueryResult<usize> {
        use crate::schema::users::dsl::*;

        let deleted = diesel::delete(users.filter(id.eq(self.id))).execute(conn)?;
        info!(target: "models/user:delete", "deleted user {}", self.id);

        Ok(deleted)
    }
}

fn username_regex() -> &'static Regex {
    static USERNAME: OnceLock<Regex> = OnceLock::new();
    USERNAME.get_or_init(|| Regex::new(USERNAME_PATTERN).expect("username pattern is valid"))
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is valid"))
}

pub fn validate_registration(username: &str, email: &str, password: &str) -> CustomResult<()> {
    if !username_regex().is_match(username) {
        return Err(Error::invalid_input(
            "username",
            "use 3 to 32 letters, digits, `_`, `.` or `-`",
        ));
    }

    if !email_regex().is_match(email.trim()) {
        return Err(Error::invalid_input("email", "enter a valid email address"));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::InvalidInputError {
            field: "password".to_string(),
            reason: format!("use at least {MIN_PASSWORD_LENGTH} characters"),
        });
    }

    Ok(())
}
