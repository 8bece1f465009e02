//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
///
/// The caller should ensure that `id` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The name the user logs in with. Unique across all users.
    pub username: String,
    /// The user's email address. Unique across all users.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// Uniqueness of both the username and email is enforced by the database; a
/// collision on either column fails with [Error::DuplicateUser] and inserts
/// nothing. The error intentionally does not say which column collided.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUser] if the username or email is already taken,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    username: &str,
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (username, email, password) VALUES (?1, ?2, ?3)",
        (username, email, &password_hash.to_string()),
    )?;

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        username: username.to_owned(),
        email: email.to_owned(),
        password_hash,
    })
}

/// Get the user from the database with a username equal to `username`.
///
/// # Errors
///
/// This function will return an error if:
/// - `username` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_username(username: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, email, password FROM user WHERE username = :username")?
        .query_row(&[(":username", username)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, username, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let username = row.get(1)?;
    let email = row.get(2)?;
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserId::new(raw_id),
        username,
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        user::{UserId, create_user, get_user_by_id, get_user_by_username},
    };

    use super::{Error, create_user_table};

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();
        let password_hash = PasswordHash::new_unchecked("hunter2");

        let inserted_user = create_user("alice", "a@x.com", password_hash.clone(), &db_connection)
            .expect("Could not create user");

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.username, "alice");
        assert_eq!(inserted_user.email, "a@x.com");
        assert_eq!(inserted_user.password_hash, password_hash);
    }

    #[test]
    fn insert_user_fails_with_duplicate_username() {
        let db_connection = get_db_connection();
        create_user(
            "alice",
            "a@x.com",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .expect("Could not create user");

        let result = create_user(
            "alice",
            "different@x.com",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        );

        assert_eq!(result, Err(Error::DuplicateUser));
    }

    #[test]
    fn insert_user_fails_with_duplicate_email() {
        let db_connection = get_db_connection();
        create_user(
            "alice",
            "a@x.com",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .expect("Could not create user");

        let result = create_user(
            "different",
            "a@x.com",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        );

        assert_eq!(result, Err(Error::DuplicateUser));
    }

    #[test]
    fn duplicate_username_and_email_produce_the_same_error() {
        let db_connection = get_db_connection();
        create_user(
            "alice",
            "a@x.com",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .expect("Could not create user");

        let username_collision = create_user(
            "alice",
            "b@x.com",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        );
        let email_collision = create_user(
            "bob",
            "a@x.com",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        );

        assert_eq!(username_collision, email_collision);
    }

    #[test]
    fn failed_insert_leaves_no_partial_record() {
        let db_connection = get_db_connection();
        create_user(
            "alice",
            "a@x.com",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .expect("Could not create user");

        let _ = create_user(
            "alice",
            "b@x.com",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        );

        let count: i64 = db_connection
            .query_row("SELECT COUNT(id) FROM user", [], |row| row.get(0))
            .expect("Could not get user count");
        assert_eq!(count, 1, "want 1 user after failed insert, got {count}");
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserId::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user = create_user(
            "alice",
            "a@x.com",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .expect("Could not create user");

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_username_succeeds() {
        let db_connection = get_db_connection();
        let test_user = create_user(
            "alice",
            "a@x.com",
            PasswordHash::new_unchecked("hunter2"),
            &db_connection,
        )
        .expect("Could not create user");

        let retrieved_user = get_user_by_username("alice", &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_username_fails_with_unknown_name() {
        let db_connection = get_db_connection();

        assert_eq!(
            get_user_by_username("nobody", &db_connection),
            Err(Error::NotFound)
        );
    }
}
