//! Firebase Realtime Database module.
//!
//! The database is a JSON tree addressed by URL paths. A [`Location`] is a
//! handle on one node of that tree: it composes child addresses and maps
//! reads, pushes, overwrites, partial updates and deletes onto the REST verbs
//! `GET`, `POST`, `PUT`, `PATCH` and `DELETE`.
//!
//! Every call goes through a [`Transport`]. The default [`HttpTransport`]
//! talks to the REST endpoint; tests and embedders can substitute their own.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use firebase_rtdb::FirebaseApp;
//! # async fn run() -> Result<(), firebase_rtdb::database::DatabaseError> {
//! let app = FirebaseApp::new("https://my-project.firebaseio.com").with_auth("secret");
//! let users = app.database().try_child("users", None).await?;
//!
//! let alice = users.push(&serde_json::json!({ "name": "Alice" }), None).await?;
//! users.update(alice.key(), &serde_json::json!({ "age": 30 }), None).await?;
//! # Ok(())
//! # }
//! ```

pub mod location;
pub mod transport;


pub use self::location::Location;
pub use self::transport::{HttpTransport, Transport, JSON_SUFFIX};

use std::collections::HashMap;
use thiserror::Error;

/// Extra query parameters passed through verbatim, e.g. `shallow`, `print` or `orderBy`.
pub type Params = HashMap<String, String>;

/// Errors that can occur during Realtime Database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The request URL could not be built from the location address.
    #[error("Invalid database URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The address contains a `.` or `..` segment, which would resolve to another node.
    #[error("Invalid database path: {0}")]
    InvalidPath(String),
    /// Wrapper for `reqwest::Error`.
    #[error("HTTP Request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Wrapper for `reqwest_middleware::Error`.
    #[error("Middleware error: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),
    /// The database answered with a status of 400 or above.
    ///
    /// The message is the response body, unparsed.
    #[error("{message}")]
    Remote { status: u16, message: String },
    /// Wrapper for `serde_json::Error`.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl DatabaseError {
    /// Returns `true` if the database answered `404 Not Found`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::Remote { status: 404, .. })
    }
}
