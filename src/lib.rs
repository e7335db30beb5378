//! Firebase Realtime Database client over the REST API.
//!
//! Start from a [`FirebaseApp`], which owns the configuration and a single
//! shared [`Transport`](database::Transport), and take [`Location`]s from it.

pub mod core;
pub mod database;

pub use database::{DatabaseError, Location, Params};

use database::{HttpTransport, Transport};
use std::sync::{Arc, OnceLock};

/// Entry point holding the database URL, the default credential and the
/// transport shared by every location it hands out.
///
/// Unless one is supplied with [`with_transport`](FirebaseApp::with_transport),
/// an [`HttpTransport`] is built on the first call to
/// [`database`](FirebaseApp::database) and reused afterwards.
#[derive(Clone)]
pub struct FirebaseApp {
    database_url: String,
    auth: Option<String>,
    transport: OnceLock<Arc<dyn Transport>>,
}

impl FirebaseApp {
    /// Creates an app for the database at `database_url`, e.g.
    /// `https://my-project.firebaseio.com`.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            auth: None,
            transport: OnceLock::new(),
        }
    }

    /// Sets the credential sent as the `auth` query parameter.
    ///
    /// The token is opaque to this crate (a database secret or an ID token).
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(token.into());
        self
    }

    /// Replaces the transport, e.g. with an [`HttpTransport`] built over a
    /// custom middleware stack.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = OnceLock::from(transport);
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn auth(&self) -> Option<&str> {
        self.auth.as_deref()
    }

    fn transport(&self) -> Arc<dyn Transport> {
        let transport = self
            .transport
            .get_or_init(|| Arc::new(HttpTransport::new()));
        Arc::clone(transport)
    }

    /// Returns a location for the root of the database.
    pub fn database(&self) -> Location {
        Location::new(
            self.database_url.clone(),
            self.auth.clone(),
            Some(self.transport()),
        )
    }
}
