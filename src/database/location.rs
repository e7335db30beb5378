use super::transport::{HttpTransport, Transport};
use super::{DatabaseError, Params};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Response body of a push (`POST`): the generated child key.
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// A handle on one node of the database tree.
///
/// A `Location` knows its address and lazily caches the value stored there.
/// The cache belongs to this handle alone; locations derived from it share
/// only the transport and credential.
///
/// The cached value is guarded by an async mutex. [`Location::value`] holds
/// the lock while it fetches, so concurrent callers trigger a single read and
/// all observe its result.
pub struct Location {
    address: String,
    auth: Option<String>,
    transport: Arc<dyn Transport>,
    value: Mutex<Option<Value>>,
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Location")
            .field("address", &self.address)
            .field("auth", &self.auth.as_ref().map(|_| "REDACTED"))
            .finish_non_exhaustive()
    }
}

/// Joins `path` onto `address`. An empty path addresses `address` itself.
fn join(address: &str, path: &str) -> String {
    let path = path.trim_matches('/');
    if path.is_empty() {
        address.to_string()
    } else {
        format!("{}/{}", address.trim_end_matches('/'), path)
    }
}

impl Location {
    /// Creates a root location.
    ///
    /// No request is made. When `transport` is `None` a new [`HttpTransport`]
    /// is created; prefer [`FirebaseApp`](crate::FirebaseApp) to share one
    /// transport between roots.
    ///
    /// # Arguments
    ///
    /// * `root` - The database URL, e.g. `https://my-project.firebaseio.com`.
    /// * `auth` - Optional credential sent with every call.
    /// * `transport` - Optional transport, mostly for substituting test doubles.
    pub fn new(
        root: impl Into<String>,
        auth: Option<String>,
        transport: Option<Arc<dyn Transport>>,
    ) -> Self {
        let transport = transport.unwrap_or_else(|| Arc::new(HttpTransport::new()));
        Self {
            address: root.into(),
            auth,
            transport,
            value: Mutex::new(None),
        }
    }

    fn derive(&self, address: String, value: Option<Value>) -> Self {
        Self {
            address,
            auth: self.auth.clone(),
            transport: Arc::clone(&self.transport),
            value: Mutex::new(value),
        }
    }

    /// The URL of this node, without the `.json` suffix.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The credential sent with every call from this location.
    pub fn auth(&self) -> Option<&str> {
        self.auth.as_deref()
    }

    /// The last path segment of this node's address.
    pub fn key(&self) -> &str {
        let address = self.address.trim_end_matches('/');
        address.rsplit('/').next().unwrap_or(address)
    }

    async fn read(
        &self,
        path: &str,
        params: Option<&Params>,
    ) -> Result<(String, Value), DatabaseError> {
        let address = join(&self.address, path);
        let bytes = self
            .transport
            .call(Method::GET, &address, self.auth(), None, params)
            .await?;
        let value = serde_json::from_slice(&bytes)?;
        Ok((address, value))
    }

    /// Returns the value stored at this location.
    ///
    /// The first call reads it from the database; later calls return the
    /// cached copy until an [`update`](Location::update) of this node clears
    /// it. Returns `None` if the read fails.
    pub async fn value(&self) -> Option<Value> {
        let mut cached = self.value.lock().await;

        if cached.is_none() {
            match self.read("", None).await {
                Ok((_, value)) => *cached = Some(value),
                Err(err) => {
                    debug!(address = %self.address, error = %err, "reading location value failed");
                }
            }
        }

        cached.clone()
    }

    /// Returns the value at this location deserialized into `T`.
    pub async fn value_as<T: DeserializeOwned>(&self) -> Result<Option<T>, DatabaseError> {
        match self.value().await {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Reads the node at `path` below this location.
    ///
    /// Returns `None` on any failure: a missing node, a transport error and
    /// an undecodable body are not distinguished. Use
    /// [`try_child`](Location::try_child) to keep the error.
    pub async fn child(&self, path: &str, params: Option<&Params>) -> Option<Location> {
        match self.try_child(path, params).await {
            Ok(location) => Some(location),
            Err(err) => {
                debug!(address = %self.address, path, error = %err, "child lookup failed");
                None
            }
        }
    }

    /// Reads the node at `path` below this location, returning a location
    /// with the value cached.
    pub async fn try_child(
        &self,
        path: &str,
        params: Option<&Params>,
    ) -> Result<Location, DatabaseError> {
        let (address, value) = self.read(path, params).await?;
        Ok(self.derive(address, Some(value)))
    }

    /// Appends `value` under this location with a server-generated key.
    ///
    /// The returned location points at the new child and caches `value`.
    pub async fn push<T: Serialize + ?Sized>(
        &self,
        value: &T,
        params: Option<&Params>,
    ) -> Result<Location, DatabaseError> {
        let value = serde_json::to_value(value)?;
        let body = serde_json::to_vec(&value)?;

        let bytes = self
            .transport
            .call(Method::POST, &self.address, self.auth(), Some(body), params)
            .await?;
        let PushResponse { name } = serde_json::from_slice(&bytes)?;

        Ok(self.derive(join(&self.address, &name), Some(value)))
    }

    /// Overwrites the node at `path` with `value`.
    ///
    /// The returned location caches whatever the database echoes back; with
    /// `print=silent` the body is empty and nothing is cached.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        path: &str,
        value: &T,
        params: Option<&Params>,
    ) -> Result<Location, DatabaseError> {
        let address = join(&self.address, path);
        let body = serde_json::to_vec(value)?;

        let bytes = self
            .transport
            .call(Method::PUT, &address, self.auth(), Some(body), params)
            .await?;

        let value = if bytes.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&bytes)?)
        };

        Ok(self.derive(address, value))
    }

    /// Applies a partial update (a map of sub-paths to new values) at `path`.
    ///
    /// Updating this node itself (an empty `path`) clears the cached value,
    /// since the merged result is only known to the database.
    pub async fn update<T: Serialize + ?Sized>(
        &self,
        path: &str,
        value: &T,
        params: Option<&Params>,
    ) -> Result<(), DatabaseError> {
        let body = serde_json::to_vec(value)?;

        let address = join(&self.address, path);
        let result = self
            .transport
            .call(Method::PATCH, &address, self.auth(), Some(body), params)
            .await;

        if path.trim_matches('/').is_empty() {
            *self.value.lock().await = None;
        }

        result.map(|_| ())
    }

    /// Deletes the node at `path`.
    pub async fn remove(&self, path: &str, params: Option<&Params>) -> Result<(), DatabaseError> {
        let address = join(&self.address, path);
        self.transport
            .call(Method::DELETE, &address, self.auth(), None, params)
            .await
            .map(|_| ())
    }
}
