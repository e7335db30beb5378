use super::{DatabaseError, Params};
use crate::core::default_client;
use crate::core::middleware::AUTH_PARAM;
use bytes::Bytes;
use reqwest::{header, Method};
use reqwest_middleware::ClientWithMiddleware;
use std::collections::BTreeMap;
use url::Url;

/// Suffix selecting the REST (JSON) endpoint for a database path.
pub const JSON_SUFFIX: &str = ".json";

/// Executes one request/response cycle against the database.
///
/// Implementations must be stateless with respect to the calls they serve:
/// a single instance is shared by every [`Location`](super::Location)
/// derived from the same root.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends `method` to `address` and returns the raw response body.
    ///
    /// # Arguments
    ///
    /// * `address` - The node URL, without the `.json` suffix.
    /// * `auth` - Default credential, sent as the `auth` query parameter.
    /// * `body` - JSON payload, `None` for reads and deletes.
    /// * `params` - Extra query parameters. An `auth` entry here replaces the default credential.
    async fn call(
        &self,
        method: Method,
        address: &str,
        auth: Option<&str>,
        body: Option<Vec<u8>>,
        params: Option<&Params>,
    ) -> Result<Bytes, DatabaseError>;
}

/// [`Transport`] speaking the Realtime Database REST protocol over HTTP.
#[derive(Clone)]
pub struct HttpTransport {
    client: ClientWithMiddleware,
}

impl HttpTransport {
    /// Creates a transport with the default client, which logs every call.
    pub fn new() -> Self {
        Self {
            client: default_client(),
        }
    }

    /// Creates a transport over a caller-built client and middleware stack.
    pub fn with_client(client: ClientWithMiddleware) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns `true` if the path part of `address` has a `.` or `..` segment.
///
/// URL parsing resolves those, so the request would hit a different node
/// than the one the address names.
fn has_dot_segment(address: &str) -> bool {
    let rest = address.split_once("://").map_or(address, |(_, rest)| rest);
    let path = rest.split_once('/').map_or("", |(_, path)| path);
    let path = path.split(['?', '#']).next().unwrap_or_default();

    path.split('/').any(|segment| {
        let segment = segment.to_ascii_lowercase().replace("%2e", ".");
        segment == "." || segment == ".."
    })
}

/// Builds the final request URL: `address/.json?auth=..&params..`.
pub(crate) fn request_url(
    address: &str,
    auth: Option<&str>,
    params: Option<&Params>,
) -> Result<Url, DatabaseError> {
    if has_dot_segment(address) {
        return Err(DatabaseError::InvalidPath(address.to_string()));
    }

    let mut path = address.to_string();
    if !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(JSON_SUFFIX);

    let mut url = Url::parse(&path)?;

    let mut query: BTreeMap<&str, &str> = BTreeMap::new();
    if let Some(auth) = auth.filter(|a| !a.is_empty()) {
        query.insert(AUTH_PARAM, auth);
    }
    // per-call params win over the default credential
    for (key, value) in params.into_iter().flatten() {
        query.insert(key.as_str(), value.as_str());
    }

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }

    Ok(url)
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        method: Method,
        address: &str,
        auth: Option<&str>,
        body: Option<Vec<u8>>,
        params: Option<&Params>,
    ) -> Result<Bytes, DatabaseError> {
        let url = request_url(address, auth, params)?;

        let mut request = self
            .client
            .request(method, url)
            .header(header::CONNECTION, "close");

        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.as_u16() >= 400 {
            return Err(DatabaseError::Remote {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(bytes)
    }
}
