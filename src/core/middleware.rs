use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use tracing::{debug, warn};
use url::Url;

/// Query parameter carrying the database credential.
pub(crate) const AUTH_PARAM: &str = "auth";

const REDACTED: &str = "REDACTED";

/// Logs every database call through `tracing`.
///
/// The `auth` query parameter is masked before anything is written, so log
/// output never contains the credential.
#[derive(Clone, Debug, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

/// Returns a copy of `url` with the value of the `auth` parameter masked.
pub(crate) fn redact_url(url: &Url) -> Url {
    if !url.query_pairs().any(|(key, _)| key == AUTH_PARAM) {
        return url.clone();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            if key == AUTH_PARAM {
                (key.into_owned(), REDACTED.to_string())
            } else {
                (key.into_owned(), value.into_owned())
            }
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}

#[async_trait::async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let url = redact_url(req.url());

        debug!(%method, %url, "calling firebase");

        let result = next.run(req, extensions).await;

        match &result {
            Ok(response) if response.status().as_u16() >= 400 => {
                warn!(
                    %method,
                    %url,
                    status = response.status().as_u16(),
                    "firebase returned an error status"
                );
            }
            Ok(response) => {
                debug!(
                    %method,
                    %url,
                    status = response.status().as_u16(),
                    "firebase call completed"
                );
            }
            Err(err) => {
                warn!(%method, %url, error = %err, "request to firebase failed");
            }
        }

        result
    }
}
