pub mod middleware;

use crate::core::middleware::LoggingMiddleware;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};

/// Builds the default HTTP client: a plain reqwest client with request logging.
///
/// No retry middleware is installed; each database call is a single attempt.
pub fn default_client() -> ClientWithMiddleware {
    ClientBuilder::new(Client::new())
        .with(LoggingMiddleware::new())
        .build()
}
