mod url;

pub use url::{ErrorResponse, HealthResponse, ShortenRequest, ShortenResponse};
