use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    #[serde(alias = "long_url")]
    pub url: String,
    #[serde(default, alias = "custom_alias")]
    pub alias: Option<String>,
}

impl ShortenRequest {
    /// The requested alias, with blank values treated as absent.
    pub fn alias(&self) -> Option<&str> {
        self.alias
            .as_deref()
            .map(str::trim)
            .filter(|alias| !alias.is_empty())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub code: String,
    pub short_url: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
