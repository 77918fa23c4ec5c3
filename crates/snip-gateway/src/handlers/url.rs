use crate::error::{AppError, Result};
use crate::model::{ShortenRequest, ShortenResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use snip_core::{ShortCode, ShortenParams, ShortenerError};

pub async fn shorten_handler(
    State(state): State<AppState>,
    request: std::result::Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>> {
    let Json(request) = request?;

    let mut params = ShortenParams::new(request.url.as_str());
    if let Some(alias) = request.alias() {
        params = params.with_alias(ShortCode::custom_alias(alias)?);
    }

    let code = state.shortener().shorten(params).await?;
    Ok(Json(ShortenResponse {
        short_url: code.to_url(state.base_url()),
        code: code.to_string(),
    }))
}

pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    // Anything that cannot be a code was never issued.
    let code =
        ShortCode::new(short_code.as_str()).map_err(|_| ShortenerError::CodeNotFound(short_code))?;

    let long_url = state.shortener().resolve(&code).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location_header(long_url)?)]).into_response())
}

/// The stored URL as a `Location` value.
///
/// The URL is sent exactly as stored unless it contains bytes a header
/// cannot carry, in which case its percent-encoded form is used.
fn location_header(long_url: String) -> Result<HeaderValue> {
    if let Ok(value) = HeaderValue::try_from(long_url.as_str()) {
        return Ok(value);
    }

    let encoded = ::url::Url::parse(&long_url)
        .map(String::from)
        .unwrap_or(long_url);
    HeaderValue::try_from(encoded).map_err(|e| {
        AppError::from(ShortenerError::Storage(format!(
            "stored url is not a valid redirect target: {e}"
        )))
    })
}
