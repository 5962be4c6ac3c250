//! `PUT` and `DELETE /api/{format}/{id}`
//!
//! The path is validated before the caller is authenticated, so a malformed
//! request never reaches the identity provider.

use crate::auth::authenticate;
use crate::error::HttpAppError;
use crate::state::AppState;
use achminup_core::{AppError, AssetKey};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use futures::{StreamExt, TryStreamExt};
use http_body_util::LengthLimitError;
use std::error::Error as _;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::io::StreamReader;
use tracing::Instrument;

pub async fn upload_asset(
    State(state): State<Arc<AppState>>,
    Path((format, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, HttpAppError> {
    let request = state.assets.next_request();
    let span = tracing::info_span!("upload", request = %request, format = %format, id = %id);

    async move {
        let key = AssetKey::parse(&format, &id)?;
        check_declared_length(&headers, state.config.max_upload_bytes)?;
        let identity = authenticate(state.identity.as_ref(), &headers).await?;

        let limit_hit = Arc::new(AtomicBool::new(false));
        let stream = {
            let limit_hit = limit_hit.clone();
            body.into_data_stream().map_err(move |e| {
                if is_length_limit(&e) {
                    limit_hit.store(true, Ordering::Relaxed);
                }
                io::Error::other(e)
            })
        };
        let mut reader = StreamReader::new(stream);
        let uploaded = state.assets.upload(key, &identity, &mut reader).await;

        if limit_hit.load(Ordering::Relaxed) {
            return Err(HttpAppError::from(AppError::PayloadTooLarge(format!(
                "Upload exceeds the {} byte limit",
                state.config.max_upload_bytes
            ))));
        }
        let url = uploaded?;

        Ok::<_, HttpAppError>((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            url,
        ))
    }
    .instrument(span)
    .await
}

/// The body limit layer reports an oversized chunked body as a stream error.
fn is_length_limit(err: &axum::Error) -> bool {
    err.source().is_some_and(|source| source.is::<LengthLimitError>())
}

/// Reject a declared `Content-Length` above the upload limit before anything
/// is staged. Chunked bodies are bounded by the body limit layer instead.
fn check_declared_length(headers: &HeaderMap, max_bytes: usize) -> Result<(), AppError> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(len) if len > max_bytes as u64 => Err(AppError::PayloadTooLarge(format!(
            "Upload of {} bytes exceeds the {} byte limit",
            len, max_bytes
        ))),
        _ => Ok(()),
    }
}

pub async fn delete_asset(
    State(state): State<Arc<AppState>>,
    Path((format, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, HttpAppError> {
    let request = state.assets.next_request();
    let span = tracing::info_span!("delete", request = %request, format = %format, id = %id);

    async move {
        let key = AssetKey::parse(&format, &id)?;
        let identity = authenticate(state.identity.as_ref(), &headers).await?;

        let mut stream = body.into_data_stream();
        while let Some(chunk) = stream.next().await {
            chunk.map_err(|e| {
                AppError::Internal(format!("Failed to read request body: {}", e))
            })?;
        }

        state.assets.delete(key, &identity).await?.into_result()?;
        Ok::<_, HttpAppError>(StatusCode::NO_CONTENT)
    }
    .instrument(span)
    .await
}
