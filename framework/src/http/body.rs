//! Body parsing utilities for HTTP requests
//!
//! Provides bounded body collection and parsing for JSON and form-urlencoded data.

use crate::error::FrameworkError;
use bytes::Bytes;
use http_body_util::{BodyExt, Limited};
use hyper::body::Incoming;
use serde::de::DeserializeOwned;

/// Why a body could not be collected
#[derive(Debug)]
pub enum BodyError {
    /// The body is larger than the configured limit
    TooLarge,
    /// The connection failed while reading
    Read(String),
}

/// Collect the full body from an Incoming stream, up to `limit` bytes
pub async fn collect_body(body: Incoming, limit: usize) -> Result<Bytes, BodyError> {
    Limited::new(body, limit)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| {
            if e.is::<http_body_util::LengthLimitError>() {
                BodyError::TooLarge
            } else {
                BodyError::Read(e.to_string())
            }
        })
}

/// Parse bytes as JSON into the target type
pub fn parse_json<T: DeserializeOwned>(bytes: &Bytes) -> Result<T, FrameworkError> {
    serde_json::from_slice(bytes)
        .map_err(|e| FrameworkError::bad_request(format!("Failed to parse JSON body: {}", e)))
}

/// Parse bytes as form-urlencoded into the target type
pub fn parse_form<T: DeserializeOwned>(bytes: &Bytes) -> Result<T, FrameworkError> {
    serde_urlencoded::from_bytes(bytes)
        .map_err(|e| FrameworkError::bad_request(format!("Failed to parse form body: {}", e)))
}
