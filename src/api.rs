//! Wire-format construction for the bulk-add backend call.
//!
//! The backend takes `application/x-www-form-urlencoded` POST bodies with an
//! `action` discriminator and the rows as a JSON array. Only payload
//! construction and response decoding live here; transport is the caller's
//! concern.

use serde::Deserialize;

use crate::bulk::CanonicalRow;
use crate::error::{ImportError, Result};

const BULK_ADD_ACTION: &str = "bulkAdd";

/// Build the form body for a bulk-add request.
pub fn bulk_add_form_body(rows: &[CanonicalRow]) -> Result<String> {
    let payload = serde_json::to_string(rows).map_err(ImportError::PayloadSerialization)?;
    Ok(format!(
        "action={BULK_ADD_ACTION}&rows={}",
        urlencoding::encode(&payload)
    ))
}

/// Append the access token to a base endpoint URL.
pub fn bulk_add_url(api_base: &str, token: &str) -> String {
    if token.is_empty() {
        return api_base.to_string();
    }
    let separator = if api_base.contains('?') { '&' } else { '?' };
    format!(
        "{api_base}{separator}token={}",
        urlencoding::encode(token)
    )
}

/// Response envelope from the backend. Extra fields are ignored.
#[derive(Debug, Deserialize)]
pub struct BulkAddResponse {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub inserted: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BulkAddResponse {
    /// Surface a backend-reported error as the failure it is.
    pub fn into_result(self) -> std::result::Result<Self, String> {
        match self.error {
            Some(error) if !error.is_empty() => Err(error),
            _ => Ok(self),
        }
    }
}
