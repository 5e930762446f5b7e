//! Captured token record
//!
//! Defines the immutable value published to API consumers: the POT token,
//! the visitor data it was captured with, and the capture timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tokens shorter than this are almost certainly malformed captures; real
/// POT tokens observed from the player run well past this length.
pub const MIN_PLAUSIBLE_TOKEN_LENGTH: usize = 160;

/// One successfully captured credential pair.
///
/// Records are immutable: a newer capture replaces the stored record, it
/// never mutates one in place. Field order matches the wire format consumed
/// by downstream clients (`updated`, `potoken`, `visitorData`), with
/// `updated` serialized as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Capture timestamp
    #[serde(rename = "updated", with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,

    /// The opaque proof-of-origin token
    #[serde(rename = "potoken")]
    pub po_token: String,

    /// The visitor/session identifier paired with the token
    #[serde(rename = "visitorData")]
    pub visitor_data: String,
}

impl TokenRecord {
    /// Create a record stamped with the current time.
    ///
    /// Callers must only construct records from fields that passed
    /// extraction validation; both strings are expected to be non-empty.
    pub fn new(po_token: impl Into<String>, visitor_data: impl Into<String>) -> Self {
        Self::with_timestamp(Utc::now(), po_token, visitor_data)
    }

    /// Create a record with an explicit capture timestamp
    pub fn with_timestamp(
        updated_at: DateTime<Utc>,
        po_token: impl Into<String>,
        visitor_data: impl Into<String>,
    ) -> Self {
        Self {
            updated_at,
            po_token: po_token.into(),
            visitor_data: visitor_data.into(),
        }
    }

    /// Whether the token is long enough to be trusted.
    ///
    /// An unusually short token is a strong signal of a malformed capture;
    /// callers decide whether that is a warning (server mode) or a hard
    /// failure (one-shot mode).
    pub fn is_plausible(&self) -> bool {
        self.po_token.len() >= MIN_PLAUSIBLE_TOKEN_LENGTH
    }

    /// Canonical JSON serialization, used for both HTTP responses and
    /// one-shot output
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
