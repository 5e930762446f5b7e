//! Extraction driver seam and player request parsing
//!
//! The [`SessionDriver`] trait is the boundary between the coordinator and
//! the browser machinery; [`parse_player_request`] is the pure part of an
//! attempt, shared with tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// The credential pair pulled out of one player API request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTokens {
    /// The opaque proof-of-origin token
    pub po_token: String,
    /// The visitor/session identifier sent alongside it
    pub visitor_data: String,
}

/// One extraction attempt, however it is implemented.
///
/// Implementations must release every resource they acquire (browser
/// session, temporary profile) on all exit paths, and bound their own wait
/// for the target request.
#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// Perform one attempt, resolving with the extracted fields or the
    /// failure that ended it
    async fn extract_once(&self) -> Result<ExtractedTokens>;
}

/// Body of a player API request, reduced to the two fields of interest.
/// Everything else in the payload is irrelevant and left unmodeled.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerRequestBody {
    #[serde(default)]
    context: Option<RequestContext>,
    #[serde(default)]
    service_integrity_dimensions: Option<IntegrityDimensions>,
}

#[derive(Debug, Deserialize)]
struct RequestContext {
    #[serde(default)]
    client: Option<ClientInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClientInfo {
    #[serde(default)]
    visitor_data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntegrityDimensions {
    #[serde(default)]
    po_token: Option<String>,
}

/// Pull the credential pair out of a player API request body.
///
/// Success requires both `serviceIntegrityDimensions.poToken` and
/// `context.client.visitorData` to be present and non-empty; anything less
/// is a parse failure and the attempt keeps watching later requests.
pub(crate) fn parse_player_request(body: &str) -> Result<ExtractedTokens> {
    let parsed: PlayerRequestBody = serde_json::from_str(body)
        .map_err(|e| Error::token_parse(format!("malformed player request body: {e}")))?;

    let po_token = parsed
        .service_integrity_dimensions
        .and_then(|dimensions| dimensions.po_token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::token_parse("request carries no poToken"))?;

    let visitor_data = parsed
        .context
        .and_then(|context| context.client)
        .and_then(|client| client.visitor_data)
        .filter(|data| !data.is_empty())
        .ok_or_else(|| Error::token_parse("request carries no visitorData"))?;

    Ok(ExtractedTokens {
        po_token,
        visitor_data,
    })
}

/// Bounded wait for the completion signal of one attempt.
///
/// Races the attempt-owned oneshot receiver against the timer; whichever
/// loses is dropped without further effect. A dropped sender means the
/// request listener died, which is a session fault rather than a timeout.
pub(crate) async fn await_extraction(
    extracted_rx: oneshot::Receiver<ExtractedTokens>,
    timeout: Duration,
) -> Result<ExtractedTokens> {
    match tokio::time::timeout(timeout, extracted_rx).await {
        Ok(Ok(tokens)) => Ok(tokens),
        Ok(Err(_)) => Err(Error::browser(
            "request listener ended before a token was captured",
        )),
        Err(_) => Err(Error::extraction_timeout(timeout.as_secs())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn player_body(po_token: &str, visitor_data: &str) -> String {
        format!(
            r#"{{
                "context": {{
                    "client": {{
                        "clientName": "WEB_EMBEDDED_PLAYER",
                        "visitorData": "{visitor_data}"
                    }}
                }},
                "videoId": "jNQXAC9IVRw",
                "serviceIntegrityDimensions": {{
                    "poToken": "{po_token}"
                }}
            }}"#
        )
    }

    #[test]
    fn test_parse_full_request() {
        let body = player_body("MnQLtoken", "CgtXvisitor");
        let tokens = parse_player_request(&body).unwrap();
        assert_eq!(
            tokens,
            ExtractedTokens {
                po_token: "MnQLtoken".to_string(),
                visitor_data: "CgtXvisitor".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_integrity_dimensions() {
        let body = r#"{"context":{"client":{"visitorData":"CgtX"}},"videoId":"x"}"#;
        let err = parse_player_request(body).unwrap_err();
        assert!(err.to_string().contains("no poToken"));
    }

    #[test]
    fn test_missing_visitor_data() {
        let body = r#"{"context":{"client":{}},"serviceIntegrityDimensions":{"poToken":"MnQL"}}"#;
        let err = parse_player_request(body).unwrap_err();
        assert!(err.to_string().contains("no visitorData"));
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        let body = player_body("", "CgtXvisitor");
        assert!(parse_player_request(&body).is_err());

        let body = player_body("MnQLtoken", "");
        assert!(parse_player_request(&body).is_err());
    }

    #[test]
    fn test_malformed_body() {
        let err = parse_player_request("{not json").unwrap_err();
        assert!(matches!(err, Error::TokenParse { .. }));
        assert!(err.to_string().contains("malformed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_extraction_signal_wins() {
        let (tx, rx) = oneshot::channel();
        tx.send(ExtractedTokens {
            po_token: "MnQL".to_string(),
            visitor_data: "CgtX".to_string(),
        })
        .unwrap();

        let tokens = await_extraction(rx, Duration::from_secs(30)).await.unwrap();
        assert_eq!(tokens.po_token, "MnQL");
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_extraction_times_out_at_the_bound() {
        let (tx, rx) = oneshot::channel::<ExtractedTokens>();

        let started = tokio::time::Instant::now();
        let err = await_extraction(rx, Duration::from_secs(30)).await.unwrap_err();

        // Resolves as failed once the bound elapses, not before and not later
        assert_eq!(started.elapsed(), Duration::from_secs(30));
        assert!(matches!(err, Error::ExtractionTimeout { seconds: 30 }));
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_extraction_detects_dead_listener() {
        let (tx, rx) = oneshot::channel::<ExtractedTokens>();
        drop(tx);

        let err = await_extraction(rx, Duration::from_secs(30)).await.unwrap_err();
        assert!(matches!(err, Error::Browser { .. }));
    }

    #[test]
    fn test_unrelated_fields_are_ignored() {
        let body = r#"{
            "context": {"client": {"visitorData": "CgtX", "hl": "en"}},
            "playbackContext": {"contentPlaybackContext": {"html5Preference": "HTML5_PREF_WANTS"}},
            "serviceIntegrityDimensions": {"poToken": "MnQL"}
        }"#;
        let tokens = parse_player_request(body).unwrap();
        assert_eq!(tokens.po_token, "MnQL");
        assert_eq!(tokens.visitor_data, "CgtX");
    }
}
