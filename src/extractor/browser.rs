//! Chromium-backed extraction driver
//!
//! Performs one extraction attempt end to end: launch an isolated headless
//! Chromium with a throwaway profile, watch its outgoing network requests
//! over CDP, open the embed watch page, click the player to start playback,
//! and wait (bounded) for one well-formed player API request to yield the
//! credential pair. All session resources are released on every exit path.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{EnableParams, EventRequestWillBeSent};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::oneshot;

use crate::config::ExtractorSettings;
use crate::error::{Error, Result};
use crate::extractor::driver::{
    ExtractedTokens, SessionDriver, await_extraction, parse_player_request,
};

/// Path fragment identifying the player API among the session's requests
const PLAYER_API_PATH: &str = "/youtubei/v1/player";

/// The embedded player element clicked to trigger playback
const PLAYER_SELECTOR: &str = "#movie_player";

/// How long to wait for the player element to appear
const PLAYER_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Polling step while waiting for the player element
const PLAYER_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Extraction driver backed by a real Chromium session
#[derive(Debug)]
pub struct BrowserDriver {
    settings: ExtractorSettings,
}

impl BrowserDriver {
    /// Create a driver with the given extractor settings
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }

    fn browser_config(&self, profile_dir: &Path) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile_dir)
            .args(vec!["--no-sandbox", "--disable-setuid-sandbox"]);

        if let Some(path) = &self.settings.browser_path {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(Error::browser)
    }

    /// Navigate, trigger playback, and wait for the completion signal.
    ///
    /// The oneshot receiver is owned by this attempt and raced against the
    /// capture timeout; whichever loses is simply dropped.
    async fn observe_playback(
        &self,
        page: &Page,
        extracted_rx: oneshot::Receiver<ExtractedTokens>,
    ) -> Result<ExtractedTokens> {
        page.goto(self.settings.watch_url.as_str())
            .await
            .map_err(|e| {
                Error::navigation(format!(
                    "failed to open {}: {e}",
                    self.settings.watch_url
                ))
            })?;

        self.click_player(page).await?;

        let tokens = await_extraction(extracted_rx, self.settings.capture_timeout()).await?;
        tracing::debug!("Extraction successful");
        Ok(tokens)
    }

    /// Wait for the player element and click it to start playback
    async fn click_player(&self, page: &Page) -> Result<()> {
        let deadline = tokio::time::Instant::now() + PLAYER_WAIT_TIMEOUT;
        loop {
            match page.find_element(PLAYER_SELECTOR).await {
                Ok(player) => {
                    player.click().await.map_err(|e| {
                        Error::navigation(format!("failed to click the video player: {e}"))
                    })?;
                    return Ok(());
                }
                Err(_) if tokio::time::Instant::now() < deadline => {
                    tokio::time::sleep(PLAYER_POLL_INTERVAL).await;
                }
                Err(e) => {
                    return Err(Error::navigation(format!(
                        "video player did not appear: {e}"
                    )));
                }
            }
        }
    }

    /// Open a page, wire up the request listener, and drive the session
    async fn drive_session(&self, browser: &Browser) -> Result<ExtractedTokens> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::browser(format!("failed to open a page: {e}")))?;

        page.execute(EnableParams::default())
            .await
            .map_err(|e| Error::browser(format!("failed to enable network events: {e}")))?;

        let mut requests = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|e| Error::browser(format!("failed to subscribe to requests: {e}")))?;

        let (extracted_tx, extracted_rx) = oneshot::channel();
        let listener = tokio::spawn(async move {
            let mut extracted_tx = Some(extracted_tx);
            while let Some(event) = requests.next().await {
                let request = &event.request;
                if request.method != "POST" || !request.url.contains(PLAYER_API_PATH) {
                    continue;
                }
                let Some(body) = request.post_data.as_deref() else {
                    continue;
                };
                match parse_player_request(body) {
                    Ok(tokens) => {
                        if let Some(tx) = extracted_tx.take() {
                            let _ = tx.send(tokens);
                        }
                        break;
                    }
                    // A later matching request may still parse cleanly
                    Err(e) => tracing::warn!("Failed to extract token: {e}"),
                }
            }
        });

        let outcome = self.observe_playback(&page, extracted_rx).await;
        listener.abort();
        outcome
    }
}

#[async_trait]
impl SessionDriver for BrowserDriver {
    async fn extract_once(&self) -> Result<ExtractedTokens> {
        // The profile lives exactly as long as this attempt
        let profile_dir = tempfile::Builder::new()
            .prefix("potoken-profile-")
            .tempdir()?;

        let config = self.browser_config(profile_dir.path())?;
        let (mut browser, handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::browser(format!("failed to launch browser: {e}")))?;

        // The CDP message pump must run for the whole session
        let handler_task = tokio::spawn(async move {
            let mut handler = handler;
            while let Some(message) = handler.next().await {
                if message.is_err() {
                    break;
                }
            }
        });

        let outcome = self.drive_session(&browser).await;

        // Release the session whatever happened above
        if let Err(e) = browser.close().await {
            tracing::debug!("Error closing browser session: {e}");
        }
        let _ = browser.wait().await;
        handler_task.abort();

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_config_with_executable_override() {
        // An explicit executable skips autodetection, so this builds even on
        // machines without a browser installed
        let settings = ExtractorSettings {
            browser_path: Some("/opt/chromium/chrome".into()),
            ..ExtractorSettings::default()
        };
        let driver = BrowserDriver::new(settings);
        let profile = tempfile::tempdir().unwrap();

        assert!(driver.browser_config(profile.path()).is_ok());
    }

    #[test]
    fn test_player_api_path_matching() {
        let url = "https://www.youtube.com/youtubei/v1/player?prettyPrint=false";
        assert!(url.contains(PLAYER_API_PATH));

        let other = "https://www.youtube.com/youtubei/v1/log_event?alt=json";
        assert!(!other.contains(PLAYER_API_PATH));
    }
}
