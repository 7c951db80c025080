//! CDP-backed page session.
//!
//! Quill attaches to an already-running Chrome started with
//! `--remote-debugging-port`. The session owns one page and exposes the three
//! page-facing capabilities the controller needs: the tab URL, a screenshot
//! of the visible viewport, and the typed injector message channel.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::time::Duration;

use quill_core::config::{BrowserSection, InjectorSection};
use quill_core::inject::{build_page_script, TARGET_NOT_FOUND};
use quill_core::{classify_url, PageRequest, PageResponse, Platform, QuillError};

/// What the controller needs from the page. One implementation drives a real
/// browser; tests substitute a scripted double.
#[async_trait]
pub trait PageChannel: Send + Sync {
    /// URL of the attached tab.
    async fn current_url(&self) -> Result<String, QuillError>;

    /// Liveness probe. Swallows transport errors: an unreachable page is
    /// simply "not ready".
    async fn probe(&self) -> bool;

    /// PNG data URL of the visible tab.
    async fn capture(&self) -> Result<String, QuillError>;

    /// Write the generated comment into the platform's reply input.
    async fn inject(&self, comment: &str, platform: Platform) -> Result<(), QuillError>;
}

pub struct CdpSession {
    // Kept alive for the lifetime of the session; dropping it would close
    // the CDP connection under the page handle.
    _browser: Browser,
    page: Page,
    probe_timeout: Duration,
    fallback_across_platforms: bool,
}

impl CdpSession {
    /// Discover the DevTools websocket, connect, and attach to the first tab
    /// showing a supported post page (falling back to the first tab so the
    /// controller can report what it actually saw).
    pub async fn connect(
        browser_cfg: &BrowserSection,
        injector_cfg: &InjectorSection,
    ) -> Result<Self, QuillError> {
        let version_url = format!(
            "http://{}:{}/json/version",
            browser_cfg.debugger_host, browser_cfg.debugger_port
        );

        let version: serde_json::Value = reqwest::get(&version_url)
            .await
            .map_err(|e| {
                QuillError::Browser(format!(
                    "cannot reach Chrome DevTools at {version_url}: {e} — start Chrome with --remote-debugging-port={}",
                    browser_cfg.debugger_port
                ))
            })?
            .json()
            .await
            .map_err(|e| QuillError::Browser(format!("malformed DevTools version payload: {e}")))?;

        let ws_url = version
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                QuillError::Browser(
                    "DevTools endpoint did not report a webSocketDebuggerUrl".to_string(),
                )
            })?;

        let (browser, mut handler) = Browser::connect(ws_url)
            .await
            .map_err(|e| QuillError::Browser(format!("CDP connect failed: {e}")))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::debug!(error = %err, "CDP handler closed");
                    break;
                }
            }
        });

        let pages = browser
            .pages()
            .await
            .map_err(|e| QuillError::Browser(format!("failed to list browser pages: {e}")))?;

        if pages.is_empty() {
            return Err(QuillError::Browser(
                "the browser has no open pages".to_string(),
            ));
        }

        let mut selected: Option<Page> = None;
        for page in &pages {
            if let Ok(Some(url)) = page.url().await {
                if classify_url(&url).is_some() {
                    tracing::debug!(%url, "attaching to supported post page");
                    selected = Some(page.clone());
                    break;
                }
            }
        }
        let page = selected.unwrap_or_else(|| pages[0].clone());
        let _ = page.activate().await;

        Ok(Self {
            _browser: browser,
            page,
            probe_timeout: Duration::from_millis(browser_cfg.probe_timeout_ms),
            fallback_across_platforms: injector_cfg.fallback_across_platforms,
        })
    }

    /// Evaluate one dispatcher round trip in the page context.
    async fn send(&self, request: &PageRequest) -> Result<PageResponse, QuillError> {
        let script = build_page_script(request, self.fallback_across_platforms)
            .map_err(|e| QuillError::Browser(format!("failed to render page script: {e}")))?;

        let evaluated = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| QuillError::Browser(format!("page evaluation failed: {e}")))?;

        let raw: String = evaluated
            .into_value()
            .map_err(|e| QuillError::Browser(format!("page returned a non-string response: {e}")))?;

        serde_json::from_str(&raw)
            .map_err(|e| QuillError::Browser(format!("malformed page response: {e}")))
    }
}

#[async_trait]
impl PageChannel for CdpSession {
    async fn current_url(&self) -> Result<String, QuillError> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| QuillError::Browser(format!("failed to read page URL: {e}")))?;
        url.ok_or_else(|| QuillError::Browser("page reported no URL".to_string()))
    }

    async fn probe(&self) -> bool {
        match tokio::time::timeout(self.probe_timeout, self.send(&PageRequest::Ping)).await {
            Ok(Ok(response)) => response.is_ready(),
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "probe failed");
                false
            }
            Err(_) => {
                tracing::debug!("probe timed out");
                false
            }
        }
    }

    async fn capture(&self) -> Result<String, QuillError> {
        let png = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
            )
            .await
            .map_err(|e| QuillError::Capture(e.to_string()))?;

        Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
    }

    async fn inject(&self, comment: &str, platform: Platform) -> Result<(), QuillError> {
        let response = self
            .send(&PageRequest::InjectComment {
                comment: comment.to_string(),
                platform,
            })
            .await?;

        if response.is_success() {
            return Ok(());
        }

        match response.error.as_deref() {
            Some(TARGET_NOT_FOUND) => Err(QuillError::InjectionTargetNotFound),
            Some(other) => Err(QuillError::Injection(other.to_string())),
            None => Err(QuillError::Injection(format!(
                "page answered with status {:?}",
                response.status
            ))),
        }
    }
}
