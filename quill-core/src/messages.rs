//! Typed request/response channel between the controller and the in-page
//! injector. Requests are dispatched on the `action` tag; tags outside the
//! enumerated set are a hard error on both ends, never silently ignored.

use crate::platform::Platform;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageRequest {
    /// Liveness probe; the page answers `ready`.
    Ping,
    /// Write generated text into the platform's reply input.
    InjectComment { comment: String, platform: Platform },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageResponse {
    pub fn ready() -> Self {
        Self {
            status: "ready".to_string(),
            error: None,
        }
    }

    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
