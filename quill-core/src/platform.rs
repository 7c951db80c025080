use serde::{Deserialize, Serialize};
use std::fmt;

/// X/Twitter reply length ceiling.
pub const X_CHAR_LIMIT: usize = 280;

/// Supported target platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Instagram,
    X,
}

impl Platform {
    /// Wire/prompt identifier for the platform.
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::X => "x",
        }
    }

    /// Hard character limit for posted replies, where the platform has one.
    pub fn char_limit(self) -> Option<usize> {
        match self {
            Platform::Instagram => None,
            Platform::X => Some(X_CHAR_LIMIT),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a tab URL into a supported platform.
///
/// Only concrete post pages qualify: an Instagram post/reel permalink, or an
/// X/Twitter status permalink. Feeds, profiles and everything else return
/// `None` and the caller reports the page as unsupported.
pub fn classify_url(url: &str) -> Option<Platform> {
    if url.contains("instagram.com") {
        if url.contains("/p/") || url.contains("/reel/") {
            return Some(Platform::Instagram);
        }
        return None;
    }

    if url.contains("x.com") || url.contains("twitter.com") {
        if url.contains("/status/") {
            return Some(Platform::X);
        }
        return None;
    }

    None
}
