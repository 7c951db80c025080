use thiserror::Error;

use crate::relay::RelayError;

/// Everything that can end a generate cycle. All variants are terminal for
/// the cycle and surface as short status text; none are retried.
#[derive(Error, Debug)]
pub enum QuillError {
    #[error("OpenAI API key not configured — run `quill settings set-key` first")]
    MissingCredential,

    #[error("Unsupported page: {url} — navigate to an Instagram post/reel or an X tweet first")]
    UnsupportedPage { url: String },

    #[error("Page injector did not respond — reload the page and try again")]
    InjectorNotReady,

    #[error("Failed to capture screenshot: {0}")]
    Capture(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("Could not find comment input field")]
    InjectionTargetNotFound,

    #[error("Comment generated but injection failed: {0}")]
    Injection(String),
}
