//! Builder for the page-side injector script.
//!
//! The script is evaluated in the page context over the DevTools protocol. It
//! receives one serialized [`PageRequest`], dispatches on the `action` tag,
//! and completes with a JSON-encoded [`PageResponse`]. Unrecognized tags get
//! an explicit error response.
//!
//! [`PageRequest`]: crate::messages::PageRequest
//! [`PageResponse`]: crate::messages::PageResponse

use crate::messages::PageRequest;
use crate::platform::Platform;

/// Instagram comment-input selectors, tried in order.
pub const INSTAGRAM_SELECTORS: &[&str] = &[
    "textarea[placeholder*=\"comment\"]",
    "textarea[aria-label*=\"comment\"]",
    "textarea[aria-label*=\"Add a comment\"]",
    "div[contenteditable=\"true\"][data-testid=\"comment-input\"]",
    "textarea[placeholder*=\"Add a comment\"]",
    "div[role=\"textbox\"][aria-label*=\"comment\"]",
];

/// X/Twitter reply-input selectors, tried in order.
pub const X_SELECTORS: &[&str] = &[
    "div[data-testid=\"tweetTextarea_0\"]",
    "div[data-testid*=\"tweetTextarea\"]",
    "div[contenteditable=\"true\"][data-testid=\"tweetTextarea_0\"]",
    "div[contenteditable=\"true\"][role=\"textbox\"][aria-label*=\"Post\"]",
    "div[contenteditable=\"true\"][role=\"textbox\"][aria-label*=\"Reply\"]",
    "[aria-label*=\"Post your reply\"]",
    "[aria-label*=\"Add another Tweet\"]",
    "div[contenteditable=\"true\"][role=\"textbox\"]",
];

/// How long the machine-generated highlight stays on the target element.
pub const HIGHLIGHT_MS: u32 = 3000;

/// How long the on-screen notification stays before auto-dismissing.
pub const NOTIFICATION_MS: u32 = 4000;

/// Error text the page reports when no selector resolves to a visible input.
pub const TARGET_NOT_FOUND: &str = "Could not find comment input field";

pub fn selectors_for(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Instagram => INSTAGRAM_SELECTORS,
        Platform::X => X_SELECTORS,
    }
}

// The dispatcher evaluated in the page. Placeholders are substituted by
// `build_page_script`; the request JSON is embedded as a JS object literal.
const PAGE_SCRIPT_TEMPLATE: &str = r#"(() => {
  const request = __REQUEST__;
  const platformSelectors = {
    instagram: __INSTAGRAM_SELECTORS__,
    x: __X_SELECTORS__,
  };
  const allowFallback = __ALLOW_FALLBACK__;

  const firstVisible = (selectors) => {
    for (const selector of selectors) {
      const element = document.querySelector(selector);
      // offsetParent is null for elements the layout engine dropped
      if (element && element.offsetParent !== null) {
        return element;
      }
    }
    return null;
  };

  const locateInput = (platform) => {
    const found = firstVisible(platformSelectors[platform] || []);
    if (found || !allowFallback) {
      return found;
    }
    for (const [name, selectors] of Object.entries(platformSelectors)) {
      if (name === platform) continue;
      const fallback = firstVisible(selectors);
      if (fallback) {
        return fallback;
      }
    }
    return null;
  };

  const writeText = (element, text) => {
    const tag = element.tagName.toLowerCase();
    if (tag === 'textarea' || tag === 'input') {
      element.value = text;
      element.dispatchEvent(new Event('input', { bubbles: true }));
      element.dispatchEvent(new Event('change', { bubbles: true }));
      return;
    }

    // Rich contenteditable editors: select-all so insertText replaces the
    // current contents (keeps React-controlled editors in sync).
    element.focus();
    const selection = window.getSelection();
    const range = document.createRange();
    range.selectNodeContents(element);
    selection.removeAllRanges();
    selection.addRange(range);

    const inserted = document.execCommand('insertText', false, text);
    if (!inserted) {
      element.textContent = text;
    }
    element.dispatchEvent(new InputEvent('input', { bubbles: true, data: text }));
    element.dispatchEvent(new Event('change', { bubbles: true }));
  };

  const highlight = (element) => {
    const border = element.style.border;
    const background = element.style.backgroundColor;
    element.style.border = '2px solid #4CAF50';
    element.style.backgroundColor = '#f0f8f0';
    setTimeout(() => {
      element.style.border = border;
      element.style.backgroundColor = background;
    }, __HIGHLIGHT_MS__);
  };

  const notify = (message, isError) => {
    const existing = document.getElementById('quill-notification');
    if (existing) {
      existing.remove();
    }
    const node = document.createElement('div');
    node.id = 'quill-notification';
    node.textContent = message;
    node.style.cssText = 'position:fixed;top:20px;right:20px;z-index:10000;'
      + 'padding:15px 20px;border-radius:8px;color:#fff;font-size:14px;font-weight:500;'
      + 'box-shadow:0 4px 12px rgba(0,0,0,0.3);cursor:pointer;'
      + 'background:' + (isError ? '#dc3545' : '#28a745') + ';';
    node.addEventListener('click', () => node.remove());
    document.body.appendChild(node);
    setTimeout(() => node.remove(), __NOTIFICATION_MS__);
  };

  const handle = () => {
    switch (request.action) {
      case 'ping':
        return { status: 'ready' };
      case 'injectComment': {
        const element = locateInput(request.platform);
        if (!element) {
          notify('__TARGET_NOT_FOUND__', true);
          return { status: 'error', error: '__TARGET_NOT_FOUND__' };
        }
        writeText(element, request.comment);
        element.focus();
        highlight(element);
        notify('Comment generated and inserted', false);
        return { status: 'success' };
      }
      default:
        return { status: 'error', error: 'unrecognized action: ' + request.action };
    }
  };

  return JSON.stringify(handle());
})()"#;

/// Render the dispatcher script for one request.
pub fn build_page_script(
    request: &PageRequest,
    fallback_across_platforms: bool,
) -> Result<String, serde_json::Error> {
    let request_json = serde_json::to_string(request)?;
    let instagram_json = serde_json::to_string(INSTAGRAM_SELECTORS)?;
    let x_json = serde_json::to_string(X_SELECTORS)?;

    Ok(PAGE_SCRIPT_TEMPLATE
        .replace("__REQUEST__", &request_json)
        .replace("__INSTAGRAM_SELECTORS__", &instagram_json)
        .replace("__X_SELECTORS__", &x_json)
        .replace(
            "__ALLOW_FALLBACK__",
            if fallback_across_platforms { "true" } else { "false" },
        )
        .replace("__HIGHLIGHT_MS__", &HIGHLIGHT_MS.to_string())
        .replace("__NOTIFICATION_MS__", &NOTIFICATION_MS.to_string())
        .replace("__TARGET_NOT_FOUND__", TARGET_NOT_FOUND))
}
