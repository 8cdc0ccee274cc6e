//! Renderer warnings with colored terminal output.
//!
//! Layout recovers locally from malformed style values: the offending
//! property is dropped and the previous value is kept. Each such recovery
//! is reported here once per unique message so a page with hundreds of
//! identical bad declarations does not flood stderr.

use std::sync::{Mutex, PoisonError};

/// ANSI color codes for terminal output
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Every distinct warning recorded since the last [`clear_warnings`],
/// in first-seen order.
static WARNED: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Warn about a recovered problem (prints once per unique message).
///
/// # Example
/// ```ignore
/// warn_once("Style", "ignoring unparseable font-size '12em'");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let mut warned = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if warned.contains(&key) {
        return;
    }

    eprintln!("{YELLOW}[Lumen {component}] ⚠ {message}{RESET}");
    warned.push(key);
}

/// Clear all recorded warnings (call at the start of a render pass).
pub fn clear_warnings() {
    WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

/// Snapshot of the warnings recorded so far, formatted as
/// `"[component] message"`.
#[must_use]
pub fn recorded_warnings() -> Vec<String> {
    WARNED.lock().unwrap_or_else(PoisonError::into_inner).clone()
}
