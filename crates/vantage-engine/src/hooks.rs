//! UI capability hooks
//!
//! The engine makes no rendering decisions. After any state mutation it
//! calls into this injected capability interface; the embedding UI
//! decides what a render or a URL write means.

/// Caller-supplied capabilities, injected at session construction
pub trait UiHooks: Send + Sync {
    /// The comparison table should be re-rendered
    fn render_table(&self) {}

    /// The restorable URL for the current state changed
    fn url_changed(&self, url: &str) {
        let _ = url;
    }
}

/// Hooks that do nothing; the default for headless use and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl UiHooks for NoopHooks {}
