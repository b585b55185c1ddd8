//! The [`BrowserDriver`] trait: the seam between the resolver/runner and a
//! concrete browser backend.
//!
//! Trait boundary: downstream crates (`browserlet-resolver`,
//! `browserlet-executor`) consume `dyn BrowserDriver` only. A [`Candidate`]
//! crossing this boundary never carries a live DOM handle; actions instead
//! take the opaque `element_ref` a [`ResolvedElement`] was scanned with.

use std::{path::Path, time::Duration};

use browserlet_protocol::Candidate;

use crate::error::Result;

/// A candidate paired with the opaque reference the driver needs to act on
/// the element it was scanned from.
#[derive(Debug, Clone)]
pub struct ResolvedElement {
    /// Opaque, driver-assigned reference (stamped `data-browserlet-ref`).
    pub element_ref: String,
    /// The DOM-reference-free descriptor the resolver scores against hints.
    pub candidate: Candidate,
}

/// Drives one browser tab: navigation, candidate scanning, and the element
/// actions the executor crate performs once the resolver has committed to a
/// target.
pub trait BrowserDriver: Send + Sync {
    /// Navigate the active tab to `url` and wait for the load event.
    fn navigate(&self, url: &str) -> Result<()>;

    /// The active tab's current URL, used in [`browserlet_protocol::FailureDiagnostic`].
    fn current_url(&self) -> Result<String>;

    /// Scan the page for every element the cascade resolver's broad-scan
    /// stage should consider.
    fn scan_candidates(&self) -> Result<Vec<ResolvedElement>>;

    /// Resolve a raw CSS selector directly, for the stage-5 fallback path.
    fn resolve_selector(&self, selector: &str) -> Result<Option<ResolvedElement>>;

    /// Dispatch a click on the referenced element.
    fn click(&self, element_ref: &str) -> Result<()>;

    /// Focus, clear, and type `text` into the referenced element.
    fn type_text(&self, element_ref: &str, text: &str) -> Result<()>;

    /// Choose the option whose value or visible text matches `value` in a
    /// referenced `<select>`.
    fn select_option(&self, element_ref: &str, value: &str) -> Result<()>;

    /// Dispatch a hover (mouse-move) event over the referenced element.
    fn hover(&self, element_ref: &str) -> Result<()>;

    /// Scroll the referenced element into the viewport.
    fn scroll_into_view(&self, element_ref: &str) -> Result<()>;

    /// Poll until the referenced element is visible or `timeout` elapses,
    /// returning whether it became visible in time.
    fn wait_visible(&self, element_ref: &str, timeout: Duration) -> Result<bool>;

    /// Poll until the referenced element is absent or hidden (zero layout
    /// box, or removed from the document) or `timeout` elapses.
    fn wait_hidden(&self, element_ref: &str, timeout: Duration) -> Result<bool>;

    /// Read the visible text of the referenced element.
    fn extract_text(&self, element_ref: &str) -> Result<String>;

    /// Parse a `<table>` rooted at the referenced element into rows of cell
    /// text.
    fn extract_table(&self, element_ref: &str) -> Result<Vec<Vec<String>>>;

    /// Save a screenshot of the current viewport to `path`.
    fn screenshot(&self, path: &Path) -> Result<()>;
}
