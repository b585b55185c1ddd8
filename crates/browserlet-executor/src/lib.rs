//! The action executor: one function per [`ActionKind`], run against
//! whatever the cascade resolver already decided is "the" element.
//!
//! # Stable API Surface
//! - [`execute`] / [`ExecutionContext`] / [`ActionOutcome`]: the entry point
//!   the runner calls once per step.
#![warn(missing_docs)]

mod error;
mod screenshot;
mod table;
mod transform;

use std::{path::Path, time::Duration};

use browserlet_dom::{BrowserDriver, ResolvedElement};
use browserlet_protocol::{ActionKind, Output};
use tracing::debug;

pub use error::{Error, Result};
pub use table::Record;

/// Everything an action needs beyond the step itself: where to drive the
/// browser and where on disk output artifacts land.
pub struct ExecutionContext<'a> {
    /// The browser driver actions are performed against.
    pub driver: &'a dyn BrowserDriver,
    /// Directory screenshots are written under when a step doesn't name an
    /// explicit path.
    pub output_dir: &'a Path,
    /// The running script's name, used in synthesized screenshot filenames.
    pub script_name: &'a str,
}

/// What an action produced, beyond success/failure.
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// The action produced no value to store.
    None,
    /// `extract`'s post-transform text.
    Extracted(String),
    /// `table_extract`'s rows-of-records.
    ExtractedTable(Vec<Record>),
    /// `screenshot`'s destination path.
    Screenshot(std::path::PathBuf),
}

/// Run `action` against `element` (absent for `navigate` and a bare
/// `screenshot`), observing `timeout`.
#[allow(clippy::too_many_arguments)]
pub fn execute(
    ctx: &ExecutionContext<'_>,
    action: ActionKind,
    element: Option<&ResolvedElement>,
    value: Option<&str>,
    output: Option<&Output>,
    timeout: Duration,
    step_id: &str,
) -> Result<ActionOutcome> {
    debug!(%step_id, ?action, "executing action");
    match action {
        ActionKind::Navigate => {
            let url = value.unwrap_or_default();
            ctx.driver.navigate(url)?;
            Ok(ActionOutcome::None)
        }
        ActionKind::Click => {
            let element = require_element(element)?;
            ctx.driver.scroll_into_view(&element.element_ref)?;
            ctx.driver.click(&element.element_ref)?;
            Ok(ActionOutcome::None)
        }
        ActionKind::Type => {
            let element = require_element(element)?;
            ctx.driver.type_text(&element.element_ref, value.unwrap_or_default())?;
            Ok(ActionOutcome::None)
        }
        ActionKind::Select => {
            let element = require_element(element)?;
            let wanted = value.unwrap_or_default();
            ctx.driver
                .select_option(&element.element_ref, wanted)
                .map_err(|e| match e {
                    browserlet_dom::Error::Action { .. } => Error::OptionNotFound,
                    other => Error::Driver(other),
                })?;
            Ok(ActionOutcome::None)
        }
        ActionKind::WaitFor => {
            let element = require_element(element)?;
            let state = value.unwrap_or("visible");
            let reached = match state {
                "present" => true,
                "hidden" => ctx.driver.wait_hidden(&element.element_ref, timeout)?,
                _ => ctx.driver.wait_visible(&element.element_ref, timeout)?,
            };
            if !reached {
                return Err(Error::Timeout {
                    element_ref: element.element_ref.clone(),
                    state: match state {
                        "hidden" => "hidden",
                        "present" => "present",
                        _ => "visible",
                    },
                    elapsed_ms: timeout.as_millis(),
                });
            }
            Ok(ActionOutcome::None)
        }
        ActionKind::Hover => {
            let element = require_element(element)?;
            ctx.driver.hover(&element.element_ref)?;
            Ok(ActionOutcome::None)
        }
        ActionKind::Scroll => {
            let element = require_element(element)?;
            ctx.driver.scroll_into_view(&element.element_ref)?;
            Ok(ActionOutcome::None)
        }
        ActionKind::Extract => {
            let element = require_element(element)?;
            let text = ctx.driver.extract_text(&element.element_ref)?;
            let transformed = match output.and_then(|o| o.transform) {
                Some(t) => transform::apply(t, &text)?,
                None => text,
            };
            Ok(ActionOutcome::Extracted(transformed))
        }
        ActionKind::TableExtract => {
            let element = require_element(element)?;
            let rows = ctx.driver.extract_table(&element.element_ref)?;
            Ok(ActionOutcome::ExtractedTable(table::rows_to_records(&rows)))
        }
        ActionKind::Screenshot => {
            let path = screenshot::resolve_path(value, ctx.output_dir, ctx.script_name, step_id);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| Error::ScreenshotIo {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            }
            ctx.driver.screenshot(&path)?;
            Ok(ActionOutcome::Screenshot(path))
        }
    }
}

/// `Click`/`Type`/`Select`/`WaitFor`/`Hover`/`Scroll`/`Extract`/`TableExtract`
/// all require a resolved element; only `Navigate` and a bare `Screenshot`
/// do not.
fn require_element<'a>(element: Option<&'a ResolvedElement>) -> Result<&'a ResolvedElement> {
    element.ok_or_else(|| {
        Error::Driver(browserlet_dom::Error::Action {
            action: "require_target",
            message: "action requires a resolved element but none was provided".to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, path::Path};

    use browserlet_protocol::{Candidate, TransformName};
    use tempfile::tempdir;

    use super::*;

    #[derive(Default)]
    struct RecordingDriver {
        typed: RefCell<Vec<(String, String)>>,
        clicked: RefCell<Vec<String>>,
    }

    impl BrowserDriver for RecordingDriver {
        fn navigate(&self, _url: &str) -> browserlet_dom::Result<()> {
            Ok(())
        }
        fn current_url(&self) -> browserlet_dom::Result<String> {
            Ok("https://example.com".into())
        }
        fn scan_candidates(&self) -> browserlet_dom::Result<Vec<ResolvedElement>> {
            Ok(Vec::new())
        }
        fn resolve_selector(&self, _selector: &str) -> browserlet_dom::Result<Option<ResolvedElement>> {
            Ok(None)
        }
        fn click(&self, element_ref: &str) -> browserlet_dom::Result<()> {
            self.clicked.borrow_mut().push(element_ref.to_string());
            Ok(())
        }
        fn type_text(&self, element_ref: &str, text: &str) -> browserlet_dom::Result<()> {
            self.typed.borrow_mut().push((element_ref.to_string(), text.to_string()));
            Ok(())
        }
        fn select_option(&self, _element_ref: &str, _value: &str) -> browserlet_dom::Result<()> {
            Ok(())
        }
        fn hover(&self, _element_ref: &str) -> browserlet_dom::Result<()> {
            Ok(())
        }
        fn scroll_into_view(&self, _element_ref: &str) -> browserlet_dom::Result<()> {
            Ok(())
        }
        fn wait_visible(&self, _element_ref: &str, _timeout: Duration) -> browserlet_dom::Result<bool> {
            Ok(true)
        }
        fn wait_hidden(&self, _element_ref: &str, _timeout: Duration) -> browserlet_dom::Result<bool> {
            Ok(false)
        }
        fn extract_text(&self, _element_ref: &str) -> browserlet_dom::Result<String> {
            Ok("  $9.99 available  ".to_string())
        }
        fn extract_table(&self, _element_ref: &str) -> browserlet_dom::Result<Vec<Vec<String>>> {
            Ok(vec![
                vec!["name".into(), "qty".into()],
                vec!["Widget".into(), "3".into()],
            ])
        }
        fn screenshot(&self, path: &Path) -> browserlet_dom::Result<()> {
            std::fs::write(path, b"PNG").map_err(|e| browserlet_dom::Error::Screenshot(e.to_string()))
        }
    }

    fn dummy_element() -> ResolvedElement {
        ResolvedElement {
            element_ref: "bl-1".into(),
            candidate: Candidate::default(),
        }
    }

    #[test]
    fn click_scrolls_into_view_then_clicks() {
        let driver = RecordingDriver::default();
        let ctx = ExecutionContext {
            driver: &driver,
            output_dir: Path::new("/tmp"),
            script_name: "s",
        };
        let element = dummy_element();
        execute(&ctx, ActionKind::Click, Some(&element), None, None, Duration::from_secs(1), "step-1").unwrap();
        assert_eq!(driver.clicked.borrow().as_slice(), ["bl-1"]);
    }

    #[test]
    fn navigate_requires_no_element() {
        let driver = RecordingDriver::default();
        let ctx = ExecutionContext {
            driver: &driver,
            output_dir: Path::new("/tmp"),
            script_name: "s",
        };
        let outcome = execute(
            &ctx,
            ActionKind::Navigate,
            None,
            Some("https://example.com"),
            None,
            Duration::from_secs(1),
            "step-1",
        )
        .unwrap();
        assert!(matches!(outcome, ActionOutcome::None));
    }

    #[test]
    fn click_without_element_fails() {
        let driver = RecordingDriver::default();
        let ctx = ExecutionContext {
            driver: &driver,
            output_dir: Path::new("/tmp"),
            script_name: "s",
        };
        let err = execute(&ctx, ActionKind::Click, None, None, None, Duration::from_secs(1), "step-1");
        assert!(err.is_err());
    }

    #[test]
    fn extract_applies_number_transform() {
        let driver = RecordingDriver::default();
        let ctx = ExecutionContext {
            driver: &driver,
            output_dir: Path::new("/tmp"),
            script_name: "s",
        };
        let element = dummy_element();
        let output = Output {
            variable: "price".into(),
            transform: Some(TransformName::Number),
        };
        let outcome = execute(
            &ctx,
            ActionKind::Extract,
            Some(&element),
            None,
            Some(&output),
            Duration::from_secs(1),
            "step-1",
        )
        .unwrap();
        match outcome {
            ActionOutcome::Extracted(v) => assert_eq!(v, "9.99"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn table_extract_produces_records() {
        let driver = RecordingDriver::default();
        let ctx = ExecutionContext {
            driver: &driver,
            output_dir: Path::new("/tmp"),
            script_name: "s",
        };
        let element = dummy_element();
        let outcome = execute(&ctx, ActionKind::TableExtract, Some(&element), None, None, Duration::from_secs(1), "step-1").unwrap();
        match outcome {
            ActionOutcome::ExtractedTable(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].get("qty").unwrap().as_deref(), Some("3"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn screenshot_creates_output_directory() {
        let driver = RecordingDriver::default();
        let dir = tempdir().unwrap();
        let nested = dir.path().join("shots");
        let ctx = ExecutionContext {
            driver: &driver,
            output_dir: &nested,
            script_name: "s",
        };
        let outcome = execute(&ctx, ActionKind::Screenshot, None, None, None, Duration::from_secs(1), "step-1").unwrap();
        match outcome {
            ActionOutcome::Screenshot(path) => assert!(path.exists()),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
