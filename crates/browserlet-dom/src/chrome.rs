//! [`BrowserDriver`] implementation backed by `headless_chrome`.

use std::{
    path::Path,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use headless_chrome::{
    Browser, LaunchOptionsBuilder, Tab,
    protocol::cdp::Page::CaptureScreenshotFormatOption,
};
use tracing::debug;

use crate::{
    driver::{BrowserDriver, ResolvedElement},
    error::{Error, Result},
    extract::{SCAN_SCRIPT, parse_scan_result},
};

/// How often [`ChromeDriver::wait_visible`] polls the page.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A driver session backed by a single `headless_chrome` tab.
///
/// Owns the [`Browser`] so the chromium child process is torn down when the
/// driver (and therefore the run) is dropped.
pub struct ChromeDriver {
    #[allow(dead_code)]
    browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    /// Launch a new headless Chrome instance and open one tab.
    pub fn launch(headless: bool) -> Result<Self> {
        let options = LaunchOptionsBuilder::default()
            .headless(headless)
            .build()
            .map_err(|e| Error::Launch(e.to_string()))?;
        let browser = Browser::new(options).map_err(|e| Error::Launch(e.to_string()))?;
        let tab = browser.new_tab().map_err(|e| Error::Launch(e.to_string()))?;
        Ok(Self { browser, tab })
    }

    /// Find the element tagged with `element_ref` via its stamped
    /// `data-browserlet-ref` attribute.
    fn find(&self, element_ref: &str) -> Result<headless_chrome::Element<'_>> {
        let selector = format!("[data-browserlet-ref={element_ref:?}]");
        self.tab
            .find_element(&selector)
            .map_err(|_| Error::StaleReference(element_ref.to_string()))
    }

    /// Evaluate `script` and return its JSON-stringified result, unwrapped.
    fn eval_json(&self, script: &str) -> Result<String> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| Error::Query(e.to_string()))?;
        match result.value {
            Some(serde_json::Value::String(s)) => Ok(s),
            Some(other) => Ok(other.to_string()),
            None => Err(Error::Query("evaluate returned no value".into())),
        }
    }
}

impl BrowserDriver for ChromeDriver {
    fn navigate(&self, url: &str) -> Result<()> {
        self.tab.navigate_to(url).map_err(|e| Error::Navigate {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        self.tab.wait_until_navigated().map_err(|e| Error::Navigate {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    fn scan_candidates(&self) -> Result<Vec<ResolvedElement>> {
        let json = self.eval_json(SCAN_SCRIPT)?;
        debug!(candidate_count = %json.len(), "scanned page for candidates");
        let pairs = parse_scan_result(&json)?;
        Ok(pairs
            .into_iter()
            .map(|(element_ref, candidate)| ResolvedElement {
                element_ref,
                candidate,
            })
            .collect())
    }

    fn resolve_selector(&self, selector: &str) -> Result<Option<ResolvedElement>> {
        let Ok(element) = self.tab.find_element(selector) else {
            return Ok(None);
        };
        let script = format!(
            "(() => {{ const el = document.querySelector({selector:?});
              if (!el) return null;
              let r = el.getAttribute('data-browserlet-ref');
              if (!r) {{ r = 'bl-fallback-' + Math.random().toString(36).slice(2); el.setAttribute('data-browserlet-ref', r); }}
              return r;
            }})()"
        );
        let element_ref = self.eval_json(&script)?;
        drop(element);
        let json = self.eval_json(SCAN_SCRIPT)?;
        let pairs = parse_scan_result(&json)?;
        Ok(pairs
            .into_iter()
            .find(|(r, _)| *r == element_ref)
            .map(|(element_ref, candidate)| ResolvedElement {
                element_ref,
                candidate,
            }))
    }

    fn click(&self, element_ref: &str) -> Result<()> {
        self.find(element_ref)?
            .click()
            .map_err(|e| Error::Action {
                action: "click",
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn type_text(&self, element_ref: &str, text: &str) -> Result<()> {
        let element = self.find(element_ref)?;
        element.click().map_err(|e| Error::Action {
            action: "type",
            message: e.to_string(),
        })?;
        let clear = format!(
            "document.querySelector('[data-browserlet-ref={element_ref:?}]').value = '';"
        );
        self.tab
            .evaluate(&clear, false)
            .map_err(|e| Error::Action {
                action: "type",
                message: e.to_string(),
            })?;
        element.type_into(text).map_err(|e| Error::Action {
            action: "type",
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn select_option(&self, element_ref: &str, value: &str) -> Result<()> {
        let script = format!(
            "(() => {{
              const el = document.querySelector('[data-browserlet-ref={element_ref:?}]');
              if (!el) return false;
              const opt = Array.from(el.options).find(o => o.value === {value:?} || o.textContent.trim() === {value:?});
              if (!opt) return false;
              el.value = opt.value;
              el.dispatchEvent(new Event('change', {{ bubbles: true }}));
              return true;
            }})()"
        );
        let found = self.eval_json(&script)?;
        if found != "true" {
            return Err(Error::Action {
                action: "select",
                message: format!("no option matching {value:?}"),
            });
        }
        Ok(())
    }

    fn hover(&self, element_ref: &str) -> Result<()> {
        self.find(element_ref)?
            .move_mouse_over()
            .map_err(|e| Error::Action {
                action: "hover",
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn scroll_into_view(&self, element_ref: &str) -> Result<()> {
        self.find(element_ref)?
            .scroll_into_view()
            .map_err(|e| Error::Action {
                action: "scroll",
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn wait_visible(&self, element_ref: &str, timeout: Duration) -> Result<bool> {
        let script = format!(
            "(() => {{
              const el = document.querySelector('[data-browserlet-ref={element_ref:?}]');
              if (!el) return false;
              const r = el.getBoundingClientRect();
              return r.width > 0 && r.height > 0;
            }})()"
        );
        let deadline = Instant::now() + timeout;
        loop {
            if self.eval_json(&script)? == "true" {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn wait_hidden(&self, element_ref: &str, timeout: Duration) -> Result<bool> {
        let script = format!(
            "(() => {{
              const el = document.querySelector('[data-browserlet-ref={element_ref:?}]');
              if (!el) return true;
              const r = el.getBoundingClientRect();
              return r.width === 0 || r.height === 0;
            }})()"
        );
        let deadline = Instant::now() + timeout;
        loop {
            if self.eval_json(&script)? == "true" {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn extract_text(&self, element_ref: &str) -> Result<String> {
        let script = format!(
            "(() => {{
              const el = document.querySelector('[data-browserlet-ref={element_ref:?}]');
              return el ? (el.innerText || el.value || el.textContent || '').trim() : '';
            }})()"
        );
        self.eval_json(&script)
    }

    fn extract_table(&self, element_ref: &str) -> Result<Vec<Vec<String>>> {
        let script = format!(
            "(() => {{
              const el = document.querySelector('[data-browserlet-ref={element_ref:?}]');
              const table = el ? el.closest('table') || el.querySelector('table') || el : null;
              if (!table) return JSON.stringify([]);
              const rows = Array.from(table.querySelectorAll('tr')).map(tr =>
                Array.from(tr.querySelectorAll('td, th')).map(cell => cell.textContent.trim())
              );
              return JSON.stringify(rows);
            }})()"
        );
        let json = self.eval_json(&script)?;
        serde_json::from_str(&json).map_err(|e| Error::Query(e.to_string()))
    }

    fn screenshot(&self, path: &Path) -> Result<()> {
        let png = self
            .tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| Error::Screenshot(e.to_string()))?;
        std::fs::write(path, png).map_err(|e| Error::Screenshot(e.to_string()))
    }
}
