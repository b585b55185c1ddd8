//! Browser driver abstraction.
//!
//! # Stable API Surface
//! - [`BrowserDriver`]: the trait `browserlet-resolver` and
//!   `browserlet-executor` consume.
//! - [`ChromeDriver`]: the `headless_chrome`-backed implementation used in
//!   production.
//! - [`ResolvedElement`]: a [`browserlet_protocol::Candidate`] paired with
//!   the opaque reference needed to act on it.
#![warn(missing_docs)]

mod chrome;
mod driver;
mod error;
mod extract;

pub use chrome::ChromeDriver;
pub use driver::{BrowserDriver, ResolvedElement};
pub use error::{Error, Result};
pub use extract::REF_ATTRIBUTE;
