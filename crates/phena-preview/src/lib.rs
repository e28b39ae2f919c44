//! # Phena Preview
//!
//! Sandboxed live previews for p5.js sketches.
//!
//! The crate takes the text of an open sketch, checks that it parses as a
//! function body, and builds an HTML page that runs it inside p5's `setup()`
//! under a strict content-security policy. A [`PreviewController`] drives the
//! whole command against any editor that implements [`Host`], keeping at most
//! one preview panel open.
//!
//! ```rust,ignore
//! use phena_preview::prelude::*;
//!
//! let mut controller = PreviewController::new(my_host, DocumentBuilder::default());
//! match controller.run()? {
//!     RunOutcome::Rejected(err) => eprintln!("{err}"),
//!     _ => {}
//! }
//! ```
//!
//! ## Page security
//!
//! - Every build draws a new nonce; inline `<script>` and `<style>` tags carry it.
//! - Scripts load only with that nonce or from the p5.js CDN origin.
//! - `</script` inside the sketch is escaped so it cannot end the script element.

pub mod controller;
pub mod controls;
pub mod csp;
pub mod document;
pub mod escape;
pub mod host;
pub mod nonce;
pub mod template;
pub mod validate;

mod error;

pub use controller::{PanelSlot, PreviewController, RunOutcome};
pub use controls::{ControlPanel, FrameRateSink, PreferenceStore, Preferences};
pub use document::{BuilderOptions, DocumentBuilder, PreviewDocument, render_document};
pub use error::{HostError, PreviewError, Result, TemplateError};
pub use host::{COMMAND_ID, Host, Panel, PanelOptions, Placement};
pub use nonce::Nonce;
pub use template::{Template, TemplateSource};
pub use validate::{Location, SyntaxError, validate_sketch};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::controller::{PreviewController, RunOutcome};
    pub use crate::document::{BuilderOptions, DocumentBuilder};
    pub use crate::host::{Host, Panel, PanelOptions};
    pub use crate::validate::validate_sketch;
    pub use crate::{PreviewError, Result};
}
