//! The editor-facing boundary
//!
//! The controller only needs these few operations from the editor, so any
//! host (an editor extension bridge, the CLI's file host, a test fake) can
//! drive it.

use crate::error::HostError;

/// Command identifier the preview action is registered under
pub const COMMAND_ID: &str = "p5-phena.run";

/// Where the panel opens relative to the active editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Next to the active editor column
    #[default]
    Beside,
    /// In the active editor column
    Active,
}

/// Options for creating the preview panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelOptions {
    /// Host-side identifier for the kind of panel
    pub view_type: String,
    pub title: String,
    pub placement: Placement,
    /// Show without taking input focus from the editor
    pub preserve_focus: bool,
    /// Allow scripts in the panel (the preview is useless without them)
    pub enable_scripts: bool,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            view_type: "p5view".to_string(),
            title: "p5.js Preview".to_string(),
            placement: Placement::Beside,
            preserve_focus: true,
            enable_scripts: true,
        }
    }
}

/// A browser panel hosted by the editor
pub trait Panel {
    /// Origin the panel serves its own resources from, used in the CSP
    fn csp_source(&self) -> String;

    /// Replace the panel's document
    fn set_html(&mut self, html: &str);

    /// Bring the panel to the foreground
    fn reveal(&mut self, preserve_focus: bool);

    /// Register a hook the host calls once when the user closes the panel
    fn on_close(&mut self, callback: Box<dyn FnOnce()>);
}

/// The editor hosting the preview
pub trait Host {
    type Panel: Panel;

    /// Full text of the active document, or `None` when nothing is open
    fn active_text(&self) -> Option<String>;

    fn create_panel(&mut self, options: &PanelOptions) -> Result<Self::Panel, HostError>;

    /// Show an error notification to the user
    fn show_error(&mut self, message: &str);
}
