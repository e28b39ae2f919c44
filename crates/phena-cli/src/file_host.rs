//! A host that previews a sketch file into an HTML file
//!
//! The "active document" is the sketch on disk and the "panel" is the output
//! page. Deleting the output page is treated as closing the panel.

use phena_preview::{Host, HostError, Panel, PanelOptions};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

type CloseHook = Rc<RefCell<Option<Box<dyn FnOnce()>>>>;

/// Host backed by the filesystem
pub struct FileHost {
    sketch: PathBuf,
    output: PathBuf,
    csp_source: String,
    open_hook: Option<CloseHook>,
    errors: Vec<String>,
}

impl FileHost {
    pub fn new(sketch: impl Into<PathBuf>, output: impl Into<PathBuf>, csp_source: &str) -> Self {
        Self {
            sketch: sketch.into(),
            output: output.into(),
            csp_source: csp_source.to_string(),
            open_hook: None,
            errors: Vec::new(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Error messages shown so far
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Fire the close hook if the output page was deleted since it was written
    pub fn sync_closed(&mut self) {
        if self.output.exists() {
            return;
        }
        let callback = self
            .open_hook
            .take()
            .and_then(|hook| hook.borrow_mut().take());
        if let Some(callback) = callback {
            tracing::info!("Preview page {} was removed", self.output.display());
            callback();
        }
    }
}

impl Host for FileHost {
    type Panel = FilePanel;

    fn active_text(&self) -> Option<String> {
        match fs::read_to_string(&self.sketch) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Cannot read sketch {}: {}", self.sketch.display(), e);
                None
            }
        }
    }

    fn create_panel(&mut self, options: &PanelOptions) -> Result<FilePanel, HostError> {
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let hook: CloseHook = Rc::new(RefCell::new(None));
        self.open_hook = Some(Rc::clone(&hook));

        tracing::debug!(view_type = %options.view_type, "Creating file panel");
        Ok(FilePanel {
            path: self.output.clone(),
            title: options.title.clone(),
            csp_source: self.csp_source.clone(),
            on_close: hook,
        })
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("ERROR: {message}");
        self.errors.push(message.to_string());
    }
}

/// The output page standing in for a preview panel
pub struct FilePanel {
    path: PathBuf,
    title: String,
    csp_source: String,
    on_close: CloseHook,
}

impl Panel for FilePanel {
    fn csp_source(&self) -> String {
        self.csp_source.clone()
    }

    fn set_html(&mut self, html: &str) {
        if let Err(e) = fs::write(&self.path, html) {
            tracing::error!("Failed to write preview {}: {}", self.path.display(), e);
        }
    }

    fn reveal(&mut self, _preserve_focus: bool) {
        println!("{}: {}", self.title, self.path.display());
    }

    fn on_close(&mut self, callback: Box<dyn FnOnce()>) {
        *self.on_close.borrow_mut() = Some(callback);
    }
}
