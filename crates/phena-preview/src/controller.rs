//! The "render current sketch" command and the single preview panel

use crate::document::DocumentBuilder;
use crate::error::{HostError, Result};
use crate::host::{Host, Panel, PanelOptions};
use crate::validate::{SyntaxError, validate_sketch};
use std::cell::Cell;
use std::rc::Rc;

/// Holder for the one preview panel
///
/// The close hook registered with the host only flips a shared flag, so it
/// is safe to call at any time. The slot notices the flag the next time it is
/// asked for the panel and drops it.
pub struct PanelSlot<P> {
    state: SlotState<P>,
}

enum SlotState<P> {
    Empty,
    Open { panel: P, closed: Rc<Cell<bool>> },
}

impl<P: Panel> PanelSlot<P> {
    pub fn new() -> Self {
        Self {
            state: SlotState::Empty,
        }
    }

    /// Whether a panel is currently open
    pub fn is_open(&self) -> bool {
        match &self.state {
            SlotState::Empty => false,
            SlotState::Open { closed, .. } => !closed.get(),
        }
    }

    /// The open panel, clearing the slot first if the user closed it
    pub fn panel_mut(&mut self) -> Option<&mut P> {
        if !self.is_open() {
            self.state = SlotState::Empty;
        }
        match &mut self.state {
            SlotState::Empty => None,
            SlotState::Open { panel, .. } => Some(panel),
        }
    }

    /// Store a newly created panel and hook its close event to this slot
    ///
    /// A host may fire the hook while it is being registered, in which case
    /// the slot is already empty again when this returns.
    pub fn open(&mut self, mut panel: P) {
        let closed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&closed);
        panel.on_close(Box::new(move || flag.set(true)));

        self.state = SlotState::Open { panel, closed };
    }
}

impl<P: Panel> Default for PanelSlot<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// What a command invocation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No document was active; nothing happened
    NoActiveDocument,
    /// The sketch failed to parse; the error was shown and no panel was touched
    Rejected(SyntaxError),
    /// A new panel was opened
    Created,
    /// The existing panel received a new document
    Updated,
}

/// Runs the preview command against a host
pub struct PreviewController<H: Host> {
    host: H,
    builder: DocumentBuilder,
    panel_options: PanelOptions,
    slot: PanelSlot<H::Panel>,
}

impl<H: Host> PreviewController<H> {
    pub fn new(host: H, builder: DocumentBuilder) -> Self {
        Self {
            host,
            builder,
            panel_options: PanelOptions::default(),
            slot: PanelSlot::new(),
        }
    }

    pub fn with_panel_options(mut self, options: PanelOptions) -> Self {
        self.panel_options = options;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Whether the preview panel is open
    pub fn has_panel(&self) -> bool {
        self.slot.is_open()
    }

    /// Render the active document into the preview panel
    pub fn run(&mut self) -> Result<RunOutcome> {
        let Some(source) = self.host.active_text() else {
            tracing::debug!("No active document, ignoring preview command");
            return Ok(RunOutcome::NoActiveDocument);
        };

        if let Err(err) = validate_sketch(&source) {
            tracing::warn!(error = %err, "Sketch has a syntax error");
            self.host
                .show_error(&format!("p5.js sketch has a syntax error: {err}"));
            return Ok(RunOutcome::Rejected(err));
        }

        // Template failures surface before any panel is created
        let template = self.builder.load_template()?;

        if let Some(panel) = self.slot.panel_mut() {
            let document = self
                .builder
                .build_with(&template, &source, &panel.csp_source())?;
            panel.set_html(&document.html);
            panel.reveal(true);
            tracing::info!("Updated preview panel");
            return Ok(RunOutcome::Updated);
        }

        self.slot.open(self.host.create_panel(&self.panel_options)?);
        let Some(panel) = self.slot.panel_mut() else {
            return Err(HostError::new("Preview panel was closed while opening").into());
        };
        let document = self
            .builder
            .build_with(&template, &source, &panel.csp_source())?;
        panel.set_html(&document.html);
        tracing::info!(title = %self.panel_options.title, "Opened preview panel");
        Ok(RunOutcome::Created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorded {
        close_on_register: bool,
        on_close: Option<Box<dyn FnOnce()>>,
        html: Vec<String>,
    }

    struct StubPanel(Rc<RefCell<Recorded>>);

    impl Panel for StubPanel {
        fn csp_source(&self) -> String {
            "stub:".to_string()
        }
        fn set_html(&mut self, html: &str) {
            self.0.borrow_mut().html.push(html.to_string());
        }
        fn reveal(&mut self, _preserve_focus: bool) {}
        fn on_close(&mut self, callback: Box<dyn FnOnce()>) {
            if self.0.borrow().close_on_register {
                callback();
            } else {
                self.0.borrow_mut().on_close = Some(callback);
            }
        }
    }

    struct StubHost {
        recorded: Rc<RefCell<Recorded>>,
        errors: Vec<String>,
    }

    impl Host for StubHost {
        type Panel = StubPanel;

        fn active_text(&self) -> Option<String> {
            Some("background(0);".to_string())
        }
        fn create_panel(
            &mut self,
            _options: &PanelOptions,
        ) -> std::result::Result<StubPanel, HostError> {
            Ok(StubPanel(Rc::clone(&self.recorded)))
        }
        fn show_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    #[test]
    fn test_slot_clears_after_close() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let mut slot = PanelSlot::new();
        assert!(!slot.is_open());

        slot.open(StubPanel(Rc::clone(&recorded)));
        assert!(slot.is_open());
        assert!(slot.panel_mut().is_some());

        let hook = recorded.borrow_mut().on_close.take().unwrap();
        hook();

        assert!(!slot.is_open());
        assert!(slot.panel_mut().is_none());
    }

    #[test]
    fn test_slot_panel_receives_html() {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let mut slot = PanelSlot::new();
        slot.open(StubPanel(Rc::clone(&recorded)));
        slot.panel_mut().unwrap().set_html("<p>");
        assert_eq!(recorded.borrow().html, vec!["<p>".to_string()]);
    }

    #[test]
    fn test_panel_closed_during_open_is_an_error() {
        let recorded = Rc::new(RefCell::new(Recorded {
            close_on_register: true,
            ..Recorded::default()
        }));
        let host = StubHost {
            recorded: Rc::clone(&recorded),
            errors: Vec::new(),
        };
        let mut controller = PreviewController::new(host, DocumentBuilder::default());

        let err = controller.run().unwrap_err();
        assert!(matches!(err, crate::PreviewError::Host(_)));
        assert!(!controller.has_panel());
        assert!(recorded.borrow().html.is_empty());
        assert!(controller.host().errors.is_empty());

        recorded.borrow_mut().close_on_register = false;
        assert_eq!(controller.run().unwrap(), RunOutcome::Created);
        assert!(controller.has_panel());
    }
}
