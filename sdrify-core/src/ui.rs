// ============================================================================
// sdrify-core/src/ui.rs
// ============================================================================
//
// UI COLLABORATOR: What the conversion core needs from a front end
//
// The core never touches presentation state from the conversion worker.
// Every UI-visible change is wrapped in a task and handed to the front end's
// dispatcher, which runs it on the UI thread in submission order.
//
// KEY COMPONENTS:
// - UiDispatcher: "run this on the UI thread"
// - Control: anything that can be enabled or disabled during a conversion
// - ConversionView: progress sink, notices, cancel control, output opener
// - UiHandles: the bundle passed to the conversion manager

use std::path::Path;
use std::sync::Arc;

use crate::notifications::Notification;

/// Unit of work executed on the UI thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Queues tasks for execution on the UI thread.
///
/// Implementations must run tasks in the order they were dispatched.
pub trait UiDispatcher: Send + Sync {
    fn dispatch(&self, task: UiTask);
}

/// A UI element that is disabled while a conversion runs.
pub trait Control: Send + Sync {
    fn set_enabled(&self, enabled: bool);
}

/// Presentation surface of a conversion. Methods are only called from tasks
/// running on the UI thread, or directly by `ConversionManager` methods that
/// the UI thread itself invoked.
pub trait ConversionView: Send + Sync {
    fn set_cancel_visible(&self, visible: bool);

    /// Progress in percent, 0-100.
    fn set_progress(&self, percent: f64);

    fn notify(&self, notification: &Notification);

    /// Opens the converted file with the system's default application.
    fn open_output(&self, path: &Path);
}

/// Everything the conversion manager holds of the front end.
#[derive(Clone)]
pub struct UiHandles {
    pub dispatcher: Arc<dyn UiDispatcher>,
    pub view: Arc<dyn ConversionView>,
    pub controls: Vec<Arc<dyn Control>>,
}

impl UiHandles {
    pub fn new(dispatcher: Arc<dyn UiDispatcher>, view: Arc<dyn ConversionView>) -> Self {
        Self {
            dispatcher,
            view,
            controls: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_control(mut self, control: Arc<dyn Control>) -> Self {
        self.controls.push(control);
        self
    }

    /// Enables or disables every registered control.
    pub fn set_controls_enabled(&self, enabled: bool) {
        for control in &self.controls {
            control.set_enabled(enabled);
        }
    }

    /// Dispatches `f` to the UI thread with access to these handles.
    pub fn on_ui<F>(&self, f: F)
    where
        F: FnOnce(&UiHandles) + Send + 'static,
    {
        let handles = self.clone();
        self.dispatcher.dispatch(Box::new(move || f(&handles)));
    }
}

impl std::fmt::Debug for UiHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiHandles")
            .field("controls", &self.controls.len())
            .finish_non_exhaustive()
    }
}
