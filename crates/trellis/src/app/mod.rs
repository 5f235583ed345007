//! Application composition: View, Controller, Delegate.
//!
//! Trellis deliberately composes instead of mixing in: a [`Delegate`] owns a
//! [`View`] (named widget handles from the UI description), a
//! [`Controller`] (an explicit table of widget-signal handlers, built at
//! setup time), and optionally a [`Proxy`](crate::proxy::Proxy) - three
//! narrow collaborators in three fields, no inheritance chains and no
//! name-based dispatch at interaction time.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::app::{Controller, Delegate, View};
//! use trellis::toolkit::headless::HeadlessTree;
//!
//! let tree = Arc::new(HeadlessTree::new());
//! let save = tree.add_check_button("save");
//!
//! let view = View::new(tree);
//! let controller = Controller::new();
//! controller
//!     .connect(&view, "save", "clicked", || println!("saving"))
//!     .unwrap();
//!
//! let delegate = Delegate::new(view, controller);
//! assert!(delegate.view().widget("save").is_some());
//! # let _ = save;
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use trellis_core::{ConnectionId, Scheduler};

use crate::binding::{
    Adapter, BindingError, ChoiceAdapter, DisplayAdapter, TextAdapter, ToggleAdapter,
};
use crate::convert::{DataType, Value};
use crate::proxy::{AdapterSource, Proxy};
use crate::toolkit::{ChoiceWidget, ToolkitError, WidgetHandle, WidgetTree};
use crate::toolkit::headless::{HeadlessTree, HeadlessWidget};

/// Errors from controller wiring.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    /// The view has no widget with this name.
    #[error("no widget named '{0}' in the view")]
    MissingWidget(String),

    /// The widget exists but does not fire the requested signal.
    #[error(transparent)]
    Toolkit(#[from] ToolkitError),
}

/// Named widget handles, as loaded from a UI description.
pub struct View {
    tree: Arc<dyn WidgetTree>,
}

impl View {
    /// Wrap a widget tree.
    pub fn new(tree: Arc<dyn WidgetTree>) -> Self {
        Self { tree }
    }

    /// Look up a widget handle by name.
    pub fn widget(&self, name: &str) -> Option<Arc<dyn WidgetHandle>> {
        self.tree.widget(name)
    }

    /// All widget names in the view.
    pub fn widget_names(&self) -> Vec<String> {
        self.tree.widget_names()
    }

    /// Show every widget in the view.
    pub fn show_all(&self) {
        for name in self.tree.widget_names() {
            if let Some(widget) = self.tree.widget(&name) {
                widget.set_visible(true);
            }
        }
    }

    /// Hide every widget in the view.
    pub fn hide_all(&self) {
        for name in self.tree.widget_names() {
            if let Some(widget) = self.tree.widget(&name) {
                widget.set_visible(false);
            }
        }
    }

    /// Enable or disable every widget in the view.
    pub fn set_sensitive_all(&self, sensitive: bool) {
        for name in self.tree.widget_names() {
            if let Some(widget) = self.tree.widget(&name) {
                widget.set_sensitive(sensitive);
            }
        }
    }
}

/// One row of the controller's handler table.
#[derive(Debug, Clone)]
pub struct HandlerEntry {
    /// Widget the handler is connected to.
    pub widget: String,
    /// Signal name the handler listens for.
    pub signal: String,
    /// The toolkit connection backing the row.
    pub connection: ConnectionId,
}

/// An explicit (widget, signal) → handler table.
///
/// Handlers are registered once at setup; afterwards the toolkit dispatches
/// directly through the stored connections - no reflection, no name
/// matching per interaction.
#[derive(Default)]
pub struct Controller {
    handlers: Mutex<Vec<HandlerEntry>>,
}

impl Controller {
    /// Create an empty handler table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `signal` on the widget named `widget`.
    pub fn connect(
        &self,
        view: &View,
        widget: &str,
        signal: &str,
        slot: impl Fn() + Send + Sync + 'static,
    ) -> Result<(), ControllerError> {
        let handle = view
            .widget(widget)
            .ok_or_else(|| ControllerError::MissingWidget(widget.to_string()))?;
        let connection = handle.connect_signal(signal, Box::new(slot))?;
        self.handlers.lock().push(HandlerEntry {
            widget: widget.to_string(),
            signal: signal.to_string(),
            connection,
        });
        Ok(())
    }

    /// The registered handler table, in registration order.
    pub fn handlers(&self) -> Vec<HandlerEntry> {
        self.handlers.lock().clone()
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }
}

/// Composition root: one view, one controller, and optionally one proxy.
pub struct Delegate {
    view: View,
    controller: Controller,
    proxy: Option<Arc<Proxy>>,
}

impl Delegate {
    /// Compose a delegate without data binding.
    pub fn new(view: View, controller: Controller) -> Self {
        Self {
            view,
            controller,
            proxy: None,
        }
    }

    /// Compose a delegate with a model proxy.
    pub fn with_proxy(view: View, controller: Controller, proxy: Arc<Proxy>) -> Self {
        Self {
            view,
            controller,
            proxy: Some(proxy),
        }
    }

    /// The view.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// The controller.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// The proxy, if one is composed in.
    pub fn proxy(&self) -> Option<&Arc<Proxy>> {
        self.proxy.as_ref()
    }
}

/// Adapter factory over a [`HeadlessTree`], for marker-driven binding.
///
/// Picks the natural adapter for each widget kind: text adapters for
/// entries and text areas, an integer text adapter for spin buttons, a
/// toggle adapter for check buttons, a string choice adapter (items mapping
/// to themselves) for choice boxes, and a display adapter for labels.
/// Radio buttons are rejected - radio groups are declared explicitly on
/// the proxy builder.
pub struct HeadlessSource {
    tree: Arc<HeadlessTree>,
    scheduler: Arc<Scheduler>,
}

impl HeadlessSource {
    /// Create a source over `tree`.
    pub fn new(tree: Arc<HeadlessTree>, scheduler: Arc<Scheduler>) -> Self {
        Self { tree, scheduler }
    }
}

impl AdapterSource for HeadlessSource {
    fn adapter(
        &self,
        attribute: &str,
        widget_name: &str,
    ) -> Result<Arc<dyn Adapter>, BindingError> {
        let Some(widget) = self.tree.get(widget_name) else {
            return Err(BindingError::MissingWidget {
                attribute: attribute.to_string(),
                widget: widget_name.to_string(),
            });
        };
        Ok(match widget {
            HeadlessWidget::Entry(w) => TextAdapter::new(w, self.scheduler.clone()),
            HeadlessWidget::TextArea(w) => TextAdapter::new(w, self.scheduler.clone()),
            HeadlessWidget::SpinButton(w) => {
                let adapter = TextAdapter::new(w, self.scheduler.clone());
                adapter.set_data_type(DataType::Int);
                adapter
            }
            HeadlessWidget::CheckButton(w) => {
                return Ok(ToggleAdapter::new(w, self.scheduler.clone()));
            }
            HeadlessWidget::ChoiceBox(w) => {
                let entries = w
                    .items()
                    .into_iter()
                    .map(|item| (item.clone(), Value::Str(item)))
                    .collect();
                return Ok(ChoiceAdapter::new(w, DataType::Str, entries));
            }
            HeadlessWidget::Label(w) => return Ok(DisplayAdapter::new(w)),
            HeadlessWidget::RadioButton(_) => {
                return Err(BindingError::UnbindableWidget {
                    attribute: attribute.to_string(),
                    widget: widget_name.to_string(),
                });
            }
        })
    }
}
