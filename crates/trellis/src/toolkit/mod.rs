//! The widget-toolkit seam.
//!
//! Trellis does not render anything. The host toolkit (and its
//! UI-description loader) are external collaborators, consumed only through
//! the narrow traits in this module:
//!
//! - [`WidgetHandle`] - name, visibility, sensitivity, tooltip, and
//!   named-signal connection
//! - [`TextWidget`] / [`ToggleWidget`] / [`ChoiceWidget`] - displayed state
//!   access plus the change signal each widget kind fires
//! - [`WidgetTree`] - the loader contract: "given a name, return a widget
//!   handle"
//!
//! Widgets that can display validation feedback additionally implement
//! [`FeedbackSurface`](crate::validate::FeedbackSurface).
//!
//! The [`headless`] submodule provides a complete in-memory implementation
//! of every widget kind. It backs the test suite and serves as the
//! reference for toolkit integrations.

use std::sync::Arc;

use trellis_core::{ConnectionId, Signal};

pub mod headless;

/// Errors from the toolkit seam.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolkitError {
    /// The widget does not fire a signal with this name.
    #[error("widget '{widget}' has no signal named '{signal}'")]
    UnknownSignal {
        /// Widget name.
        widget: String,
        /// Requested signal name.
        signal: String,
    },
}

/// The minimal contract every toolkit widget exposes to the binding layer.
pub trait WidgetHandle: Send + Sync {
    /// The widget's name, as assigned by the UI description.
    fn name(&self) -> &str;

    /// Whether the widget is shown.
    fn is_visible(&self) -> bool;

    /// Show or hide the widget.
    fn set_visible(&self, visible: bool);

    /// Whether the widget accepts interaction.
    fn is_sensitive(&self) -> bool;

    /// Enable or disable interaction.
    fn set_sensitive(&self, sensitive: bool);

    /// The current tooltip text.
    fn tooltip(&self) -> Option<String>;

    /// Set or clear the tooltip text.
    fn set_tooltip(&self, tooltip: Option<String>);

    /// Connect a callback to a named interaction signal.
    ///
    /// This is the generic entry point used by controller tables; typed
    /// bindings go through the per-kind change signals instead. The set of
    /// valid names is widget-specific (`"changed"`, `"toggled"`,
    /// `"activate"`, ...).
    fn connect_signal(
        &self,
        signal: &str,
        slot: Box<dyn Fn() + Send + Sync>,
    ) -> Result<ConnectionId, ToolkitError>;
}

/// A widget displaying editable text (entries, multiline views, numeric
/// spinners).
pub trait TextWidget: WidgetHandle {
    /// The currently displayed text.
    fn displayed_text(&self) -> String;

    /// Replace the displayed text.
    ///
    /// Fires [`text_changed`](Self::text_changed) exactly like an
    /// interactive edit does; the binding layer suppresses the echo during
    /// programmatic updates.
    fn set_displayed_text(&self, text: &str);

    /// Fired whenever the displayed text changes, with the new text.
    fn text_changed(&self) -> &Signal<String>;
}

/// A widget displaying an on/off state (check buttons, radio buttons).
pub trait ToggleWidget: WidgetHandle {
    /// Whether the widget is active (checked / selected).
    fn is_active(&self) -> bool;

    /// Set the active state. Fires [`toggled`](Self::toggled) on change.
    fn set_active(&self, active: bool);

    /// Fired when the active state changes, with the new state.
    fn toggled(&self) -> &Signal<bool>;
}

/// A widget displaying a pick-one selection (combo boxes, option menus).
pub trait ChoiceWidget: WidgetHandle {
    /// The selectable items, in display order.
    fn items(&self) -> Vec<String>;

    /// Replace the selectable items, clearing the selection.
    fn set_items(&self, items: Vec<String>);

    /// The currently selected item, if any.
    fn selected(&self) -> Option<String>;

    /// Select the given item. Returns `false` if it is not in the list.
    fn select(&self, item: &str) -> bool;

    /// Clear the selection.
    fn clear_selection(&self);

    /// Fired when the selection changes, with the new selection.
    fn selection_changed(&self) -> &Signal<Option<String>>;
}

/// The UI-description loader contract: named widget lookup.
pub trait WidgetTree: Send + Sync {
    /// Look up a widget handle by name.
    fn widget(&self, name: &str) -> Option<Arc<dyn WidgetHandle>>;

    /// All widget names in the tree.
    fn widget_names(&self) -> Vec<String>;
}
