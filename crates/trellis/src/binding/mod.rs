//! Widget binding: the `read()`/`update()` contract.
//!
//! A widget [`Adapter`] wraps exactly one toolkit widget (or, for grouped
//! widgets, a set of sub-widgets with the values they represent) and gives
//! the model proxy a uniform, typed view of it:
//!
//! - [`Adapter::read`] parses the displayed content into the bound semantic
//!   type, running conversion and validation. Malformed user input is never
//!   a panic: it updates the adapter's feedback state and `read` returns
//!   `None`.
//! - [`Adapter::update`] pushes a value into the display. For its full
//!   duration - including nested change notifications the toolkit re-emits
//!   because of the display change - the adapter is *blocked*: interaction
//!   callbacks are ignored and no model write can happen.
//!
//! Adapter kinds:
//!
//! - [`TextAdapter`] - entries, multiline views, numeric spinners
//! - [`ToggleAdapter`] - check buttons
//! - [`RadioGroupAdapter`] - a set of radio buttons jointly representing
//!   one attribute
//! - [`ChoiceAdapter`] - selection menus with an item-to-value mapping
//! - [`DisplayAdapter`] - display-only labels
//!
//! # Errors and panics
//!
//! Recoverable problems (malformed input, rejected values) become feedback
//! state. Wiring mistakes are programming errors and panic synchronously
//! with a message naming the attribute: calling `update` with a value of
//! the wrong runtime type, targeting a group value no member represents, or
//! mutating configuration after the adapter is attached to a proxy.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::convert::{DataType, Value, ValueUpdate};

mod choice;
mod display;
mod radio;
mod text;
mod toggle;

pub use choice::{BindableChoice, ChoiceAdapter};
pub use display::DisplayAdapter;
pub use radio::{GroupMember, RadioGroupAdapter};
pub use text::TextAdapter;
pub use toggle::ToggleAdapter;

/// Errors raised while wiring attributes to widgets.
///
/// These are configuration errors: they indicate a bug in the application
/// wiring, not bad user input, and surface synchronously at construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// An attribute referenced a widget the tree does not contain.
    #[error("no widget named '{widget}' to bind attribute '{attribute}'")]
    MissingWidget {
        /// The attribute being bound.
        attribute: String,
        /// The missing widget name.
        widget: String,
    },

    /// The widget exists but its kind cannot represent a bound attribute.
    #[error("widget '{widget}' (attribute '{attribute}') is not a bindable widget kind")]
    UnbindableWidget {
        /// The attribute being bound.
        attribute: String,
        /// The widget name.
        widget: String,
    },

    /// The same attribute name was bound twice on one proxy.
    #[error("attribute '{0}' is bound more than once")]
    DuplicateAttribute(String),

    /// An operation referenced an attribute the proxy does not know.
    #[error("no attribute named '{0}' is bound to this proxy")]
    UnknownAttribute(String),

    /// No converter is registered for the adapter's data type.
    #[error("no converter registered for type '{data_type}' (attribute '{attribute}')")]
    MissingConverter {
        /// The attribute being bound.
        attribute: String,
        /// The data type lacking a converter.
        data_type: DataType,
    },

    /// An adapter was attached to a second proxy or attribute.
    #[error("adapter is already attached (attribute '{0}')")]
    AlreadyAttached(String),

    /// `new_model` received an instance of a different model type.
    #[error("model type mismatch: expected {expected}, got {got}")]
    ModelTypeMismatch {
        /// Type name of the previously attached model.
        expected: String,
        /// Type name of the offered model.
        got: String,
    },
}

/// Handler the proxy installs to receive user-edited values.
pub type UserWriteHandler = Arc<dyn Fn(&str, Value) + Send + Sync>;

/// The per-widget binding contract.
///
/// Implementations wrap one widget (or widget group) and are attached to at
/// most one proxy attribute for their lifetime.
pub trait Adapter: Send + Sync {
    /// The bound attribute name; empty until [`attach`](Self::attach).
    fn attribute(&self) -> String;

    /// The bound semantic type. Never changes after construction-time
    /// configuration is frozen by [`attach`](Self::attach).
    fn data_type(&self) -> DataType;

    /// Whether empty content shows the "missing input" indicator.
    fn is_mandatory(&self) -> bool;

    /// Parse the displayed content into the bound type.
    ///
    /// Returns `None` - with feedback state updated - when conversion or
    /// custom validation fails, or when mandatory content is missing. Never
    /// panics for malformed user input.
    fn read(&self) -> Option<Value>;

    /// Push a value into the display.
    ///
    /// [`ValueUpdate::Unset`] and [`ValueUpdate::Null`] empty the widget.
    /// The adapter is blocked for the whole call: no model write results
    /// from the display change, however many change notifications the
    /// toolkit re-emits.
    ///
    /// # Panics
    ///
    /// Panics if a [`ValueUpdate::Value`] carries a runtime type the bound
    /// [`DataType`] does not accept, or (for grouped adapters) a value no
    /// group member represents.
    fn update(&self, value: ValueUpdate);

    /// Whether a programmatic update is currently suppressing interaction.
    fn is_blocked(&self) -> bool;

    /// Raise the suppression depth. Prefer [`AdapterExt::block_scope`].
    fn begin_block(&self);

    /// Lower the suppression depth.
    fn end_block(&self);

    /// Bind this adapter to an attribute, freezing configuration.
    ///
    /// Called by the proxy builder exactly once per adapter.
    fn attach(&self, attribute: &str) -> Result<(), BindingError>;

    /// Whether [`attach`](Self::attach) has run.
    fn is_attached(&self) -> bool;

    /// Record the currently displayed value as the attribute default.
    ///
    /// The proxy builder calls this before any model is attached; the
    /// captured value stands in when a bound model lacks the attribute.
    fn capture_default(&self);

    /// The default captured by [`capture_default`](Self::capture_default).
    fn default_value(&self) -> Option<Value>;

    /// Install the handler that receives successfully-read user edits.
    fn set_user_write_handler(&self, handler: UserWriteHandler);

    /// Cancel adapter-owned timers and clear feedback visuals.
    fn detach(&self);
}

/// Convenience extensions on adapters.
pub trait AdapterExt: Adapter {
    /// Raise suppression for the lifetime of the returned guard.
    fn block_scope(&self) -> BlockGuard<'_, Self> {
        BlockGuard::new(self)
    }
}

impl<A: Adapter + ?Sized> AdapterExt for A {}

/// RAII guard holding an adapter's suppression depth.
pub struct BlockGuard<'a, A: Adapter + ?Sized> {
    adapter: &'a A,
}

impl<'a, A: Adapter + ?Sized> BlockGuard<'a, A> {
    fn new(adapter: &'a A) -> Self {
        adapter.begin_block();
        Self { adapter }
    }
}

impl<A: Adapter + ?Sized> Drop for BlockGuard<'_, A> {
    fn drop(&mut self) {
        self.adapter.end_block();
    }
}

/// State shared by every adapter implementation.
pub(crate) struct AdapterCore {
    attribute: Mutex<String>,
    data_type: Mutex<DataType>,
    mandatory: AtomicBool,
    format: Mutex<Option<String>>,
    attached: AtomicBool,
    block_depth: AtomicUsize,
    user_write: Mutex<Option<UserWriteHandler>>,
}

impl AdapterCore {
    pub(crate) fn new(data_type: DataType) -> Self {
        Self {
            attribute: Mutex::new(String::new()),
            data_type: Mutex::new(data_type),
            mandatory: AtomicBool::new(false),
            format: Mutex::new(None),
            attached: AtomicBool::new(false),
            block_depth: AtomicUsize::new(0),
            user_write: Mutex::new(None),
        }
    }

    pub(crate) fn attribute(&self) -> String {
        self.attribute.lock().clone()
    }

    pub(crate) fn data_type(&self) -> DataType {
        *self.data_type.lock()
    }

    /// Change the data type. Configuration only; panics after attach.
    pub(crate) fn set_data_type(&self, data_type: DataType) {
        self.assert_configurable("set_data_type");
        *self.data_type.lock() = data_type;
    }

    pub(crate) fn is_mandatory(&self) -> bool {
        self.mandatory.load(Ordering::SeqCst)
    }

    pub(crate) fn set_mandatory(&self, mandatory: bool) {
        self.assert_configurable("set_mandatory");
        self.mandatory.store(mandatory, Ordering::SeqCst);
    }

    pub(crate) fn format(&self) -> Option<String> {
        self.format.lock().clone()
    }

    pub(crate) fn set_format(&self, format: Option<String>) {
        self.assert_configurable("set_format");
        *self.format.lock() = format;
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_attached(&self, attribute: &str) -> Result<(), BindingError> {
        if self.attached.swap(true, Ordering::SeqCst) {
            return Err(BindingError::AlreadyAttached(self.attribute()));
        }
        *self.attribute.lock() = attribute.to_string();
        Ok(())
    }

    pub(crate) fn is_blocked(&self) -> bool {
        self.block_depth.load(Ordering::SeqCst) > 0
    }

    pub(crate) fn begin_block(&self) {
        self.block_depth.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn end_block(&self) {
        self.block_depth.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn set_user_write_handler(&self, handler: UserWriteHandler) {
        *self.user_write.lock() = Some(handler);
    }

    /// Deliver a successfully-read user value to the installed handler.
    pub(crate) fn deliver_user_value(&self, value: Value) {
        let handler = self.user_write.lock().clone();
        if let Some(handler) = handler {
            handler(&self.attribute(), value);
        }
    }

    /// Panic if configuration is mutated after attach.
    fn assert_configurable(&self, operation: &str) {
        assert!(
            !self.is_attached(),
            "{operation} called on the adapter for attribute '{}' after it was attached",
            self.attribute()
        );
    }

    /// Panic unless the bound type accepts `value`.
    pub(crate) fn assert_value_type(&self, value: &Value) {
        let data_type = self.data_type();
        assert!(
            data_type.accepts(value),
            "attribute '{}' is bound as {} but update() received a {} value",
            self.attribute(),
            data_type,
            value.data_type()
        );
    }
}

/// Shared helper: run `update` semantics for the empty cases.
pub(crate) fn is_empty_update(value: &ValueUpdate) -> bool {
    matches!(value, ValueUpdate::Unset | ValueUpdate::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_block_depth_nests() {
        let core = AdapterCore::new(DataType::Str);
        assert!(!core.is_blocked());
        core.begin_block();
        core.begin_block();
        core.end_block();
        assert!(core.is_blocked());
        core.end_block();
        assert!(!core.is_blocked());
    }

    #[test]
    fn test_core_attach_freezes_configuration() {
        let core = AdapterCore::new(DataType::Str);
        core.set_format(Some("%s".into()));
        core.mark_attached("name").unwrap();
        assert!(core.is_attached());
        assert_eq!(core.attribute(), "name");
        assert!(core.mark_attached("other").is_err());
    }

    #[test]
    #[should_panic(expected = "set_format called")]
    fn test_core_late_configuration_panics() {
        let core = AdapterCore::new(DataType::Str);
        core.mark_attached("name").unwrap();
        core.set_format(Some("%s".into()));
    }

    #[test]
    #[should_panic(expected = "bound as integer")]
    fn test_core_value_type_check_panics() {
        let core = AdapterCore::new(DataType::Int);
        core.assert_value_type(&Value::Str("25".into()));
    }
}
