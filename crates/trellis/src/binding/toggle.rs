//! Adapter for two-state widgets.

use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;
use trellis_core::{ConnectionId, Scheduler};

use super::{Adapter, AdapterCore, AdapterExt, BindingError, UserWriteHandler, is_empty_update};
use crate::convert::{DataType, Value, ValueUpdate};
use crate::toolkit::ToggleWidget;
use crate::validate::{FeedbackConfig, FeedbackMachine, FeedbackSurface, Validator};

/// Binds one check button to one boolean model attribute.
///
/// The bound data type is always [`DataType::Bool`]. An
/// [`update`](Adapter::update) of `Null` or `Unset` leaves the widget
/// inactive.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trellis::binding::{Adapter, ToggleAdapter};
/// use trellis::convert::{Value, ValueUpdate};
/// use trellis::toolkit::ToggleWidget;
/// use trellis::toolkit::headless::CheckButton;
/// use trellis_core::Scheduler;
///
/// let scheduler = Arc::new(Scheduler::new());
/// let check = Arc::new(CheckButton::new("subscribed"));
/// let adapter = ToggleAdapter::new(check.clone(), scheduler);
///
/// adapter.update(ValueUpdate::Value(Value::Bool(true)));
/// assert!(check.is_active());
/// assert_eq!(adapter.read(), Some(Value::Bool(true)));
/// ```
pub struct ToggleAdapter {
    core: AdapterCore,
    widget: Arc<dyn ToggleWidget>,
    feedback: Arc<FeedbackMachine>,
    validator: Mutex<Option<Arc<dyn Validator>>>,
    default: Mutex<Option<Value>>,
    edit_connection: ConnectionId,
}

impl ToggleAdapter {
    /// Create an adapter for `widget`.
    pub fn new<W>(widget: Arc<W>, scheduler: Arc<Scheduler>) -> Arc<Self>
    where
        W: ToggleWidget + FeedbackSurface + 'static,
    {
        let surface: Arc<dyn FeedbackSurface> = widget.clone();
        let feedback = FeedbackMachine::new(scheduler, surface, FeedbackConfig::default());
        let toggle: Arc<dyn ToggleWidget> = widget;

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let edit_connection = toggle.toggled().connect(move |_| {
                if let Some(adapter) = weak.upgrade() {
                    adapter.on_widget_edit();
                }
            });
            Self {
                core: AdapterCore::new(DataType::Bool),
                widget: toggle.clone(),
                feedback,
                validator: Mutex::new(None),
                default: Mutex::new(None),
                edit_connection,
            }
        })
    }

    /// Attach a custom validator, checked on every read.
    pub fn set_validator(&self, validator: Arc<dyn Validator>) {
        *self.validator.lock() = Some(validator);
    }

    fn on_widget_edit(self: &Arc<Self>) {
        if self.core.is_blocked() {
            return;
        }
        self.feedback.edited(Instant::now());
        if let Some(value) = self.read() {
            self.core.deliver_user_value(value);
        }
    }
}

impl Adapter for ToggleAdapter {
    fn attribute(&self) -> String {
        self.core.attribute()
    }

    fn data_type(&self) -> DataType {
        DataType::Bool
    }

    fn is_mandatory(&self) -> bool {
        false
    }

    fn read(&self) -> Option<Value> {
        let value = Value::Bool(self.widget.is_active());
        if let Some(validator) = self.validator.lock().clone() {
            if let Err(err) = validator.check(&value) {
                self.feedback.invalid(err.message(), Instant::now());
                return None;
            }
        }
        self.feedback.valid();
        Some(value)
    }

    fn update(&self, value: ValueUpdate) {
        let _guard = self.block_scope();
        if is_empty_update(&value) {
            self.widget.set_active(false);
            self.feedback.valid();
            return;
        }
        let ValueUpdate::Value(value) = value else {
            unreachable!()
        };
        self.core.assert_value_type(&value);
        self.widget.set_active(value.as_bool().unwrap_or(false));
        self.feedback.valid();
    }

    fn is_blocked(&self) -> bool {
        self.core.is_blocked()
    }

    fn begin_block(&self) {
        self.core.begin_block();
    }

    fn end_block(&self) {
        self.core.end_block();
    }

    fn attach(&self, attribute: &str) -> Result<(), BindingError> {
        self.core.mark_attached(attribute)
    }

    fn is_attached(&self) -> bool {
        self.core.is_attached()
    }

    fn capture_default(&self) {
        let captured = self.read();
        *self.default.lock() = captured;
    }

    fn default_value(&self) -> Option<Value> {
        self.default.lock().clone()
    }

    fn set_user_write_handler(&self, handler: UserWriteHandler) {
        self.core.set_user_write_handler(handler);
    }

    fn detach(&self) {
        self.widget.toggled().disconnect(self.edit_connection);
        self.feedback.detach();
    }
}
