//! Adapter for radio-button groups.
//!
//! A whole set of radio buttons jointly represents one attribute: each
//! member carries the value it stands for, `read` scans for the active
//! member, and `update` activates the member representing the target value
//! while deactivating the rest. The adapter also enforces exclusivity when
//! the user clicks, so the underlying toggles need no grouping support of
//! their own.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use trellis_core::ConnectionId;

use super::{Adapter, AdapterCore, AdapterExt, BindingError, UserWriteHandler, is_empty_update};
use crate::convert::{DataType, Value, ValueUpdate};
use crate::toolkit::ToggleWidget;
use crate::validate::FeedbackSurface;

/// A toggle that can also display validation feedback.
pub trait GroupMember: ToggleWidget + FeedbackSurface {}

impl<T: ToggleWidget + FeedbackSurface> GroupMember for T {}

/// Binds a set of radio buttons to one model attribute.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trellis::binding::{Adapter, RadioGroupAdapter};
/// use trellis::convert::{Value, ValueUpdate};
/// use trellis::toolkit::ToggleWidget;
/// use trellis::toolkit::headless::RadioButton;
///
/// let male = Arc::new(RadioButton::new("sex_male"));
/// let female = Arc::new(RadioButton::new("sex_female"));
/// let adapter = RadioGroupAdapter::new(vec![
///     (male.clone(), Value::Str("M".into())),
///     (female.clone(), Value::Str("F".into())),
/// ]);
///
/// adapter.update(ValueUpdate::Value(Value::Str("F".into())));
/// assert!(female.is_active());
/// assert!(!male.is_active());
/// assert_eq!(adapter.read(), Some(Value::Str("F".into())));
/// ```
pub struct RadioGroupAdapter {
    core: AdapterCore,
    members: Vec<(Arc<dyn GroupMember>, Value)>,
    default: Mutex<Option<Value>>,
    edit_connections: Vec<ConnectionId>,
}

impl RadioGroupAdapter {
    /// Create an adapter over `members`, each paired with the value it
    /// represents.
    ///
    /// # Panics
    ///
    /// Panics if `members` is empty or the member values do not all share
    /// one data type - both are wiring bugs, reported at construction.
    pub fn new<W>(members: Vec<(Arc<W>, Value)>) -> Arc<Self>
    where
        W: GroupMember + 'static,
    {
        let members: Vec<(Arc<dyn GroupMember>, Value)> = members
            .into_iter()
            .map(|(w, v)| (w as Arc<dyn GroupMember>, v))
            .collect();

        assert!(
            !members.is_empty(),
            "a radio group needs at least one member"
        );
        let data_type = members[0].1.data_type();
        for (widget, value) in &members {
            assert!(
                value.data_type() == data_type,
                "radio button '{}' carries a {} value in a group of {}",
                widget.name(),
                value.data_type(),
                data_type
            );
        }

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let edit_connections = members
                .iter()
                .enumerate()
                .map(|(index, (widget, _))| {
                    let weak = weak.clone();
                    widget.toggled().connect(move |_| {
                        if let Some(adapter) = weak.upgrade() {
                            adapter.on_member_toggled(index);
                        }
                    })
                })
                .collect();
            Self {
                core: AdapterCore::new(data_type),
                members,
                default: Mutex::new(None),
                edit_connections,
            }
        })
    }

    /// Require a selection, driving the "missing input" indicator on every
    /// member.
    ///
    /// # Panics
    ///
    /// Panics if called after the adapter is attached to a proxy.
    pub fn set_mandatory(&self, mandatory: bool) {
        self.core.set_mandatory(mandatory);
        if !mandatory {
            self.set_missing(false);
        }
    }

    fn set_missing(&self, on: bool) {
        for (widget, _) in &self.members {
            widget.set_missing_indicator(on);
        }
    }

    fn active_member(&self) -> Option<&(Arc<dyn GroupMember>, Value)> {
        self.members.iter().find(|(widget, _)| widget.is_active())
    }

    fn on_member_toggled(self: &Arc<Self>, index: usize) {
        if self.core.is_blocked() {
            return;
        }
        // Enforce exclusivity: activating one member deactivates the rest.
        if self.members[index].0.is_active() {
            let _guard = self.block_scope();
            for (i, (widget, _)) in self.members.iter().enumerate() {
                if i != index && widget.is_active() {
                    widget.set_active(false);
                }
            }
        }
        if let Some(value) = self.read() {
            self.core.deliver_user_value(value);
        }
    }
}

impl Adapter for RadioGroupAdapter {
    fn attribute(&self) -> String {
        self.core.attribute()
    }

    fn data_type(&self) -> DataType {
        self.core.data_type()
    }

    fn is_mandatory(&self) -> bool {
        self.core.is_mandatory()
    }

    fn read(&self) -> Option<Value> {
        match self.active_member() {
            Some((_, value)) => {
                if self.core.is_mandatory() {
                    self.set_missing(false);
                }
                Some(value.clone())
            }
            None => {
                if self.core.is_mandatory() {
                    self.set_missing(true);
                }
                None
            }
        }
    }

    fn update(&self, value: ValueUpdate) {
        let _guard = self.block_scope();

        if is_empty_update(&value) {
            for (widget, _) in &self.members {
                widget.set_active(false);
            }
            if self.core.is_mandatory() {
                self.set_missing(true);
            }
            return;
        }

        let ValueUpdate::Value(value) = value else {
            unreachable!()
        };
        self.core.assert_value_type(&value);

        let matched = self.members.iter().any(|(_, v)| *v == value);
        assert!(
            matched,
            "no radio button in group '{}' represents value {:?}",
            self.core.attribute(),
            value
        );

        for (widget, member_value) in &self.members {
            widget.set_active(*member_value == value);
        }
        if self.core.is_mandatory() {
            self.set_missing(false);
        }
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
        for ((widget, _), connection) in self.members.iter().zip(&self.edit_connections) {
            widget.toggled().disconnect(*connection);
        }
        self.set_missing(false);
    }
}
