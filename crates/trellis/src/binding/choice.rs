//! Adapter for pick-one selection widgets.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use trellis_core::ConnectionId;

use super::{Adapter, AdapterCore, AdapterExt, BindingError, UserWriteHandler, is_empty_update};
use crate::convert::{DataType, Value, ValueUpdate};
use crate::toolkit::ChoiceWidget;
use crate::validate::FeedbackSurface;

/// A choice widget that can also display validation feedback.
pub trait BindableChoice: ChoiceWidget + FeedbackSurface {}

impl<T: ChoiceWidget + FeedbackSurface> BindableChoice for T {}

/// Binds a selection menu to one model attribute.
///
/// The adapter owns the mapping from displayed item to semantic value. The
/// item list may be swapped at runtime with [`set_choices`] - selection
/// menus are routinely repopulated before they can accept a new value.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trellis::binding::{Adapter, ChoiceAdapter};
/// use trellis::convert::{DataType, Value, ValueUpdate};
/// use trellis::toolkit::ChoiceWidget;
/// use trellis::toolkit::headless::ChoiceBox;
///
/// let choice = Arc::new(ChoiceBox::new("state"));
/// let adapter = ChoiceAdapter::new(choice.clone(), DataType::Int, vec![
///     ("Draft".to_string(), Value::Int(0)),
///     ("Published".to_string(), Value::Int(1)),
/// ]);
///
/// adapter.update(ValueUpdate::Value(Value::Int(1)));
/// assert_eq!(choice.selected().as_deref(), Some("Published"));
/// assert_eq!(adapter.read(), Some(Value::Int(1)));
/// ```
///
/// [`set_choices`]: ChoiceAdapter::set_choices
pub struct ChoiceAdapter {
    core: AdapterCore,
    widget: Arc<dyn BindableChoice>,
    entries: Mutex<Vec<(String, Value)>>,
    default: Mutex<Option<Value>>,
    edit_connection: ConnectionId,
}

impl ChoiceAdapter {
    /// Create an adapter for `widget` with the given item-to-value entries.
    ///
    /// The widget's item list is replaced by the entry labels. `entries`
    /// may be empty (to be populated later via [`set_choices`]); the bound
    /// data type is therefore explicit.
    ///
    /// # Panics
    ///
    /// Panics if an entry value is not accepted by `data_type`.
    ///
    /// [`set_choices`]: ChoiceAdapter::set_choices
    pub fn new<W>(widget: Arc<W>, data_type: DataType, entries: Vec<(String, Value)>) -> Arc<Self>
    where
        W: BindableChoice + 'static,
    {
        for (item, value) in &entries {
            assert!(
                data_type.accepts(value),
                "choice item '{item}' carries a {} value but the adapter is bound as {}",
                value.data_type(),
                data_type
            );
        }

        let choice: Arc<dyn BindableChoice> = widget;
        choice.set_items(entries.iter().map(|(item, _)| item.clone()).collect());

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let edit_connection = choice.selection_changed().connect(move |_| {
                if let Some(adapter) = weak.upgrade() {
                    adapter.on_selection_changed();
                }
            });
            Self {
                core: AdapterCore::new(data_type),
                widget: choice.clone(),
                entries: Mutex::new(entries),
                default: Mutex::new(None),
                edit_connection,
            }
        })
    }

    /// Replace the selectable entries.
    ///
    /// Allowed at any time - repopulation is a runtime operation, not
    /// configuration. The selection is cleared; callers typically follow
    /// with an [`update`](Adapter::update) to restore one. No model write
    /// results from the swap.
    ///
    /// # Panics
    ///
    /// Panics if an entry value is not accepted by the bound data type.
    pub fn set_choices(&self, entries: Vec<(String, Value)>) {
        let data_type = self.core.data_type();
        for (item, value) in &entries {
            assert!(
                data_type.accepts(value),
                "choice item '{item}' carries a {} value but attribute '{}' is bound as {}",
                value.data_type(),
                self.core.attribute(),
                data_type
            );
        }

        let _guard = self.block_scope();
        self.widget
            .set_items(entries.iter().map(|(item, _)| item.clone()).collect());
        *self.entries.lock() = entries;
    }

    /// Require a selection, driving the "missing input" indicator.
    ///
    /// # Panics
    ///
    /// Panics if called after the adapter is attached to a proxy.
    pub fn set_mandatory(&self, mandatory: bool) {
        self.core.set_mandatory(mandatory);
        if !mandatory {
            self.widget.set_missing_indicator(false);
        }
    }

    fn on_selection_changed(self: &Arc<Self>) {
        if self.core.is_blocked() {
            return;
        }
        if let Some(value) = self.read() {
            self.core.deliver_user_value(value);
        }
    }
}

impl Adapter for ChoiceAdapter {
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
        let Some(item) = self.widget.selected() else {
            if self.core.is_mandatory() {
                self.widget.set_missing_indicator(true);
            }
            return None;
        };

        let entries = self.entries.lock();
        let value = entries
            .iter()
            .find(|(entry_item, _)| *entry_item == item)
            .map(|(_, value)| value.clone())
            .unwrap_or_else(|| {
                panic!(
                    "choice widget for attribute '{}' selected item '{item}' which has no mapped value",
                    self.core.attribute()
                )
            });
        drop(entries);

        if self.core.is_mandatory() {
            self.widget.set_missing_indicator(false);
        }
        Some(value)
    }

    fn update(&self, value: ValueUpdate) {
        let _guard = self.block_scope();

        if is_empty_update(&value) {
            self.widget.clear_selection();
            if self.core.is_mandatory() {
                self.widget.set_missing_indicator(true);
            }
            return;
        }

        let ValueUpdate::Value(value) = value else {
            unreachable!()
        };
        self.core.assert_value_type(&value);

        let item = self
            .entries
            .lock()
            .iter()
            .find(|(_, entry_value)| *entry_value == value)
            .map(|(item, _)| item.clone())
            .unwrap_or_else(|| {
                panic!(
                    "no choice in '{}' represents value {:?}",
                    self.core.attribute(),
                    value
                )
            });

        let selected = self.widget.select(&item);
        assert!(
            selected,
            "choice widget for attribute '{}' has no item '{item}'",
            self.core.attribute()
        );
        if self.core.is_mandatory() {
            self.widget.set_missing_indicator(false);
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
        self.widget
            .selection_changed()
            .disconnect(self.edit_connection);
        self.widget.set_missing_indicator(false);
    }
}
