//! Adapter for display-only widgets.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Adapter, AdapterCore, AdapterExt, BindingError, UserWriteHandler, is_empty_update};
use crate::convert::{Converter, DataType, Value, ValueUpdate, registry};
use crate::toolkit::TextWidget;

/// Binds a display-only widget (a label) to one model attribute.
///
/// Values flow model-to-widget only; there is no interaction signal to
/// connect and no validation feedback. `read` parses whatever is displayed,
/// which round-trips values previously pushed with `update`.
pub struct DisplayAdapter {
    core: AdapterCore,
    widget: Arc<dyn TextWidget>,
    converter: Mutex<Option<Arc<dyn Converter>>>,
    default: Mutex<Option<Value>>,
}

impl DisplayAdapter {
    /// Create an adapter for `widget`.
    pub fn new<W>(widget: Arc<W>) -> Arc<Self>
    where
        W: TextWidget + 'static,
    {
        Arc::new(Self {
            core: AdapterCore::new(DataType::Str),
            widget,
            converter: Mutex::new(None),
            default: Mutex::new(None),
        })
    }

    /// Set the bound data type.
    ///
    /// # Panics
    ///
    /// Panics if called after the adapter is attached to a proxy.
    pub fn set_data_type(&self, data_type: DataType) {
        self.core.set_data_type(data_type);
    }

    /// Set the display format (printf-style for numbers, strftime for dates).
    ///
    /// # Panics
    ///
    /// Panics if called after the adapter is attached to a proxy.
    pub fn set_format(&self, format: impl Into<String>) {
        self.core.set_format(Some(format.into()));
    }

    fn active_converter(&self) -> Option<Arc<dyn Converter>> {
        if let Some(converter) = self.converter.lock().clone() {
            return Some(converter);
        }
        registry::converter(self.core.data_type())
    }
}

impl Adapter for DisplayAdapter {
    fn attribute(&self) -> String {
        self.core.attribute()
    }

    fn data_type(&self) -> DataType {
        self.core.data_type()
    }

    fn is_mandatory(&self) -> bool {
        false
    }

    fn read(&self) -> Option<Value> {
        let text = self.widget.displayed_text();
        if text.trim().is_empty() {
            return self.default.lock().clone();
        }
        let converter = self.active_converter()?;
        match converter.from_display(text.trim()) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(
                    target: "trellis::binding",
                    attribute = %self.core.attribute(),
                    error = %err,
                    "displayed text does not parse"
                );
                None
            }
        }
    }

    fn update(&self, value: ValueUpdate) {
        let _guard = self.block_scope();

        if is_empty_update(&value) {
            self.widget.set_displayed_text("");
            return;
        }
        let ValueUpdate::Value(value) = value else {
            unreachable!()
        };
        self.core.assert_value_type(&value);

        let converter = self.active_converter().unwrap_or_else(|| {
            panic!(
                "no converter registered for type '{}' (attribute '{}')",
                self.core.data_type(),
                self.core.attribute()
            )
        });
        let format = self.core.format();
        let text = converter
            .to_display(&value, format.as_deref())
            .unwrap_or_else(|err| {
                panic!(
                    "cannot render attribute '{}' for display: {err}",
                    self.core.attribute()
                )
            });
        self.widget.set_displayed_text(&text);
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
        {
            let mut slot = self.converter.lock();
            if slot.is_none() {
                let data_type = self.core.data_type();
                *slot = Some(registry::converter(data_type).ok_or(
                    BindingError::MissingConverter {
                        attribute: attribute.to_string(),
                        data_type,
                    },
                )?);
            }
        }
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

    fn set_user_write_handler(&self, _handler: UserWriteHandler) {
        // Display-only: there is no user edit to deliver.
    }

    fn detach(&self) {}
}
