//! Adapter for text-displaying widgets.
//!
//! [`TextAdapter`] binds entries, multiline views, and numeric spinners -
//! anything implementing [`TextWidget`] plus
//! [`FeedbackSurface`](crate::validate::FeedbackSurface) - to one model
//! attribute. It owns the conversion configuration (data type, optional
//! format string, mandatory flag, custom validator) and a
//! [`FeedbackMachine`] driving deferred error announcement.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::binding::{Adapter, TextAdapter};
//! use trellis::convert::{DataType, Value, ValueUpdate};
//! use trellis::toolkit::TextWidget;
//! use trellis::toolkit::headless::Entry;
//! use trellis_core::Scheduler;
//!
//! let scheduler = Arc::new(Scheduler::new());
//! let entry = Arc::new(Entry::new("age"));
//! let adapter = TextAdapter::new(entry.clone(), scheduler);
//! adapter.set_data_type(DataType::Int);
//!
//! entry.type_text("25");
//! assert_eq!(adapter.read(), Some(Value::Int(25)));
//!
//! adapter.update(ValueUpdate::Value(Value::Int(40)));
//! assert_eq!(entry.displayed_text(), "40");
//! ```

use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;
use trellis_core::{ConnectionId, Scheduler};

use super::{Adapter, AdapterCore, AdapterExt, BindingError, UserWriteHandler, is_empty_update};
use crate::convert::{Converter, DataType, Value, ValueUpdate, registry};
use crate::toolkit::TextWidget;
use crate::validate::{FeedbackConfig, FeedbackMachine, FeedbackPhase, FeedbackSurface, Validator};

/// Binds one text-displaying widget to one model attribute.
pub struct TextAdapter {
    core: AdapterCore,
    widget: Arc<dyn TextWidget>,
    surface: Arc<dyn FeedbackSurface>,
    feedback: Arc<FeedbackMachine>,
    /// Resolved at attach (or explicitly injected); fresh registry lookups
    /// before that, so pre-attach type changes take effect.
    converter: Mutex<Option<Arc<dyn Converter>>>,
    validator: Mutex<Option<Arc<dyn Validator>>>,
    default: Mutex<Option<Value>>,
    edit_connection: ConnectionId,
}

impl TextAdapter {
    /// Create an adapter for `widget` with default feedback timing.
    ///
    /// The bound data type starts as [`DataType::Str`]; configure it before
    /// attaching the adapter to a proxy.
    pub fn new<W>(widget: Arc<W>, scheduler: Arc<Scheduler>) -> Arc<Self>
    where
        W: TextWidget + FeedbackSurface + 'static,
    {
        Self::with_config(widget, scheduler, FeedbackConfig::default())
    }

    /// Create an adapter with explicit feedback timing.
    pub fn with_config<W>(
        widget: Arc<W>,
        scheduler: Arc<Scheduler>,
        config: FeedbackConfig,
    ) -> Arc<Self>
    where
        W: TextWidget + FeedbackSurface + 'static,
    {
        let surface: Arc<dyn FeedbackSurface> = widget.clone();
        let feedback = FeedbackMachine::new(scheduler, surface.clone(), config);
        let text_widget: Arc<dyn TextWidget> = widget;

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let edit_connection = text_widget.text_changed().connect(move |_| {
                if let Some(adapter) = weak.upgrade() {
                    adapter.on_widget_edit();
                }
            });
            Self {
                core: AdapterCore::new(DataType::Str),
                widget: text_widget.clone(),
                surface,
                feedback,
                converter: Mutex::new(None),
                validator: Mutex::new(None),
                default: Mutex::new(None),
                edit_connection,
            }
        })
    }

    // =========================================================================
    // Pre-attach configuration
    // =========================================================================

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

    /// Mark the content numeric; a non-numeric current type becomes
    /// [`DataType::Float`]. `false` reverts to [`DataType::Str`].
    ///
    /// # Panics
    ///
    /// Panics if called after the adapter is attached to a proxy.
    pub fn set_numeric(&self, numeric: bool) {
        let current = self.core.data_type();
        if numeric {
            if !matches!(current, DataType::Int | DataType::Float) {
                self.core.set_data_type(DataType::Float);
            }
        } else if matches!(current, DataType::Int | DataType::Float) {
            self.core.set_data_type(DataType::Str);
        }
    }

    /// Mark the content as a date. `false` reverts to [`DataType::Str`].
    ///
    /// # Panics
    ///
    /// Panics if called after the adapter is attached to a proxy.
    pub fn set_datetime(&self, datetime: bool) {
        let current = self.core.data_type();
        if datetime {
            self.core.set_data_type(DataType::Date);
        } else if current == DataType::Date {
            self.core.set_data_type(DataType::Str);
        }
    }

    /// Require non-empty content, driving the "missing input" indicator.
    ///
    /// # Panics
    ///
    /// Panics if called after the adapter is attached to a proxy.
    pub fn set_mandatory(&self, mandatory: bool) {
        self.core.set_mandatory(mandatory);
        if !mandatory {
            self.surface.set_missing_indicator(false);
        }
    }

    /// Attach a custom validator, checked after conversion succeeds.
    pub fn set_validator(&self, validator: Arc<dyn Validator>) {
        *self.validator.lock() = Some(validator);
    }

    /// Inject an explicit converter, bypassing the registry lookup.
    ///
    /// # Panics
    ///
    /// Panics if called after the adapter is attached to a proxy.
    pub fn set_converter(&self, converter: Arc<dyn Converter>) {
        assert!(
            !self.core.is_attached(),
            "set_converter called on the adapter for attribute '{}' after it was attached",
            self.core.attribute()
        );
        *self.converter.lock() = Some(converter);
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// The current announcement phase of the displayed content.
    pub fn feedback_phase(&self) -> FeedbackPhase {
        self.feedback.phase()
    }

    /// The failure message currently attached, if any.
    pub fn feedback_message(&self) -> Option<String> {
        self.feedback.message()
    }

    fn active_converter(&self) -> Option<Arc<dyn Converter>> {
        if let Some(converter) = self.converter.lock().clone() {
            return Some(converter);
        }
        registry::converter(self.core.data_type())
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

impl Adapter for TextAdapter {
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
        let text = self.widget.displayed_text();
        let trimmed = text.trim();

        if trimmed.is_empty() {
            if self.core.is_mandatory() {
                self.surface.set_missing_indicator(true);
                self.feedback.invalid("this field is mandatory", Instant::now());
                return None;
            }
            self.feedback.valid();
            return self.default.lock().clone();
        }

        let converted = if self.core.data_type() == DataType::Bool {
            // Permissive boolean parse: placeholder text falls back to the
            // configured default instead of erroring.
            let fallback = self
                .default
                .lock()
                .as_ref()
                .and_then(Value::as_bool)
                .unwrap_or(false);
            Ok(Value::Bool(registry::parse_bool(trimmed).unwrap_or(fallback)))
        } else {
            match self.active_converter() {
                Some(converter) => converter.from_display(trimmed),
                None => {
                    return None;
                }
            }
        };

        let value = match converted {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(
                    target: "trellis::binding",
                    attribute = %self.core.attribute(),
                    error = %err,
                    "conversion failed"
                );
                self.feedback.invalid(err.message(), Instant::now());
                return None;
            }
        };

        if let Some(validator) = self.validator.lock().clone() {
            if let Err(err) = validator.check(&value) {
                self.feedback.invalid(err.message(), Instant::now());
                return None;
            }
        }

        if self.core.is_mandatory() {
            self.surface.set_missing_indicator(false);
        }
        self.feedback.valid();
        Some(value)
    }

    fn update(&self, value: ValueUpdate) {
        let _guard = self.block_scope();

        if is_empty_update(&value) {
            self.widget.set_displayed_text("");
            if self.core.is_mandatory() {
                self.surface.set_missing_indicator(true);
            }
            self.feedback.valid();
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
        if self.core.is_mandatory() {
            self.surface.set_missing_indicator(text.trim().is_empty());
        }
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

    fn set_user_write_handler(&self, handler: UserWriteHandler) {
        self.core.set_user_write_handler(handler);
    }

    fn detach(&self) {
        self.widget.text_changed().disconnect(self.edit_connection);
        self.feedback.detach();
        self.surface.set_missing_indicator(false);
    }
}
