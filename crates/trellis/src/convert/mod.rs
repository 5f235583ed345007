//! Semantic values and locale-aware type conversion.
//!
//! Widgets display text; models hold typed values. This module is the
//! conversion layer between the two:
//!
//! - [`Value`] - a tagged runtime value (string, integer, float, boolean,
//!   date, opaque object)
//! - [`DataType`] - the semantic type key an attribute is bound to
//! - [`ValueUpdate`] - the three-way "unset / null / value" type used by
//!   programmatic updates
//! - [`ConversionError`] - recoverable failure carrying a user-facing message
//! - the process-wide converter [`registry`](crate::convert::registry)
//!
//! Numeric and date converters consult the process locale once, when they
//! are constructed, and cache the derived separators and patterns. Changing
//! the process locale afterwards does not retroactively change conversion
//! behavior.
//!
//! # Example
//!
//! ```
//! use trellis::convert::{DataType, Value, from_display, to_display};
//!
//! let text = to_display(DataType::Int, &Value::Int(42), None).unwrap();
//! let value = from_display(DataType::Int, &text).unwrap();
//! assert_eq!(value, Value::Int(42));
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;

mod date;
mod number;
pub mod registry;

pub use date::DateFormat;
pub use number::{NumericFormat, apply_numeric_format};
pub use registry::{
    BoolConverter, Converter, DateConverter, FloatConverter, IntConverter, StrConverter,
    converter, from_display, parse_bool, register_converter, to_display,
};

/// The semantic type of a bound attribute.
///
/// Fixed once an attribute is bound; a widget adapter never changes its
/// data type after construction. `Named` is the extension point for
/// application-registered converters (see
/// [`register_converter`](registry::register_converter)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Plain text.
    Str,
    /// Signed integer.
    Int,
    /// Floating-point number.
    Float,
    /// Boolean.
    Bool,
    /// Calendar date (no time component).
    Date,
    /// Opaque application object; passed through without text conversion.
    Object,
    /// Application-defined type with a registered converter.
    Named(&'static str),
}

impl DataType {
    /// Human-readable type name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Bool => "boolean",
            Self::Date => "date",
            Self::Object => "object",
            Self::Named(name) => name,
        }
    }

    /// Whether a runtime value is acceptable for this data type.
    ///
    /// `Object` and `Named` types both accept [`Value::Object`]; everything
    /// else matches its own variant. `Str` additionally accepts nothing
    /// else - there is no implicit stringification.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Str, Value::Str(_))
                | (Self::Int, Value::Int(_))
                | (Self::Float, Value::Float(_))
                | (Self::Float, Value::Int(_))
                | (Self::Bool, Value::Bool(_))
                | (Self::Date, Value::Date(_))
                | (Self::Object, Value::Object(_))
                | (Self::Named(_), Value::Object(_))
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tagged runtime value flowing between model attributes and widgets.
#[derive(Clone)]
pub enum Value {
    /// Plain text.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Opaque application object. Compared by identity.
    Object(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// The data type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Str(_) => DataType::Str,
            Self::Int(_) => DataType::Int,
            Self::Float(_) => DataType::Float,
            Self::Bool(_) => DataType::Bool,
            Self::Date(_) => DataType::Date,
            Self::Object(_) => DataType::Object,
        }
    }

    /// Borrow the string content, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer content, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the float content; `Int` values widen losslessly where possible.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get the boolean content, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the date content, if this is a `Date`.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Downcast an `Object` value to a concrete type.
    pub fn downcast_object<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Self::Object(obj) => obj.clone().downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            // Opaque objects compare by identity.
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

/// The three-way value passed to programmatic widget updates.
///
/// Replaces the single "unset" sentinel object some binding frameworks use:
/// `Unset` means "no value was supplied" (e.g. "push the model's current
/// value"), `Null` means "explicitly no value" (empty the widget), and
/// `Value` carries an actual value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueUpdate {
    /// No value supplied; the callee decides (usually: read the model).
    Unset,
    /// Explicitly no value; widgets display empty content.
    Null,
    /// An actual value.
    Value(Value),
}

impl ValueUpdate {
    /// True for the `Unset` variant.
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Convert to an `Option`, folding `Unset` and `Null` to `None`.
    pub fn into_option(self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Build from an `Option`, mapping `None` to `Null`.
    pub fn from_option(value: Option<Value>) -> Self {
        match value {
            Some(v) => Self::Value(v),
            None => Self::Null,
        }
    }
}

impl From<Value> for ValueUpdate {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

/// A recoverable conversion failure.
///
/// Carries a human-readable message describing what was wrong with the
/// input. Conversion errors are never fatal: the binding layer captures
/// them as validation feedback state and the model keeps its last valid
/// value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ConversionError {
    message: String,
}

impl ConversionError {
    /// Create a conversion error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The user-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }
}
