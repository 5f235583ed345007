//! Process-wide converter registry.
//!
//! The registry maps a [`DataType`] to the [`Converter`] responsible for it.
//! Builtin converters for string, integer, float, boolean, and date types
//! are installed lazily on first access; each caches its locale-derived
//! settings (separators, date pattern) at that moment. Adding a converter
//! for a new type is an explicit [`register_converter`] call - there is no
//! reflection-based discovery.
//!
//! Opaque `Object` values have no default converter: they pass through the
//! binding layer by identity and never take a text form.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::convert::{Converter, ConversionError, DataType, Value, register_converter};
//!
//! struct UpperConverter;
//!
//! impl Converter for UpperConverter {
//!     fn to_display(&self, value: &Value, _format: Option<&str>) -> Result<String, ConversionError> {
//!         Ok(value.as_str().unwrap_or_default().to_uppercase())
//!     }
//!     fn from_display(&self, text: &str) -> Result<Value, ConversionError> {
//!         Ok(Value::Str(text.to_lowercase()))
//!     }
//! }
//!
//! register_converter(DataType::Named("shout"), Arc::new(UpperConverter));
//! ```

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::{ConversionError, DataType, DateFormat, NumericFormat, Value, apply_numeric_format};

/// Converts between semantic values and their textual widget representation.
///
/// `to_display` may honor an optional per-attribute format string
/// (printf-style for numbers, strftime-style for dates). `from_display`
/// reports malformed input as a recoverable [`ConversionError`], never a
/// panic.
pub trait Converter: Send + Sync {
    /// Render a value as widget display text.
    fn to_display(&self, value: &Value, format: Option<&str>) -> Result<String, ConversionError>;

    /// Parse widget display text back into a value.
    fn from_display(&self, text: &str) -> Result<Value, ConversionError>;
}

static REGISTRY: OnceLock<RwLock<HashMap<DataType, Arc<dyn Converter>>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<DataType, Arc<dyn Converter>>> {
    REGISTRY.get_or_init(|| {
        let mut map: HashMap<DataType, Arc<dyn Converter>> = HashMap::new();
        map.insert(DataType::Str, Arc::new(StrConverter));
        map.insert(DataType::Int, Arc::new(IntConverter::new()));
        map.insert(DataType::Float, Arc::new(FloatConverter::new()));
        map.insert(DataType::Bool, Arc::new(BoolConverter));
        map.insert(DataType::Date, Arc::new(DateConverter::new()));
        RwLock::new(map)
    })
}

/// Install or replace the converter for a data type.
pub fn register_converter(data_type: DataType, converter: Arc<dyn Converter>) {
    registry().write().insert(data_type, converter);
    tracing::debug!(target: "trellis::convert", %data_type, "converter registered");
}

/// Look up the converter for a data type.
pub fn converter(data_type: DataType) -> Option<Arc<dyn Converter>> {
    registry().read().get(&data_type).cloned()
}

/// Render a value through the registered converter for `data_type`.
pub fn to_display(
    data_type: DataType,
    value: &Value,
    format: Option<&str>,
) -> Result<String, ConversionError> {
    converter(data_type)
        .ok_or_else(|| {
            ConversionError::new(format!("no converter registered for type '{data_type}'"))
        })?
        .to_display(value, format)
}

/// Parse display text through the registered converter for `data_type`.
pub fn from_display(data_type: DataType, text: &str) -> Result<Value, ConversionError> {
    converter(data_type)
        .ok_or_else(|| {
            ConversionError::new(format!("no converter registered for type '{data_type}'"))
        })?
        .from_display(text)
}

/// Permissive boolean parse.
///
/// Recognizes `"true"`, `"1"`, `"false"`, `"0"` case-insensitively and
/// returns `None` for anything else, so callers can substitute a default.
/// This tolerates widget placeholder text without raising an error.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

// =============================================================================
// Builtin converters
// =============================================================================

/// Identity conversion for string attributes.
pub struct StrConverter;

impl Converter for StrConverter {
    fn to_display(&self, value: &Value, format: Option<&str>) -> Result<String, ConversionError> {
        let s = value
            .as_str()
            .ok_or_else(|| ConversionError::new("expected a string value"))?;
        Ok(match format {
            Some(fmt) if fmt.contains("%s") => fmt.replace("%s", s),
            _ => s.to_string(),
        })
    }

    fn from_display(&self, text: &str) -> Result<Value, ConversionError> {
        Ok(Value::Str(text.to_string()))
    }
}

/// Locale-aware integer conversion.
pub struct IntConverter {
    numeric: NumericFormat,
}

impl IntConverter {
    /// Converter for the current process locale.
    pub fn new() -> Self {
        Self {
            numeric: NumericFormat::system(),
        }
    }

    /// Converter with an explicit numeric format.
    pub fn with_format(numeric: NumericFormat) -> Self {
        Self { numeric }
    }
}

impl Default for IntConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for IntConverter {
    fn to_display(&self, value: &Value, format: Option<&str>) -> Result<String, ConversionError> {
        if let Some(fmt) = format {
            return apply_numeric_format(fmt, value);
        }
        let v = value
            .as_int()
            .ok_or_else(|| ConversionError::new("expected an integer value"))?;
        Ok(self.numeric.format_int(v))
    }

    fn from_display(&self, text: &str) -> Result<Value, ConversionError> {
        self.numeric.parse_int(text).map(Value::Int)
    }
}

/// Locale-aware float conversion.
pub struct FloatConverter {
    numeric: NumericFormat,
}

impl FloatConverter {
    /// Converter for the current process locale.
    pub fn new() -> Self {
        Self {
            numeric: NumericFormat::system(),
        }
    }

    /// Converter with an explicit numeric format.
    pub fn with_format(numeric: NumericFormat) -> Self {
        Self { numeric }
    }
}

impl Default for FloatConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for FloatConverter {
    fn to_display(&self, value: &Value, format: Option<&str>) -> Result<String, ConversionError> {
        if let Some(fmt) = format {
            return apply_numeric_format(fmt, value);
        }
        let v = value
            .as_float()
            .ok_or_else(|| ConversionError::new("expected a numeric value"))?;
        Ok(self.numeric.format_float(v))
    }

    fn from_display(&self, text: &str) -> Result<Value, ConversionError> {
        self.numeric.parse_float(text).map(Value::Float)
    }
}

/// Strict boolean conversion.
///
/// The strict set is `{"true", "1", "false", "0"}` case-insensitively.
/// Callers who want the permissive fallback use [`parse_bool`] and supply
/// their own default.
pub struct BoolConverter;

impl Converter for BoolConverter {
    fn to_display(&self, value: &Value, _format: Option<&str>) -> Result<String, ConversionError> {
        let v = value
            .as_bool()
            .ok_or_else(|| ConversionError::new("expected a boolean value"))?;
        Ok(if v { "true" } else { "false" }.to_string())
    }

    fn from_display(&self, text: &str) -> Result<Value, ConversionError> {
        parse_bool(text)
            .map(Value::Bool)
            .ok_or_else(|| ConversionError::new(format!("'{}' is not a boolean", text.trim())))
    }
}

/// Locale-aware date conversion.
pub struct DateConverter {
    format: DateFormat,
}

impl DateConverter {
    /// Converter for the current process locale.
    pub fn new() -> Self {
        Self {
            format: DateFormat::system(),
        }
    }

    /// Converter with an explicit date format.
    pub fn with_format(format: DateFormat) -> Self {
        Self { format }
    }
}

impl Default for DateConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for DateConverter {
    fn to_display(&self, value: &Value, format: Option<&str>) -> Result<String, ConversionError> {
        let d = value
            .as_date()
            .ok_or_else(|| ConversionError::new("expected a date value"))?;
        Ok(match format {
            Some(pattern) => DateFormat::with_pattern(pattern).format(d),
            None => self.format.format(d),
        })
    }

    fn from_display(&self, text: &str) -> Result<Value, ConversionError> {
        self.format.parse(text).map(Value::Date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_str_round_trip() {
        let conv = StrConverter;
        let text = conv.to_display(&Value::Str("hello".into()), None).unwrap();
        assert_eq!(conv.from_display(&text).unwrap(), Value::Str("hello".into()));
    }

    #[test]
    fn test_str_format_substitution() {
        let conv = StrConverter;
        assert_eq!(
            conv.to_display(&Value::Str("Bob".into()), Some("Name: %s"))
                .unwrap(),
            "Name: Bob"
        );
    }

    #[test]
    fn test_int_round_trip() {
        let conv = IntConverter::with_format(NumericFormat::for_locale("en-US"));
        for v in [0i64, 25, -7, 1234567] {
            let text = conv.to_display(&Value::Int(v), None).unwrap();
            assert_eq!(conv.from_display(&text).unwrap(), Value::Int(v));
        }
    }

    #[test]
    fn test_int_explicit_format_is_lossy_on_purpose() {
        let conv = IntConverter::with_format(NumericFormat::for_locale("en-US"));
        assert_eq!(
            conv.to_display(&Value::Int(255), Some("%X")).unwrap(),
            "FF"
        );
    }

    #[test]
    fn test_float_round_trip() {
        let conv = FloatConverter::with_format(NumericFormat::for_locale("de-DE"));
        for v in [0.0, 0.25, -1234.5, 23400.2] {
            let text = conv.to_display(&Value::Float(v), None).unwrap();
            assert_eq!(conv.from_display(&text).unwrap(), Value::Float(v));
        }
    }

    #[test]
    fn test_bool_strict_set() {
        let conv = BoolConverter;
        assert_eq!(conv.from_display("true").unwrap(), Value::Bool(true));
        assert_eq!(conv.from_display("TRUE").unwrap(), Value::Bool(true));
        assert_eq!(conv.from_display("1").unwrap(), Value::Bool(true));
        assert_eq!(conv.from_display("false").unwrap(), Value::Bool(false));
        assert_eq!(conv.from_display("0").unwrap(), Value::Bool(false));
        assert!(conv.from_display("yes").is_err());
    }

    #[test]
    fn test_parse_bool_permissive() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        // Placeholder text falls back to the caller's default.
        assert_eq!(parse_bool("Click to toggle"), None);
    }

    #[test]
    fn test_date_round_trip_and_explicit_format() {
        let conv = DateConverter::with_format(DateFormat::for_locale("en-US"));
        let d = NaiveDate::from_ymd_opt(2026, 8, 8).unwrap();
        let text = conv.to_display(&Value::Date(d), None).unwrap();
        assert_eq!(conv.from_display(&text).unwrap(), Value::Date(d));
        assert_eq!(
            conv.to_display(&Value::Date(d), Some("%Y-%m")).unwrap(),
            "2026-08"
        );
    }

    #[test]
    fn test_registry_custom_type() {
        struct PercentConverter;
        impl Converter for PercentConverter {
            fn to_display(
                &self,
                value: &Value,
                _format: Option<&str>,
            ) -> Result<String, ConversionError> {
                let v = value
                    .as_float()
                    .ok_or_else(|| ConversionError::new("expected a number"))?;
                Ok(format!("{}%", v * 100.0))
            }
            fn from_display(&self, text: &str) -> Result<Value, ConversionError> {
                let body = text.trim().trim_end_matches('%');
                body.parse::<f64>()
                    .map(|v| Value::Float(v / 100.0))
                    .map_err(|_| ConversionError::new(format!("'{text}' is not a percentage")))
            }
        }

        register_converter(DataType::Named("percent"), Arc::new(PercentConverter));
        let conv = converter(DataType::Named("percent")).unwrap();
        assert_eq!(conv.from_display("50%").unwrap(), Value::Float(0.5));
    }

    #[test]
    fn test_object_has_no_default_converter() {
        assert!(converter(DataType::Object).is_none());
        assert!(from_display(DataType::Object, "anything").is_err());
    }

    #[test]
    fn test_builtin_lookup() {
        for ty in [
            DataType::Str,
            DataType::Int,
            DataType::Float,
            DataType::Bool,
            DataType::Date,
        ] {
            assert!(converter(ty).is_some(), "missing builtin for {ty}");
        }
    }
}
