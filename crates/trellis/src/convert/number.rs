//! Locale-aware numeric formatting and parsing.
//!
//! A [`NumericFormat`] caches the decimal and thousands separators of a
//! locale at construction time. Parsing is strict about separator placement:
//! a string whose separators are inconsistent with the locale convention is
//! a [`ConversionError`], never a silently-wrong number.
//!
//! The accepted shape is sign, digit groups, optional fraction:
//!
//! - at most one decimal separator;
//! - no thousands separator at or right of the decimal separator;
//! - when thousands separators are present, the leading digit group has
//!   one to three digits and every following group exactly three.
//!
//! Exponent notation is not accepted from widgets.

use super::{ConversionError, Value};

/// Cached locale separators for numeric conversion.
///
/// Constructed once per converter; changing the process locale afterwards
/// does not affect existing instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericFormat {
    /// Character separating digit groups in the integer part.
    thousands_sep: char,
    /// Character separating the integer and fractional parts.
    decimal_sep: char,
}

impl NumericFormat {
    /// Create a format for the current process locale.
    pub fn system() -> Self {
        let locale = sys_locale::get_locale().unwrap_or_else(|| "en-US".to_string());
        Self::for_locale(&locale)
    }

    /// Create a format for a specific locale identifier.
    ///
    /// Supports locale-aware separators for common locales:
    /// - `en-US`, `en-GB`, `ja-JP`, `zh-CN`, ...: 1,234.56
    /// - `de-DE`, `es-ES`, `it-IT`, `pt-BR`, ...: 1.234,56
    /// - `fr-FR`, `sv-SE`, `ru-RU`, ...: 1 234,56 (narrow no-break space)
    pub fn for_locale(locale: &str) -> Self {
        let lang = locale
            .split(['-', '_'])
            .next()
            .unwrap_or("en")
            .to_lowercase();

        // Locales using comma as decimal separator (and period/space as thousands)
        let comma_decimal = matches!(
            lang.as_str(),
            "de" | "fr" | "es" | "it" | "pt" | "nl" | "da" | "fi" | "nb" | "nn" | "sv"
                | "pl" | "cs" | "sk" | "hu" | "ro" | "bg" | "hr" | "sl" | "sr" | "uk" | "ru"
                | "el" | "tr" | "vi" | "id" | "ca" | "gl" | "eu" | "et" | "lv" | "lt"
        );

        // French and some others use space as thousands separator
        let space_thousands = matches!(
            lang.as_str(),
            "fr" | "fi" | "sv" | "nb" | "nn" | "pl" | "cs" | "sk" | "ru" | "uk" | "bg"
        );

        let (thousands_sep, decimal_sep) = if comma_decimal {
            if space_thousands {
                ('\u{202F}', ',') // Narrow no-break space, comma
            } else {
                ('.', ',')
            }
        } else {
            (',', '.')
        };

        Self {
            thousands_sep,
            decimal_sep,
        }
    }

    /// Create a format with explicit separators.
    ///
    /// # Panics
    ///
    /// Panics if the two separators are equal; the parse would be ambiguous.
    pub fn with_separators(thousands_sep: char, decimal_sep: char) -> Self {
        assert_ne!(
            thousands_sep, decimal_sep,
            "thousands and decimal separators must differ"
        );
        Self {
            thousands_sep,
            decimal_sep,
        }
    }

    /// The thousands separator character.
    pub fn thousands_separator(&self) -> char {
        self.thousands_sep
    }

    /// The decimal separator character.
    pub fn decimal_separator(&self) -> char {
        self.decimal_sep
    }

    /// Whether `c` counts as this locale's thousands separator.
    ///
    /// Space-separated locales accept the ASCII space and both no-break
    /// space variants interchangeably.
    fn is_thousands(&self, c: char) -> bool {
        if c == self.thousands_sep {
            return true;
        }
        matches!(self.thousands_sep, ' ' | '\u{00A0}' | '\u{202F}')
            && matches!(c, ' ' | '\u{00A0}' | '\u{202F}')
    }

    // =========================================================================
    // Formatting
    // =========================================================================

    /// Format an integer with thousands separators.
    pub fn format_int(&self, value: i64) -> String {
        let digits = value.unsigned_abs().to_string();
        let grouped = self.group_digits(&digits);
        if value < 0 {
            format!("-{grouped}")
        } else {
            grouped
        }
    }

    /// Format a float with the shortest representation that round-trips.
    pub fn format_float(&self, value: f64) -> String {
        self.localize_float_string(&format!("{}", value))
    }

    /// Format a float with a fixed number of decimal places.
    pub fn format_float_with_precision(&self, value: f64, decimal_places: usize) -> String {
        self.localize_float_string(&format!("{:.prec$}", value, prec = decimal_places))
    }

    /// Replace the plain '.'/'-' rendering of a float with localized
    /// separators and digit grouping.
    fn localize_float_string(&self, plain: &str) -> String {
        let (sign, rest) = match plain.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", plain),
        };
        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (rest, None),
        };
        let grouped = self.group_digits(int_part);
        match frac_part {
            Some(frac) => format!("{sign}{grouped}{}{frac}", self.decimal_sep),
            None => format!("{sign}{grouped}"),
        }
    }

    /// Insert the thousands separator every three digits from the right.
    fn group_digits(&self, digits: &str) -> String {
        let len = digits.len();
        if len <= 3 {
            return digits.to_string();
        }
        let mut result = String::with_capacity(len + len / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                result.push(self.thousands_sep);
            }
            result.push(c);
        }
        result
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    /// Parse an integer, enforcing locale separator placement.
    pub fn parse_int(&self, text: &str) -> Result<i64, ConversionError> {
        let normalized = self.normalize(text)?;
        if normalized.contains('.') {
            return Err(ConversionError::new(format!(
                "'{}' is not an integer",
                text.trim()
            )));
        }
        normalized.parse::<i64>().map_err(|_| {
            ConversionError::new(format!("'{}' is out of range for an integer", text.trim()))
        })
    }

    /// Parse a float, enforcing locale separator placement.
    pub fn parse_float(&self, text: &str) -> Result<f64, ConversionError> {
        let normalized = self.normalize(text)?;
        normalized
            .parse::<f64>()
            .map_err(|_| ConversionError::new(format!("'{}' is not a number", text.trim())))
    }

    /// Strip thousands separators and rewrite the decimal separator to '.',
    /// validating placement along the way.
    fn normalize(&self, text: &str) -> Result<String, ConversionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ConversionError::new("empty string is not a number"));
        }

        let (sign, body) = match trimmed.strip_prefix(['-', '+']) {
            Some(rest) => (&trimmed[..1], rest),
            None => ("", trimmed),
        };
        let sign = if sign == "+" { "" } else { sign };

        if body.chars().filter(|&c| c == self.decimal_sep).count() > 1 {
            return Err(ConversionError::new(format!(
                "'{trimmed}' has more than one decimal separator ('{}')",
                self.decimal_sep
            )));
        }

        let (int_part, frac_part) = match body.split_once(self.decimal_sep) {
            Some((i, f)) => (i, Some(f)),
            None => (body, None),
        };

        if let Some(frac) = frac_part {
            if frac.chars().any(|c| self.is_thousands(c)) {
                return Err(ConversionError::new(format!(
                    "'{trimmed}' has a thousands separator after the decimal separator"
                )));
            }
            if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConversionError::new(format!("'{trimmed}' is not a number")));
            }
        }

        let int_digits = if int_part.chars().any(|c| self.is_thousands(c)) {
            let groups: Vec<&str> = split_on(int_part, |c| self.is_thousands(c));
            let well_grouped = groups.len() > 1
                && (1..=3).contains(&groups[0].len())
                && groups[1..].iter().all(|g| g.len() == 3)
                && groups.iter().all(|g| g.chars().all(|c| c.is_ascii_digit()));
            if !well_grouped {
                return Err(ConversionError::new(format!(
                    "'{trimmed}' has a misplaced thousands separator ('{}')",
                    self.thousands_sep
                )));
            }
            groups.concat()
        } else {
            if !int_part.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConversionError::new(format!("'{trimmed}' is not a number")));
            }
            int_part.to_string()
        };

        if int_digits.is_empty() && frac_part.is_none() {
            return Err(ConversionError::new(format!("'{trimmed}' is not a number")));
        }

        match frac_part {
            Some(frac) => Ok(format!("{sign}{int_digits}.{frac}")),
            None => Ok(format!("{sign}{int_digits}")),
        }
    }
}

impl Default for NumericFormat {
    fn default() -> Self {
        Self::system()
    }
}

fn split_on<'a>(s: &'a str, mut pred: impl FnMut(char) -> bool) -> Vec<&'a str> {
    s.split(move |c| pred(c)).collect()
}

// =============================================================================
// Printf-style explicit formats
// =============================================================================

/// Apply a printf-style format string to a numeric value.
///
/// Supported conversions: `%d`/`%i` (integer), `%x`/`%X` (hex), `%o`
/// (octal), `%f` (fixed-point, default precision 6), `%e` (scientific),
/// `%g` (shortest), `%%` (literal percent). A width with optional leading
/// zero and a `.precision` are honored. Anything else in the format string
/// is literal text.
///
/// An explicit format takes the place of locale-default conversion, so the
/// output uses plain ASCII digits and '.' - printf semantics, not locale
/// semantics.
pub fn apply_numeric_format(format: &str, value: &Value) -> Result<String, ConversionError> {
    let mut out = String::new();
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let mut zero_pad = false;
        let mut width = 0usize;
        let mut precision: Option<usize> = None;

        if chars.peek() == Some(&'0') {
            zero_pad = true;
            chars.next();
        }
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            width = width * 10 + d as usize;
            chars.next();
        }
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut p = 0usize;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                p = p * 10 + d as usize;
                chars.next();
            }
            precision = Some(p);
        }

        let conv = chars
            .next()
            .ok_or_else(|| ConversionError::new(format!("truncated format string '{format}'")))?;

        match conv {
            'd' | 'i' => {
                let v = value.as_int().ok_or_else(|| {
                    ConversionError::new(format!("format '%{conv}' needs an integer value"))
                })?;
                if zero_pad {
                    out.push_str(&format!("{:0width$}", v, width = width));
                } else {
                    out.push_str(&format!("{:width$}", v, width = width));
                }
            }
            'x' | 'X' | 'o' => {
                let v = value.as_int().ok_or_else(|| {
                    ConversionError::new(format!("format '%{conv}' needs an integer value"))
                })?;
                let body = match conv {
                    'x' => format!("{:x}", v),
                    'X' => format!("{:X}", v),
                    _ => format!("{:o}", v),
                };
                if zero_pad {
                    out.push_str(&format!("{:0>width$}", body, width = width));
                } else {
                    out.push_str(&format!("{:>width$}", body, width = width));
                }
            }
            'f' => {
                let v = value.as_float().ok_or_else(|| {
                    ConversionError::new("format '%f' needs a numeric value")
                })?;
                let prec = precision.unwrap_or(6);
                if zero_pad {
                    out.push_str(&format!("{:0width$.prec$}", v, width = width, prec = prec));
                } else {
                    out.push_str(&format!("{:width$.prec$}", v, width = width, prec = prec));
                }
            }
            'e' => {
                let v = value.as_float().ok_or_else(|| {
                    ConversionError::new("format '%e' needs a numeric value")
                })?;
                match precision {
                    Some(prec) => out.push_str(&format!("{:.prec$e}", v, prec = prec)),
                    None => out.push_str(&format!("{:e}", v)),
                }
            }
            'g' => {
                let v = value.as_float().ok_or_else(|| {
                    ConversionError::new("format '%g' needs a numeric value")
                })?;
                out.push_str(&format!("{}", v));
            }
            other => {
                return Err(ConversionError::new(format!(
                    "unsupported format conversion '%{other}'"
                )));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en_us() -> NumericFormat {
        NumericFormat::for_locale("en-US")
    }

    fn de_de() -> NumericFormat {
        NumericFormat::for_locale("de-DE")
    }

    #[test]
    fn test_locale_separator_table() {
        assert_eq!(en_us().decimal_separator(), '.');
        assert_eq!(en_us().thousands_separator(), ',');
        assert_eq!(de_de().decimal_separator(), ',');
        assert_eq!(de_de().thousands_separator(), '.');
        assert_eq!(NumericFormat::for_locale("fr-FR").thousands_separator(), '\u{202F}');
        assert_eq!(NumericFormat::for_locale("ja-JP").decimal_separator(), '.');
    }

    #[test]
    fn test_format_int_groups_thousands() {
        assert_eq!(en_us().format_int(1234567), "1,234,567");
        assert_eq!(en_us().format_int(-1234567), "-1,234,567");
        assert_eq!(en_us().format_int(999), "999");
        assert_eq!(de_de().format_int(1234567), "1.234.567");
    }

    #[test]
    fn test_format_float_localizes() {
        assert_eq!(en_us().format_float(23400.2), "23,400.2");
        assert_eq!(de_de().format_float(23400.2), "23.400,2");
        assert_eq!(de_de().format_float(-0.5), "-0,5");
        assert_eq!(en_us().format_float_with_precision(3.14159, 2), "3.14");
    }

    #[test]
    fn test_parse_float_accepts_locale_convention() {
        // Comma-thousands locale: "1,234.56" form.
        assert_eq!(en_us().parse_float("23,400.2").unwrap(), 23400.2);
        assert_eq!(en_us().parse_float("1234.5").unwrap(), 1234.5);
        assert_eq!(en_us().parse_float("-1,234.5").unwrap(), -1234.5);
        // Period-thousands locale: "1.234,56" form is tolerated.
        assert_eq!(de_de().parse_float("23.400,2").unwrap(), 23400.2);
        assert_eq!(de_de().parse_float("1234,5").unwrap(), 1234.5);
    }

    #[test]
    fn test_parse_float_rejects_swapped_separators() {
        // "23.400,2" in a comma-thousands locale must fail, not misparse.
        assert!(en_us().parse_float("23.400,2").is_err());
        assert!(de_de().parse_float("23,400.2").is_err());
    }

    #[test]
    fn test_parse_rejects_multiple_decimal_points() {
        assert!(en_us().parse_float("1.2.3").is_err());
        assert!(de_de().parse_float("1,2,3").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_grouping() {
        assert!(en_us().parse_float("1,23,456").is_err());
        assert!(en_us().parse_float("12,34").is_err());
        assert!(en_us().parse_float(",123").is_err());
        assert!(en_us().parse_float("1,,234").is_err());
        // Thousands separator right of the decimal point.
        assert!(en_us().parse_float("1.2,3").is_err());
    }

    #[test]
    fn test_parse_rejects_garbage_and_exponents() {
        assert!(en_us().parse_float("abc").is_err());
        assert!(en_us().parse_float("1e5").is_err());
        assert!(en_us().parse_float("").is_err());
        assert!(en_us().parse_float("12 34").is_err());
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(en_us().parse_int("1,234,567").unwrap(), 1234567);
        assert_eq!(en_us().parse_int("-25").unwrap(), -25);
        assert_eq!(en_us().parse_int("+25").unwrap(), 25);
        assert!(en_us().parse_int("1.5").is_err());
        assert!(en_us().parse_int("99999999999999999999999").is_err());
    }

    #[test]
    fn test_parse_space_thousands() {
        let fr = NumericFormat::for_locale("fr-FR");
        // ASCII space and no-break spaces are interchangeable on input.
        assert_eq!(fr.parse_float("1 234,5").unwrap(), 1234.5);
        assert_eq!(fr.parse_float("1\u{202F}234,5").unwrap(), 1234.5);
        assert_eq!(fr.parse_float("1\u{00A0}234,5").unwrap(), 1234.5);
    }

    #[test]
    fn test_round_trip() {
        for fmt in [en_us(), de_de(), NumericFormat::for_locale("fr-FR")] {
            for v in [0i64, 7, -42, 1234, -1234567] {
                assert_eq!(fmt.parse_int(&fmt.format_int(v)).unwrap(), v);
            }
            for v in [0.0f64, 0.5, -2.25, 23400.2, 1234567.875] {
                assert_eq!(fmt.parse_float(&fmt.format_float(v)).unwrap(), v);
            }
        }
    }

    #[test]
    fn test_apply_numeric_format_integers() {
        assert_eq!(
            apply_numeric_format("%d", &Value::Int(42)).unwrap(),
            "42"
        );
        assert_eq!(
            apply_numeric_format("%05d", &Value::Int(42)).unwrap(),
            "00042"
        );
        assert_eq!(
            apply_numeric_format("0x%X", &Value::Int(255)).unwrap(),
            "0xFF"
        );
        assert_eq!(
            apply_numeric_format("%d%%", &Value::Int(80)).unwrap(),
            "80%"
        );
    }

    #[test]
    fn test_apply_numeric_format_floats() {
        assert_eq!(
            apply_numeric_format("%.2f", &Value::Float(3.14159)).unwrap(),
            "3.14"
        );
        assert_eq!(
            apply_numeric_format("$%.2f", &Value::Float(5.0)).unwrap(),
            "$5.00"
        );
        // Integers widen for %f.
        assert_eq!(
            apply_numeric_format("%.1f", &Value::Int(2)).unwrap(),
            "2.0"
        );
    }

    #[test]
    fn test_apply_numeric_format_type_mismatch() {
        assert!(apply_numeric_format("%d", &Value::Float(1.5)).is_err());
        assert!(apply_numeric_format("%q", &Value::Int(1)).is_err());
        assert!(apply_numeric_format("%", &Value::Int(1)).is_err());
    }
}
