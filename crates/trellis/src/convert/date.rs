//! Locale-aware date formatting and parsing.
//!
//! A [`DateFormat`] resolves the locale's date component order and separator
//! to a strftime pattern at construction time, and caches it. Parsing goes
//! through `chrono`, so calendar-invalid dates (February 30th) fail with a
//! [`ConversionError`] rather than wrapping.

use chrono::NaiveDate;

use super::ConversionError;

/// Date component ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateOrder {
    /// Day/Month/Year (most of the world)
    Dmy,
    /// Month/Day/Year (US)
    Mdy,
    /// Year/Month/Day (ISO, East Asian)
    Ymd,
}

/// Cached date pattern for a locale, or an explicit strftime pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    /// Create a format for the current process locale.
    pub fn system() -> Self {
        let locale = sys_locale::get_locale().unwrap_or_else(|| "en-US".to_string());
        Self::for_locale(&locale)
    }

    /// Create a format for a specific locale identifier.
    ///
    /// Supports locale-aware date patterns for common locales:
    /// - `en-US`: MM/DD/YYYY
    /// - `en-GB`, `fr-FR`: DD/MM/YYYY
    /// - `de-DE`, `cs-CZ`: DD.MM.YYYY
    /// - `nl-NL`, `da-DK`, `sv-SE`: DD-MM-YYYY
    /// - `ja-JP`, `zh-CN`, `ko-KR`, `hu-HU`: YYYY/MM/DD
    pub fn for_locale(locale: &str) -> Self {
        let parts: Vec<&str> = locale.split(['-', '_']).collect();
        let lang = parts
            .first()
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| "en".to_string());
        let region = parts.get(1).map(|s| s.to_uppercase());

        let (order, sep) = Self::date_order_for_locale(&lang, region.as_deref());
        let pattern = match order {
            DateOrder::Mdy => format!("%m{sep}%d{sep}%Y"),
            DateOrder::Dmy => format!("%d{sep}%m{sep}%Y"),
            DateOrder::Ymd => format!("%Y{sep}%m{sep}%d"),
        };
        Self { pattern }
    }

    /// Create a format with an explicit strftime pattern (e.g. `"%Y-%m-%d"`).
    pub fn with_pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Determine date order and separator based on locale.
    fn date_order_for_locale(lang: &str, region: Option<&str>) -> (DateOrder, char) {
        // YMD locales (East Asian, Hungarian, Lithuanian, etc.)
        let ymd_langs = ["ja", "zh", "ko", "hu", "lt", "mn", "fa"];
        if ymd_langs.contains(&lang) {
            return (DateOrder::Ymd, '/');
        }

        // MDY locales (primarily US-influenced)
        if matches!(
            (lang, region),
            ("en", Some("US")) | ("en", Some("PH")) | ("es", Some("US")) | ("fil", _)
        ) {
            return (DateOrder::Mdy, '/');
        }

        // DMY with period separator (German, Nordic, Central European)
        let period_sep_langs = [
            "de", "no", "nb", "nn", "fi", "et", "lv", "sl", "sk", "cs", "hr", "ro", "bg",
        ];
        if period_sep_langs.contains(&lang) {
            return (DateOrder::Dmy, '.');
        }

        // DMY with dash separator (Dutch, Danish, Swedish, Icelandic)
        let dash_sep_langs = ["nl", "da", "sv", "is"];
        if dash_sep_langs.contains(&lang) {
            return (DateOrder::Dmy, '-');
        }

        // DMY with slash separator (everything else)
        (DateOrder::Dmy, '/')
    }

    /// The strftime pattern in use.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Format a date with the cached pattern.
    pub fn format(&self, date: NaiveDate) -> String {
        date.format(&self.pattern).to_string()
    }

    /// Parse a date against the cached pattern.
    ///
    /// Fails when the text does not match the pattern or does not name a
    /// valid calendar date.
    pub fn parse(&self, text: &str) -> Result<NaiveDate, ConversionError> {
        NaiveDate::parse_from_str(text.trim(), &self.pattern).map_err(|_| {
            ConversionError::new(format!(
                "'{}' is not a valid date (expected format {})",
                text.trim(),
                self.pattern
            ))
        })
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_locale_patterns() {
        assert_eq!(DateFormat::for_locale("en-US").pattern(), "%m/%d/%Y");
        assert_eq!(DateFormat::for_locale("en-GB").pattern(), "%d/%m/%Y");
        assert_eq!(DateFormat::for_locale("de-DE").pattern(), "%d.%m.%Y");
        assert_eq!(DateFormat::for_locale("nl-NL").pattern(), "%d-%m-%Y");
        assert_eq!(DateFormat::for_locale("ja-JP").pattern(), "%Y/%m/%d");
    }

    #[test]
    fn test_format() {
        let us = DateFormat::for_locale("en-US");
        assert_eq!(us.format(date(2026, 1, 17)), "01/17/2026");
        let de = DateFormat::for_locale("de-DE");
        assert_eq!(de.format(date(2026, 1, 17)), "17.01.2026");
    }

    #[test]
    fn test_parse_valid() {
        let us = DateFormat::for_locale("en-US");
        assert_eq!(us.parse("01/17/2026").unwrap(), date(2026, 1, 17));
        // Leap day parses in a leap year.
        assert_eq!(us.parse("02/29/2024").unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn test_parse_rejects_invalid_calendar_dates() {
        let us = DateFormat::for_locale("en-US");
        assert!(us.parse("02/30/2024").is_err());
        assert!(us.parse("13/01/2024").is_err());
        assert!(us.parse("02/29/2023").is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        let us = DateFormat::for_locale("en-US");
        assert!(us.parse("2026-01-17").is_err());
        assert!(us.parse("not a date").is_err());
        assert!(us.parse("").is_err());
    }

    #[test]
    fn test_explicit_pattern_round_trip() {
        let iso = DateFormat::with_pattern("%Y-%m-%d");
        let d = date(1999, 12, 31);
        assert_eq!(iso.parse(&iso.format(d)).unwrap(), d);
    }

    #[test]
    fn test_locale_round_trip() {
        for locale in ["en-US", "en-GB", "de-DE", "nl-NL", "ja-JP", "fr-FR"] {
            let fmt = DateFormat::for_locale(locale);
            let d = date(2026, 8, 8);
            assert_eq!(fmt.parse(&fmt.format(d)).unwrap(), d, "locale {locale}");
        }
    }
}
