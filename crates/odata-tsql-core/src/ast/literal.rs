//! Typed scalar literals.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use regex::Regex;

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+$").expect("static regex"));
static LONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?[0-9]+)[lL]$").expect("static regex"));
static DOUBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?(?:[0-9]+\.[0-9]*|\.[0-9]+|[0-9]+)(?:[eE][+-]?[0-9]+)?)([dDfFmM]?)$")
        .expect("static regex")
});
static GUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("static regex")
});
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-)?P(?:([0-9]+)D)?(?:T(?:([0-9]+)H)?(?:([0-9]+)M)?(?:([0-9]+(?:\.[0-9]+)?)S)?)?$")
        .expect("static regex")
});

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"];
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// A scalar value written in a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer, written `NNNL` or too large for 32 bits.
    Long(i64),
    /// IEEE double.
    Double(f64),
    /// Quoted string.
    String(String),
    /// GUID in canonical textual form.
    Guid(String),
    /// Date and time without offset.
    DateTime(NaiveDateTime),
    /// Date and time with offset.
    DateTimeOffset(DateTime<FixedOffset>),
    /// Interval, `duration'P1DT2H'` or `time'10:30'`.
    TimeSpan(TimeDelta),
    /// Byte array, `X'0AFF'`.
    Bytes(Vec<u8>),
}

impl Literal {
    /// Classifies an unquoted word (`42`, `10L`, `1.5`, `2024-01-01`, a GUID,
    /// `null`, `true`, `false`). Returns `None` when the word is not a literal.
    #[must_use]
    pub fn from_bare(word: &str) -> Option<Self> {
        match word {
            "null" => return Some(Self::Null),
            "true" => return Some(Self::Bool(true)),
            "false" => return Some(Self::Bool(false)),
            _ => {}
        }

        if INTEGER.is_match(word) {
            if let Ok(n) = word.parse::<i32>() {
                return Some(Self::Int(n));
            }
            return word.parse::<i64>().ok().map(Self::Long);
        }
        if let Some(caps) = LONG.captures(word) {
            return caps[1].parse::<i64>().ok().map(Self::Long);
        }
        if let Some(caps) = DOUBLE.captures(word) {
            return caps[1]
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Self::Double);
        }
        if GUID.is_match(word) {
            return Some(Self::Guid(word.to_ascii_lowercase()));
        }
        parse_offset(word)
            .map(Self::DateTimeOffset)
            .or_else(|| parse_datetime(word).map(Self::DateTime))
    }

    /// Builds a literal from `prefix'body'` syntax.
    ///
    /// Returns `None` when `prefix` is not a literal type, in which case the
    /// caller treats the pair as an enum literal. `Some(Err)` carries the
    /// reason a known prefix rejected its body.
    #[must_use]
    pub fn from_typed(prefix: &str, body: &str) -> Option<Result<Self, String>> {
        let parsed = match prefix.to_ascii_lowercase().as_str() {
            "duration" => parse_duration(body)
                .map(Self::TimeSpan)
                .ok_or_else(|| format!("invalid duration '{body}'")),
            "time" => parse_time(body)
                .map(Self::TimeSpan)
                .ok_or_else(|| format!("invalid time of day '{body}'")),
            "datetime" => parse_datetime(body)
                .map(Self::DateTime)
                .ok_or_else(|| format!("invalid datetime '{body}'")),
            "datetimeoffset" => parse_offset(body)
                .map(Self::DateTimeOffset)
                .ok_or_else(|| format!("invalid datetimeoffset '{body}'")),
            "guid" if GUID.is_match(body) => Ok(Self::Guid(body.to_ascii_lowercase())),
            "guid" => Err(format!("invalid guid '{body}'")),
            "x" | "binary" => parse_hex(body)
                .map(Self::Bytes)
                .ok_or_else(|| format!("invalid hex literal '{body}'")),
            _ => return None,
        };
        Some(parsed)
    }

    /// Whether `word` has the shape of a number, whether or not its value fits.
    #[must_use]
    pub fn is_numeric(word: &str) -> bool {
        INTEGER.is_match(word) || LONG.is_match(word) || DOUBLE.is_match(word)
    }

    /// Infers a literal from substituted parameter text.
    ///
    /// Quoted text is a string; anything [`Literal::from_bare`] recognizes
    /// keeps that type; everything else is taken as a plain string.
    #[must_use]
    pub fn infer(text: &str) -> Self {
        let text = text.trim();
        if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
            return Self::String(text[1..text.len() - 1].replace("''", "'"));
        }
        Self::from_bare(text).unwrap_or_else(|| Self::String(String::from(text)))
    }

    /// Returns the document type tag of this literal.
    #[must_use]
    pub const fn type_tag(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Guid(_) => "guid",
            Self::DateTime(_) => "datetime",
            Self::DateTimeOffset(_) => "datetimeoffset",
            Self::TimeSpan(_) => "duration",
            Self::Bytes(_) => "binary",
        }
    }

    /// Returns the unquoted value text stored in the structured document.
    #[must_use]
    pub fn raw_value(&self) -> String {
        match self {
            Self::Null => String::from("null"),
            Self::Bool(b) => b.to_string(),
            Self::Int(n) => n.to_string(),
            Self::Long(n) => n.to_string(),
            Self::Double(f) => format_double(*f),
            Self::String(s) | Self::Guid(s) => s.clone(),
            Self::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            Self::DateTimeOffset(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f%:z").to_string(),
            Self::TimeSpan(span) => format_duration(*span),
            Self::Bytes(bytes) => bytes.iter().map(|b| format!("{b:02X}")).collect(),
        }
    }

    /// Rebuilds a literal from its document type tag and raw value.
    ///
    /// # Errors
    ///
    /// Returns a message when the tag is unknown or the value does not parse.
    pub fn from_raw(type_tag: &str, value: &str) -> Result<Self, String> {
        let bad = || format!("invalid {type_tag} literal '{value}'");
        match type_tag {
            "null" => Ok(Self::Null),
            "bool" => value.parse().map(Self::Bool).map_err(|_| bad()),
            "int" => value.parse().map(Self::Int).map_err(|_| bad()),
            "long" => value.parse().map(Self::Long).map_err(|_| bad()),
            "double" => value.parse().map(Self::Double).map_err(|_| bad()),
            "string" => Ok(Self::String(String::from(value))),
            "guid" => Ok(Self::Guid(String::from(value))),
            "datetime" => parse_datetime(value).map(Self::DateTime).ok_or_else(bad),
            "datetimeoffset" => parse_offset(value).map(Self::DateTimeOffset).ok_or_else(bad),
            "duration" => parse_duration(value).map(Self::TimeSpan).ok_or_else(bad),
            "binary" => parse_hex(value).map(Self::Bytes).ok_or_else(bad),
            other => Err(format!("unknown literal type '{other}'")),
        }
    }

    /// Returns true for `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long(n) => write!(f, "{n}L"),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::TimeSpan(_) => write!(f, "duration'{}'", self.raw_value()),
            Self::Bytes(_) => write!(f, "X'{}'", self.raw_value()),
            _ => f.write_str(&self.raw_value()),
        }
    }
}

fn format_double(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains(['.', 'e', 'E']) {
        format!("{text}.0")
    } else {
        text
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

fn parse_offset(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
    })
}

fn parse_time(text: &str) -> Option<TimeDelta> {
    let time = TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())?;
    Some(time - NaiveTime::MIN)
}

/// Parses an ISO-8601 day-time duration (`P1DT2H30M`, `-PT0.5S`).
fn parse_duration(text: &str) -> Option<TimeDelta> {
    let caps = DURATION.captures(text)?;
    if text.trim_start_matches('-') == "P" || text.ends_with('T') {
        return None;
    }
    let part = |i: usize| -> Option<i64> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    let seconds: f64 = caps.get(5).map_or(Some(0.0), |m| m.as_str().parse().ok())?;
    let millis = (seconds * 1000.0).round() as i64;
    let span = TimeDelta::try_days(part(2)?)?
        + TimeDelta::try_hours(part(3)?)?
        + TimeDelta::try_minutes(part(4)?)?
        + TimeDelta::try_milliseconds(millis)?;
    Some(if caps.get(1).is_some() { -span } else { span })
}

fn format_duration(span: TimeDelta) -> String {
    let negative = span < TimeDelta::zero();
    let span = if negative { -span } else { span };
    let days = span.num_days();
    let hours = span.num_hours() % 24;
    let minutes = span.num_minutes() % 60;
    let millis = span.num_milliseconds() % 60_000;

    let mut out = String::from(if negative { "-P" } else { "P" });
    if days > 0 {
        out.push_str(&format!("{days}D"));
    }
    if hours > 0 || minutes > 0 || millis > 0 || days == 0 {
        out.push('T');
        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if millis > 0 || (days == 0 && hours == 0 && minutes == 0) {
            if millis % 1000 == 0 {
                out.push_str(&format!("{}S", millis / 1000));
            } else {
                out.push_str(&format!("{}.{:03}S", millis / 1000, millis % 1000));
            }
        }
    }
    out
}

fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let text = text.strip_prefix("0x").unwrap_or(text);
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| text.get(i..i + 2).and_then(|pair| u8::from_str_radix(pair, 16).ok()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_pick_width() {
        assert_eq!(Literal::from_bare("42"), Some(Literal::Int(42)));
        assert_eq!(Literal::from_bare("-7"), Some(Literal::Int(-7)));
        assert_eq!(
            Literal::from_bare("3000000000"),
            Some(Literal::Long(3_000_000_000))
        );
        assert_eq!(Literal::from_bare("5L"), Some(Literal::Long(5)));
    }

    #[test]
    fn test_doubles_with_suffixes() {
        assert_eq!(Literal::from_bare("1.5"), Some(Literal::Double(1.5)));
        assert_eq!(Literal::from_bare("2d"), Some(Literal::Double(2.0)));
        assert_eq!(Literal::from_bare("1e3"), Some(Literal::Double(1000.0)));
        assert_eq!(Literal::Double(2.0).to_string(), "2.0");
    }

    #[test]
    fn test_out_of_range_numbers_are_not_literals() {
        assert_eq!(Literal::from_bare("1e400"), None);
        assert_eq!(Literal::from_bare("99999999999999999999"), None);
        assert!(Literal::is_numeric("1e400"));
        assert!(!Literal::is_numeric("Price"));
    }

    #[test]
    fn test_dates() {
        let lit = Literal::from_bare("2024-03-01").unwrap();
        assert_eq!(lit.raw_value(), "2024-03-01T00:00:00");
        let lit = Literal::from_bare("2024-03-01T10:30:00Z").unwrap();
        assert!(matches!(lit, Literal::DateTimeOffset(_)));
        assert_eq!(lit.raw_value(), "2024-03-01T10:30:00+00:00");
    }

    #[test]
    fn test_guid_is_normalized() {
        let lit = Literal::from_bare("0B2D4C9A-1111-2222-3333-444455556666").unwrap();
        assert_eq!(
            lit,
            Literal::Guid(String::from("0b2d4c9a-1111-2222-3333-444455556666"))
        );
    }

    #[test]
    fn test_property_names_are_not_literals() {
        assert_eq!(Literal::from_bare("Name"), None);
        assert_eq!(Literal::from_bare("Address/City"), None);
    }

    #[test]
    fn test_typed_literals() {
        let span = Literal::from_typed("duration", "P1DT2H").unwrap().unwrap();
        assert_eq!(span, Literal::TimeSpan(TimeDelta::hours(26)));
        assert_eq!(span.to_string(), "duration'P1DT2H'");

        let bytes = Literal::from_typed("X", "0AFF").unwrap().unwrap();
        assert_eq!(bytes, Literal::Bytes(vec![0x0A, 0xFF]));

        assert!(Literal::from_typed("guid", "nope").unwrap().is_err());
        assert!(Literal::from_typed("Color", "Red").is_none());
    }

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_duration(TimeDelta::minutes(90)), "PT1H30M");
        assert_eq!(format_duration(TimeDelta::zero()), "PT0S");
        assert_eq!(format_duration(-TimeDelta::days(2)), "-P2D");
        assert_eq!(format_duration(TimeDelta::milliseconds(1500)), "PT1.500S");
    }

    #[test]
    fn test_infer() {
        assert_eq!(Literal::infer("12"), Literal::Int(12));
        assert_eq!(Literal::infer("'12'"), Literal::String(String::from("12")));
        assert_eq!(Literal::infer(" Seattle "), Literal::String(String::from("Seattle")));
        assert!(matches!(Literal::infer("2020-01-02"), Literal::DateTime(_)));
    }

    #[test]
    fn test_raw_value_round_trip() {
        for lit in [
            Literal::Int(4),
            Literal::Long(9),
            Literal::Double(0.25),
            Literal::String(String::from("it's")),
            Literal::TimeSpan(TimeDelta::hours(3)),
            Literal::Bytes(vec![1, 2]),
        ] {
            let back = Literal::from_raw(lit.type_tag(), &lit.raw_value()).unwrap();
            assert_eq!(back, lit);
        }
    }
}
