//! OData URI literal conversion.
//!
//! Converts the textual form of primitive and enum values as they appear in
//! resource paths (`Customers(42)`, `GetByName(name='O''Neil')`,
//! `Products(Color=NS.Color'Red')`) into typed [`EdmValue`]s and back.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use uuid::Uuid;

use crate::error::LiteralError;
use crate::model::{EdmModel, EnumType};
use crate::types::{PrimitiveKind, TypeKind, TypeRef};

/// A typed value produced from a URI literal.
#[derive(Clone, Debug, PartialEq)]
pub enum EdmValue {
    Null,
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(BigDecimal),
    String(String),
    Guid(Uuid),
    Date(NaiveDate),
    DateTimeOffset(DateTime<FixedOffset>),
    TimeOfDay(NaiveTime),
    Duration(TimeDelta),
    Binary(Vec<u8>),
    /// Enum value; flags values hold comma-separated member names.
    Enum { type_name: String, value: String },
}

impl EdmValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, EdmValue::Null)
    }

    /// Render the value in URI literal form.
    #[must_use]
    pub fn to_uri_literal(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EdmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdmValue::Null => f.write_str("null"),
            EdmValue::Boolean(v) => write!(f, "{v}"),
            EdmValue::Byte(v) => write!(f, "{v}"),
            EdmValue::SByte(v) => write!(f, "{v}"),
            EdmValue::Int16(v) => write!(f, "{v}"),
            EdmValue::Int32(v) => write!(f, "{v}"),
            EdmValue::Int64(v) => write!(f, "{v}"),
            EdmValue::Single(v) => write_float(f, f64::from(*v)),
            EdmValue::Double(v) => write_float(f, *v),
            EdmValue::Decimal(v) => write!(f, "{v}"),
            EdmValue::String(v) => write!(f, "'{}'", v.replace('\'', "''")),
            EdmValue::Guid(v) => write!(f, "{}", v.hyphenated()),
            EdmValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            EdmValue::DateTimeOffset(v) => f.write_str(&v.to_rfc3339()),
            EdmValue::TimeOfDay(v) => write!(f, "{}", v.format("%H:%M:%S%.f")),
            EdmValue::Duration(v) => write!(f, "duration'{}'", format_duration(*v)),
            EdmValue::Binary(v) => write!(
                f,
                "binary'{}'",
                base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(v)
            ),
            EdmValue::Enum { type_name, value } => write!(f, "{type_name}'{value}'"),
        }
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        f.write_str("NaN")
    } else if v.is_infinite() {
        f.write_str(if v > 0.0 { "INF" } else { "-INF" })
    } else {
        write!(f, "{v}")
    }
}

/// Convert a URI literal to a value of the given type.
///
/// # Errors
/// - `LiteralError::Invalid` when `text` is not a literal of the expected type
/// - `LiteralError::NullNotAllowed` for `null` against a non-nullable type
/// - `LiteralError::Unsupported` for collection and structured targets
pub fn parse_literal(text: &str, ty: &TypeRef, model: &EdmModel) -> Result<EdmValue, LiteralError> {
    let expected = model.type_name(ty);
    if ty.collection {
        return Err(LiteralError::Unsupported { expected });
    }
    if text == "null" {
        return if ty.nullable {
            Ok(EdmValue::Null)
        } else {
            Err(LiteralError::NullNotAllowed { expected })
        };
    }
    let invalid = || LiteralError::Invalid {
        literal: text.to_owned(),
        expected: model.type_name(ty),
    };
    match ty.kind {
        TypeKind::Primitive(kind) => parse_primitive(text, kind).ok_or_else(invalid),
        TypeKind::Enum(id) => parse_enum(text, model.enum_type(id)).ok_or_else(invalid),
        TypeKind::Structured(_) => Err(LiteralError::Unsupported { expected }),
    }
}

/// Convert a primitive URI literal; `None` when the text is malformed.
#[must_use]
pub fn parse_primitive(text: &str, kind: PrimitiveKind) -> Option<EdmValue> {
    match kind {
        PrimitiveKind::Boolean => {
            if text.eq_ignore_ascii_case("true") {
                Some(EdmValue::Boolean(true))
            } else if text.eq_ignore_ascii_case("false") {
                Some(EdmValue::Boolean(false))
            } else {
                None
            }
        }
        PrimitiveKind::Byte => text.parse().ok().map(EdmValue::Byte),
        PrimitiveKind::SByte => text.parse().ok().map(EdmValue::SByte),
        PrimitiveKind::Int16 => text.parse().ok().map(EdmValue::Int16),
        PrimitiveKind::Int32 => text.parse().ok().map(EdmValue::Int32),
        PrimitiveKind::Int64 => text
            .strip_suffix(['L', 'l'])
            .unwrap_or(text)
            .parse()
            .ok()
            .map(EdmValue::Int64),
        PrimitiveKind::Single => parse_float(text, ['f', 'F'])
            .and_then(narrow)
            .map(EdmValue::Single),
        PrimitiveKind::Double => parse_float(text, ['d', 'D']).map(EdmValue::Double),
        PrimitiveKind::Decimal => {
            let digits = text.strip_suffix(['m', 'M']).unwrap_or(text);
            if digits.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
                return None;
            }
            BigDecimal::from_str(digits).ok().map(EdmValue::Decimal)
        }
        PrimitiveKind::String => unquote(text).map(EdmValue::String),
        PrimitiveKind::Guid => {
            if text.len() != 36 {
                return None;
            }
            Uuid::parse_str(text).ok().map(EdmValue::Guid)
        }
        PrimitiveKind::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .map(EdmValue::Date),
        PrimitiveKind::DateTimeOffset => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(EdmValue::DateTimeOffset),
        PrimitiveKind::TimeOfDay => NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
            .ok()
            .map(EdmValue::TimeOfDay),
        PrimitiveKind::Duration => {
            let body = strip_prefixed_quotes(text, "duration").unwrap_or(text);
            parse_duration(body).map(EdmValue::Duration)
        }
        PrimitiveKind::Binary => {
            let body = strip_prefixed_quotes(text, "binary")?;
            base64::engine::general_purpose::URL_SAFE_NO_PAD
                .decode(body.trim_end_matches('='))
                .ok()
                .map(EdmValue::Binary)
        }
    }
}

/// Finite values that overflow `f32` are rejected; spelled `INF`/`NaN` pass through.
#[allow(clippy::cast_possible_truncation)]
fn narrow(v: f64) -> Option<f32> {
    let narrowed = v as f32;
    (narrowed.is_finite() || !v.is_finite()).then_some(narrowed)
}

fn parse_float(text: &str, suffixes: [char; 2]) -> Option<f64> {
    match text {
        "INF" => return Some(f64::INFINITY),
        "-INF" => return Some(f64::NEG_INFINITY),
        "NaN" => return Some(f64::NAN),
        _ => {}
    }
    let digits = text.strip_suffix(suffixes).unwrap_or(text);
    // Reject Rust-only spellings such as "inf" or "infinity".
    if digits.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    // Overflow parses to infinity; only the spelled tokens may produce it.
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `'O''Neil'` -> `O'Neil`
fn unquote(text: &str) -> Option<String> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.next() != Some('\'') {
                return None;
            }
        }
        out.push(c);
    }
    Some(out)
}

/// `duration'P1D'` -> `P1D`
fn strip_prefixed_quotes<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    text[prefix.len()..].strip_prefix('\'')?.strip_suffix('\'')
}

/// ISO 8601 day-time duration: `[-]P[nD][T[nH][nM][n[.f]S]]`.
fn parse_duration(text: &str) -> Option<TimeDelta> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let rest = rest.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };

    let mut seconds: i64 = 0;
    let mut nanos: u32 = 0;
    let mut any = false;

    if !date_part.is_empty() {
        let days: i64 = date_part.strip_suffix('D')?.parse().ok()?;
        seconds = seconds.checked_add(days.checked_mul(86_400)?)?;
        any = true;
    }

    if let Some(mut time) = time_part {
        if time.is_empty() {
            return None;
        }
        for (designator, factor) in [('H', 3_600_i64), ('M', 60)] {
            if let Some((value, tail)) = time.split_once(designator) {
                let value: i64 = value.parse().ok()?;
                seconds = seconds.checked_add(value.checked_mul(factor)?)?;
                time = tail;
                any = true;
            }
        }
        if !time.is_empty() {
            let value = time.strip_suffix('S')?;
            let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
            seconds = seconds.checked_add(whole.parse::<i64>().ok()?)?;
            if !fraction.is_empty() {
                if fraction.len() > 9 || !fraction.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                nanos = format!("{fraction:0<9}").parse().ok()?;
            }
            any = true;
        }
    }

    if !any {
        return None;
    }
    let delta = TimeDelta::new(seconds, nanos)?;
    Some(if negative { -delta } else { delta })
}

fn format_duration(delta: TimeDelta) -> String {
    let (sign, delta) = if delta < TimeDelta::zero() {
        ("-", -delta)
    } else {
        ("", delta)
    };
    let total = delta.num_seconds();
    let nanos = delta.subsec_nanos();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;
    let mut out = format!("{sign}P{days}DT{hours}H{minutes}M{secs}");
    if nanos > 0 {
        let fraction = format!("{nanos:09}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out.push('S');
    out
}

/// Accepts `Ns.Type'Member'`, `'Member'`, `Member` and integer values.
fn parse_enum(text: &str, enum_type: &EnumType) -> Option<EdmValue> {
    let full_name = enum_type.full_name();
    let body = if let Some(rest) = text.strip_prefix(full_name.as_str()) {
        rest.strip_prefix('\'')?.strip_suffix('\'')?
    } else if text.starts_with('\'') {
        text.strip_prefix('\'')?.strip_suffix('\'')?
    } else {
        text
    };

    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() > 1 && !enum_type.is_flags {
        return None;
    }
    let mut names = Vec::with_capacity(parts.len());
    for part in parts {
        let member = enum_type.member(part).or_else(|| {
            let value: i64 = part.parse().ok()?;
            enum_type.members.iter().find(|m| m.value == value)
        })?;
        names.push(member.name.as_str());
    }
    Some(EdmValue::Enum {
        type_name: full_name,
        value: names.join(","),
    })
}
