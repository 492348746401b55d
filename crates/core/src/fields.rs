//! Field-descriptor tables
//!
//! Options types expose their fields as an ordered table of
//! `(name, kind, getter, setter)` descriptors. Script templates use the
//! getters for placeholder substitution and the settings editor uses the
//! setters to write operator input back into typed values.

use crate::errors::FieldError;
use serde_json::Value;
use std::fmt;

/// Value type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Bool,
    Integer,
    Version,
}

impl FieldKind {
    /// Convert raw operator input into a JSON value of this kind.
    pub fn convert(&self, raw: &str) -> Result<Value, FieldError> {
        let raw = raw.trim();
        let invalid = || FieldError::InvalidValue {
            kind: self.to_string(),
        };
        match self {
            FieldKind::Text => Ok(Value::String(raw.to_string())),
            FieldKind::Bool => parse_bool(raw).map(Value::Bool).ok_or_else(invalid),
            FieldKind::Integer => raw
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .map_err(|_| invalid()),
            FieldKind::Version => crate::versions::parse_version(raw)
                .map(|v| Value::String(v.to_string()))
                .ok_or_else(invalid),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Text => "String",
            FieldKind::Bool => "Boolean",
            FieldKind::Integer => "Integer",
            FieldKind::Version => "Version",
        };
        f.write_str(name)
    }
}

/// Parse `true`/`false` case-insensitively.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// One named field of `T`
pub struct FieldDescriptor<T: 'static> {
    pub name: &'static str,
    pub kind: FieldKind,
    pub get: fn(&T) -> Option<String>,
    pub set: fn(&mut T, &str) -> Result<(), FieldError>,
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Types whose fields can be enumerated without reflection
pub trait FieldTable: Sized + 'static {
    /// Ordered field descriptors, built once per type.
    fn fields() -> &'static [FieldDescriptor<Self>];

    /// Look up a descriptor by name, ignoring case.
    fn field(name: &str) -> Option<&'static FieldDescriptor<Self>> {
        Self::fields()
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    fn get_field(&self, name: &str) -> Option<String> {
        Self::field(name).and_then(|d| (d.get)(self))
    }

    fn set_field(&mut self, name: &str, raw: &str) -> Result<(), FieldError> {
        let descriptor = Self::field(name).ok_or_else(|| FieldError::UnknownField {
            name: name.to_string(),
        })?;
        (descriptor.set)(self, raw)
    }

    /// Current values in table order.
    fn field_values(&self) -> Vec<(&'static str, Option<String>)> {
        Self::fields()
            .iter()
            .map(|d| (d.name, (d.get)(self)))
            .collect()
    }
}

/// Declare a static descriptor table and the [`FieldTable`] impl for a type.
///
/// ```ignore
/// field_table!(MacroOptions, MACRO_FIELDS, [
///     ("UserName", Text, |o| o.user_name.clone(), |o, v| { ... }),
/// ]);
/// ```
macro_rules! field_table {
    ($ty:ty, $table:ident, [$(($name:expr, $kind:ident, $get:expr, $set:expr)),* $(,)?]) => {
        static $table: once_cell::sync::Lazy<Vec<$crate::fields::FieldDescriptor<$ty>>> =
            once_cell::sync::Lazy::new(|| {
                vec![$($crate::fields::FieldDescriptor::<$ty> {
                    name: $name,
                    kind: $crate::fields::FieldKind::$kind,
                    get: $get,
                    set: $set,
                }),*]
            });

        impl $crate::fields::FieldTable for $ty {
            fn fields() -> &'static [$crate::fields::FieldDescriptor<Self>] {
                &$table
            }
        }
    };
}
pub(crate) use field_table;

/// Setter helper for optional text fields; empty input clears the value.
pub fn set_optional_text(target: &mut Option<String>, raw: &str) {
    *target = if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    };
}

/// Setter helper for boolean fields.
pub fn set_bool(target: &mut bool, raw: &str) -> Result<(), FieldError> {
    *target = parse_bool(raw).ok_or_else(|| FieldError::InvalidValue {
        kind: FieldKind::Bool.to_string(),
    })?;
    Ok(())
}

/// Setter helper for integer fields.
pub fn set_integer<N: std::str::FromStr>(target: &mut N, raw: &str) -> Result<(), FieldError> {
    *target = raw
        .trim()
        .parse::<N>()
        .map_err(|_| FieldError::InvalidValue {
            kind: FieldKind::Integer.to_string(),
        })?;
    Ok(())
}

/// Setter helper for optional version fields; empty input clears the value.
pub fn set_version(target: &mut Option<semver::Version>, raw: &str) -> Result<(), FieldError> {
    if raw.trim().is_empty() {
        *target = None;
        return Ok(());
    }
    *target = Some(
        crate::versions::parse_version(raw).ok_or_else(|| FieldError::InvalidValue {
            kind: FieldKind::Version.to_string(),
        })?,
    );
    Ok(())
}

/// Getter helper that treats empty strings as missing.
pub fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
