//! Table keys: primary keys, foreign keys and the undiscriminated placeholder

use crate::error::StructureError;
use crate::structure::field::Field;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;

pub const PRIMARY_KEY_TYPE: &str = "primary key";
pub const FOREIGN_KEY_TYPE: &str = "foreign key";

/// Primary key over one or more columns
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryKey {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub name: Field<String>,
    #[serde(default)]
    pub column_names: Vec<String>,
}

/// Foreign key; `from_columns[i]` references `to_columns[i]`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub name: Field<String>,
    #[serde(default)]
    pub from_columns: Vec<String>,
    #[serde(default)]
    pub to_columns: Vec<String>,
}

/// Stand-in for a key whose variant could not be determined while decoding
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct UnknownKey {}

/// A table key
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    Primary(PrimaryKey),
    Foreign(ForeignKey),
    Unknown(UnknownKey),
}

impl Key {
    pub fn primary(name: Option<&str>, column_names: &[&str]) -> Self {
        Key::Primary(PrimaryKey {
            name: Field::from_option(name.map(str::to_string)),
            column_names: column_names.iter().map(|c| c.to_string()).collect(),
        })
    }

    pub fn foreign(name: Option<&str>, from_columns: &[&str], to_columns: &[&str]) -> Self {
        Key::Foreign(ForeignKey {
            name: Field::from_option(name.map(str::to_string)),
            from_columns: from_columns.iter().map(|c| c.to_string()).collect(),
            to_columns: to_columns.iter().map(|c| c.to_string()).collect(),
        })
    }

    /// Discriminator written to the wire. Empty for the placeholder.
    pub fn key_type(&self) -> &'static str {
        match self {
            Key::Primary(_) => PRIMARY_KEY_TYPE,
            Key::Foreign(_) => FOREIGN_KEY_TYPE,
            Key::Unknown(_) => "",
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Key::Primary(k) => k.name.as_deref(),
            Key::Foreign(k) => k.name.as_deref(),
            Key::Unknown(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Key::Unknown(_))
    }
}

/// Order keys for display.
///
/// Primary keys come before foreign keys. Primary keys are ordered by name
/// with unnamed keys last. Every other pairing (two foreign keys, anything
/// involving a placeholder) compares equal, so this is not a total order.
pub fn compare_keys(a: &Key, b: &Key) -> Ordering {
    match (a, b) {
        (Key::Primary(_), Key::Foreign(_)) => Ordering::Less,
        (Key::Foreign(_), Key::Primary(_)) => Ordering::Greater,
        (Key::Primary(a), Key::Primary(b)) => match (a.name.value(), b.name.value()) {
            (Some(a), Some(b)) => a.cmp(b),
            (None, _) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        },
        _ => Ordering::Equal,
    }
}

#[derive(Serialize)]
struct Tagged<'a, T: Serialize> {
    #[serde(flatten)]
    key: &'a T,
    #[serde(rename = "type")]
    key_type: &'static str,
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let key_type = self.key_type();
        match self {
            Key::Primary(key) => Tagged { key, key_type }.serialize(serializer),
            Key::Foreign(key) => Tagged { key, key_type }.serialize(serializer),
            Key::Unknown(key) => Tagged { key, key_type }.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        DiscriminatorResolver
            .resolve(raw)
            .map_err(serde::de::Error::custom)
    }
}

/// Strategy for turning a raw wire key into a concrete `Key`
pub trait KeyResolver: Send + Sync {
    fn resolve(&self, raw: serde_json::Value) -> Result<Key, StructureError>;
}

/// Picks the variant from the `type` discriminator.
///
/// A missing or unrecognised discriminator yields the placeholder. A known
/// discriminator with fields that don't fit the variant is an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscriminatorResolver;

impl KeyResolver for DiscriminatorResolver {
    fn resolve(&self, raw: serde_json::Value) -> Result<Key, StructureError> {
        let discriminator = raw
            .get("type")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);

        match discriminator.as_deref() {
            Some(PRIMARY_KEY_TYPE) => serde_json::from_value(raw)
                .map(Key::Primary)
                .map_err(|e| StructureError::KeyResolution(format!("{}: {}", PRIMARY_KEY_TYPE, e))),
            Some(FOREIGN_KEY_TYPE) => serde_json::from_value(raw)
                .map(Key::Foreign)
                .map_err(|e| StructureError::KeyResolution(format!("{}: {}", FOREIGN_KEY_TYPE, e))),
            other => {
                log::warn!(
                    "key discriminator {:?} has no registered variant, using placeholder",
                    other
                );
                Ok(Key::Unknown(UnknownKey::default()))
            }
        }
    }
}

/// Resolver used when no per-variant strategy is registered
#[derive(Clone, Copy, Debug, Default)]
pub struct PlaceholderResolver;

impl KeyResolver for PlaceholderResolver {
    fn resolve(&self, _raw: serde_json::Value) -> Result<Key, StructureError> {
        Ok(Key::Unknown(UnknownKey::default()))
    }
}
