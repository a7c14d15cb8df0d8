//! Example usage snippets attached to a table

use crate::structure::field::Field;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Single key/value configuration entry, as stored by property-list plugins
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Property {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub key: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub value: Field<Value>,
}

impl Property {
    pub fn new(key: &str, value: impl Into<Value>) -> Self {
        Self {
            key: Field::Value(key.to_string()),
            value: Field::Value(value.into()),
        }
    }
}

/// Template configuration in whichever shape the plugin family uses
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TemplateConfiguration {
    /// Ordered property list (SQL-style plugins)
    PropertyList(Vec<Property>),
    /// Key/value map (UQI plugins)
    ConfigMap(Map<String, Value>),
    /// Present on the wire as an explicit null
    Null,
    #[default]
    Absent,
}

impl TemplateConfiguration {
    pub fn is_absent(&self) -> bool {
        matches!(self, TemplateConfiguration::Absent)
    }

    fn from_properties(properties: Vec<Property>) -> Self {
        if properties.is_empty() {
            TemplateConfiguration::Absent
        } else {
            TemplateConfiguration::PropertyList(properties)
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        if map.is_empty() {
            TemplateConfiguration::Absent
        } else {
            TemplateConfiguration::ConfigMap(map)
        }
    }
}

impl Serialize for TemplateConfiguration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TemplateConfiguration::PropertyList(properties) => properties.serialize(serializer),
            TemplateConfiguration::ConfigMap(map) => map.serialize(serializer),
            TemplateConfiguration::Null | TemplateConfiguration::Absent => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for TemplateConfiguration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(TemplateConfiguration::Null),
            Value::Object(map) => Ok(TemplateConfiguration::ConfigMap(map)),
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<Vec<Property>, _>>()
                .map(TemplateConfiguration::PropertyList)
                .map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!(
                "template configuration must be a list or a map, got {}",
                other
            ))),
        }
    }
}

/// Named example query for a table
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Template {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub title: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub body: Field<String>,
    #[serde(default, skip_serializing_if = "TemplateConfiguration::is_absent")]
    pub configuration: TemplateConfiguration,
}

impl Template {
    /// Template without configuration
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: Field::Value(title.to_string()),
            body: Field::Value(body.to_string()),
            configuration: TemplateConfiguration::Absent,
        }
    }

    /// Template for plugins that store configuration as a property list
    pub fn with_properties(title: &str, body: &str, properties: Vec<Property>) -> Self {
        Self {
            title: Field::Value(title.to_string()),
            body: Field::Value(body.to_string()),
            configuration: TemplateConfiguration::from_properties(properties),
        }
    }

    /// Template for UQI plugins that store configuration as a map
    pub fn with_config_map(title: &str, body: &str, configuration: Map<String, Value>) -> Self {
        Self {
            title: Field::Value(title.to_string()),
            body: Field::Value(body.to_string()),
            configuration: TemplateConfiguration::from_map(configuration),
        }
    }

    /// UQI template where the map alone describes the query; no body
    pub fn from_config_map(title: &str, configuration: Map<String, Value>) -> Self {
        Self {
            title: Field::Value(title.to_string()),
            body: Field::Null,
            configuration: TemplateConfiguration::from_map(configuration),
        }
    }
}
