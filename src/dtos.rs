//! Legacy request parameter DTO

use crate::structure::{Field, Property};
use serde::{Deserialize, Serialize};

/// Key/value parameter from the old action format
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct OldParam {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl From<OldParam> for Property {
    fn from(param: OldParam) -> Self {
        Property {
            key: Field::from_option(param.key),
            value: Field::from_option(param.value.map(serde_json::Value::String)),
        }
    }
}
