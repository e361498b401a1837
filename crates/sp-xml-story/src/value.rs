use std::collections::BTreeMap;

use rhai::{Array, Dynamic, ImmutableString, Map, FLOAT, INT};
use serde::{Deserialize, Serialize};
use sp_core::PreviewError;
use sp_runtime::StoryValue;

/// Variable value as the XML story engine keeps it between steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum XmlValue {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<XmlValue>),
    Map(BTreeMap<String, XmlValue>),
}

impl XmlValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    pub(crate) fn to_text(&self) -> String {
        match self {
            Self::Unit => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::String(value) => value.clone(),
            Self::Array(_) | Self::Map(_) => format!("{:?}", self),
        }
    }

    /// Maps are not representable through the story contract.
    pub(crate) fn to_story_value(&self) -> Option<StoryValue> {
        match self {
            Self::Unit => Some(StoryValue::Unset),
            Self::Bool(value) => Some(StoryValue::Bool(*value)),
            Self::Int(value) => Some(StoryValue::Number(*value as f64)),
            Self::Float(value) => Some(StoryValue::Number(*value)),
            Self::String(value) => Some(StoryValue::String(value.clone())),
            Self::Array(values) => Some(StoryValue::List(
                values
                    .iter()
                    .map(|value| value.to_story_value().unwrap_or(StoryValue::Unset))
                    .collect(),
            )),
            Self::Map(_) => None,
        }
    }
}

pub(crate) fn xml_value_to_dynamic(value: &XmlValue) -> Dynamic {
    match value {
        XmlValue::Unit => Dynamic::UNIT,
        XmlValue::Bool(value) => Dynamic::from_bool(*value),
        XmlValue::Int(value) => Dynamic::from_int(*value as INT),
        XmlValue::Float(value) => Dynamic::from_float(*value as FLOAT),
        XmlValue::String(value) => Dynamic::from(value.clone()),
        XmlValue::Array(values) => {
            Dynamic::from_array(values.iter().map(xml_value_to_dynamic).collect::<Array>())
        }
        XmlValue::Map(values) => {
            let mut map = Map::new();
            for (key, value) in values {
                map.insert(key.clone().into(), xml_value_to_dynamic(value));
            }
            Dynamic::from_map(map)
        }
    }
}

pub(crate) fn dynamic_to_xml_value(value: Dynamic) -> Result<XmlValue, PreviewError> {
    if value.is_unit() {
        return Ok(XmlValue::Unit);
    }
    if value.is::<bool>() {
        return Ok(XmlValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(XmlValue::Int(value.cast::<INT>() as i64));
    }
    if value.is::<FLOAT>() {
        return Ok(XmlValue::Float(value.cast::<FLOAT>() as f64));
    }
    if value.is::<ImmutableString>() {
        return Ok(XmlValue::String(value.cast::<ImmutableString>().to_string()));
    }
    if value.is::<char>() {
        return Ok(XmlValue::String(value.cast::<char>().to_string()));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(dynamic_to_xml_value(item)?);
        }
        return Ok(XmlValue::Array(out));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, value) in map {
            out.insert(key.to_string(), dynamic_to_xml_value(value)?);
        }
        return Ok(XmlValue::Map(out));
    }

    Err(PreviewError::new(
        "STORY_RUNTIME",
        format!("Unsupported value type \"{}\".", value.type_name()),
    ))
}
