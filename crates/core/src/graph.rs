use crate::error::SchemaError;
use serde::{de, Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(text) => Ok(PropertyValue::String(text)),
            serde_json::Value::Number(number) => {
                if let Some(integer) = number.as_i64() {
                    Ok(PropertyValue::Integer(integer))
                } else if let Some(float) = number.as_f64() {
                    Ok(PropertyValue::Float(float))
                } else {
                    Err(de::Error::custom(format!(
                        "property value {number} is out of range"
                    )))
                }
            }
            other => Err(de::Error::custom(format!(
                "property value must be a string, an integer, or a float, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub properties: Option<Vec<Property>>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: None,
        }
    }

    pub fn with_properties(name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            name: name.into(),
            properties: Some(properties),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub relation: String,
    #[serde(default)]
    pub properties: Option<Vec<Property>>,
}

impl Relationship {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
            properties: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
}

impl KnowledgeGraph {
    // First violation wins; a malformed graph is never repaired.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut names: HashSet<&str> = HashSet::with_capacity(self.entities.len());
        for (index, entity) in self.entities.iter().enumerate() {
            if entity.name.is_empty() {
                return Err(SchemaError::EmptyEntityName { index });
            }
            if !names.insert(entity.name.as_str()) {
                return Err(SchemaError::DuplicateEntity {
                    name: entity.name.clone(),
                });
            }
            validate_properties(entity.properties.as_deref(), || {
                format!("entity {:?}", entity.name)
            })?;
        }

        for relationship in &self.relationships {
            if relationship.relation.is_empty() {
                return Err(SchemaError::EmptyRelation {
                    source_name: relationship.source.clone(),
                    target_name: relationship.target.clone(),
                });
            }
            if !names.contains(relationship.source.as_str()) {
                return Err(SchemaError::UnknownSource {
                    relation: relationship.relation.clone(),
                    name: relationship.source.clone(),
                });
            }
            if !names.contains(relationship.target.as_str()) {
                return Err(SchemaError::UnknownTarget {
                    relation: relationship.relation.clone(),
                    name: relationship.target.clone(),
                });
            }
            validate_properties(relationship.properties.as_deref(), || {
                format!("relationship {:?}", relationship.relation)
            })?;
        }

        Ok(())
    }
}

fn validate_properties(
    properties: Option<&[Property]>,
    owner: impl Fn() -> String,
) -> Result<(), SchemaError> {
    for property in properties.unwrap_or_default() {
        if property.key.is_empty() {
            return Err(SchemaError::EmptyPropertyKey { owner: owner() });
        }
    }
    Ok(())
}
