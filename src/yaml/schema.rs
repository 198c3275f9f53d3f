//! Schema rules and how they are read from YAML.
//!
//! A rule is written with the same camelCase keys JSON Schema uses:
//!
//! ```yaml
//! type: map
//! required: [name]
//! properties:
//!   name: {type: string, minLength: 1}
//!   port: {type: int, minimum: 1, maximum: 65535}
//! additionalProperties: false
//! ```

use super::document::Document;
use super::error::Error;
use super::value::{value_type, Value};
use indexmap::IndexMap;

/// Type a rule accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleType {
    String,
    Int,
    Float,
    Bool,
    Array,
    Map,
    #[default]
    Any,
}

impl std::str::FromStr for RuleType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "string" => Ok(RuleType::String),
            "int" | "integer" => Ok(RuleType::Int),
            "float" | "number" => Ok(RuleType::Float),
            "bool" | "boolean" => Ok(RuleType::Bool),
            "array" => Ok(RuleType::Array),
            "map" | "object" => Ok(RuleType::Map),
            "any" => Ok(RuleType::Any),
            other => Err(Error::InvalidSchema(format!("unknown type '{}'", other))),
        }
    }
}

impl RuleType {
    pub fn name(&self) -> &'static str {
        match self {
            RuleType::String => "string",
            RuleType::Int => "int",
            RuleType::Float => "float",
            RuleType::Bool => "bool",
            RuleType::Array => "array",
            RuleType::Map => "map",
            RuleType::Any => "any",
        }
    }
}

/// One node of a schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationRule {
    pub rule_type: RuleType,
    pub nullable: bool,
    pub enum_values: Option<Vec<Value>>,

    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<f64>,
    pub exclusive_maximum: Option<f64>,

    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: bool,
    pub items: Option<Box<ValidationRule>>,

    pub required: Vec<String>,
    pub properties: IndexMap<String, ValidationRule>,
    /// `Some(false)` rejects keys missing from `properties`
    pub additional_properties: Option<bool>,
}

impl ValidationRule {
    pub fn new(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            ..Self::default()
        }
    }

    /// Parse a schema written in YAML.
    pub fn parse(text: &str) -> Result<Self, Error> {
        Self::from_document(&Document::load(text)?)
    }

    pub fn from_document(doc: &Document) -> Result<Self, Error> {
        Self::from_value(&doc.get("")?)
    }

    /// Build a rule from a decoded schema map.
    pub fn from_value(value: &Value) -> Result<Self, Error> {
        Self::read(value, "")
    }

    fn read(value: &Value, at: &str) -> Result<Self, Error> {
        let map = value.as_map().ok_or_else(|| {
            invalid(at, format!("expected a map, found {}", value_type(value)))
        })?;
        let mut rule = Self::default();
        for (key, v) in map {
            match key.as_str() {
                "type" => rule.rule_type = string(v, at, key)?.parse()?,
                "nullable" => rule.nullable = boolean(v, at, key)?,
                "enum" => rule.enum_values = Some(list(v, at, key)?.to_vec()),
                "minLength" => rule.min_length = Some(count(v, at, key)?),
                "maxLength" => rule.max_length = Some(count(v, at, key)?),
                "pattern" => rule.pattern = Some(string(v, at, key)?.to_string()),
                "minimum" => rule.minimum = Some(number(v, at, key)?),
                "maximum" => rule.maximum = Some(number(v, at, key)?),
                "exclusiveMinimum" => rule.exclusive_minimum = Some(number(v, at, key)?),
                "exclusiveMaximum" => rule.exclusive_maximum = Some(number(v, at, key)?),
                "minItems" => rule.min_items = Some(count(v, at, key)?),
                "maxItems" => rule.max_items = Some(count(v, at, key)?),
                "uniqueItems" => rule.unique_items = boolean(v, at, key)?,
                "items" => rule.items = Some(Box::new(Self::read(v, &join(at, "items"))?)),
                "required" => {
                    rule.required = list(v, at, key)?
                        .iter()
                        .map(|item| string(item, at, key).map(str::to_string))
                        .collect::<Result<_, _>>()?
                }
                "properties" => {
                    let props = v.as_map().ok_or_else(|| {
                        invalid(at, "'properties' must be a map".to_string())
                    })?;
                    let base = join(at, "properties");
                    for (name, sub) in props {
                        let rule_at = join(&base, name);
                        rule.properties.insert(name.clone(), Self::read(sub, &rule_at)?);
                    }
                }
                "additionalProperties" => {
                    rule.additional_properties = Some(boolean(v, at, key)?)
                }
                "description" | "title" => {}
                other => return Err(invalid(at, format!("unknown keyword '{}'", other))),
            }
        }
        Ok(rule)
    }
}

fn join(at: &str, key: &str) -> String {
    if at.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", at, key)
    }
}

fn invalid(at: &str, message: String) -> Error {
    if at.is_empty() {
        Error::InvalidSchema(message)
    } else {
        Error::InvalidSchema(format!("{} (in '{}')", message, at))
    }
}

fn expected(at: &str, key: &str, what: &str, found: &Value) -> Error {
    invalid(
        at,
        format!("'{}' must be {}, found {}", key, what, value_type(found)),
    )
}

fn string<'a>(v: &'a Value, at: &str, key: &str) -> Result<&'a str, Error> {
    v.as_str().ok_or_else(|| expected(at, key, "a string", v))
}

fn boolean(v: &Value, at: &str, key: &str) -> Result<bool, Error> {
    v.as_bool().ok_or_else(|| expected(at, key, "a boolean", v))
}

fn number(v: &Value, at: &str, key: &str) -> Result<f64, Error> {
    v.as_f64().ok_or_else(|| expected(at, key, "a number", v))
}

fn count(v: &Value, at: &str, key: &str) -> Result<usize, Error> {
    v.as_i64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| expected(at, key, "a non-negative integer", v))
}

fn list<'a>(v: &'a Value, at: &str, key: &str) -> Result<&'a [Value], Error> {
    v.as_list().ok_or_else(|| expected(at, key, "a list", v))
}
