//! Checking a document tree against a [`ValidationRule`].
//!
//! The walk stops at the first failure; the error carries the path of the
//! node that failed.

use super::emitter::emit_flow;
use super::error::Error;
use super::node::{Node, Tag};
use super::path::Path;
use super::schema::{RuleType, ValidationRule};
use super::value::{decode, node_type, Value};
use log::trace;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Validate `root` against `rule`.
pub fn validate(root: &Node, rule: &ValidationRule) -> Result<(), Error> {
    check(root, rule, &Path::root())
}

fn check(node: &Node, rule: &ValidationRule, path: &Path) -> Result<(), Error> {
    trace!("validating '{}' as {}", path, rule.rule_type.name());
    if rule.nullable && node.is_null() {
        return Ok(());
    }
    match rule.rule_type {
        RuleType::String => {
            expect(node, path, rule, &[Tag::String])?;
            if let Value::String(s) = decode(node, path)? {
                check_string(&s, rule, path)?;
            }
        }
        RuleType::Int => {
            expect(node, path, rule, &[Tag::Int])?;
            check_number(node, rule, path)?;
        }
        RuleType::Float => {
            expect(node, path, rule, &[Tag::Int, Tag::Float])?;
            check_number(node, rule, path)?;
        }
        RuleType::Bool => expect(node, path, rule, &[Tag::Bool])?,
        RuleType::Array => {
            if !node.is_sequence() {
                return Err(mismatch(node, path, rule));
            }
            check_array(node, rule, path)?;
        }
        RuleType::Map => {
            if !node.is_mapping() {
                return Err(mismatch(node, path, rule));
            }
            check_map(node, rule, path)?;
        }
        RuleType::Any => {}
    }
    check_enum(node, rule, path)
}

fn mismatch(node: &Node, path: &Path, rule: &ValidationRule) -> Error {
    Error::TypeMismatch {
        path: path.to_string(),
        expected: rule.rule_type.name().to_string(),
        found: node_type(node),
    }
}

fn expect(node: &Node, path: &Path, rule: &ValidationRule, tags: &[Tag]) -> Result<(), Error> {
    match node.tag() {
        Some(tag) if tags.contains(&tag) => Ok(()),
        _ => Err(mismatch(node, path, rule)),
    }
}

fn violation(path: &Path, message: String) -> Error {
    Error::ConstraintViolation {
        path: path.to_string(),
        message,
    }
}

fn check_string(s: &str, rule: &ValidationRule, path: &Path) -> Result<(), Error> {
    let len = s.chars().count();
    if let Some(min) = rule.min_length {
        if len < min {
            return Err(violation(
                path,
                format!("length {} is less than minLength {}", len, min),
            ));
        }
    }
    if let Some(max) = rule.max_length {
        if len > max {
            return Err(violation(
                path,
                format!("length {} is greater than maxLength {}", len, max),
            ));
        }
    }
    if let Some(pattern) = &rule.pattern {
        let re = Regex::new(pattern).map_err(|e| Error::InvalidPattern {
            path: path.to_string(),
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        if !re.is_match(s) {
            return Err(violation(
                path,
                format!("'{}' does not match pattern '{}'", s, pattern),
            ));
        }
    }
    Ok(())
}

fn check_number(node: &Node, rule: &ValidationRule, path: &Path) -> Result<(), Error> {
    let value = decode(node, path)?;
    if value.as_f64().is_none() {
        return Err(mismatch(node, path, rule));
    }
    let shown = value.to_string();
    if let Some(min) = rule.minimum {
        if compare(&value, min) == Some(Ordering::Less) {
            return Err(violation(path, format!("value {} is less than minimum {}", shown, min)));
        }
    }
    if let Some(max) = rule.maximum {
        if compare(&value, max) == Some(Ordering::Greater) {
            return Err(violation(path, format!("value {} is greater than maximum {}", shown, max)));
        }
    }
    if let Some(min) = rule.exclusive_minimum {
        if compare(&value, min) != Some(Ordering::Greater) {
            return Err(violation(
                path,
                format!("value {} is not greater than exclusiveMinimum {}", shown, min),
            ));
        }
    }
    if let Some(max) = rule.exclusive_maximum {
        if compare(&value, max) != Some(Ordering::Less) {
            return Err(violation(
                path,
                format!("value {} is not less than exclusiveMaximum {}", shown, max),
            ));
        }
    }
    Ok(())
}

/// Order of a number against a bound. Integers are compared exactly when the
/// bound is a whole number in `i64` range.
fn compare(value: &Value, bound: f64) -> Option<Ordering> {
    if let Value::Int(i) = value {
        if bound.fract() == 0.0 && bound >= i64::MIN as f64 && bound < i64::MAX as f64 {
            return Some(i.cmp(&(bound as i64)));
        }
    }
    value.as_f64()?.partial_cmp(&bound)
}

fn check_array(node: &Node, rule: &ValidationRule, path: &Path) -> Result<(), Error> {
    let items = node.items();
    if let Some(min) = rule.min_items {
        if items.len() < min {
            return Err(violation(
                path,
                format!("{} items is fewer than minItems {}", items.len(), min),
            ));
        }
    }
    if let Some(max) = rule.max_items {
        if items.len() > max {
            return Err(violation(
                path,
                format!("{} items is more than maxItems {}", items.len(), max),
            ));
        }
    }
    if rule.unique_items {
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (i, item) in items.iter().enumerate() {
            if let Some(first) = seen.insert(emit_flow(item), i) {
                return Err(violation(
                    path,
                    format!("item [{}] duplicates item [{}]", i, first),
                ));
            }
        }
    }
    if let Some(item_rule) = &rule.items {
        for (i, item) in items.iter().enumerate() {
            check(item, item_rule, &path.child_index(i))?;
        }
    }
    Ok(())
}

fn check_map(node: &Node, rule: &ValidationRule, path: &Path) -> Result<(), Error> {
    for field in &rule.required {
        if node.get(field).is_none() {
            return Err(Error::RequiredFieldMissing {
                path: path.to_string(),
                field: field.clone(),
            });
        }
    }
    for (key, sub) in &rule.properties {
        if let Some(value) = node.get(key) {
            check(value, sub, &path.child_key(key))?;
        }
    }
    if rule.additional_properties == Some(false) {
        if let Some(entry) = node
            .entries()
            .iter()
            .find(|e| !rule.properties.contains_key(e.key_str()))
        {
            return Err(Error::AdditionalPropertyNotAllowed {
                path: path.to_string(),
                property: entry.key_str().to_string(),
            });
        }
    }
    Ok(())
}

fn check_enum(node: &Node, rule: &ValidationRule, path: &Path) -> Result<(), Error> {
    let allowed = match &rule.enum_values {
        Some(allowed) => allowed,
        None => return Ok(()),
    };
    let value = decode(node, path)?;
    if allowed.iter().any(|a| a.loosely_equals(&value)) {
        return Ok(());
    }
    Err(Error::EnumViolation {
        path: path.to_string(),
        value: value.to_string(),
        allowed: allowed.iter().map(Value::to_string).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;

    fn run(schema: &str, text: &str) -> Result<(), Error> {
        let rule = ValidationRule::parse(schema).unwrap();
        validate(&parse(text).unwrap().root, &rule)
    }

    #[test]
    fn test_required_reports_map_path() {
        let schema = "type: map\nproperties:\n  server:\n    type: map\n    required: [x]\n";
        let err = run(schema, "server:\n  y: 1\n").unwrap_err();
        assert_eq!(
            err,
            Error::RequiredFieldMissing {
                path: "server".into(),
                field: "x".into()
            }
        );
        let err = run("type: map\nrequired: [x]\n", "a: 1\n").unwrap_err();
        assert_eq!(err.path(), Some(""));
    }

    #[test]
    fn test_maximum_is_inclusive() {
        let schema = "type: map\nproperties:\n  n: {type: int, maximum: 10}\n";
        assert!(run(schema, "n: 10\n").is_ok());
        let err = run(schema, "n: 11\n").unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { ref path, .. } if path == "n"));
    }

    #[test]
    fn test_exclusive_bounds() {
        let schema = "type: map\nproperties:\n  n: {type: float, exclusiveMinimum: 0}\n";
        assert!(run(schema, "n: 0.5\n").is_ok());
        assert!(run(schema, "n: 0\n").is_err());
    }

    #[test]
    fn test_int_rejects_float_and_float_accepts_int() {
        let int = "type: map\nproperties:\n  n: {type: int}\n";
        let float = "type: map\nproperties:\n  n: {type: float}\n";
        assert!(matches!(run(int, "n: 1.5\n"), Err(Error::TypeMismatch { .. })));
        assert!(run(float, "n: 3\n").is_ok());
    }

    #[test]
    fn test_nullable() {
        let schema = "type: map\nproperties:\n  s: {type: string, nullable: true}\n  t: {type: string}\n";
        assert!(run(schema, "s: null\nt: x\n").is_ok());
        assert!(matches!(run(schema, "s: x\nt: ~\n"), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_string_constraints() {
        let schema = "type: map\nproperties:\n  s: {type: string, minLength: 2, maxLength: 4, pattern: '^[a-z]+$'}\n";
        assert!(run(schema, "s: abc\n").is_ok());
        assert!(run(schema, "s: a\n").is_err());
        assert!(run(schema, "s: abcde\n").is_err());
        assert!(run(schema, "s: AB\n").is_err());
        let chars = "type: map\nproperties:\n  s: {type: string, maxLength: 2}\n";
        assert!(run(chars, "s: \"\u{e9}\u{e9}\"\n").is_ok());
    }

    #[test]
    fn test_invalid_pattern() {
        let schema = "type: map\nproperties:\n  s: {type: string, pattern: '(['}\n";
        assert!(matches!(run(schema, "s: a\n"), Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_enum() {
        let schema = "type: map\nproperties:\n  env: {type: string, enum: [dev, prod]}\n  n: {enum: [1, 2]}\n";
        assert!(run(schema, "env: dev\nn: 2.0\n").is_ok());
        let err = run(schema, "env: test\n").unwrap_err();
        assert_eq!(
            err,
            Error::EnumViolation {
                path: "env".into(),
                value: "test".into(),
                allowed: vec!["dev".into(), "prod".into()]
            }
        );
    }

    #[test]
    fn test_array_rules() {
        let schema = "type: map\nproperties:\n  l:\n    type: array\n    minItems: 1\n    maxItems: 3\n    uniqueItems: true\n    items: {type: int}\n";
        assert!(run(schema, "l: [1, 2]\n").is_ok());
        assert!(run(schema, "l: []\n").is_err());
        assert!(run(schema, "l: [1, 2, 3, 4]\n").is_err());
        assert!(run(schema, "l: [1, 1]\n").is_err());
        let err = run(schema, "l: [1, x]\n").unwrap_err();
        assert_eq!(err.path(), Some("l[1]"));
    }

    #[test]
    fn test_additional_properties() {
        let closed = "type: map\nproperties:\n  a: {type: int}\nadditionalProperties: false\n";
        let open = "type: map\nproperties:\n  a: {type: int}\n";
        assert!(matches!(
            run(closed, "a: 1\nb: 2\n"),
            Err(Error::AdditionalPropertyNotAllowed { ref property, .. }) if property == "b"
        ));
        assert!(run(open, "a: 1\nb: 2\n").is_ok());
    }

    #[test]
    fn test_first_failure_wins() {
        let schema = "type: map\nrequired: [z]\nproperties:\n  a: {type: int}\n";
        assert!(matches!(
            run(schema, "a: x\n"),
            Err(Error::RequiredFieldMissing { .. })
        ));
    }

    #[test]
    fn test_large_ints_compare_exactly() {
        let schema = "type: map\nproperties:\n  n: {type: int, maximum: 9007199254740992}\n";
        assert!(run(schema, "n: 9007199254740992\n").is_ok());
        let err = run(schema, "n: 9007199254740993\n").unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { ref path, .. } if path == "n"));
        let exclusive = "type: map\nproperties:\n  n: {type: int, exclusiveMinimum: 9007199254740992}\n";
        assert!(run(exclusive, "n: 9007199254740993\n").is_ok());
    }
}
