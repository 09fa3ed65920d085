//! `${field}` template interpolation against top-level config fields
//! (spec §4.1, §6).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

static TEMPLATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Build the field lookup table from the top-level object's scalar fields
/// (string form), used as interpolation sources.
pub fn scalar_field_table(top_level: &Value) -> HashMap<String, String> {
    let mut table = HashMap::new();
    if let Value::Object(map) = top_level {
        for (key, value) in map {
            if let Some(s) = scalar_to_string(value) {
                table.insert(key.clone(), s);
            }
        }
    }
    table
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Recursively substitute `${x}` in every string leaf of `value`.
/// Unknown references are left verbatim (spec §4.1).
pub fn interpolate(value: &mut Value, table: &HashMap<String, String>) {
    match value {
        Value::String(s) => {
            *s = interpolate_str(s, table);
        }
        Value::Array(items) => {
            for item in items {
                interpolate(item, table);
            }
        }
        Value::Object(map) => {
            for v in map.values_mut() {
                interpolate(v, table);
            }
        }
        _ => {}
    }
}

fn interpolate_str(input: &str, table: &HashMap<String, String>) -> String {
    TEMPLATE
        .replace_all(input, |caps: &regex::Captures| {
            let key = &caps[1];
            table
                .get(key)
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn substitutes_known_field() {
        let mut table = HashMap::new();
        table.insert("name".to_string(), "app".to_string());
        let mut value = json!("project: ${name}");
        interpolate(&mut value, &table);
        assert_eq!(value, json!("project: app"));
    }

    #[test]
    fn leaves_unknown_reference_verbatim() {
        let table = HashMap::new();
        let mut value = json!("${missing}");
        interpolate(&mut value, &table);
        assert_eq!(value, json!("${missing}"));
    }

    #[test]
    fn recurses_into_nested_structures() {
        let mut table = HashMap::new();
        table.insert("env".to_string(), "prod".to_string());
        let mut value = json!({"a": ["${env}", {"b": "${env}-1"}]});
        interpolate(&mut value, &table);
        assert_eq!(value, json!({"a": ["prod", {"b": "prod-1"}]}));
    }
}
