//! Helpers for reading JSON records out of model output

use serde_json::Value;

/// Slice the outermost `{...}` out of a response (handles markdown fences
/// and chatter around the object).
pub fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}

/// Parse the JSON object embedded in `response`, if any
pub fn parse_object(response: &str) -> Option<serde_json::Map<String, Value>> {
    let json_str = extract_json(response)?;
    match serde_json::from_str::<Value>(json_str) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Model output is not valid JSON: {}", e);
            None
        }
    }
}

/// Collect the string members of the first array found under any of `keys`
pub fn string_list(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Vec<String> {
    keys.iter()
        .find_map(|k| map.get(*k).and_then(Value::as_array))
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Read a string member, treating absence and non-strings as `None`
pub fn string_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Read a boolean member; accepts `"true"`/`"false"` strings as well
pub fn bool_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "sim" | "yes" => Some(true),
            "false" | "não" | "nao" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_fenced_block() {
        let response = "```json\n{\"answer\": \"ok\"}\n```";
        assert_eq!(extract_json(response), Some("{\"answer\": \"ok\"}"));
    }

    #[test]
    fn test_no_object() {
        assert!(extract_json("plain text").is_none());
        assert!(parse_object("} backwards {").is_none());
        assert!(parse_object("{not json}").is_none());
    }

    #[test]
    fn test_string_list_aliases() {
        let map = parse_object(r#"{"variantes": ["a", " b ", 3, ""]}"#).unwrap();
        assert_eq!(string_list(&map, &["variations", "variantes"]), vec!["a", "b"]);
        assert!(string_list(&map, &["missing"]).is_empty());
    }

    #[test]
    fn test_bool_field_accepts_strings() {
        let map = parse_object(r#"{"a": true, "b": "false", "c": 1}"#).unwrap();
        assert_eq!(bool_field(&map, "a"), Some(true));
        assert_eq!(bool_field(&map, "b"), Some(false));
        assert_eq!(bool_field(&map, "c"), None);
    }
}
