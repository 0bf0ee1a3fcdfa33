//! Flat key/value configuration reader.
//!
//! Reads a JSON document whose root is an object of scalar values and returns
//! its entries in file order, every value rendered as a string. Structured
//! documents (nested objects or arrays) are rejected; `NetworkSpec` is the
//! typed route for those.

use serde_json::Value;

use crate::error::{NnError, Result};

/// Reads the flat object at `path` into ordered `(key, value)` pairs.
pub fn read_pairs(path: &str) -> Result<Vec<(String, String)>> {
    let text = std::fs::read_to_string(path)?;
    parse_pairs(&text)
}

/// Parses a flat JSON object into ordered `(key, value)` pairs.
pub fn parse_pairs(text: &str) -> Result<Vec<(String, String)>> {
    let root: Value = serde_json::from_str(text)?;
    let object = match root {
        Value::Object(map) => map,
        _ => return Err(NnError::invalid("configuration root must be an object")),
    };

    object.into_iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(NnError::invalid(format!("configuration key `{key}` is not a scalar")));
                }
            };
            Ok((key, rendered))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_scalars_in_file_order() {
        let pairs = parse_pairs(r#"{ "foo": 1, "baz": "foobar", "pi": 3.14, "on": true }"#).unwrap();
        assert_eq!(pairs, vec![
            ("foo".to_string(), "1".to_string()),
            ("baz".to_string(), "foobar".to_string()),
            ("pi".to_string(), "3.14".to_string()),
            ("on".to_string(), "true".to_string()),
        ]);
    }

    #[test]
    fn rejects_structured_documents() {
        assert!(parse_pairs(r#"{ "layers": [1, 2] }"#).is_err());
        assert!(parse_pairs(r#"[1, 2]"#).is_err());
        assert!(matches!(parse_pairs("{ not json"), Err(NnError::Json(_))));
    }

    #[test]
    fn missing_file_fails() {
        assert!(matches!(read_pairs("/nonexistent/strata_nn.json"), Err(NnError::Io(_))));
    }

    #[test]
    fn reads_from_file() {
        let path = std::env::temp_dir().join("strata_nn_pairs_test.json");
        std::fs::write(&path, r#"{ "learning_rate": 0.3, "epochs": 100 }"#).unwrap();
        let pairs = read_pairs(path.to_str().unwrap()).unwrap();
        assert_eq!(pairs[0], ("learning_rate".to_string(), "0.3".to_string()));
        assert_eq!(pairs[1], ("epochs".to_string(), "100".to_string()));
        let _ = std::fs::remove_file(path);
    }
}
