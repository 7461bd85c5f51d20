use recon_core::errors::{ErrorInfo, ReconError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Recursively rebuilds objects with their keys in lexicographic order.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, nested)| (key, sort_keys(nested)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        scalar => scalar,
    }
}

/// Pretty-printed JSON with sorted keys and a trailing newline.
///
/// The scalar summary consumed by the renderer is always written through this
/// function, so equal values always serialize to equal bytes.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, ReconError> {
    let tree = serde_json::to_value(value)
        .map_err(|err| ReconError::Export(ErrorInfo::new("json_serialize", err.to_string())))?;
    let mut bytes = serde_json::to_vec_pretty(&sort_keys(tree))
        .map_err(|err| ReconError::Export(ErrorInfo::new("json_write", err.to_string())))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Deserializes a YAML configuration payload.
pub fn from_yaml_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, ReconError> {
    serde_yaml::from_slice(data)
        .map_err(|err| ReconError::Config(ErrorInfo::new("yaml_deserialize", err.to_string())))
}

/// Serializes a value (typically a descriptor or a configuration) into YAML.
pub fn to_yaml_string<T: Serialize>(value: &T) -> Result<String, ReconError> {
    serde_yaml::to_string(value)
        .map_err(|err| ReconError::Config(ErrorInfo::new("yaml_serialize", err.to_string())))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn nested_keys_are_sorted() {
        let bytes = to_canonical_json_bytes(&json!({"b": {"z": 1, "a": 2}, "a": [ {"y": 0, "x": 1} ]}))
            .expect("canonical");
        let text = String::from_utf8(bytes).expect("utf8");
        let a = text.find("\"a\"").expect("a");
        let b = text.find("\"b\"").expect("b");
        assert!(a < b);
        assert!(text.find("\"x\"").expect("x") < text.find("\"y\"").expect("y"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn malformed_yaml_is_config_error() {
        let err = from_yaml_slice::<crate::config::ReconConfig>(b"root: [unterminated")
            .expect_err("yaml");
        assert!(matches!(err, ReconError::Config(_)));
    }
}
