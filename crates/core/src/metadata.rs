use crate::error::MetadataError;
use serde_json::{Map, Value as JsonValue};

/// Key/value data read from a metadata section.
pub type JsonMap = Map<String, JsonValue>;

/// Parses the body of a metadata section into a key/value map.
///
/// The body is a YAML mapping (`title: X`). An optional pair of `---` fences
/// around it is tolerated. Blank bodies and `null` yield an empty map.
pub fn parse_metadata(body: &str) -> Result<JsonMap, MetadataError> {
    let block = strip_yaml_fences(strip_bom(body));
    if block.trim().is_empty() {
        return Ok(JsonMap::new());
    }

    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| MetadataError::Parse(err.to_string()))?;
    let json_value =
        serde_json::to_value(yaml_value).map_err(|err| MetadataError::Parse(err.to_string()))?;

    match json_value {
        JsonValue::Null => Ok(JsonMap::new()),
        JsonValue::Object(map) => Ok(map),
        _ => Err(MetadataError::InvalidRootType),
    }
}

/// Merges `update` into `target`, later keys replacing earlier ones.
pub fn merge_metadata(target: &mut JsonMap, update: JsonMap) {
    for (key, value) in update {
        target.insert(key, value);
    }
}

fn strip_bom(input: &str) -> &str {
    input.strip_prefix('\u{feff}').unwrap_or(input)
}

fn strip_yaml_fences(input: &str) -> &str {
    let trimmed = input.trim();
    let Some(inner) = trimmed.strip_prefix("---") else {
        return input;
    };
    let Some(inner) = inner.strip_suffix("---") else {
        return input;
    };
    if !inner.starts_with(['\n', '\r']) {
        return input;
    }
    inner
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> JsonMap {
        parse_metadata(input).expect("metadata parsing should succeed")
    }

    #[test]
    fn parses_key_value_lines() {
        let map = parse("title: X\nauthor: Ada\n");
        assert_eq!(map.get("title").and_then(JsonValue::as_str), Some("X"));
        assert_eq!(map.get("author").and_then(JsonValue::as_str), Some("Ada"));
    }

    #[test]
    fn preserves_key_order() {
        let map = parse("zeta: 1\nalpha: 2\nmid: 3\n");
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn blank_body_is_empty() {
        assert!(parse("\n  \n").is_empty());
        assert!(parse("~\n").is_empty());
    }

    #[test]
    fn tolerates_yaml_fences() {
        let map = parse("---\ntitle: Fenced\n---\n");
        assert_eq!(map.get("title").and_then(JsonValue::as_str), Some("Fenced"));
    }

    #[test]
    fn nested_values_survive() {
        let map = parse("tags:\n  - law\n  - torts\n");
        let tags = map.get("tags").and_then(JsonValue::as_array).unwrap();
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn errors_on_invalid_yaml() {
        let err = parse_metadata("title: [unterminated\n").unwrap_err();
        assert!(matches!(err, MetadataError::Parse(_)), "{err:?}");
    }

    #[test]
    fn errors_on_non_mapping_root() {
        let err = parse_metadata("- just\n- a list\n").unwrap_err();
        assert!(matches!(err, MetadataError::InvalidRootType));
    }

    #[test]
    fn merge_overwrites_conflicting_keys_only() {
        let mut target = parse("title: Old\nyear: 2020\n");
        merge_metadata(&mut target, parse("title: New\n"));
        assert_eq!(target.get("title").and_then(JsonValue::as_str), Some("New"));
        assert_eq!(target.get("year").and_then(JsonValue::as_i64), Some(2020));
    }
}
