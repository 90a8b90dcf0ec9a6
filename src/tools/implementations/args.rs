// Argument extraction helpers

use serde_json::Value;

use crate::tools::error::ToolError;

pub(crate) fn required_str<'a>(input: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    match input.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(Value::Null) | None => Err(ToolError::Validation(format!(
            "Missing required parameter: {}",
            key
        ))),
        Some(_) => Err(ToolError::Validation(format!(
            "Parameter '{}' must be a string",
            key
        ))),
    }
}

pub(crate) fn optional_str<'a>(input: &'a Value, key: &str) -> Option<&'a str> {
    input.get(key).and_then(Value::as_str)
}

/// Non-negative integer, accepting numeric strings the model sometimes sends
pub(crate) fn optional_usize(input: &Value, key: &str) -> Result<Option<usize>, ToolError> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(|v| Some(usize::try_from(v).unwrap_or(usize::MAX)))
            .ok_or_else(|| ToolError::Validation(format!("Parameter '{}' must be >= 0", key))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ToolError::Validation(format!("Parameter '{}' must be an integer", key))),
        Some(_) => Err(ToolError::Validation(format!(
            "Parameter '{}' must be an integer",
            key
        ))),
    }
}

pub(crate) fn optional_bool(input: &Value, key: &str) -> bool {
    match input.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.as_str(), "true" | "True" | "1"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_str() {
        let input = json!({"path": "a", "n": 3});
        assert_eq!(required_str(&input, "path").unwrap(), "a");
        assert!(matches!(required_str(&input, "missing"), Err(ToolError::Validation(_))));
        assert!(matches!(required_str(&input, "n"), Err(ToolError::Validation(_))));
    }

    #[test]
    fn test_optional_usize_accepts_numeric_strings() {
        let input = json!({"a": 5, "b": "7", "c": -1, "d": "x"});
        assert_eq!(optional_usize(&input, "a").unwrap(), Some(5));
        assert_eq!(optional_usize(&input, "b").unwrap(), Some(7));
        assert!(optional_usize(&input, "c").is_err());
        assert!(optional_usize(&input, "d").is_err());
        assert_eq!(optional_usize(&input, "missing").unwrap(), None);
    }
}
