use serde_json::{Number, Value};

/// Parse a raw text value into a typed scalar.
/// Tries: bool → integer → float → string.
///
/// Used by formats that only carry text (INI values, XML text nodes).
pub fn parse_scalar(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Number(i.into());
    }
    // Only use float if the string actually contains a dot,
    // to avoid "NaN" / "inf" being parsed as float.
    if s.contains('.')
        && let Ok(f) = s.parse::<f64>()
        && let Some(n) = Number::from_f64(f)
    {
        return Value::Number(n);
    }
    Value::String(s.to_string())
}

/// Render a scalar back to text. Containers render as JSON.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_bool_case_insensitive() {
        assert_eq!(parse_scalar("TRUE"), json!(true));
        assert_eq!(parse_scalar("false"), json!(false));
    }

    #[test]
    fn parse_integer() {
        assert_eq!(parse_scalar("8080"), json!(8080));
        assert_eq!(parse_scalar("-5"), json!(-5));
    }

    #[test]
    fn parse_float() {
        assert_eq!(parse_scalar("5.99"), json!(5.99));
    }

    #[test]
    fn parse_string_fallback() {
        assert_eq!(parse_scalar("hello world"), json!("hello world"));
        assert_eq!(parse_scalar("NaN"), json!("NaN"));
        assert_eq!(parse_scalar(""), json!(""));
    }

    #[test]
    fn scalar_text_renders_plain() {
        assert_eq!(scalar_text(&json!("x")), "x");
        assert_eq!(scalar_text(&json!(3)), "3");
        assert_eq!(scalar_text(&json!(false)), "false");
        assert_eq!(scalar_text(&Value::Null), "");
    }
}
