use super::value::Scalar;

/// Coerces untyped text (INI values, XML text content) into the most
/// specific scalar: null, boolean, integer, float, or string as a fallback.
pub fn coerce_value(s: &str) -> Scalar {
    let lower = s.to_ascii_lowercase();
    match lower.as_str() {
        "null" => return Scalar::Null,
        "true" | "on" | "yes" => return Scalar::Bool(true),
        "false" | "off" | "no" | "none" => return Scalar::Bool(false),
        _ => {}
    }

    if looks_like_integer(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Scalar::Integer(i);
        }
    }

    if looks_like_float(s) {
        if let Ok(f) = s.parse::<f64>() {
            return Scalar::Float(f);
        }
    }

    Scalar::String(s.to_string())
}

/// A stricter [`coerce_value`] for XML text: only `true`, `false` and `null`
/// are keywords, and numbers with leading zeros stay strings.
pub fn coerce_literal(s: &str) -> Scalar {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let padded = unsigned.len() > 1
        && unsigned.starts_with('0')
        && unsigned[1..].starts_with(|c: char| c.is_ascii_digit());
    match s.to_ascii_lowercase().as_str() {
        "on" | "yes" | "off" | "no" | "none" => Scalar::String(s.to_string()),
        _ if padded => Scalar::String(s.to_string()),
        _ => coerce_value(s),
    }
}

fn looks_like_integer(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

// Rejects "inf", "NaN" and friends, which `f64::from_str` would accept.
fn looks_like_float(s: &str) -> bool {
    s.contains('.')
        && s.chars().any(|c| c.is_ascii_digit())
        && s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_keywords() {
        assert_eq!(coerce_value("null"), Scalar::Null);
        assert_eq!(coerce_value("On"), Scalar::Bool(true));
        assert_eq!(coerce_value("yes"), Scalar::Bool(true));
        assert_eq!(coerce_value("FALSE"), Scalar::Bool(false));
        assert_eq!(coerce_value("none"), Scalar::Bool(false));
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(coerce_value("1"), Scalar::Integer(1));
        assert_eq!(coerce_value("-42"), Scalar::Integer(-42));
        assert_eq!(coerce_value("5.0"), Scalar::Float(5.0));
        assert_eq!(coerce_value("1.5e3"), Scalar::Float(1500.0));
        assert_eq!(
            coerce_value("99999999999999999999"),
            Scalar::String("99999999999999999999".into())
        );
    }

    #[test]
    fn test_coerce_fallback_to_string() {
        assert_eq!(coerce_value("inf"), Scalar::String("inf".into()));
        assert_eq!(coerce_value("1.2.3"), Scalar::String("1.2.3".into()));
        assert_eq!(coerce_value("-"), Scalar::String("-".into()));
        assert_eq!(coerce_value(""), Scalar::String(String::new()));
        assert_eq!(
            coerce_value("/usr/local/bin"),
            Scalar::String("/usr/local/bin".into())
        );
    }

    #[test]
    fn test_coerce_literal_keeps_words_and_padding() {
        assert_eq!(coerce_literal("none"), Scalar::String("none".into()));
        assert_eq!(coerce_literal("no"), Scalar::String("no".into()));
        assert_eq!(coerce_literal("007"), Scalar::String("007".into()));
        assert_eq!(coerce_literal("-01"), Scalar::String("-01".into()));
        assert_eq!(coerce_literal("0"), Scalar::Integer(0));
        assert_eq!(coerce_literal("0.5"), Scalar::Float(0.5));
        assert_eq!(coerce_literal("True"), Scalar::Bool(true));
        assert_eq!(coerce_literal("null"), Scalar::Null);
    }
}
