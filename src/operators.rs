//! Replacement tables for JavaScript operators and literals.

/// Replacement text for string literals and non-literal call arguments.
pub const SENTINEL: &str = "\"MUTATION!\"";

/// Boundary variant first, negation second.
pub fn comparison_mutations(op: &str) -> Vec<&'static str> {
    let (boundary, negation) = match op {
        "<" => ("<=", ">="),
        "<=" => ("<", ">"),
        ">" => (">=", "<="),
        ">=" => (">", "<"),
        "===" => ("==", "!=="),
        "==" => ("===", "!="),
        "!==" => ("!=", "==="),
        "!=" => ("!==", "=="),
        _ => return vec![],
    };
    vec![boundary, negation]
}

pub fn is_comparison(op: &str) -> bool {
    matches!(op, "<" | "<=" | ">" | ">=" | "===" | "==" | "!==" | "!=")
}

pub fn math_mutation(op: &str) -> Option<&'static str> {
    let replacement = match op {
        "+" => "-",
        "-" => "+",
        "*" => "/",
        "/" => "*",
        "%" => "*",
        _ => return None,
    };
    Some(replacement)
}

pub fn logical_mutation(op: &str) -> Option<&'static str> {
    let replacement = match op {
        "&&" => "||",
        "||" => "&&",
        _ => return None,
    };
    Some(replacement)
}

pub fn update_mutation(op: &str) -> Option<&'static str> {
    let replacement = match op {
        "++" => "--",
        "--" => "++",
        _ => return None,
    };
    Some(replacement)
}

/// Prefix operators that are stripped outright.
pub fn is_strippable_unary(op: &str) -> bool {
    matches!(op, "-" | "!" | "~" | "+")
}

/// Literal replacement keyed on the tree-sitter node kind and its text.
pub fn literal_replacement(kind: &str, text: &str) -> Option<String> {
    match kind {
        "string" => Some(SENTINEL.to_string()),
        "number" => increment_number(text),
        "true" => Some("false".to_string()),
        "false" => Some("true".to_string()),
        _ => None,
    }
}

pub fn is_literal_kind(kind: &str) -> bool {
    matches!(kind, "string" | "number" | "true" | "false")
}

/// `text` plus one, written back as a JavaScript numeric literal. `None`
/// when the result does not fit a finite double (`1e400`).
pub fn increment_number(text: &str) -> Option<String> {
    let cleaned = text.replace('_', "");

    if let Some(digits) = cleaned.strip_suffix('n') {
        let value = parse_integer(digits)?;
        return Some(format!("{}n", value.checked_add(1)?));
    }

    let value = match parse_integer(&cleaned) {
        Some(v) if has_radix_prefix(&cleaned) => v as f64,
        _ => cleaned.parse::<f64>().ok()?,
    };
    let incremented = value + 1.0;
    if !incremented.is_finite() {
        return None;
    }
    Some(format_number(incremented))
}

fn has_radix_prefix(text: &str) -> bool {
    text.len() > 2 && text.starts_with('0') && text.as_bytes()[1].is_ascii_alphabetic()
}

fn parse_integer(text: &str) -> Option<i128> {
    if let Some(hex) = strip_radix(text, "0x", "0X") {
        i128::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = strip_radix(text, "0o", "0O") {
        i128::from_str_radix(oct, 8).ok()
    } else if let Some(bin) = strip_radix(text, "0b", "0B") {
        i128::from_str_radix(bin, 2).ok()
    } else {
        text.parse::<i128>().ok()
    }
}

fn strip_radix<'a>(text: &'a str, lower: &str, upper: &str) -> Option<&'a str> {
    text.strip_prefix(lower).or_else(|| text.strip_prefix(upper))
}

fn format_number(value: f64) -> String {
    // 2^53: beyond this f64 no longer holds every integer
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
