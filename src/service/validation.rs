//! DTO validation against field contracts. Collects every violation.

use crate::config::ValidationRule;
use crate::error::{AppError, FieldViolation};
use regex::Regex;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a serialized DTO. `required` fails on absent, null, or empty-string fields.
    pub fn validate(doc: &Value, rules: &[(&str, ValidationRule)]) -> Result<(), AppError> {
        let violations = Self::violations(doc, rules);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(violations))
        }
    }

    pub fn violations(doc: &Value, rules: &[(&str, ValidationRule)]) -> Vec<FieldViolation> {
        let mut out = Vec::new();
        for (field, rule) in rules {
            let val = doc.get(*field).filter(|v| !v.is_null());
            if rule.required == Some(true) && val.map(is_blank).unwrap_or(true) {
                out.push(FieldViolation::new(*field, format!("{} is required", field)));
                continue;
            }
            if let Some(v) = val {
                validate_field(field, v, rule, &mut out);
            }
        }
        out
    }
}

fn is_blank(v: &Value) -> bool {
    matches!(v, Value::String(s) if s.trim().is_empty())
}

fn validate_field(col: &str, v: &Value, rule: &ValidationRule, out: &mut Vec<FieldViolation>) {
    if let Some(format) = &rule.format {
        if let Some(message) = check_format(col, v, format) {
            out.push(FieldViolation::new(col, message));
        }
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                out.push(FieldViolation::new(col, format!("{} must be at most {} characters", col, max)));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                out.push(FieldViolation::new(col, format!("{} must be at least {} characters", col, min)));
            }
        }
        if let Some(ref pattern) = rule.pattern {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    out.push(FieldViolation::new(col, format!("{} does not match required pattern", col)))
                }
                Ok(_) => {}
                Err(_) => out.push(FieldViolation::new(col, format!("invalid pattern for {}", col))),
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            out.push(FieldViolation::new(
                col,
                format!(
                    "{} must be one of: {:?}",
                    col,
                    allowed.iter().take(5).collect::<Vec<_>>()
                ),
            ));
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                out.push(FieldViolation::new(col, format!("{} must be at least {}", col, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                out.push(FieldViolation::new(col, format!("{} must be at most {}", col, max)));
            }
        }
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn check_format(col: &str, v: &Value, format: &str) -> Option<String> {
    let s = v.as_str()?;
    match format.to_lowercase().as_str() {
        "email" if !s.contains('@') || s.len() < 3 => Some(format!("{} must be a valid email", col)),
        "uuid" if uuid::Uuid::parse_str(s).is_err() => Some(format!("{} must be a valid UUID", col)),
        "date" if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() => {
            Some(format!("{} must be a date (YYYY-MM-DD)", col))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules() -> Vec<(&'static str, ValidationRule)> {
        vec![
            ("name", ValidationRule::required().max_length(8)),
            ("price", ValidationRule::default().range(0.0, 100.0)),
            ("contact", ValidationRule::default().format("email")),
            ("kind", ValidationRule::default().allowed(vec![json!("Novel"), json!("Poetry")])),
        ]
    }

    #[test]
    fn valid_document_passes() {
        let doc = json!({ "name": "Dune", "price": 9.5, "contact": "a@b.c", "kind": "Novel" });
        assert!(RequestValidator::validate(&doc, &rules()).is_ok());
    }

    #[test]
    fn collects_all_violations() {
        let doc = json!({ "name": "", "price": -1, "contact": "nope", "kind": "Comic" });
        let fields: Vec<String> = RequestValidator::violations(&doc, &rules())
            .into_iter()
            .map(|v| v.field)
            .collect();
        assert_eq!(fields, vec!["name", "price", "contact", "kind"]);
    }

    #[test]
    fn missing_optional_fields_are_fine() {
        let doc = json!({ "name": "Dune" });
        assert!(RequestValidator::validate(&doc, &rules()).is_ok());
    }

    #[test]
    fn null_required_field_is_reported() {
        let doc = json!({ "name": null });
        let v = RequestValidator::violations(&doc, &rules());
        assert_eq!(v, vec![FieldViolation::new("name", "name is required")]);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let doc = json!({ "name": "ééééééé" });
        assert!(RequestValidator::validate(&doc, &rules()).is_ok());
    }

    #[test]
    fn date_format_is_checked() {
        let rules = vec![("publishDate", ValidationRule::default().format("date"))];
        assert!(RequestValidator::validate(&json!({ "publishDate": "2024-02-29" }), &rules).is_ok());
        assert!(RequestValidator::validate(&json!({ "publishDate": "2023-02-29" }), &rules).is_err());
    }
}
