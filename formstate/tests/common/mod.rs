//! Fake validators shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use formstate::prelude::*;
use serde_json::Value;

pub const REQUIRED_MESSAGE: &str = "This field is required";

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn requires(rules: &ResolvedRules) -> bool {
    match rules {
        ResolvedRules::Text(text) => text.split('|').any(|rule| rule.trim() == "required"),
        ResolvedRules::Map(entries) => entries.get("required") == Some(&Value::Bool(true)),
    }
}

/// Understands `required` (text or `{"required": true}`) and
/// `{"confirmed": <other value>}`.
pub fn required_validator() -> Arc<dyn RuleValidator> {
    Arc::new(validator_fn(|value, rules, _cx| async move {
        let mut errors = Vec::new();
        if requires(&rules) && is_empty(&value) {
            errors.push(REQUIRED_MESSAGE.to_string());
        }
        if let Some(other) = rules.param("confirmed")
            && *other != value
        {
            errors.push("Values do not match".to_string());
        }

        if errors.is_empty() {
            Ok(ValidationResult::passed())
        } else {
            Ok(ValidationResult::failed(errors))
        }
    }))
}

/// Every call the recording validator has seen.
#[derive(Debug, Clone)]
pub struct Call {
    pub value: Value,
    pub rules: ResolvedRules,
    pub context: ValidationContext,
}

/// Behaves like [`required_validator`] and records each call.
pub fn recording_validator() -> (Arc<dyn RuleValidator>, Arc<Mutex<Vec<Call>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let inner = required_validator();
    let recorded = Arc::clone(&calls);

    let validator = validator_fn(move |value, rules, context| {
        let calls = Arc::clone(&recorded);
        let inner = Arc::clone(&inner);
        async move {
            calls.lock().unwrap().push(Call {
                value: value.clone(),
                rules: rules.clone(),
                context: context.clone(),
            });
            inner.validate(&value, &rules, &context).await
        }
    });

    (Arc::new(validator), calls)
}

/// Takes longer for `"slow"` than for anything else; `"slow"` fails.
pub fn latency_validator(slow: Duration, fast: Duration) -> Arc<dyn RuleValidator> {
    Arc::new(validator_fn(move |value, _rules, _cx| async move {
        if value == Value::from("slow") {
            tokio::time::sleep(slow).await;
            Ok(ValidationResult::failed(["slow"]))
        } else {
            tokio::time::sleep(fast).await;
            Ok(ValidationResult::passed())
        }
    }))
}

/// Fails to run whenever the value is `"boom"`.
pub fn flaky_validator() -> Arc<dyn RuleValidator> {
    Arc::new(validator_fn(|value, _rules, _cx| async move {
        if value == Value::from("boom") {
            Err(ValidatorError::new("rule expression could not be parsed"))
        } else {
            Ok(ValidationResult::passed())
        }
    }))
}
