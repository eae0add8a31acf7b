mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{
    REQUIRED_MESSAGE, flaky_validator, latency_validator, recording_validator, required_validator,
};
use formstate::prelude::*;
use serde_json::{Value, json};
use tokio::time::sleep;

fn settle() -> Duration {
    DEFAULT_DEBOUNCE * 2
}

async fn text_field(
    name: &str,
    initial: &str,
    rules: &str,
    options: FieldOptions,
) -> (Field<String>, State<String>) {
    let value = State::new(initial.to_string());
    let field = Field::new(name, value.clone(), rules, required_validator(), options)
        .await
        .expect("field creation failed");
    (field, value)
}

fn assert_defaults(flags: &FieldFlags) {
    assert!(flags.pristine);
    assert!(flags.untouched);
    assert!(!flags.dirty);
    assert!(!flags.touched);
    assert!(!flags.validated);
    assert!(!flags.pending);
    assert!(!flags.valid);
    assert!(!flags.invalid);
    assert!(!flags.changed);
}

#[tokio::test(start_paused = true)]
async fn test_email_field_lifecycle() {
    let (field, value) = text_field("email", "", "required", FieldOptions::new()).await;

    let flags = field.flags();
    assert!(!flags.valid);
    assert!(flags.invalid);
    assert!(!flags.validated);
    assert!(field.errors().is_empty());

    value.set("a@b.com".to_string());
    sleep(settle()).await;

    let flags = field.flags();
    assert!(flags.valid);
    assert!(!flags.invalid);
    assert!(flags.validated);
    assert!(flags.changed);
    assert!(flags.passed());
    assert!(!flags.pending);
}

#[tokio::test(start_paused = true)]
async fn test_immediate_commits_initial_result() {
    let options = FieldOptions::new().immediate(true);
    let (field, _value) = text_field("email", "", "required", options).await;

    let flags = field.flags();
    assert!(flags.invalid);
    assert!(flags.validated);
    assert!(flags.failed());
    assert!(!flags.changed);
    assert_eq!(field.errors(), vec![REQUIRED_MESSAGE.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_pending_is_raised_before_validation_runs() {
    let value = State::new("x".to_string());
    let field = Field::new(
        "name",
        value,
        "required",
        latency_validator(Duration::from_millis(50), Duration::from_millis(50)),
        FieldOptions::new(),
    )
    .await
    .unwrap();
    assert!(!field.flags().pending);

    let running = field.validate();
    assert!(field.flags().pending);

    let result = running.await.unwrap();
    assert!(result.valid);
    assert!(!field.flags().pending);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_changes_coalesce_into_latest_value() {
    let (validator, calls) = recording_validator();
    let value = State::new(String::new());
    let _field = Field::new("name", value.clone(), "required", validator, FieldOptions::new())
        .await
        .unwrap();
    assert_eq!(calls.lock().unwrap().len(), 1, "initial pass");

    value.set("a".to_string());
    sleep(DEFAULT_DEBOUNCE / 3).await;
    value.set("ab".to_string());
    sleep(DEFAULT_DEBOUNCE / 3).await;
    value.set("abc".to_string());
    sleep(settle()).await;

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].value, json!("abc"));
}

#[tokio::test(start_paused = true)]
async fn test_custom_debounce_delay() {
    let (validator, calls) = recording_validator();
    let value = State::new(String::new());
    let _field = Field::new(
        "name",
        value.clone(),
        "required",
        validator,
        FieldOptions::new().debounce(Duration::from_millis(20)),
    )
    .await
    .unwrap();

    value.set("a".to_string());
    sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.lock().unwrap().len(), 1);

    sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_blur_and_input_flags_are_complements() {
    let (field, _value) = text_field("name", "", "", FieldOptions::new()).await;

    field.on_blur();
    let flags = field.flags();
    assert!(flags.touched && !flags.untouched);
    assert!(flags.pristine && !flags.dirty);

    field.on_input();
    let flags = field.flags();
    assert!(flags.dirty && !flags.pristine);

    // One-way until reset.
    field.on_blur();
    assert!(field.flags().touched);
}

#[tokio::test(start_paused = true)]
async fn test_reset_restores_defaults_and_is_idempotent() {
    let (field, value) = text_field("email", "", "required", FieldOptions::new()).await;

    field.on_blur();
    field.on_input();
    value.set("   ".to_string());
    sleep(settle()).await;
    assert!(field.flags().validated);
    assert!(!field.errors().is_empty());

    field.reset();
    let once = field.flags();
    assert_defaults(&once);
    assert!(field.errors().is_empty());

    field.reset();
    assert_eq!(field.flags(), once);
    assert!(field.errors().is_empty());

    // Value and initial snapshot are untouched.
    assert_eq!(field.value(), "   ");
    assert_eq!(field.initial_value(), "");
}

#[tokio::test(start_paused = true)]
async fn test_reset_keeps_required_default() {
    let options = FieldOptions::new().required(true);
    let (field, _value) = text_field("email", "", "required", options).await;
    assert!(field.flag(Flag::Required));

    field.reset();
    assert!(field.flag(Flag::Required));
}

#[tokio::test(start_paused = true)]
async fn test_valid_and_invalid_exclusive_after_commit() {
    let (field, value) = text_field("name", "", "required", FieldOptions::new()).await;

    for next in ["", "x", " ", "yz"] {
        value.set(next.to_string());
        field.validate().await.unwrap();
        let flags = field.flags();
        assert!(flags.validated);
        assert!(flags.valid ^ flags.invalid, "exactly one of valid/invalid for {next:?}");
    }
}

#[tokio::test(start_paused = true)]
async fn test_changed_compares_against_initial_value() {
    let (field, value) = text_field("name", "start", "", FieldOptions::new()).await;

    value.set("other".to_string());
    field.validate().await.unwrap();
    assert!(field.flags().changed);

    value.set("start".to_string());
    field.validate().await.unwrap();
    assert!(!field.flags().changed);
}

#[tokio::test(start_paused = true)]
async fn test_changed_uses_value_at_commit_time() {
    let value = State::new("start".to_string());
    let field = Field::new(
        "name",
        value.clone(),
        "",
        latency_validator(Duration::from_millis(50), Duration::from_millis(50)),
        FieldOptions::new().debounce(Duration::from_secs(60)),
    )
    .await
    .unwrap();

    // Validation starts on the initial value...
    let running = field.validate();
    // ...but the value moves on before the result is committed.
    value.set("moved".to_string());
    running.await.unwrap();

    assert!(field.flags().changed);
}

#[tokio::test(start_paused = true)]
async fn test_observable_rules_trigger_validation() {
    let value = State::new(String::new());
    let rules = State::new(RuleExpr::from(""));
    let field = Field::new(
        "nickname",
        value,
        rules.clone(),
        required_validator(),
        FieldOptions::new(),
    )
    .await
    .unwrap();
    assert!(field.flags().valid);

    rules.set(RuleExpr::from("required"));
    sleep(settle()).await;

    let flags = field.flags();
    assert!(flags.failed());
    assert_eq!(field.errors(), vec![REQUIRED_MESSAGE.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_observable_rule_param_triggers_validation() {
    let password = State::new(json!("hunter2"));
    let confirmation = State::new("hunter2".to_string());
    let field = Field::new(
        "confirmation",
        confirmation,
        RuleExpr::map([("confirmed", RuleParam::Observable(password.clone()))]),
        required_validator(),
        FieldOptions::new().immediate(true),
    )
    .await
    .unwrap();
    assert!(field.flags().passed());

    password.set(json!("hunter3"));
    sleep(settle()).await;

    assert!(field.flags().failed());
    assert_eq!(field.errors(), vec!["Values do not match".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_resolved_rules_reach_validator() {
    let (validator, calls) = recording_validator();
    let limit = State::new(json!(3));
    let _field = Field::new(
        "age",
        State::new(21u32),
        RuleExpr::map([
            ("min", RuleParam::Observable(limit.clone())),
            ("required", RuleParam::Value(Value::Bool(true))),
        ]),
        validator,
        FieldOptions::new(),
    )
    .await
    .unwrap();

    limit.set(json!(18));
    sleep(settle()).await;

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].rules.param("min"), Some(&json!(3)));
    assert_eq!(calls[1].rules.param("min"), Some(&json!(18)));
    assert_eq!(calls[1].value, json!(21));
}

#[tokio::test(start_paused = true)]
async fn test_detached_field_gets_empty_value_records() {
    let (validator, calls) = recording_validator();
    let _field = Field::new("solo", State::new(1), "", validator, FieldOptions::new())
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0].context.name, "solo");
    assert!(calls[0].context.values.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_validator_failure_propagates_and_leaves_pending() {
    let value = State::new("ok".to_string());
    let field = Field::new("name", value.clone(), "", flaky_validator(), FieldOptions::new())
        .await
        .unwrap();

    value.set("boom".to_string());
    let err = field.validate().await.unwrap_err();

    assert!(matches!(err, FormError::Validator(_)));
    assert!(field.flags().pending);
}

#[tokio::test(start_paused = true)]
async fn test_failing_initial_validation_fails_creation() {
    let result = Field::new(
        "name",
        State::new("boom".to_string()),
        "",
        flaky_validator(),
        FieldOptions::new(),
    )
    .await;

    assert!(matches!(result, Err(FormError::Validator(_))));
}

// Overlapping validations are not sequenced by default: whichever finishes
// last wins, even if it was started first.
#[tokio::test(start_paused = true)]
async fn test_overlapping_validations_last_to_finish_wins() {
    let value = State::new("slow".to_string());
    let field = Field::new(
        "name",
        value.clone(),
        "",
        latency_validator(Duration::from_millis(100), Duration::from_millis(10)),
        FieldOptions::new().debounce(Duration::from_secs(60)),
    )
    .await
    .unwrap();

    let older = field.validate();
    value.set("fast".to_string());
    let newer = field.validate();
    let (older, newer) = tokio::join!(older, newer);

    assert!(!older.unwrap().valid);
    assert!(newer.unwrap().valid);
    assert!(field.flags().invalid);
    assert_eq!(field.errors(), vec!["slow".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_discard_stale_keeps_newest_result() {
    let value = State::new("slow".to_string());
    let field = Field::new(
        "name",
        value.clone(),
        "",
        latency_validator(Duration::from_millis(100), Duration::from_millis(10)),
        FieldOptions::new()
            .debounce(Duration::from_secs(60))
            .discard_stale(true),
    )
    .await
    .unwrap();

    let older = field.validate();
    value.set("fast".to_string());
    let newer = field.validate();
    let (older, _newer) = tokio::join!(older, newer);

    // The overtaken result is still reported to its caller...
    assert!(!older.unwrap().valid);
    // ...but not committed.
    let flags = field.flags();
    assert!(flags.valid);
    assert!(!flags.pending);
    assert!(field.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_flag_changes() {
    let (field, _value) = text_field("name", "", "", FieldOptions::new()).await;
    let count = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&count);
    let sub = field.subscribe(move |_: &FieldFlags| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    field.on_blur();
    field.on_blur();
    assert_eq!(count.load(Ordering::SeqCst), 1, "unchanged flags do not notify");

    drop(sub);
    field.on_input();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_field_stops_validating() {
    let (validator, calls) = recording_validator();
    let value = State::new(String::new());
    let field = Field::new("name", value.clone(), "required", validator, FieldOptions::new())
        .await
        .unwrap();

    drop(field);
    value.set("late".to_string());
    sleep(settle()).await;

    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_with_rules_shorthand() {
    let field = Field::with_rules("title", "required", required_validator())
        .await
        .unwrap();

    assert_eq!(field.name(), "title");
    assert_eq!(field.value(), "");
    assert!(field.flags().invalid);

    field.value_handle().set("Hello".to_string());
    sleep(settle()).await;
    assert!(field.flags().passed());
}
