//! Signup form example.
//!
//! Two fields with a closure validator: typing into a field schedules a
//! debounced validation, and submitting only goes through once both fields
//! are valid.
//!
//! Run with: cargo run --example signup

use std::sync::Arc;

use formstate::prelude::*;
use log::LevelFilter;
use serde_json::Value;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

fn validator() -> Arc<dyn RuleValidator> {
    Arc::new(validator_fn(|value, rules, _cx| async move {
        let text = value.as_str().unwrap_or_default();
        let mut errors = Vec::new();

        for rule in rules.as_text().unwrap_or_default().split('|') {
            match rule {
                "required" if text.trim().is_empty() => errors.push("This field is required"),
                "email" if !text.is_empty() && !text.contains('@') => {
                    errors.push("Please enter a valid email")
                }
                "" | "required" | "email" => {}
                other => {
                    return Err(ValidatorError::new(format!("Unknown rule '{other}'")));
                }
            }
        }

        if errors.is_empty() {
            Ok(ValidationResult::passed())
        } else {
            Ok(ValidationResult::failed(errors))
        }
    }))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    TermLogger::init(
        LevelFilter::Debug,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let form = Form::new(FormOptions::new().on_submit(|| async {
        println!("Submitted!");
    }));

    let email = State::new(String::new());
    let name = State::new(String::new());
    let email_field = Field::new(
        "email",
        email.clone(),
        "required|email",
        validator(),
        FieldOptions::new().form(&form),
    )
    .await?;
    let _name_field = Field::new(
        "name",
        name.clone(),
        "required",
        validator(),
        FieldOptions::new().form(&form),
    )
    .await?;

    let _watch = form.subscribe(|flags: &FormFlags| {
        println!(
            "form: valid={} pending={} touched={}",
            flags.valid, flags.pending, flags.touched
        );
    });

    println!("Submitting empty form...");
    form.submit().await?;
    println!("Errors: {:?}\n", form.errors());

    email_field.on_input();
    email.set("ada".to_string());
    email_field.on_blur();
    tokio::time::sleep(DEFAULT_DEBOUNCE * 2).await;
    println!("email flags: {:?}", email_field.flags());
    println!("email errors: {:?}", email_field.errors());

    email.set("ada@example.com".to_string());

    name.set("Ada".to_string());
    println!("\nSubmitting filled form...");
    let submitted = form.submit().await?;
    println!("Submitted: {submitted}");

    let values: Value = serde_json::to_value(form.value_records()?)?;
    println!("Values: {values}");

    Ok(())
}
