//! Configuration tests
//!
//! Defaults, builder methods, validation and serde behavior.

use crate::{
    ConfigValidationError, LlmProvider, Tool, TransducibleConfig, TransductionError,
    TransductionErrorCode, TransductionMode,
};
use proptest::prelude::*;
use serde_json::{Value, json};
use std::time::Duration;

fn noop_tool(name: &str) -> Tool {
    Tool::new(name, "does nothing", |_args: Value| async move {
        Ok::<_, TransductionError>(Value::Null)
    })
}

#[test]
fn test_defaults() {
    let config = TransducibleConfig::default();

    assert_eq!(config.mode, TransductionMode::Map);
    assert!(config.tools.is_empty());
    assert!(!config.enforce_output_type);
    assert!(config.llm.is_none());
    assert!(!config.reasoning);
    assert_eq!(config.max_iter, 3);
    assert_eq!(config.batch_size, 10);
    assert!(config.verbose_transduction);
    assert!(!config.verbose_agent);
    assert!(config.instructions.is_none());
    assert!(config.call_timeout().is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_builders() {
    let config = TransducibleConfig::new()
        .with_mode(TransductionMode::Reduce)
        .with_enforce_output_type(true)
        .with_llm(LlmProvider::new("small-model").with_option("temperature", json!(0.2)))
        .with_reasoning(true)
        .with_max_iter(5)
        .with_batch_size(4)
        .with_verbose_transduction(false)
        .with_verbose_agent(true)
        .with_instructions("Be brief")
        .with_call_timeout(Duration::from_secs(2))
        .with_tool(noop_tool("search"));

    assert_eq!(config.mode, TransductionMode::Reduce);
    assert!(config.enforce_output_type);
    assert_eq!(config.llm.as_ref().unwrap().model, "small-model");
    assert!(config.reasoning);
    assert_eq!(config.max_iter, 5);
    assert_eq!(config.batch_size, 4);
    assert!(!config.verbose_transduction);
    assert!(config.verbose_agent);
    assert_eq!(config.instructions.as_deref(), Some("Be brief"));
    assert_eq!(config.call_timeout(), Some(Duration::from_secs(2)));
    assert_eq!(config.tools.len(), 1);
}

#[test]
fn test_validation_errors() {
    let cases = [
        (
            TransducibleConfig::default().with_max_iter(0),
            ConfigValidationError::InvalidMaxIter,
        ),
        (
            TransducibleConfig::default().with_batch_size(0),
            ConfigValidationError::InvalidBatchSize,
        ),
        (
            TransducibleConfig::default().with_call_timeout(Duration::ZERO),
            ConfigValidationError::InvalidCallTimeout,
        ),
        (
            TransducibleConfig::default().with_tools([noop_tool("search"), noop_tool("search")]),
            ConfigValidationError::DuplicateTool("search".into()),
        ),
    ];

    for (config, expected) in cases {
        assert_eq!(config.validate(), Err(expected));
    }
}

#[test]
fn test_sub_millisecond_timeout_rounds_up() {
    let config = TransducibleConfig::default().with_call_timeout(Duration::from_micros(500));
    assert_eq!(config.call_timeout_ms, Some(1));
    assert!(config.validate().is_ok());

    let config = TransducibleConfig::default().with_call_timeout(Duration::from_micros(1500));
    assert_eq!(config.call_timeout(), Some(Duration::from_millis(2)));
}

#[test]
fn test_validation_error_converts_to_config_code() {
    let err: TransductionError = ConfigValidationError::InvalidBatchSize.into();
    assert_eq!(err.code, TransductionErrorCode::Config);
    assert_eq!(err.message, "batch_size must be greater than 0");
}

#[test]
fn test_partial_json_fills_defaults() {
    let config: TransducibleConfig =
        serde_json::from_value(json!({ "mode": "reduce", "batch_size": 4 })).unwrap();

    assert_eq!(config.mode, TransductionMode::Reduce);
    assert_eq!(config.batch_size, 4);
    assert_eq!(config.max_iter, 3);
    assert!(config.verbose_transduction);
}

#[test]
fn test_tools_are_not_serialized() {
    let config = TransducibleConfig::default().with_tool(noop_tool("search"));
    let value = serde_json::to_value(&config).unwrap();

    assert!(value.get("tools").is_none());
    assert_eq!(value["mode"], json!("map"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Positive limits always validate, zero limits never do.
    #[test]
    fn prop_limits_validation(max_iter in 0usize..20, batch_size in 0usize..20) {
        let config = TransducibleConfig::default()
            .with_max_iter(max_iter)
            .with_batch_size(batch_size);
        prop_assert_eq!(config.validate().is_ok(), max_iter > 0 && batch_size > 0);
    }
}
