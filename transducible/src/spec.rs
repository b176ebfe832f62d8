//! Immutable description of one transduction.

use crate::config::{LlmProvider, TransducibleConfig, TransductionMode};
use crate::tool::Tool;
use atype::SchemaRef;
use serde_json::Value;
use std::sync::Arc;

/// Everything an executor needs to perform a transduction.
///
/// Built once when a transducer is declared. Calls share it behind an
/// `Arc`, and batches take their own clone, so nothing a call does can leak
/// into another.
#[derive(Debug, Clone)]
pub struct TransductionSpec {
    /// Transducer name
    pub name: String,
    /// Schema of input records
    pub source_schema: SchemaRef,
    /// Schema of output records (the optional view of the declared target)
    pub target_schema: SchemaRef,
    /// Rendered task instructions
    pub instructions: String,
    pub mode: TransductionMode,
    pub tools: Arc<[Tool]>,
    pub enforce_output_type: bool,
    pub max_iter: usize,
    pub batch_size: usize,
    pub reasoning: bool,
    pub llm: Option<LlmProvider>,
    pub verbose_transduction: bool,
    pub verbose_agent: bool,
}

impl TransductionSpec {
    pub fn new(
        name: impl Into<String>,
        source_schema: SchemaRef,
        target_schema: SchemaRef,
        instructions: impl Into<String>,
        config: &TransducibleConfig,
    ) -> Self {
        Self {
            name: name.into(),
            source_schema,
            target_schema,
            instructions: instructions.into(),
            mode: config.mode,
            tools: config.tools.iter().cloned().collect(),
            enforce_output_type: config.enforce_output_type,
            max_iter: config.max_iter,
            batch_size: config.batch_size,
            reasoning: config.reasoning,
            llm: config.llm.clone(),
            verbose_transduction: config.verbose_transduction,
            verbose_agent: config.verbose_agent,
        }
    }

    /// Look up a tool by name.
    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// JSON Schema of the records the executor must produce.
    pub fn target_json_schema(&self) -> Value {
        self.target_schema.to_json_schema()
    }
}

/// Task header sent to the executor.
pub fn render_instructions(name: &str, source: &str, target: &str, body: Option<&str>) -> String {
    format!(
        "TASK: You are transducing the function {name}.\nInput Type: {source}\nOutput Type: {target}.\nINSTRUCTIONS:\n{}",
        body.unwrap_or_default().trim()
    )
}
