//! Transducer configuration.
//!
//! [`TransducibleConfig`] carries everything a transducer needs besides its
//! signature and body. It is serde-serializable (tools excepted) so that
//! default configurations can live in application config files.
//!
//! # Example
//! ```rust,ignore
//! use transducible::{TransducibleConfig, TransductionMode};
//! use std::time::Duration;
//!
//! let config = TransducibleConfig::default()
//!     .with_mode(TransductionMode::Reduce)
//!     .with_batch_size(4)
//!     .with_call_timeout(Duration::from_secs(30));
//! config.validate()?;
//! ```

use crate::error::TransductionError;
use crate::tool::Tool;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::Duration;

/// Error type for configuration validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigValidationError {
    /// max_iter must be greater than 0
    InvalidMaxIter,
    /// batch_size must be greater than 0
    InvalidBatchSize,
    /// call_timeout_ms must be greater than 0 when set
    InvalidCallTimeout,
    /// Two tools share a name
    DuplicateTool(String),
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMaxIter => write!(f, "max_iter must be greater than 0"),
            Self::InvalidBatchSize => write!(f, "batch_size must be greater than 0"),
            Self::InvalidCallTimeout => {
                write!(f, "call_timeout_ms must be greater than 0 when set")
            }
            Self::DuplicateTool(name) => write!(f, "duplicate tool name '{}'", name),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

impl From<ConfigValidationError> for TransductionError {
    fn from(err: ConfigValidationError) -> Self {
        TransductionError::config(err.to_string())
    }
}

/// How a transducer maps inputs to outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransductionMode {
    /// One Target per Source item
    #[default]
    Map,
    /// One or a few Targets per group of Source items
    Reduce,
}

impl fmt::Display for TransductionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map => write!(f, "map"),
            Self::Reduce => write!(f, "reduce"),
        }
    }
}

/// Opaque handle naming the model an executor should use.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LlmProvider {
    /// Model identifier understood by the executor
    pub model: String,
    /// Executor-specific options
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

impl LlmProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            options: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// Configuration attached to a transducer at declaration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransducibleConfig {
    /// Map or reduce
    pub mode: TransductionMode,
    /// Tools exposed to the executor
    #[serde(skip)]
    pub tools: Vec<Tool>,
    /// Check directly returned records against the target schema
    pub enforce_output_type: bool,
    /// Model handle for the executor
    pub llm: Option<LlmProvider>,
    /// Ask the executor to reason before answering
    pub reasoning: bool,
    /// Maximum executor iterations per item
    pub max_iter: usize,
    /// Maximum items in flight during a batch
    pub batch_size: usize,
    /// Log dispatch and completion at info level
    pub verbose_transduction: bool,
    /// Ask the executor to log its own steps
    pub verbose_agent: bool,
    /// Replaces the body's doc as the task instructions
    pub instructions: Option<String>,
    /// Per executor call timeout in milliseconds
    pub call_timeout_ms: Option<u64>,
}

impl Default for TransducibleConfig {
    fn default() -> Self {
        Self {
            mode: TransductionMode::Map,
            tools: Vec::new(),
            enforce_output_type: false,
            llm: None,
            reasoning: false,
            max_iter: 3,
            batch_size: 10,
            verbose_transduction: true,
            verbose_agent: false,
            instructions: None,
            call_timeout_ms: None,
        }
    }
}

impl TransducibleConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mode(mut self, mode: TransductionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Tool>) -> Self {
        self.tools.extend(tools);
        self
    }

    #[must_use]
    pub fn with_enforce_output_type(mut self, enforce: bool) -> Self {
        self.enforce_output_type = enforce;
        self
    }

    #[must_use]
    pub fn with_llm(mut self, llm: LlmProvider) -> Self {
        self.llm = Some(llm);
        self
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: bool) -> Self {
        self.reasoning = reasoning;
        self
    }

    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_verbose_transduction(mut self, verbose: bool) -> Self {
        self.verbose_transduction = verbose;
        self
    }

    #[must_use]
    pub fn with_verbose_agent(mut self, verbose: bool) -> Self {
        self.verbose_agent = verbose;
        self
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        // Partial milliseconds round up
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.call_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    /// Per-call timeout, if any.
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_iter == 0 {
            return Err(ConfigValidationError::InvalidMaxIter);
        }
        if self.batch_size == 0 {
            return Err(ConfigValidationError::InvalidBatchSize);
        }
        if self.call_timeout_ms == Some(0) {
            return Err(ConfigValidationError::InvalidCallTimeout);
        }
        let mut seen = HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name()) {
                return Err(ConfigValidationError::DuplicateTool(tool.name().to_string()));
            }
        }
        Ok(())
    }
}
