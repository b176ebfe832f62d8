//! # transducible
//!
//! Typed transductions: functions from one record schema to another whose
//! body may hand the work to an external executor, typically an LLM.
//!
//! ## Overview
//!
//! - **Transducers** declared from a [`Signature`] and an async body, called
//!   with one record, a list of records or an explicit [`TransduceRequest`]
//! - **Map and reduce modes**: per-item ordered batches, or one call over a
//!   whole group
//! - **Composition** of schemas and transducers into new transducers
//! - **Self-test utilities**: prototypical instance generation and logical
//!   proximity estimation
//! - **Structured errors** with typed error codes
//!
//! ## Architecture
//!
//! ```text
//!   Signature + body + TransducibleConfig
//!                 │
//!                 ▼  introspect
//!   ┌─────────────────────────────┐      ┌──────────────────────┐
//!   │ Transducer                  │      │ SchemaAlgebra        │
//!   │  spec: TransductionSpec ────┼──────│  merge / optional /  │
//!   │  body: map | reduce         │      │  project (cached)    │
//!   └──────────────┬──────────────┘      └──────────────────────┘
//!                  │ TransduceRequest
//!                  ▼
//!   ┌─────────────────────────────┐
//!   │ TransductionExecutor        │
//!   │  transduce / run_batch      │
//!   └─────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use transducible::prelude::*;
//!
//! let email = parse_schema("struct Email { subject: String, body: String }")?;
//! let summary = parse_schema("struct Summary { text: Option<String> }")?;
//!
//! let engine = TransductionEngine::new(Arc::new(my_executor));
//! let summarize = engine
//!     .transducible(Signature::unary("summarize", &email, &summary).doc("Summarize the email."))
//!     .map(|email: Record| async move { Ok(Outcome::transduce(email)) })?;
//!
//! let one = summarize.call_one(email.record(json!({ "subject": "Hi", "body": "..." }))?).await?;
//! let score = engine.estimate_proximity(&summarize, 10).await?;
//! ```

pub mod batch;
pub mod compose;
mod config;
mod context;
mod engine;
mod error;
mod executor;
mod handler;
pub mod introspect;
pub mod logging;
pub mod merge;
pub mod prototypes;
pub mod proximity;
mod spec;
mod tool;
mod transducer;

#[cfg(test)]
mod tests;

pub use atype::{
    Field, FieldType, Record, Schema, SchemaAlgebra, SchemaError, SchemaRef, SchemaRegistry,
    parse_schema, parse_schema_with,
};
pub use batch::{BatchMetrics, ItemFn, ItemFuture, execute_ordered, execute_ordered_with_metrics};
pub use compose::{ComposeOperand, compose_transduction, with};
pub use config::{ConfigValidationError, LlmProvider, TransducibleConfig, TransductionMode};
pub use context::{CallContext, CancellationSignal};
pub use engine::{DEFAULT_PROXIMITY_SAMPLES, TransductionEngine};
pub use error::{NO_STATE_OUTPUT, TransductionError, TransductionErrorCode, TransductionResult};
pub use executor::{ExecutorInput, FnExecutor, TransductionExecutor};
pub use handler::{BoxFuture, Handler, Outcome, TransduceRequest};
pub use introspect::{Param, ResolvedSchemas, Signature, introspect};
pub use merge::semantic_merge;
pub use prototypes::generate_prototypes;
pub use proximity::{estimate_proximity, percent_non_empty_fields};
pub use spec::{TransductionSpec, render_instructions};
pub use tool::{Tool, ToolFuture};
pub use transducer::{CallArgs, Transduced, Transducer, TransducerBuilder, TransducerInput};

/// Prelude for convenient imports
///
/// ```rust,ignore
/// use transducible::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CallArgs, CallContext, ComposeOperand, ExecutorInput, FieldType, FnExecutor, Outcome,
        Record, Schema, SchemaRef, Signature, TransduceRequest, Transduced, TransducibleConfig,
        Transducer, TransductionEngine, TransductionError, TransductionErrorCode,
        TransductionExecutor, TransductionMode, TransductionResult, TransductionSpec, parse_schema,
        with,
    };
    pub use async_trait::async_trait;
    pub use serde_json::json;
    pub use std::sync::Arc;
}
