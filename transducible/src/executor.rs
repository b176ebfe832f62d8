//! The executor boundary.
//!
//! A [`TransductionExecutor`] performs the actual transformation, typically
//! by prompting an LLM with the spec's instructions and target schema. The
//! engine treats it as a black box with two obligations: `transduce` returns
//! records of `spec.target_schema`, and `run_batch` returns results in input
//! order.

use crate::batch::{ItemFn, execute_ordered};
use crate::error::TransductionResult;
use crate::handler::BoxFuture;
use crate::spec::TransductionSpec;
use async_trait::async_trait;
use atype::Record;
use std::future::Future;
use std::sync::Arc;

/// What the executor is asked to transduce.
#[derive(Debug, Clone)]
pub enum ExecutorInput {
    /// Typed source records: one in map mode, the whole group in reduce mode
    Records(Vec<Record>),
    /// Free text
    Text(String),
}

impl ExecutorInput {
    /// Number of source items (free text counts as one).
    pub fn len(&self) -> usize {
        match self {
            Self::Records(records) => records.len(),
            Self::Text(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// External collaborator that performs transductions.
#[async_trait]
pub trait TransductionExecutor: Send + Sync {
    /// Transduce `input` into records of `spec.target_schema`.
    async fn transduce(
        &self,
        spec: &TransductionSpec,
        input: ExecutorInput,
    ) -> TransductionResult<Vec<Record>>;

    /// Apply `per_item` to every item, returning results in input order.
    ///
    /// The default runs up to `spec.batch_size` items concurrently.
    async fn run_batch(
        &self,
        spec: &TransductionSpec,
        items: Vec<Record>,
        per_item: ItemFn,
    ) -> TransductionResult<Vec<Record>> {
        execute_ordered(items, spec.batch_size, per_item).await
    }
}

type ExecutorFn = dyn Fn(TransductionSpec, ExecutorInput) -> BoxFuture<Vec<Record>>
    + Send
    + Sync;

/// Executor built from an async closure.
///
/// The closure receives its own copy of the spec.
#[derive(Clone)]
pub struct FnExecutor {
    f: Arc<ExecutorFn>,
}

impl FnExecutor {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(TransductionSpec, ExecutorInput) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TransductionResult<Vec<Record>>> + Send + 'static,
    {
        Self {
            f: Arc::new(move |spec, input| Box::pin(f(spec, input))),
        }
    }
}

#[async_trait]
impl TransductionExecutor for FnExecutor {
    async fn transduce(
        &self,
        spec: &TransductionSpec,
        input: ExecutorInput,
    ) -> TransductionResult<Vec<Record>> {
        (self.f)(spec.clone(), input).await
    }
}

impl std::fmt::Debug for FnExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnExecutor").finish_non_exhaustive()
    }
}
