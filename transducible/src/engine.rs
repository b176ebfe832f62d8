//! Engine entry point.
//!
//! [`TransductionEngine`] bundles an executor, a schema algebra and default
//! configuration. Every transducer it declares shares those three.

use crate::compose::{ComposeOperand, compose_transduction};
use crate::config::{TransducibleConfig, TransductionMode};
use crate::error::TransductionResult;
use crate::executor::TransductionExecutor;
use crate::introspect::Signature;
use crate::merge::semantic_merge;
use crate::prototypes::generate_prototypes;
use crate::proximity::estimate_proximity;
use crate::transducer::{Transducer, TransducerBuilder};
use atype::{Record, SchemaAlgebra, SchemaRef};
use std::fmt;
use std::sync::Arc;

/// Default sample size for [`TransductionEngine::estimate_proximity`].
pub const DEFAULT_PROXIMITY_SAMPLES: usize = 10;

/// Executor, algebra and defaults shared by declared transducers.
#[derive(Clone)]
pub struct TransductionEngine {
    executor: Arc<dyn TransductionExecutor>,
    algebra: Arc<SchemaAlgebra>,
    defaults: TransducibleConfig,
}

impl TransductionEngine {
    /// Create an engine over `executor`, using the global algebra.
    pub fn new(executor: Arc<dyn TransductionExecutor>) -> Self {
        Self {
            executor,
            algebra: SchemaAlgebra::global(),
            defaults: TransducibleConfig::default(),
        }
    }

    #[must_use]
    pub fn with_algebra(mut self, algebra: Arc<SchemaAlgebra>) -> Self {
        self.algebra = algebra;
        self
    }

    /// Configuration applied when a declaration supplies none.
    #[must_use]
    pub fn with_defaults(mut self, defaults: TransducibleConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn executor(&self) -> &Arc<dyn TransductionExecutor> {
        &self.executor
    }

    pub fn algebra(&self) -> &Arc<SchemaAlgebra> {
        &self.algebra
    }

    pub fn defaults(&self) -> &TransducibleConfig {
        &self.defaults
    }

    /// Start declaring a transducer from a signature.
    pub fn transducible(&self, signature: Signature) -> TransducerBuilder {
        Transducer::builder(signature)
            .config(self.defaults.clone())
            .executor(self.executor.clone())
            .algebra(self.algebra.clone())
    }

    /// One-hop `source -> target` transducer that always delegates to the
    /// executor.
    ///
    /// The result is always a map transducer, whatever the default mode.
    pub fn make_transducible_from_types(
        &self,
        source: &SchemaRef,
        target: &SchemaRef,
        instructions: impl Into<String>,
    ) -> TransductionResult<Transducer> {
        self.from_types_with(
            source,
            target,
            self.defaults
                .clone()
                .with_mode(TransductionMode::Map)
                .with_instructions(instructions),
        )
    }

    /// One-hop transducer with explicit configuration.
    ///
    /// A reduce-mode configuration declares `Vec<source> -> target`.
    pub fn from_types_with(
        &self,
        source: &SchemaRef,
        target: &SchemaRef,
        config: TransducibleConfig,
    ) -> TransductionResult<Transducer> {
        let name = format!("{}_to_{}", source.name(), target.name());
        let signature = match config.mode {
            TransductionMode::Map => Signature::unary(name, source, target),
            TransductionMode::Reduce => Signature::reduce(name, source, target),
        };
        Transducer::builder(signature)
            .config(config)
            .executor(self.executor.clone())
            .algebra(self.algebra.clone())
            .transduce()
    }

    /// Compose `target` with `operand`. See [`compose_transduction`].
    pub fn compose(
        &self,
        target: &SchemaRef,
        operand: impl Into<ComposeOperand>,
    ) -> TransductionResult<Transducer> {
        compose_transduction(self, target, operand.into())
    }

    /// Ask the executor for up to `n` sample records of `schema`.
    pub async fn generate_prototypes(
        &self,
        schema: &SchemaRef,
        n: usize,
    ) -> TransductionResult<Vec<Record>> {
        generate_prototypes(self, schema, n).await
    }

    /// Mean completeness of `transducer`'s output over `n` prototypes.
    pub async fn estimate_proximity(
        &self,
        transducer: &Transducer,
        n: usize,
    ) -> TransductionResult<f64> {
        estimate_proximity(self, transducer, n).await
    }

    /// Merge two records of different schemas through the executor.
    pub async fn semantic_merge(&self, a: &Record, b: &Record) -> TransductionResult<Record> {
        semantic_merge(self, a, b).await
    }
}

impl fmt::Debug for TransductionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransductionEngine")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}
