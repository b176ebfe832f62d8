//! Transducers: declared `Source -> Target` functions.
//!
//! A [`Transducer`] pairs a body with a [`TransductionSpec`] and an
//! executor. Calling it classifies the input shape and dispatches:
//!
//! - **Single record** (map mode): run the body. A direct output is the
//!   result. A [`TransduceRequest`] is handed to the executor, which must
//!   return exactly one record.
//! - **List of records** (map mode): run the single-record path for every
//!   item through the executor's ordered batch, preserving input order.
//! - **List of records** (reduce mode): run the body once over the whole
//!   list; a request dispatches one executor call for the group.
//! - **TransduceRequest**: skip the body and dispatch directly.
//!
//! # Example
//! ```rust,ignore
//! let summarize = Transducer::builder(Signature::unary("summarize", &email, &summary))
//!     .executor(executor)
//!     .map(|email: Record| async move { Ok(Outcome::transduce(email)) })?;
//!
//! let one = summarize.call_one(email_record).await?;
//! let many = summarize.call_many(vec![a, b, c]).await?;
//! ```

use crate::batch::ItemFn;
use crate::config::{TransducibleConfig, TransductionMode};
use crate::context::CallContext;
use crate::engine::TransductionEngine;
use crate::error::{TransductionError, TransductionResult};
use crate::executor::{ExecutorInput, TransductionExecutor};
use crate::handler::{BoxedHandler, Handler, Outcome, TransduceRequest, into_boxed};
use crate::introspect::{Signature, introspect};
use crate::logging::{
    log_batch_started, log_short_circuit, log_transducer_declared, log_transduction_completed,
    log_transduction_dispatched,
};
use crate::spec::{TransductionSpec, render_instructions};
use crate::tool::Tool;
use atype::{Record, SchemaAlgebra, SchemaRef, value_kind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Input accepted by [`Transducer::call`].
#[derive(Debug, Clone)]
pub enum TransducerInput {
    /// One source record
    Single(Record),
    /// Explicit request to delegate to the executor
    Request(TransduceRequest),
    /// A list of source records
    Batch(Vec<Record>),
}

impl From<Record> for TransducerInput {
    fn from(record: Record) -> Self {
        Self::Single(record)
    }
}

impl From<Vec<Record>> for TransducerInput {
    fn from(records: Vec<Record>) -> Self {
        Self::Batch(records)
    }
}

impl From<TransduceRequest> for TransducerInput {
    fn from(request: TransduceRequest) -> Self {
        Self::Request(request)
    }
}

/// Result of a transducer call.
#[derive(Debug, Clone, PartialEq)]
pub enum Transduced {
    /// One target record
    Single(Record),
    /// A list of target records
    Many(Vec<Record>),
}

impl Transduced {
    /// The single record, or a one-element list's record.
    pub fn into_single(self) -> TransductionResult<Record> {
        match self {
            Self::Single(record) => Ok(record),
            Self::Many(records) if records.len() == 1 => {
                records.into_iter().next().ok_or_else(TransductionError::no_state_output)
            }
            Self::Many(records) => Err(TransductionError::output_type(format!(
                "Expected a single record, got {}",
                records.len()
            ))),
        }
    }

    /// All records, in order.
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::Single(record) => vec![record],
            Self::Many(records) => records,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The result as JSON: an object, or an array of objects.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Single(record) => record.to_value(),
            Self::Many(records) => Value::Array(records.iter().map(Record::to_value).collect()),
        }
    }
}

/// Dynamic call arguments, as received from an untyped surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallArgs {
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl CallArgs {
    /// A single positional argument.
    pub fn positional(value: Value) -> Self {
        Self {
            args: vec![value],
            kwargs: Map::new(),
        }
    }

    #[must_use]
    pub fn with_arg(mut self, value: Value) -> Self {
        self.args.push(value);
        self
    }

    #[must_use]
    pub fn with_kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.kwargs.insert(name.into(), value);
        self
    }
}

enum Body {
    Map(BoxedHandler<Record>),
    /// Single-record body that runs under the caller's context
    Contextual(BoxedHandler<(CallContext, Record)>),
    Reduce(BoxedHandler<Vec<Record>>),
}

struct Inner {
    spec: Arc<TransductionSpec>,
    declared_target: SchemaRef,
    description: Option<String>,
    body: Body,
    executor: Arc<dyn TransductionExecutor>,
    algebra: Arc<SchemaAlgebra>,
    call_timeout: Option<Duration>,
}

/// A declared, callable transduction.
///
/// Cloning is cheap and shares the spec, body and executor.
#[derive(Clone)]
pub struct Transducer {
    inner: Arc<Inner>,
}

impl Transducer {
    /// Start declaring a transducer.
    pub fn builder(signature: Signature) -> TransducerBuilder {
        TransducerBuilder::new(signature)
    }

    pub fn name(&self) -> &str {
        &self.inner.spec.name
    }

    pub fn spec(&self) -> &TransductionSpec {
        &self.inner.spec
    }

    pub fn mode(&self) -> TransductionMode {
        self.inner.spec.mode
    }

    /// Schema of accepted input records.
    pub fn source_schema(&self) -> &SchemaRef {
        &self.inner.spec.source_schema
    }

    /// Schema of produced records (the optional view of the declared target).
    pub fn target_schema(&self) -> &SchemaRef {
        &self.inner.spec.target_schema
    }

    /// Target schema as declared.
    pub fn declared_target(&self) -> &SchemaRef {
        &self.inner.declared_target
    }

    /// Doc attached to the signature.
    pub fn description(&self) -> Option<&str> {
        self.inner.description.as_deref()
    }

    pub fn tools(&self) -> &[Tool] {
        &self.inner.spec.tools
    }

    pub fn executor(&self) -> &Arc<dyn TransductionExecutor> {
        &self.inner.executor
    }

    pub fn algebra(&self) -> &Arc<SchemaAlgebra> {
        &self.inner.algebra
    }

    /// An engine sharing this transducer's executor and algebra.
    pub fn engine(&self) -> TransductionEngine {
        TransductionEngine::new(self.inner.executor.clone()).with_algebra(self.inner.algebra.clone())
    }

    /// Call with a fresh [`CallContext`].
    pub async fn call(&self, input: impl Into<TransducerInput>) -> TransductionResult<Transduced> {
        self.call_with(&CallContext::new(), input).await
    }

    /// Call under an existing context.
    pub async fn call_with(
        &self,
        ctx: &CallContext,
        input: impl Into<TransducerInput>,
    ) -> TransductionResult<Transduced> {
        let ctx = ctx.clone().or_timeout(self.inner.call_timeout);

        match (self.mode(), input.into()) {
            (TransductionMode::Map, TransducerInput::Single(record)) => {
                Ok(Transduced::Single(self.run_single(&ctx, record).await?))
            }
            (TransductionMode::Map, TransducerInput::Batch(records)) => {
                Ok(Transduced::Many(self.run_batch(&ctx, records).await?))
            }
            (TransductionMode::Map, TransducerInput::Request(TransduceRequest::Single(record))) => {
                let record = self.admit(record)?;
                Ok(Transduced::Single(self.dispatch_single(&ctx, record).await?))
            }
            (TransductionMode::Reduce, TransducerInput::Batch(records)) => {
                self.run_group(&ctx, records).await
            }
            (TransductionMode::Reduce, TransducerInput::Request(request)) => {
                let records = self.admit_all(request.into_records())?;
                self.dispatch_group(&ctx, records).await
            }
            (_, input) => Err(TransductionError::invalid_call(format!(
                "Transducer '{}' accepts only {}",
                self.name(),
                self.accepted_shapes()
            ))
            .with_details(serde_json::json!({ "received": input_kind(&input) }))),
        }
    }

    /// Call with one record and expect one record back.
    pub async fn call_one(&self, record: Record) -> TransductionResult<Record> {
        self.call(record).await?.into_single()
    }

    /// Call with a list of records.
    pub async fn call_many(&self, records: Vec<Record>) -> TransductionResult<Vec<Record>> {
        Ok(self.call(records).await?.into_records())
    }

    /// Call from dynamic arguments.
    ///
    /// Exactly one positional argument and no keyword arguments are
    /// accepted; the argument is handled as by [`Transducer::call_value`].
    pub async fn invoke(&self, args: CallArgs) -> TransductionResult<Transduced> {
        if args.args.len() != 1 || !args.kwargs.is_empty() {
            return Err(TransductionError::invalid_call(format!(
                "Transducer '{}' accepts exactly one positional argument and no keyword arguments: {}",
                self.name(),
                self.accepted_shapes()
            ))
            .with_details(serde_json::json!({
                "positional": args.args.len(),
                "keyword": args.kwargs.keys().collect::<Vec<_>>(),
            })));
        }
        let value = args.args.into_iter().next().unwrap_or(Value::Null);
        self.call_value(value).await
    }

    /// Call with a JSON object (one record) or array of objects (a list).
    pub async fn call_value(&self, value: Value) -> TransductionResult<Transduced> {
        match value {
            Value::Object(_) => {
                let record = self.parse_source(value)?;
                self.call(record).await
            }
            Value::Array(items) => {
                let records = items
                    .into_iter()
                    .map(|item| self.parse_source(item))
                    .collect::<TransductionResult<Vec<_>>>()?;
                self.call(records).await
            }
            other => Err(TransductionError::invalid_call(format!(
                "Transducer '{}' accepts only {}, found {}",
                self.name(),
                self.accepted_shapes(),
                value_kind(&other)
            ))),
        }
    }

    /// Generate `n` prototypical source records with this transducer's executor.
    pub async fn generate_prototypical_sources(&self, n: usize) -> TransductionResult<Vec<Record>> {
        self.engine().generate_prototypes(self.source_schema(), n).await
    }

    fn accepted_shapes(&self) -> String {
        let source = self.source_schema().name();
        match self.mode() {
            TransductionMode::Map => format!("{source}, TransduceRequest, or Vec<{source}>"),
            TransductionMode::Reduce => format!("Vec<{source}> or TransduceRequest"),
        }
    }

    fn parse_source(&self, value: Value) -> TransductionResult<Record> {
        Record::from_value(self.source_schema(), value).map_err(|e| {
            TransductionError::invalid_call(format!(
                "Argument is not a valid {}",
                self.source_schema().name()
            ))
            .with_cause(e.to_string())
        })
    }

    /// Accept a record of the source schema, a schema derived from it, or
    /// anything whose values conform to it.
    fn admit(&self, record: Record) -> TransductionResult<Record> {
        let source = self.source_schema();
        if record.is_instance_of(source) {
            return Ok(record);
        }
        record.conform_to(source).map_err(|e| {
            TransductionError::invalid_call(format!(
                "{} record is not a valid {}",
                record.schema().name(),
                source.name()
            ))
            .with_cause(e.to_string())
        })
    }

    fn admit_all(&self, records: Vec<Record>) -> TransductionResult<Vec<Record>> {
        records.into_iter().map(|record| self.admit(record)).collect()
    }

    async fn run_single(&self, ctx: &CallContext, record: Record) -> TransductionResult<Record> {
        let record = self.admit(record)?;
        let outcome = match &self.inner.body {
            Body::Map(body) => body(record).await?,
            Body::Contextual(body) => body((ctx.clone(), record)).await?,
            Body::Reduce(_) => {
                return Err(TransductionError::internal(format!(
                    "Transducer '{}' has no single-record body",
                    self.name()
                )));
            }
        };

        match outcome {
            Outcome::Output(output) => {
                log_short_circuit(self.spec(), ctx.call_id());
                self.check_output(output)
            }
            Outcome::Transduce(TransduceRequest::Single(source)) => {
                let source = self.admit(source)?;
                self.dispatch_single(ctx, source).await
            }
            Outcome::Transduce(TransduceRequest::Group(_)) => {
                Err(TransductionError::output_type(format!(
                    "Map transducer '{}' returned a grouped transduction request",
                    self.name()
                )))
            }
        }
    }

    async fn run_group(&self, ctx: &CallContext, records: Vec<Record>) -> TransductionResult<Transduced> {
        let records = self.admit_all(records)?;
        let Body::Reduce(body) = &self.inner.body else {
            return Err(TransductionError::internal(format!(
                "Transducer '{}' has no group body",
                self.name()
            )));
        };

        match body(records).await? {
            Outcome::Output(output) => {
                log_short_circuit(self.spec(), ctx.call_id());
                Ok(Transduced::Single(self.check_output(output)?))
            }
            Outcome::Transduce(request) => {
                let records = self.admit_all(request.into_records())?;
                self.dispatch_group(ctx, records).await
            }
        }
    }

    async fn run_batch(&self, ctx: &CallContext, records: Vec<Record>) -> TransductionResult<Vec<Record>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.admit_all(records)?;
        let total = records.len();

        let spec = TransductionSpec::clone(&self.inner.spec);
        log_batch_started(&spec, ctx.call_id(), total);

        let this = self.clone();
        let item_ctx = ctx.clone();
        let per_item: ItemFn = Arc::new(move |_index, record| {
            let this = this.clone();
            let ctx = item_ctx.clone();
            Box::pin(async move { this.run_single(&ctx, record).await })
        });

        let results = self.inner.executor.run_batch(&spec, records, per_item).await?;
        if results.len() != total {
            return Err(TransductionError::executor_contract(format!(
                "Batch returned {} results for {} items",
                results.len(),
                total
            )));
        }
        Ok(results)
    }

    async fn dispatch_single(&self, ctx: &CallContext, source: Record) -> TransductionResult<Record> {
        let outputs = self.execute(ctx, vec![source]).await?;
        let count = outputs.len();
        let mut outputs = outputs.into_iter();
        match (outputs.next(), outputs.next()) {
            (Some(output), None) => self.conform_output(output),
            (None, _) => Err(TransductionError::no_state_output()),
            (Some(_), Some(_)) => Err(TransductionError::executor_contract(format!(
                "Executor returned {count} records for a single-item transduction"
            ))),
        }
    }

    async fn dispatch_group(&self, ctx: &CallContext, sources: Vec<Record>) -> TransductionResult<Transduced> {
        let outputs = self
            .execute(ctx, sources)
            .await?
            .into_iter()
            .map(|output| self.conform_output(output))
            .collect::<TransductionResult<Vec<_>>>()?;

        match <[Record; 1]>::try_from(outputs) {
            Ok([output]) => Ok(Transduced::Single(output)),
            Err(outputs) => Ok(Transduced::Many(outputs)),
        }
    }

    async fn execute(&self, ctx: &CallContext, sources: Vec<Record>) -> TransductionResult<Vec<Record>> {
        let spec = self.inner.spec.clone();
        log_transduction_dispatched(&spec, ctx.call_id(), sources.len());

        let start = Instant::now();
        let outputs = ctx
            .run(self.inner.executor.transduce(&spec, ExecutorInput::Records(sources)))
            .await?;
        log_transduction_completed(&spec, ctx.call_id(), outputs.len(), start.elapsed());
        Ok(outputs)
    }

    fn conform_output(&self, output: Record) -> TransductionResult<Record> {
        output.conform_to(self.target_schema()).map_err(|e| {
            TransductionError::from(e).with_cause(format!(
                "Executor output for '{}' does not conform to {}",
                self.name(),
                self.target_schema().name()
            ))
        })
    }

    fn check_output(&self, output: Record) -> TransductionResult<Record> {
        let declared = self.declared_target();
        if !self.spec().enforce_output_type
            || output.is_instance_of(declared)
            || output.is_instance_of(self.target_schema())
        {
            return Ok(output);
        }
        Err(TransductionError::output_type(format!(
            "Returned object {output} is not an instance of {}",
            declared.name()
        ))
        .with_details(serde_json::json!({
            "expected": declared.name(),
            "found": output.schema().name(),
        })))
    }
}

impl fmt::Debug for Transducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transducer")
            .field("name", &self.name())
            .field("mode", &self.mode())
            .field("source", self.source_schema())
            .field("target", self.declared_target())
            .finish_non_exhaustive()
    }
}

fn input_kind(input: &TransducerInput) -> &'static str {
    match input {
        TransducerInput::Single(_) => "record",
        TransducerInput::Request(TransduceRequest::Single(_)) => "single transduction request",
        TransducerInput::Request(TransduceRequest::Group(_)) => "group transduction request",
        TransducerInput::Batch(_) => "list",
    }
}

/// Builder for [`Transducer`].
///
/// The body method chosen at the end (`map`, `reduce` or `transduce`) fixes
/// the transducer's mode.
pub struct TransducerBuilder {
    signature: Signature,
    config: TransducibleConfig,
    executor: Option<Arc<dyn TransductionExecutor>>,
    algebra: Option<Arc<SchemaAlgebra>>,
}

impl TransducerBuilder {
    pub fn new(signature: Signature) -> Self {
        Self {
            signature,
            config: TransducibleConfig::default(),
            executor: None,
            algebra: None,
        }
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn config(mut self, config: TransducibleConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn executor(mut self, executor: Arc<dyn TransductionExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Use a specific algebra instead of the global one.
    #[must_use]
    pub fn algebra(mut self, algebra: Arc<SchemaAlgebra>) -> Self {
        self.algebra = Some(algebra);
        self
    }

    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.instructions = Some(instructions.into());
        self
    }

    #[must_use]
    pub fn tool(mut self, tool: Tool) -> Self {
        self.config.tools.push(tool);
        self
    }

    #[must_use]
    pub fn enforce_output_type(mut self, enforce: bool) -> Self {
        self.config.enforce_output_type = enforce;
        self
    }

    /// Finish with a single-record body.
    pub fn map<H>(self, handler: H) -> TransductionResult<Transducer>
    where
        H: Handler<Record>,
    {
        self.build(Body::Map(into_boxed(handler)))
    }

    /// Finish with a single-record body that receives the call's context.
    ///
    /// Transducers called from the body with [`Transducer::call_with`] share
    /// the caller's timeout and cancellation signal.
    pub fn map_with_context<H>(self, handler: H) -> TransductionResult<Transducer>
    where
        H: Handler<(CallContext, Record)>,
    {
        self.build(Body::Contextual(into_boxed(handler)))
    }

    /// Finish with a list body.
    pub fn reduce<H>(self, handler: H) -> TransductionResult<Transducer>
    where
        H: Handler<Vec<Record>>,
    {
        self.build(Body::Reduce(into_boxed(handler)))
    }

    /// Finish with a body that always delegates to the executor, in the
    /// configured mode.
    pub fn transduce(self) -> TransductionResult<Transducer> {
        match self.config.mode {
            TransductionMode::Map => self.map(|record: Record| async move {
                Ok::<_, TransductionError>(Outcome::transduce(record))
            }),
            TransductionMode::Reduce => self.reduce(|records: Vec<Record>| async move {
                Ok::<_, TransductionError>(Outcome::transduce_all(records))
            }),
        }
    }

    fn build(self, body: Body) -> TransductionResult<Transducer> {
        let mode = match body {
            Body::Map(_) | Body::Contextual(_) => TransductionMode::Map,
            Body::Reduce(_) => TransductionMode::Reduce,
        };
        let config = self.config.with_mode(mode);
        config.validate()?;

        let signature = self.signature;
        let executor = self.executor.ok_or_else(|| {
            TransductionError::declaration(format!(
                "No transduction executor configured for '{}'",
                signature.name
            ))
        })?;
        let algebra = self.algebra.unwrap_or_else(SchemaAlgebra::global);

        let resolved = introspect(&signature, mode, &algebra)?;
        let doc = config.instructions.as_deref().or(signature.doc.as_deref());
        let instructions = render_instructions(
            &signature.name,
            resolved.source.name(),
            resolved.declared_target.name(),
            doc,
        );

        log_transducer_declared(
            &signature.name,
            resolved.source.name(),
            resolved.declared_target.name(),
            mode,
        );

        let spec = TransductionSpec::new(
            signature.name,
            resolved.source,
            resolved.target,
            instructions,
            &config,
        );

        Ok(Transducer {
            inner: Arc::new(Inner {
                spec: Arc::new(spec),
                declared_target: resolved.declared_target,
                description: signature.doc,
                body,
                executor,
                algebra,
                call_timeout: config.call_timeout(),
            }),
        })
    }
}
