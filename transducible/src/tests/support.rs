//! Shared schemas and stub executors for the test suites.

use crate::{
    ExecutorInput, TransductionEngine, TransductionExecutor, TransductionResult, TransductionSpec,
};
use async_trait::async_trait;
use atype::{Field, FieldType, Record, Schema, SchemaAlgebra, SchemaRef};
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// =============================================================================
// Schemas
// =============================================================================

/// `Question { q: String }`
pub fn question() -> SchemaRef {
    Schema::builder("Question")
        .field(Field::required("q", FieldType::String))
        .build()
        .unwrap()
}

/// `Answer { a: String }`
pub fn answer() -> SchemaRef {
    Schema::builder("Answer")
        .field(Field::required("a", FieldType::String))
        .build()
        .unwrap()
}

/// `Verdict { a: String, b: String }`
pub fn verdict() -> SchemaRef {
    Schema::builder("Verdict")
        .field(Field::required("a", FieldType::String))
        .field(Field::required("b", FieldType::String))
        .build()
        .unwrap()
}

pub fn ask(question: &SchemaRef, q: &str) -> Record {
    question.record(json!({ "q": q })).unwrap()
}

/// Engine over `executor` with a private algebra.
pub fn engine_with(executor: Arc<dyn TransductionExecutor>) -> TransductionEngine {
    TransductionEngine::new(executor).with_algebra(Arc::new(SchemaAlgebra::new()))
}

fn source_records(input: &ExecutorInput) -> Vec<Record> {
    match input {
        ExecutorInput::Records(records) => records.clone(),
        ExecutorInput::Text(_) => Vec::new(),
    }
}

// =============================================================================
// Executors
// =============================================================================

/// Always answers `{ "a": "42" }`, one record per call.
#[derive(Default)]
pub struct ConstantExecutor {
    pub calls: AtomicUsize,
}

impl ConstantExecutor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransductionExecutor for ConstantExecutor {
    async fn transduce(
        &self,
        spec: &TransductionSpec,
        _input: ExecutorInput,
    ) -> TransductionResult<Vec<Record>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![spec.target_schema.record(json!({ "a": "42" }))?])
    }
}

/// Never produces anything.
pub struct EmptyExecutor;

#[async_trait]
impl TransductionExecutor for EmptyExecutor {
    async fn transduce(
        &self,
        _spec: &TransductionSpec,
        _input: ExecutorInput,
    ) -> TransductionResult<Vec<Record>> {
        Ok(Vec::new())
    }
}

/// Copies each source `q` into the target `a`, after sleeping `q`
/// milliseconds when `q` is a number. Tracks peak concurrency.
#[derive(Default)]
pub struct EchoExecutor {
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

#[async_trait]
impl TransductionExecutor for EchoExecutor {
    async fn transduce(
        &self,
        spec: &TransductionSpec,
        input: ExecutorInput,
    ) -> TransductionResult<Vec<Record>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let mut outputs = Vec::new();
        for source in source_records(&input) {
            let q = source.get("q").and_then(Value::as_str).unwrap_or_default().to_string();
            if let Ok(millis) = q.parse::<u64>() {
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }
            outputs.push(spec.target_schema.record(json!({ "a": q }))?);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(outputs)
    }
}

/// Hangs far longer than any test timeout.
pub struct HungExecutor;

#[async_trait]
impl TransductionExecutor for HungExecutor {
    async fn transduce(
        &self,
        _spec: &TransductionSpec,
        _input: ExecutorInput,
    ) -> TransductionResult<Vec<Record>> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(Vec::new())
    }
}

/// Populates every field of the target schema, nested records included.
/// Lists get two elements.
pub struct FillingExecutor;

#[async_trait]
impl TransductionExecutor for FillingExecutor {
    async fn transduce(
        &self,
        spec: &TransductionSpec,
        _input: ExecutorInput,
    ) -> TransductionResult<Vec<Record>> {
        Ok(vec![Record::new(&spec.target_schema, sample_object(&spec.target_schema))?])
    }
}

pub fn sample_object(schema: &Schema) -> Map<String, Value> {
    schema
        .fields()
        .iter()
        .map(|field| (field.name.clone(), sample_value(&field.ty)))
        .collect()
}

pub fn sample_value(ty: &FieldType) -> Value {
    match ty {
        FieldType::String | FieldType::Any => json!("value"),
        FieldType::Boolean => json!(true),
        FieldType::Integer => json!(1),
        FieldType::Float => json!(1.5),
        FieldType::List(inner) => json!([sample_value(inner), sample_value(inner)]),
        FieldType::Map(inner) => json!({ "key": sample_value(inner) }),
        FieldType::Optional(inner) => sample_value(inner),
        FieldType::Record(schema) => Value::Object(sample_object(schema)),
    }
}

/// Records every call, then delegates.
pub struct RecordingExecutor<E> {
    inner: E,
    pub calls: Mutex<Vec<(TransductionSpec, ExecutorInput)>>,
}

impl<E> RecordingExecutor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn specs(&self) -> Vec<TransductionSpec> {
        self.calls.lock().unwrap().iter().map(|(spec, _)| spec.clone()).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl<E: TransductionExecutor> TransductionExecutor for RecordingExecutor<E> {
    async fn transduce(
        &self,
        spec: &TransductionSpec,
        input: ExecutorInput,
    ) -> TransductionResult<Vec<Record>> {
        self.calls.lock().unwrap().push((spec.clone(), input.clone()));
        self.inner.transduce(spec, input).await
    }
}
