//! Transducer bodies and what they return.
//!
//! A transducer body is an async function from the input (one record in map
//! mode, a list in reduce mode) to an [`Outcome`]. The outcome either is the
//! final output, which short-circuits the executor, or a
//! [`TransduceRequest`] asking the engine to hand the input to the executor.

use crate::error::TransductionResult;
use atype::Record;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{trace, warn};

/// Boxed, sendable future resolving to a transduction result.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = TransductionResult<T>> + Send>>;

/// Marker asking the engine to delegate to the executor.
#[derive(Debug, Clone, PartialEq)]
pub enum TransduceRequest {
    /// One source record (map mode)
    Single(Record),
    /// A group of source records (reduce mode)
    Group(Vec<Record>),
}

impl TransduceRequest {
    /// Number of records carried by the request.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Group(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::Single(record) => vec![record],
            Self::Group(records) => records,
        }
    }
}

impl From<Record> for TransduceRequest {
    fn from(record: Record) -> Self {
        Self::Single(record)
    }
}

impl From<Vec<Record>> for TransduceRequest {
    fn from(records: Vec<Record>) -> Self {
        Self::Group(records)
    }
}

/// What a transducer body produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The final output
    Output(Record),
    /// Delegate to the executor
    Transduce(TransduceRequest),
}

impl Outcome {
    pub fn output(record: Record) -> Self {
        Self::Output(record)
    }

    /// Delegate one record to the executor.
    pub fn transduce(record: Record) -> Self {
        Self::Transduce(TransduceRequest::Single(record))
    }

    /// Delegate a group of records to the executor.
    pub fn transduce_all(records: Vec<Record>) -> Self {
        Self::Transduce(TransduceRequest::Group(records))
    }
}

/// Boxed body for type erasure
pub(crate) type BoxedHandler<Input> = Arc<dyn Fn(Input) -> BoxFuture<Outcome> + Send + Sync>;

/// Trait for transducer bodies
///
/// Automatically implemented for async functions with the signature:
/// `async fn(Input) -> TransductionResult<Outcome>`
pub trait Handler<Input>: Send + Sync + 'static
where
    Input: Send + 'static,
{
    /// The future type returned by the body
    type Future: Future<Output = TransductionResult<Outcome>> + Send + 'static;

    /// Run the body
    fn call(&self, input: Input) -> Self::Future;
}

impl<Input, F, Fut> Handler<Input> for F
where
    Input: Send + 'static,
    F: Fn(Input) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TransductionResult<Outcome>> + Send + 'static,
{
    type Future = Fut;

    fn call(&self, input: Input) -> Self::Future {
        (self)(input)
    }
}

/// Convert a body into a boxed handler for storage
pub(crate) fn into_boxed<Input, H>(handler: H) -> BoxedHandler<Input>
where
    Input: Send + 'static,
    H: Handler<Input>,
{
    Arc::new(move |input| {
        let fut = handler.call(input);
        Box::pin(async move {
            trace!("Executing transducer body");
            fut.await.inspect_err(|e| {
                warn!(error_code = %e.code, error_message = %e.message, "Transducer body failed");
            })
        })
    })
}
