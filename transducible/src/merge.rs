//! Semantic merge of two records through the executor.

use crate::context::CallContext;
use crate::engine::TransductionEngine;
use crate::error::{TransductionError, TransductionResult};
use crate::executor::ExecutorInput;
use crate::logging::{log_transduction_completed, log_transduction_dispatched};
use crate::spec::{TransductionSpec, render_instructions};
use atype::{Field, FieldType, Record, Schema};
use std::time::Instant;

const MERGE_INSTRUCTIONS: &str = "Merge the two provided instances into an instance of the target type. \
    Copy non null attributes verbatim if only one option is provided. \
    If different values for the same attribute are provided, derive one that represents the semantic average of the two options. \
    If missing values of the target type can be inferred, fill them, otherwise leave them blank.";

/// Merge `a` and `b` into one record of the optional view of their merged
/// schema, letting the executor reconcile conflicting values.
///
/// The executor must return exactly one record.
pub async fn semantic_merge(
    engine: &TransductionEngine,
    a: &Record,
    b: &Record,
) -> TransductionResult<Record> {
    let algebra = engine.algebra();
    let merged = algebra.merge_schemas(a.schema(), b.schema())?;
    let target = algebra.make_all_fields_optional(&merged)?;
    let source = Schema::builder("MergeInput")
        .field(Field::required("text", FieldType::String))
        .build()?;

    let name = "semantic_merge";
    let instructions =
        render_instructions(name, source.name(), merged.name(), Some(MERGE_INSTRUCTIONS));
    let spec = TransductionSpec::new(name, source, target.clone(), instructions, engine.defaults());

    let text = format!(
        "{}\n{}",
        serde_json::to_string(a)?,
        serde_json::to_string(b)?
    );

    let ctx = CallContext::new().or_timeout(engine.defaults().call_timeout());
    log_transduction_dispatched(&spec, ctx.call_id(), 2);
    let start = Instant::now();
    let outputs = ctx
        .run(engine.executor().transduce(&spec, ExecutorInput::Text(text)))
        .await?;
    log_transduction_completed(&spec, ctx.call_id(), outputs.len(), start.elapsed());

    let count = outputs.len();
    let mut outputs = outputs.into_iter();
    match (outputs.next(), outputs.next()) {
        (Some(output), None) => Ok(output.conform_to(&target)?),
        (None, _) => Err(TransductionError::executor_contract(
            "Semantic merge produced no record",
        )),
        (Some(_), Some(_)) => Err(TransductionError::executor_contract(format!(
            "Semantic merge produced {count} records, expected exactly one"
        ))),
    }
}
