//! Prototypical instance generation.
//!
//! The engine is used reflexively: a one-hop transducer from an empty input
//! to a holder schema asks the executor for a list of sample records.

use crate::engine::TransductionEngine;
use crate::error::{TransductionError, TransductionResult};
use crate::logging::log_prototypes_generated;
use atype::{Field, FieldType, Record, Schema, SchemaRef};
use serde_json::Value;

/// Name of the throwaway schema holding generated instances.
pub const HOLDER_SCHEMA_NAME: &str = "ListOfObjectsOfGivenType";

const INSTANCES_FIELD: &str = "instances";

/// Ask the executor for up to `n` varied, maximally complete records of `schema`.
///
/// The result may hold fewer than `n` records. `n == 0` returns an empty
/// list without calling the executor.
pub async fn generate_prototypes(
    engine: &TransductionEngine,
    schema: &SchemaRef,
    n: usize,
) -> TransductionResult<Vec<Record>> {
    if n == 0 {
        return Ok(Vec::new());
    }

    let holder = Schema::builder(HOLDER_SCHEMA_NAME)
        .field(Field::required(
            INSTANCES_FIELD,
            FieldType::list(FieldType::Record(schema.clone())),
        ))
        .build()?;
    let empty = Schema::builder("EmptyInput").build()?;

    let generator =
        engine.make_transducible_from_types(&empty, &holder, prototype_instructions(schema, n))?;
    let generated = generator.call_one(empty.empty_record()?).await?;

    let instances = match generated.get(INSTANCES_FIELD) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .cloned()
            .map(|item| Record::from_value(schema, item))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(TransductionError::executor_contract(format!(
                "Expected a list of {} instances, found {}",
                schema.name(),
                atype::value_kind(other)
            )));
        }
    };

    log_prototypes_generated(schema.name(), n, instances.len());
    Ok(instances)
}

fn prototype_instructions(schema: &SchemaRef, n: usize) -> String {
    format!(
        "Generate list of {n} random instances of the following type {}. \
         Try to fill most of the attributes for each generated instance as possible",
        schema.to_json_schema()
    )
}
