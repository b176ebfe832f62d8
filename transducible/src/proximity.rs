//! Logical proximity: how completely a transducer fills its target.

use crate::engine::TransductionEngine;
use crate::error::TransductionResult;
use crate::logging::log_proximity_estimated;
use crate::transducer::Transducer;
use atype::Record;

/// Fraction of `record`'s schema fields that are neither null nor `""`.
pub fn percent_non_empty_fields(record: &Record) -> f64 {
    record.fraction_non_empty()
}

/// Generate `n` source prototypes, transduce them as a batch and return the
/// mean [`percent_non_empty_fields`] of the outputs.
///
/// Returns `0.0` when no outputs are produced.
pub async fn estimate_proximity(
    engine: &TransductionEngine,
    transducer: &Transducer,
    n: usize,
) -> TransductionResult<f64> {
    let sources = engine.generate_prototypes(transducer.source_schema(), n).await?;
    let targets = transducer.call_many(sources).await?;

    let score = if targets.is_empty() {
        0.0
    } else {
        targets.iter().map(percent_non_empty_fields).sum::<f64>() / targets.len() as f64
    };

    log_proximity_estimated(transducer.name(), targets.len(), score);
    Ok(score)
}
