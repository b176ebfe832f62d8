//! Transducer lifecycle logging functions.
//!
//! Dispatch and completion events are logged at Info level when the spec
//! has `verbose_transduction` set and at Debug level otherwise.

use crate::config::TransductionMode;
use crate::spec::TransductionSpec;
use std::time::Duration;
use uuid::Uuid;

// =============================================================================
// Declaration
// =============================================================================

/// Log transducer declaration. Logged at Debug level.
pub fn log_transducer_declared(name: &str, source: &str, target: &str, mode: TransductionMode) {
    tracing::debug!(
        transducer = %name,
        source = %source,
        target = %target,
        mode = %mode,
        "Transducer declared"
    );
}

// =============================================================================
// Calls
// =============================================================================

/// Log a hand-off to the executor.
pub fn log_transduction_dispatched(spec: &TransductionSpec, call_id: Uuid, items: usize) {
    if spec.verbose_transduction {
        tracing::info!(
            transducer = %spec.name,
            call_id = %call_id,
            mode = %spec.mode,
            items,
            "Executing transduction"
        );
    } else {
        tracing::debug!(
            transducer = %spec.name,
            call_id = %call_id,
            mode = %spec.mode,
            items,
            "Executing transduction"
        );
    }
}

/// Log executor completion.
pub fn log_transduction_completed(
    spec: &TransductionSpec,
    call_id: Uuid,
    produced: usize,
    elapsed: Duration,
) {
    if spec.verbose_transduction {
        tracing::info!(
            transducer = %spec.name,
            call_id = %call_id,
            produced,
            duration_ms = elapsed.as_millis() as u64,
            "Transduction completed"
        );
    } else {
        tracing::debug!(
            transducer = %spec.name,
            call_id = %call_id,
            produced,
            duration_ms = elapsed.as_millis() as u64,
            "Transduction completed"
        );
    }
}

/// Log a body that returned its output directly. Logged at Trace level.
pub fn log_short_circuit(spec: &TransductionSpec, call_id: Uuid) {
    tracing::trace!(
        transducer = %spec.name,
        call_id = %call_id,
        "Body returned output without transduction"
    );
}

/// Log a batch hand-off.
pub fn log_batch_started(spec: &TransductionSpec, call_id: Uuid, items: usize) {
    if spec.verbose_transduction {
        tracing::info!(
            transducer = %spec.name,
            call_id = %call_id,
            items,
            batch_size = spec.batch_size,
            "Executing batch transduction"
        );
    } else {
        tracing::debug!(
            transducer = %spec.name,
            call_id = %call_id,
            items,
            batch_size = spec.batch_size,
            "Executing batch transduction"
        );
    }
}

// =============================================================================
// Self-test utilities
// =============================================================================

/// Log prototype generation. Logged at Debug level.
pub fn log_prototypes_generated(schema: &str, requested: usize, produced: usize) {
    tracing::debug!(
        schema = %schema,
        requested,
        produced,
        "Prototypical instances generated"
    );
}

/// Log a logical proximity estimate. Logged at Info level.
pub fn log_proximity_estimated(transducer: &str, targets: usize, score: f64) {
    tracing::info!(
        transducer = %transducer,
        targets,
        score,
        "Logical proximity estimated"
    );
}
