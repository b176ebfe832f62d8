//! Transducer composition.
//!
//! `compose(Target, operand)` builds a transducer into `Target` from one of
//! three operand kinds:
//!
//! | Operand | Result |
//! |---|---|
//! | schema `S` | one-hop `S -> Target` with a default instruction |
//! | `with(S, config)` | one-hop `S -> Target` with `config` |
//! | transducer `g: C -> Mid` | `C -> Target`, running `g` then `Mid -> Target` |
//!
//! Reduce-mode operands cannot form a one-hop map pipeline and are rejected.

use crate::config::{TransducibleConfig, TransductionMode};
use crate::context::CallContext;
use crate::engine::TransductionEngine;
use crate::error::{TransductionError, TransductionResult};
use crate::handler::Outcome;
use crate::introspect::Signature;
use crate::transducer::Transducer;
use atype::{Record, SchemaRef};

/// Right-hand side of a composition.
#[derive(Debug, Clone)]
pub enum ComposeOperand {
    /// A bare source schema
    Schema(SchemaRef),
    /// A source schema with explicit configuration
    Configured(SchemaRef, TransducibleConfig),
    /// An existing transducer to chain after
    Transducer(Transducer),
}

/// Pair a source schema with a configuration for [`compose_transduction`].
pub fn with(schema: &SchemaRef, config: TransducibleConfig) -> ComposeOperand {
    ComposeOperand::Configured(schema.clone(), config)
}

impl From<SchemaRef> for ComposeOperand {
    fn from(schema: SchemaRef) -> Self {
        Self::Schema(schema)
    }
}

impl From<&SchemaRef> for ComposeOperand {
    fn from(schema: &SchemaRef) -> Self {
        Self::Schema(schema.clone())
    }
}

impl From<Transducer> for ComposeOperand {
    fn from(transducer: Transducer) -> Self {
        Self::Transducer(transducer)
    }
}

impl From<&Transducer> for ComposeOperand {
    fn from(transducer: &Transducer) -> Self {
        Self::Transducer(transducer.clone())
    }
}

/// Default instruction of a one-hop transducer.
pub fn default_instruction(source: &str, target: &str) -> String {
    format!("Transduce {source} → {target}")
}

/// Build a transducer into `target` from `operand`.
pub fn compose_transduction(
    engine: &TransductionEngine,
    target: &SchemaRef,
    operand: ComposeOperand,
) -> TransductionResult<Transducer> {
    let reduce_mode = match &operand {
        ComposeOperand::Schema(_) => false,
        ComposeOperand::Configured(_, config) => config.mode == TransductionMode::Reduce,
        ComposeOperand::Transducer(g) => g.mode() == TransductionMode::Reduce,
    };
    if reduce_mode {
        return Err(TransductionError::unsupported_operand(&operand));
    }

    match operand {
        ComposeOperand::Schema(source) => engine.make_transducible_from_types(
            &source,
            target,
            default_instruction(source.name(), target.name()),
        ),
        ComposeOperand::Configured(source, config) => {
            engine.from_types_with(&source, target, config)
        }
        ComposeOperand::Transducer(g) => chain(engine, target, g),
    }
}

/// `C -> Target` as `g` followed by a `Mid -> Target` hop.
///
/// Both inner calls run under the composed call's context.
fn chain(
    engine: &TransductionEngine,
    target: &SchemaRef,
    g: Transducer,
) -> TransductionResult<Transducer> {
    let mid = g.declared_target().clone();
    let hop = engine.make_transducible_from_types(
        g.target_schema(),
        target,
        default_instruction(mid.name(), target.name()),
    )?;

    let name = format!("{}_after_{}", target.name(), mid.name());
    let signature = Signature::unary(name, g.source_schema(), target);

    engine
        .transducible(signature)
        .config(
            engine
                .defaults()
                .clone()
                .with_instructions(default_instruction(g.source_schema().name(), target.name())),
        )
        .map_with_context(move |(ctx, source): (CallContext, Record)| {
            let g = g.clone();
            let hop = hop.clone();
            async move {
                let mid = g.call_with(&ctx, source).await?.into_single()?;
                let output = hop.call_with(&ctx, mid).await?.into_single()?;
                Ok::<_, TransductionError>(Outcome::output(output))
            }
        })
}
