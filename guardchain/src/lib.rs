#![cfg_attr(docsrs, feature(doc_cfg))]
//! Guardchain runs guardrail checks over content flowing into and out of
//! an LLM-backed service.
//!
//! Input guardrails sit right before the model call, output guardrails
//! right after it. For each direction a [`GuardrailChain`] decides whether
//! content may proceed, must be blocked, or must be rewritten (truncation,
//! PII masking), and reports one [`AggregatedResult`] per run.
//!
//! The crate defines how an arbitrary set of checks is scheduled, combined,
//! bounded in time and reported. What an individual check looks for is up
//! to the caller, via the [`GuardrailCheck`] trait; a few reference checks
//! live in [`checks`].

pub mod chain;
pub mod checks;
pub mod error;
pub mod guardrail;
pub mod prelude;

pub use chain::{
    AggregatedResult, ChainSettings, ExecutionMode, GuardrailChain, GuardrailChainBuilder,
    MergePolicy, TimeoutPolicy,
};
pub use error::{CheckError, ConfigError, Error, Result};
pub use guardrail::{
    CancellationToken, CheckContext, Direction, Guardrail, GuardrailCheck, GuardrailDescriptor,
    GuardrailOutput, GuardrailResult, from_fn,
};
