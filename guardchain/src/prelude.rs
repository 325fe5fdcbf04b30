//! Convenience re-exports for building and running guardrail chains.
//!
//! ```rust,ignore
//! use guardchain::prelude::*;
//! ```

pub use std::time::Duration;

pub use async_trait::async_trait;

pub use crate::chain::{
    AggregatedResult, ChainSettings, ExecutionMode, GuardrailChain, MergePolicy, TimeoutPolicy,
};
pub use crate::checks::{LengthAction, MaxLengthCheck, PatternCheck, RedactCheck};
pub use crate::error::{CheckError, ConfigError};
pub use crate::guardrail::{
    CancellationToken, CheckContext, Direction, Guardrail, GuardrailCheck, GuardrailOutput,
    GuardrailResult, from_fn,
};
