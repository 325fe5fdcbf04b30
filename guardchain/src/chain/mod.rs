//! Guardrail chains: the public entry points of the engine.
//!
//! A [`GuardrailChain`] owns an ordered list of guardrails for the input
//! direction and one for the output direction, plus [`ChainSettings`]. It
//! is built once, is read-only afterwards, and is safe to share between
//! concurrent requests: every call works on its own content, context and
//! result set.
//!
//! # Execution Modes
//!
//! - **Parallel** (default): blocking guardrails run concurrently; the first
//!   block cancels the rest and skips non-blocking guardrails. Otherwise
//!   non-blocking guardrails run concurrently afterwards. Rewrites are
//!   resolved by [`MergePolicy`].
//! - **Sequential**: guardrails run in configured order, each seeing the
//!   previous rewrite; a block from a blocking guardrail stops the run.
//!
//! Either mode is bounded by one end-to-end timeout. Expiry never raises an
//! error; the verdict follows [`TimeoutPolicy`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use guardchain::prelude::*;
//!
//! let chain = GuardrailChain::builder()
//!     .input_guardrail(Guardrail::new("length", MaxLengthCheck::block(4_000)))
//!     .input_guardrail(Guardrail::new("injection", PatternCheck::prompt_injection()?))
//!     .output_guardrail(Guardrail::new("pii", RedactCheck::pii()?).blocking(false))
//!     .timeout(Duration::from_secs(2))
//!     .build()?;
//!
//! let verdict = chain.check_input(prompt, CheckContext::default()).await;
//! if verdict.blocked {
//!     return Err(reject(verdict.rejection_message()));
//! }
//! ```

mod aggregate;
mod config;
mod executor;

pub use aggregate::AggregatedResult;
pub use config::{ChainSettings, DEFAULT_TIMEOUT_MS, ExecutionMode, MergePolicy, TimeoutPolicy};

use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{Instrument, debug, debug_span, info, warn};

use crate::error::ConfigError;
use crate::guardrail::{CheckContext, Direction, Guardrail};

/// An immutable, validated set of input and output guardrails.
///
/// Checks of a parallel run are spawned onto the current Tokio runtime, so
/// [`check_input`](Self::check_input) and
/// [`check_output`](Self::check_output) must be awaited inside one.
#[derive(Debug, Clone)]
pub struct GuardrailChain {
    input: Vec<Guardrail>,
    output: Vec<Guardrail>,
    settings: ChainSettings,
}

impl GuardrailChain {
    /// Start building a chain.
    #[must_use]
    pub fn builder() -> GuardrailChainBuilder {
        GuardrailChainBuilder::default()
    }

    /// Returns the chain settings.
    #[must_use]
    pub const fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    /// Returns the configured guardrails for one direction, in order.
    #[must_use]
    pub fn guardrails(&self, direction: Direction) -> &[Guardrail] {
        match direction {
            Direction::Input => &self.input,
            Direction::Output => &self.output,
        }
    }

    /// Run the input guardrails over a user prompt.
    pub async fn check_input(
        &self,
        content: &str,
        context: impl Into<CheckContext>,
    ) -> AggregatedResult {
        self.check(Direction::Input, content, context.into()).await
    }

    /// Run the output guardrails over a model response.
    pub async fn check_output(
        &self,
        content: &str,
        context: impl Into<CheckContext>,
    ) -> AggregatedResult {
        self.check(Direction::Output, content, context.into()).await
    }

    /// Run one direction's guardrails and aggregate the verdict.
    ///
    /// Never fails: check errors are recorded per guardrail and timeouts
    /// produce a partial verdict.
    pub async fn check(
        &self,
        direction: Direction,
        content: &str,
        context: CheckContext,
    ) -> AggregatedResult {
        let guardrails = self.guardrails(direction);
        let settings = self.settings;
        let span = debug_span!(
            "guardrail_chain",
            direction = %direction,
            mode = %settings.mode,
            guardrails = guardrails.len(),
        );

        async move {
            let started = Instant::now();
            let deadline = started + settings.timeout();
            debug!("running guardrail chain");

            let execution = match settings.mode {
                ExecutionMode::Parallel => {
                    executor::run_parallel(guardrails, content, &context, deadline).await
                }
                ExecutionMode::Sequential => {
                    executor::run_sequential(guardrails, content, &context, deadline).await
                }
            };

            if execution.timed_out {
                warn!(
                    completed = execution.results.len(),
                    timeout_ms = settings.timeout_ms,
                    policy = ?settings.on_timeout,
                    "guardrail chain timed out"
                );
            }
            let short_circuited = execution.short_circuited;

            let verdict = aggregate::aggregate(
                direction,
                guardrails,
                content,
                execution,
                &settings,
                started.elapsed(),
            );

            if verdict.blocked {
                info!(
                    blocked_by = ?verdict.blocked_by,
                    reason = verdict.blocking_reason.as_deref().unwrap_or_default(),
                    short_circuited,
                    "guardrail chain blocked content"
                );
            } else {
                debug!(
                    passed = verdict.passed,
                    failed = ?verdict.failed_guardrails,
                    elapsed_ms = verdict.total_execution_time_ms,
                    "guardrail chain finished"
                );
            }
            verdict
        }
        .instrument(span)
        .await
    }
}

/// Builder for [`GuardrailChain`].
#[derive(Debug, Default)]
pub struct GuardrailChainBuilder {
    input: Vec<Guardrail>,
    output: Vec<Guardrail>,
    settings: ChainSettings,
}

impl GuardrailChainBuilder {
    /// Append a guardrail to the input direction.
    #[must_use]
    pub fn input_guardrail(mut self, guardrail: Guardrail) -> Self {
        self.input.push(guardrail);
        self
    }

    /// Append several guardrails to the input direction.
    #[must_use]
    pub fn input_guardrails(mut self, guardrails: impl IntoIterator<Item = Guardrail>) -> Self {
        self.input.extend(guardrails);
        self
    }

    /// Append a guardrail to the output direction.
    #[must_use]
    pub fn output_guardrail(mut self, guardrail: Guardrail) -> Self {
        self.output.push(guardrail);
        self
    }

    /// Append several guardrails to the output direction.
    #[must_use]
    pub fn output_guardrails(mut self, guardrails: impl IntoIterator<Item = Guardrail>) -> Self {
        self.output.extend(guardrails);
        self
    }

    /// Replace all settings at once.
    #[must_use]
    pub const fn settings(mut self, settings: ChainSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the execution mode.
    #[must_use]
    pub const fn mode(mut self, mode: ExecutionMode) -> Self {
        self.settings.mode = mode;
        self
    }

    /// Set the end-to-end timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the verdict policy on timeout.
    #[must_use]
    pub const fn on_timeout(mut self, policy: TimeoutPolicy) -> Self {
        self.settings.on_timeout = policy;
        self
    }

    /// Set the parallel-mode rewrite resolution.
    #[must_use]
    pub const fn merge(mut self, policy: MergePolicy) -> Self {
        self.settings.merge = policy;
        self
    }

    /// Validate and build the chain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyName`] or
    /// [`ConfigError::DuplicateGuardrail`] for badly named guardrails, and
    /// [`ConfigError::InvalidTimeout`] for a zero timeout.
    pub fn build(self) -> Result<GuardrailChain, ConfigError> {
        self.settings.validate()?;
        validate_names(Direction::Input, &self.input)?;
        validate_names(Direction::Output, &self.output)?;
        Ok(GuardrailChain {
            input: self.input,
            output: self.output,
            settings: self.settings,
        })
    }
}

fn validate_names(direction: Direction, guardrails: &[Guardrail]) -> Result<(), ConfigError> {
    let mut seen = HashSet::with_capacity(guardrails.len());
    for guardrail in guardrails {
        let name = guardrail.name();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyName { direction });
        }
        if !seen.insert(name) {
            return Err(ConfigError::DuplicateGuardrail {
                direction,
                name: name.to_owned(),
            });
        }
    }
    Ok(())
}
