//! Guardrail check trait, descriptor and the runnable pairing of both.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::CheckError;

use super::{GuardrailOutput, GuardrailResult};

/// Trait for implementing guardrail check logic.
///
/// Implement this trait on your own struct to define custom validation or
/// transformation. The [`check`](GuardrailCheck::check) method receives an
/// immutable content snapshot and the request context, and returns the
/// verdict as a [`GuardrailOutput`].
///
/// Implementations must be safe to invoke concurrently with other checks
/// over the same content. Return `Err` only for infrastructure failures;
/// rejecting content is an `Ok` verdict.
#[async_trait]
pub trait GuardrailCheck: Send + Sync {
    /// Check the content and return a guardrail output.
    ///
    /// # Arguments
    ///
    /// * `content`: the content snapshot to evaluate
    /// * `ctx`: request attributes and this invocation's cancellation token
    ///
    /// # Errors
    ///
    /// Returns a [`CheckError`] when the check could not reach a verdict
    /// (external service down, cancelled, internal fault).
    async fn check(&self, content: &str, ctx: &CheckContext)
    -> Result<GuardrailOutput, CheckError>;
}

/// Read-only request context handed to every check.
///
/// Cloning is cheap: attributes are shared behind an `Arc`. Each check
/// invocation gets its own child cancellation token, which fires when the
/// chain short-circuits or times out.
#[derive(Debug, Clone, Default)]
pub struct CheckContext {
    values: Arc<HashMap<String, Value>>,
    cancel: CancellationToken,
}

impl CheckContext {
    /// Create a context from request attributes.
    #[must_use]
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self {
            values: Arc::new(values),
            cancel: CancellationToken::new(),
        }
    }

    /// Tie this context to a caller-owned cancellation token.
    ///
    /// Cancelling `token` signals every check spawned from this context.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Look up one attribute.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// All attributes.
    #[must_use]
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// The cancellation token for this invocation.
    #[must_use]
    pub const fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Returns `true` once the engine no longer wants this check's result.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the engine cancels this invocation.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Same attributes, with a token cancelled whenever this one is.
    pub(crate) fn child(&self) -> Self {
        Self {
            values: Arc::clone(&self.values),
            cancel: self.cancel.child_token(),
        }
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl From<HashMap<String, Value>> for CheckContext {
    fn from(values: HashMap<String, Value>) -> Self {
        Self::new(values)
    }
}

/// Identity and execution policy for one guardrail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailDescriptor {
    /// Unique name within its direction's chain.
    pub name: String,

    /// Whether a block from this guardrail halts the chain.
    pub blocking: bool,
}

/// A named guardrail: descriptor plus check logic.
///
/// Guardrails are registered on a
/// [`GuardrailChainBuilder`](crate::GuardrailChainBuilder) for the input or
/// output direction. New guardrails are blocking; use
/// [`blocking(false)`](Self::blocking) for checks that may only flag or
/// rewrite.
#[derive(Clone)]
pub struct Guardrail {
    descriptor: GuardrailDescriptor,
    check: Arc<dyn GuardrailCheck>,
}

impl Guardrail {
    /// Create a new blocking guardrail with the given name and check logic.
    #[must_use]
    pub fn new(name: impl Into<String>, check: impl GuardrailCheck + 'static) -> Self {
        Self::from_shared(name, Arc::new(check))
    }

    /// Create a guardrail around a check instance shared with other chains.
    #[must_use]
    pub fn from_shared(name: impl Into<String>, check: Arc<dyn GuardrailCheck>) -> Self {
        Self {
            descriptor: GuardrailDescriptor {
                name: name.into(),
                blocking: true,
            },
            check,
        }
    }

    /// Set whether a block from this guardrail halts the chain.
    #[must_use]
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.descriptor.blocking = blocking;
        self
    }

    /// Returns the name of this guardrail.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Returns whether this guardrail may halt the chain.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        self.descriptor.blocking
    }

    /// Returns the descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &GuardrailDescriptor {
        &self.descriptor
    }

    /// Execute this guardrail check.
    ///
    /// Never fails: check errors and panics are converted into a
    /// non-passing [`GuardrailResult`] for this guardrail only.
    pub async fn run(&self, content: &str, ctx: &CheckContext) -> GuardrailResult {
        let name = self.name();
        let started = Instant::now();
        let outcome = AssertUnwindSafe(self.check.check(content, ctx))
            .catch_unwind()
            .await;
        let elapsed = started.elapsed();

        let err = match outcome {
            Ok(Ok(output)) => return GuardrailResult::from_output(name, output, elapsed),
            Ok(Err(err)) => err,
            Err(payload) => CheckError::Panicked(panic_message(payload.as_ref())),
        };
        warn!(guardrail = %name, error = %err, "guardrail check failed");
        GuardrailResult::from_error(name, &err, elapsed)
    }
}

impl std::fmt::Debug for Guardrail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guardrail")
            .field("name", &self.descriptor.name)
            .field("blocking", &self.descriptor.blocking)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

/// A check backed by a synchronous closure.
///
/// Created with [`from_fn`].
pub struct FnCheck<F> {
    f: F,
}

/// Wrap a synchronous closure as a [`GuardrailCheck`].
///
/// ```rust,ignore
/// let not_empty = from_fn(|content, _ctx| {
///     Ok(if content.trim().is_empty() {
///         GuardrailOutput::block("empty content")
///     } else {
///         GuardrailOutput::pass()
///     })
/// });
/// ```
#[must_use]
pub const fn from_fn<F>(f: F) -> FnCheck<F>
where
    F: Fn(&str, &CheckContext) -> Result<GuardrailOutput, CheckError> + Send + Sync,
{
    FnCheck { f }
}

#[async_trait]
impl<F> GuardrailCheck for FnCheck<F>
where
    F: Fn(&str, &CheckContext) -> Result<GuardrailOutput, CheckError> + Send + Sync,
{
    async fn check(
        &self,
        content: &str,
        ctx: &CheckContext,
    ) -> Result<GuardrailOutput, CheckError> {
        (self.f)(content, ctx)
    }
}

impl<F> std::fmt::Debug for FnCheck<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCheck").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Panicking;

    #[async_trait]
    impl GuardrailCheck for Panicking {
        async fn check(
            &self,
            content: &str,
            _ctx: &CheckContext,
        ) -> Result<GuardrailOutput, CheckError> {
            if !content.is_empty() {
                panic!("detector exploded");
            }
            Ok(GuardrailOutput::pass())
        }
    }

    #[tokio::test]
    async fn test_run_records_name_and_verdict() {
        let guardrail = Guardrail::new(
            "no-empty",
            from_fn(|content, _| {
                Ok(if content.is_empty() {
                    GuardrailOutput::block("empty")
                } else {
                    GuardrailOutput::pass()
                })
            }),
        );

        let ok = guardrail.run("hi", &CheckContext::default()).await;
        assert_eq!(ok.guardrail_name, "no-empty");
        assert!(ok.passed);

        let blocked = guardrail.run("", &CheckContext::default()).await;
        assert!(blocked.blocked);
        assert_eq!(blocked.reason.as_deref(), Some("empty"));
    }

    #[tokio::test]
    async fn test_run_absorbs_errors() {
        let guardrail = Guardrail::new(
            "moderation",
            from_fn(|_, _| Err(CheckError::upstream("moderation-api", "timeout"))),
        );
        let result = guardrail.run("text", &CheckContext::default()).await;
        assert!(result.errored);
        assert!(!result.passed);
        assert!(!result.blocked);
    }

    #[tokio::test]
    async fn test_run_absorbs_panics() {
        let guardrail = Guardrail::new("panicky", Panicking);
        let result = guardrail.run("text", &CheckContext::default()).await;
        assert!(result.errored);
        assert_eq!(result.details["error_kind"], "panicked");
        assert!(
            result.details["error"]
                .as_str()
                .unwrap()
                .contains("detector exploded")
        );
    }

    #[test]
    fn test_guardrail_blocking_flag() {
        let check = from_fn(|_, _| Ok(GuardrailOutput::pass()));
        let guardrail = Guardrail::new("flag", check).blocking(false);
        assert!(!guardrail.is_blocking());
        assert_eq!(
            guardrail.descriptor(),
            &GuardrailDescriptor {
                name: "flag".into(),
                blocking: false,
            }
        );
    }

    #[test]
    fn test_child_context_follows_parent_cancellation() {
        let mut values = HashMap::new();
        values.insert("user_id".to_owned(), Value::from("u-1"));
        let parent = CheckContext::new(values);
        let child = parent.child();
        assert_eq!(child.get("user_id"), Some(&Value::from("u-1")));
        assert!(!child.is_cancelled());

        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_fn_check_is_sync_callable() {
        let check = from_fn(|content, _| Ok(GuardrailOutput::modify(content.to_uppercase())));
        let output = tokio_test::block_on(check.check("abc", &CheckContext::default())).unwrap();
        assert_eq!(output.modified_content.as_deref(), Some("ABC"));
    }
}
