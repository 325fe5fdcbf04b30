//! Guardrail module: the per-check contract consumed by the chain engine.
//!
//! A guardrail is a validation or transformation unit that looks at one
//! content string (a user prompt on the way in, a model response on the way
//! out) and proposes a verdict:
//!
//! - **pass**: content satisfies the check's policy.
//! - **fail**: content does not satisfy the policy, but the check does not
//!   demand that the chain halt.
//! - **block**: content must be rejected; a blocking guardrail reporting
//!   this halts its direction's chain.
//! - **modify**: content is acceptable after a rewrite (truncation, PII
//!   masking, ...), proposed through `modified_content`.
//!
//! Checks never mutate the content or the context they are given. Policy
//! about whether a check may halt the chain lives in its
//! [`GuardrailDescriptor`], not in the check itself.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use guardchain::prelude::*;
//!
//! struct NoShouting;
//!
//! #[async_trait::async_trait]
//! impl GuardrailCheck for NoShouting {
//!     async fn check(
//!         &self,
//!         content: &str,
//!         _ctx: &CheckContext,
//!     ) -> Result<GuardrailOutput, CheckError> {
//!         if content.chars().any(char::is_lowercase) {
//!             Ok(GuardrailOutput::pass())
//!         } else {
//!             Ok(GuardrailOutput::fail("content is all caps"))
//!         }
//!     }
//! }
//!
//! let guardrail = Guardrail::new("no-shouting", NoShouting).blocking(false);
//! ```

mod check;
mod output;
mod result;

pub use check::{CheckContext, FnCheck, Guardrail, GuardrailCheck, GuardrailDescriptor, from_fn};
pub use output::GuardrailOutput;
pub use result::GuardrailResult;
pub use tokio_util::sync::CancellationToken;

pub(crate) use result::millis;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which side of the model call a chain run guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Content on its way into the model (user prompt).
    Input,
    /// Content produced by the model (response).
    Output,
}

impl Direction {
    /// Lowercase label used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
