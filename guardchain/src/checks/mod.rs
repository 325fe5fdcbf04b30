//! Built-in guardrail checks.
//!
//! Small, dependency-free reference checks covering the most common needs:
//! length limits, deny-list patterns and PII masking. Anything domain
//! specific (moderation APIs, classifiers) is expected to implement
//! [`GuardrailCheck`](crate::GuardrailCheck) directly.

mod length;
mod pattern;
mod redact;

pub use length::{LengthAction, MaxLengthCheck};
pub use pattern::PatternCheck;
pub use redact::{DEFAULT_MASK, RedactCheck};
