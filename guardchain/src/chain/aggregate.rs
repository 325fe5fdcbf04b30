//! Result aggregation: reduces per-guardrail results to one verdict.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::guardrail::{Direction, Guardrail, GuardrailResult, millis};

use super::config::{ChainSettings, MergePolicy, TimeoutPolicy};
use super::executor::Execution;

/// The chain-level verdict for one direction's run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Direction this run guarded.
    pub direction: Direction,

    /// No block, and every blocking guardrail that ran passed.
    pub passed: bool,

    /// A blocking guardrail blocked, or the run timed out under
    /// [`TimeoutPolicy::FailClosed`].
    pub blocked: bool,

    /// Content after all applicable rewrites.
    pub final_content: String,

    /// Results of every guardrail that actually completed.
    pub results: Vec<GuardrailResult>,

    /// Wall-clock duration of the whole run, timeout included.
    pub total_execution_time_ms: u64,

    /// Reason of the first block.
    pub blocking_reason: Option<String>,

    /// Names of every blocking guardrail that blocked.
    ///
    /// Empty when the block comes from a fail-closed timeout.
    pub blocked_by: Vec<String>,

    /// Names of every blocking guardrail that did not pass.
    pub failed_guardrails: Vec<String>,

    /// Names of guardrails whose result records an infrastructure failure.
    pub errored_guardrails: Vec<String>,

    /// The chain budget elapsed before the run concluded.
    pub timed_out: bool,
}

impl AggregatedResult {
    /// Find the result reported by one guardrail.
    #[must_use]
    pub fn result(&self, name: &str) -> Option<&GuardrailResult> {
        self.results.iter().find(|r| r.guardrail_name == name)
    }

    /// Rejection text for the caller to surface, when blocked.
    #[must_use]
    pub fn rejection_message(&self) -> Option<String> {
        if !self.blocked {
            return None;
        }
        let reason = self.blocking_reason.as_deref().unwrap_or("policy violation");
        Some(if self.blocked_by.is_empty() {
            format!("{} rejected: {reason}", self.direction)
        } else {
            format!(
                "{} rejected by {}: {reason}",
                self.direction,
                self.blocked_by.join(", ")
            )
        })
    }
}

/// Reduce an execution into the chain verdict.
pub(crate) fn aggregate(
    direction: Direction,
    guardrails: &[Guardrail],
    original: &str,
    execution: Execution,
    settings: &ChainSettings,
    elapsed: Duration,
) -> AggregatedResult {
    let positions: HashMap<&str, (usize, bool)> = guardrails
        .iter()
        .enumerate()
        .map(|(i, g)| (g.name(), (i, g.is_blocking())))
        .collect();
    let is_blocking = |name: &str| positions.get(name).is_some_and(|&(_, b)| b);

    let Execution {
        results,
        content,
        timed_out,
        ..
    } = execution;

    let blockers: Vec<&GuardrailResult> = results
        .iter()
        .filter(|r| r.blocked && is_blocking(r.guardrail_name.as_str()))
        .collect();
    let blocked_by: Vec<String> = blockers.iter().map(|r| r.guardrail_name.clone()).collect();
    let mut blocking_reason = blockers.first().and_then(|r| r.reason.clone());

    let failed_guardrails: Vec<String> = results
        .iter()
        .filter(|r| !r.passed && is_blocking(r.guardrail_name.as_str()))
        .map(|r| r.guardrail_name.clone())
        .collect();
    let errored_guardrails: Vec<String> = results
        .iter()
        .filter(|r| r.errored)
        .map(|r| r.guardrail_name.clone())
        .collect();

    let mut blocked = !blocked_by.is_empty();
    if timed_out && settings.on_timeout == TimeoutPolicy::FailClosed && !blocked {
        blocked = true;
        blocking_reason = Some(format!(
            "{direction} guardrail chain timed out after {} ms",
            settings.timeout_ms
        ));
    }
    let passed = !blocked && failed_guardrails.is_empty();

    let final_content = if timed_out {
        original.to_owned()
    } else if let Some(resolved) = content {
        resolved
    } else {
        merge_rewrites(&results, &positions, settings.merge)
            .unwrap_or_else(|| original.to_owned())
    };

    AggregatedResult {
        direction,
        passed,
        blocked,
        final_content,
        results,
        total_execution_time_ms: millis(elapsed),
        blocking_reason,
        blocked_by,
        failed_guardrails,
        errored_guardrails,
        timed_out,
    }
}

/// Pick the winning rewrite among concurrently proposed ones.
fn merge_rewrites(
    results: &[GuardrailResult],
    positions: &HashMap<&str, (usize, bool)>,
    policy: MergePolicy,
) -> Option<String> {
    let proposals = results
        .iter()
        .filter_map(|r| r.modified_content.as_ref().map(|c| (r, c)));
    let winner = match policy {
        MergePolicy::LastCompleted => proposals.last(),
        MergePolicy::ConfigOrder => proposals.max_by_key(|(r, _)| {
            positions
                .get(r.guardrail_name.as_str())
                .map_or(0, |&(i, _)| i)
        }),
    };
    winner.map(|(_, content)| content.clone())
}
