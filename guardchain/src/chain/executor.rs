//! Chain executor: schedules one direction's guardrails.
//!
//! Both strategies share a single deadline and stop collecting results the
//! moment it passes, a blocking guardrail blocks, or every guardrail has
//! reported. Anything still in flight at that point is signalled through
//! its cancellation token and then aborted; a late result is never
//! recorded.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

use crate::guardrail::{CheckContext, Guardrail, GuardrailResult};

/// What a strategy collected before it concluded.
#[derive(Debug)]
pub(crate) struct Execution {
    /// Results in completion order (parallel) or configured order (sequential).
    pub results: Vec<GuardrailResult>,
    /// Content already resolved during execution. `None` leaves resolution
    /// to aggregation.
    pub content: Option<String>,
    /// A blocking guardrail halted the chain.
    pub short_circuited: bool,
    /// The deadline passed first.
    pub timed_out: bool,
}

impl Execution {
    const fn new(results: Vec<GuardrailResult>, content: Option<String>) -> Self {
        Self {
            results,
            content,
            short_circuited: false,
            timed_out: false,
        }
    }

    const fn halted(mut self) -> Self {
        self.short_circuited = true;
        self
    }

    /// Original content is kept on timeout, so nothing is resolved here.
    const fn expired(results: Vec<GuardrailResult>) -> Self {
        Self {
            results,
            content: None,
            short_circuited: false,
            timed_out: true,
        }
    }
}

/// How one concurrent wave of guardrails ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WaveEnd {
    Completed,
    ShortCircuited,
    TimedOut,
}

/// Run blocking guardrails concurrently, then non-blocking ones.
///
/// Every guardrail sees the same original content snapshot. Non-blocking
/// guardrails only start once all blocking ones reported without a block.
pub(crate) async fn run_parallel(
    guardrails: &[Guardrail],
    content: &str,
    ctx: &CheckContext,
    deadline: Instant,
) -> Execution {
    let snapshot: Arc<str> = Arc::from(content);
    let (blocking, non_blocking): (Vec<&Guardrail>, Vec<&Guardrail>) =
        guardrails.iter().partition(|g| g.is_blocking());
    let mut results = Vec::with_capacity(guardrails.len());

    match run_wave(&blocking, &snapshot, ctx, deadline, true, &mut results).await {
        WaveEnd::Completed => {}
        WaveEnd::ShortCircuited => return Execution::new(results, None).halted(),
        WaveEnd::TimedOut => return Execution::expired(results),
    }

    match run_wave(&non_blocking, &snapshot, ctx, deadline, false, &mut results).await {
        WaveEnd::TimedOut => Execution::expired(results),
        WaveEnd::Completed | WaveEnd::ShortCircuited => Execution::new(results, None),
    }
}

/// Spawn every guardrail of one wave and collect results as they complete.
async fn run_wave(
    wave: &[&Guardrail],
    snapshot: &Arc<str>,
    ctx: &CheckContext,
    deadline: Instant,
    halt_on_block: bool,
    results: &mut Vec<GuardrailResult>,
) -> WaveEnd {
    if wave.is_empty() {
        return WaveEnd::Completed;
    }

    let wave_ctx = ctx.child();
    let mut tasks = JoinSet::new();
    for guardrail in wave {
        let guardrail = Guardrail::clone(guardrail);
        let content = Arc::clone(snapshot);
        let task_ctx = wave_ctx.child();
        tasks.spawn(async move { guardrail.run(&content, &task_ctx).await });
    }

    let expiry = sleep_until(deadline);
    tokio::pin!(expiry);

    loop {
        tokio::select! {
            joined = tasks.join_next() => match joined {
                None => return WaveEnd::Completed,
                Some(Ok(result)) => {
                    let halt = halt_on_block && result.blocked;
                    if halt {
                        debug!(
                            guardrail = %result.guardrail_name,
                            pending = tasks.len(),
                            "blocking guardrail triggered, cancelling wave"
                        );
                    }
                    results.push(result);
                    if halt {
                        wave_ctx.cancel();
                        tasks.abort_all();
                        return WaveEnd::ShortCircuited;
                    }
                }
                Some(Err(err)) => {
                    warn!(error = %err, "guardrail task ended without a result");
                }
            },
            () = &mut expiry => {
                debug!(pending = tasks.len(), "chain deadline reached, cancelling wave");
                wave_ctx.cancel();
                tasks.abort_all();
                return WaveEnd::TimedOut;
            }
        }
    }
}

/// Run guardrails one at a time in configured order.
///
/// A proposed rewrite replaces the working content before the next
/// guardrail runs.
pub(crate) async fn run_sequential(
    guardrails: &[Guardrail],
    content: &str,
    ctx: &CheckContext,
    deadline: Instant,
) -> Execution {
    let mut current = content.to_owned();
    let mut results = Vec::with_capacity(guardrails.len());

    let expiry = sleep_until(deadline);
    tokio::pin!(expiry);

    for guardrail in guardrails {
        let check_ctx = ctx.child();
        let result = tokio::select! {
            result = guardrail.run(&current, &check_ctx) => result,
            () = &mut expiry => {
                debug!(guardrail = %guardrail.name(), "chain deadline reached mid-check");
                check_ctx.cancel();
                return Execution::expired(results);
            }
        };

        if let Some(modified) = &result.modified_content {
            current.clone_from(modified);
        }
        let halt = guardrail.is_blocking() && result.blocked;
        results.push(result);
        if halt {
            return Execution::new(results, Some(current)).halted();
        }
    }

    Execution::new(results, Some(current))
}
