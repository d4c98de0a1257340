//! Cycle driving
//!
//! Runs the init / check / body / end state machine for a command with an
//! attached cycle. Member commands execute through the queue executor as an
//! isolated sub-queue, once per iteration in declared order.

use crate::engine::context::RunContext;
use crate::engine::executor::Executor;
use crate::error::ExecutionResult;
use crate::registry::Cycle;

/// Drive a cycle to completion
///
/// `init` and `end` each run exactly once, `loop_condition` gates every
/// iteration including the first, and `end` runs as cleanup even when a
/// member command or hook fails (the original error wins over an `end`
/// failure).
pub(crate) fn drive(
    cycle: &Cycle,
    executor: &mut Executor<'_>,
    ctx: &mut RunContext,
) -> ExecutionResult<()> {
    ctx.print_debug(&format!("Entering cycle '{}'", cycle.name));

    if let Some(hook) = &cycle.init {
        (**hook)(ctx)?;
    }

    let members = cycle.member_names();
    let result = run_iterations(cycle, &members, executor, ctx);

    let end_result = match &cycle.end {
        Some(hook) => (**hook)(ctx),
        None => Ok(()),
    };

    ctx.print_debug(&format!("Leaving cycle '{}'", cycle.name));

    match (result, end_result) {
        (Err(err), _) => Err(err),
        (Ok(()), Err(err)) => Err(err),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn run_iterations(
    cycle: &Cycle,
    members: &[String],
    executor: &mut Executor<'_>,
    ctx: &mut RunContext,
) -> ExecutionResult<()> {
    loop {
        if !(*cycle.loop_condition)(ctx)? {
            return Ok(());
        }

        if let Some(hook) = &cycle.loop_start {
            (**hook)(ctx)?;
        }

        executor.execute_members(members, ctx)?;

        if let Some(hook) = &cycle.loop_end {
            (**hook)(ctx)?;
        }
    }
}
