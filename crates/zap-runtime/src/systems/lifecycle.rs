use crate::api::context::EngineContext;
use crate::api::types::ComponentRef;
use crate::components::component::{ON_DESTROY, ON_LATE_UPDATE, ON_START, ON_UPDATE};
use crate::error::EngineResult;
use crate::systems::dispatch::invoke;

/// Run `OnStart` for everything queued since the last frame. The queue is
/// emptied up front, so each component starts at most once.
pub fn run_start(ctx: &mut EngineContext) -> EngineResult<()> {
    let queue = ctx.scene.take_start_queue();
    run_enabled(ctx, &queue, ON_START)
}

pub fn run_update(ctx: &mut EngineContext) -> EngineResult<()> {
    let targets = ctx.scene.update_targets();
    run_enabled(ctx, &targets, ON_UPDATE)
}

pub fn run_late_update(ctx: &mut EngineContext) -> EngineResult<()> {
    let targets = ctx.scene.late_update_targets();
    run_enabled(ctx, &targets, ON_LATE_UPDATE)
}

/// Run queued `OnDestroy` callbacks. These fire even though their components
/// were disabled when they were queued.
pub fn run_destroy(ctx: &mut EngineContext) -> EngineResult<()> {
    for (target, behavior) in ctx.scene.take_destroy_queue() {
        invoke(ctx, &target, &behavior, ON_DESTROY, &[])?;
    }
    Ok(())
}

/// Dispatch over a snapshot of targets. Enabled state is checked right before
/// each call, so a component disabled by an earlier callback is skipped.
fn run_enabled(ctx: &mut EngineContext, targets: &[ComponentRef], callback: &str) -> EngineResult<()> {
    for target in targets {
        if let Some(behavior) = ctx.scene.enabled_behavior(target) {
            invoke(ctx, target, &behavior, callback, &[])?;
        }
    }
    Ok(())
}
