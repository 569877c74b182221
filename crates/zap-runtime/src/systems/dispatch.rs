use crate::api::context::EngineContext;
use crate::api::types::ComponentRef;
use crate::error::{EngineResult, ScriptError};
use crate::script::behavior::{Behavior, Value};

/// Call `callback` on `behavior` if it has one.
///
/// Raised script errors are logged with the owning actor's name and swallowed,
/// so one failing handler never stops the others. Fatal errors are returned.
pub fn invoke(
    ctx: &mut EngineContext,
    target: &ComponentRef,
    behavior: &Behavior,
    callback: &str,
    args: &[Value],
) -> EngineResult<()> {
    let Some(function) = behavior.callback(callback) else {
        return Ok(());
    };
    match function.call(ctx, behavior, args) {
        Ok(()) => Ok(()),
        Err(ScriptError::Raised(message)) => {
            log::error!("{} {}: {}", label(ctx, target), callback, message);
            Ok(())
        }
        Err(ScriptError::Fatal(err)) => Err(err),
    }
}

/// `actor-name [key]` for error reports, falling back to the id once the
/// actor is gone.
pub fn label(ctx: &EngineContext, target: &ComponentRef) -> String {
    let actor = ctx
        .scene
        .actor(target.actor)
        .map(|a| a.name().to_string())
        .unwrap_or_else(|| target.actor.to_string());
    format!("{} [{}]", actor, target.key)
}
