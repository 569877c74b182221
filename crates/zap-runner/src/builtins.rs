//! Behaviors shipped with the runner. Their component type files live in the
//! builtin resource directory (`core/component_types`).

use zap_runtime::{BindingRuntime, Behavior, ContactCallback, ScriptError, ScriptResult, Value};

/// Destroys its actor after `seconds` of scaled time.
pub const LIFETIME: &str = "Lifetime";
/// Instantiates `template` every `interval` seconds.
pub const SPAWNER: &str = "Spawner";
/// Logs every contact its actor receives.
pub const CONTACT_LOGGER: &str = "ContactLogger";
/// Ends the game after `frames` frames.
pub const QUIT_AFTER: &str = "QuitAfter";

/// A runtime with every builtin binding installed.
pub fn runtime() -> BindingRuntime {
    let mut runtime = BindingRuntime::new();
    install(&mut runtime);
    runtime
}

pub fn install(runtime: &mut BindingRuntime) {
    runtime.bind(LIFETIME, lifetime);
    runtime.bind(SPAWNER, spawner);
    runtime.bind(CONTACT_LOGGER, contact_logger);
    runtime.bind(QUIT_AFTER, quit_after);
}

fn number(this: &Behavior, name: &str, default: f64) -> f64 {
    this.get(name).as_float().unwrap_or(default)
}

fn owner(this: &Behavior) -> ScriptResult<zap_runtime::ActorId> {
    this.get("actor")
        .as_actor()
        .ok_or_else(|| ScriptError::raised("component is not attached to an actor"))
}

fn lifetime(template: &Behavior) {
    template.set_callback("OnUpdate", |ctx, this, _| {
        let remaining = number(this, "seconds", 1.0) - ctx.time.delta() as f64;
        this.set("seconds", remaining);
        if remaining <= 0.0 {
            ctx.destroy_actor(owner(this)?);
        }
        Ok(())
    });
}

fn spawner(template: &Behavior) {
    template.set_callback("OnUpdate", |ctx, this, _| {
        let interval = number(this, "interval", 1.0);
        if interval <= 0.0 {
            return Err(ScriptError::raised("Spawner.interval must be positive"));
        }
        let name = this
            .get("template")
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ScriptError::raised("Spawner.template must name an actor template"))?;

        let mut elapsed = number(this, "elapsed", 0.0) + ctx.time.delta() as f64;
        while elapsed >= interval {
            elapsed -= interval;
            let spawned = ctx.instantiate(&name)?;
            log::debug!("spawned {} as {}", name, spawned);
        }
        this.set("elapsed", elapsed);
        Ok(())
    });
}

fn contact_logger(template: &Behavior) {
    for callback in [
        ContactCallback::CollisionEnter,
        ContactCallback::CollisionExit,
        ContactCallback::TriggerEnter,
        ContactCallback::TriggerExit,
    ] {
        template.set_callback(callback.name(), move |ctx, this, args| {
            let own = owner(this)?;
            let Some(Value::Collision(collision)) = args.first() else {
                return Err(ScriptError::raised("contact callback without a collision"));
            };
            log::info!(
                "{} {} {} (point {:?}, relative velocity {:?})",
                ctx.actor_name(own).unwrap_or("?"),
                callback.name(),
                ctx.actor_name(collision.other).unwrap_or("?"),
                collision.point,
                collision.relative_velocity
            );
            Ok(())
        });
    }
}

fn quit_after(template: &Behavior) {
    template.set_callback("OnLateUpdate", |ctx, this, _| {
        let frames = this.get("frames").as_int().unwrap_or(0);
        if ctx.frame() + 1 >= frames.max(0) as u64 {
            log::info!("quitting after {} frames", ctx.frame() + 1);
            ctx.quit();
        }
        Ok(())
    });
}
