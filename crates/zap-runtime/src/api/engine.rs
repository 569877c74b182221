use crate::api::config::{AssetPaths, GameConfig};
use crate::api::context::EngineContext;
use crate::error::EngineResult;
use crate::input::queue::InputQueue;
use crate::script::runtime::ScriptRuntime;
use crate::systems::{contact, lifecycle};

/// Receives the finished frame. Rendering, audio and text output live behind this.
pub trait RenderSink {
    fn render(&mut self, ctx: &EngineContext);
}

/// A sink that draws nothing, for headless runs.
#[derive(Debug, Default)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn render(&mut self, _ctx: &EngineContext) {}
}

/// The frame scheduler. Owns the engine context and drives one frame at a time.
pub struct Engine {
    ctx: EngineContext,
}

impl Engine {
    pub fn new(config: GameConfig, paths: AssetPaths, runtime: Box<dyn ScriptRuntime>) -> Self {
        Self {
            ctx: EngineContext::new(config, paths, runtime),
        }
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    /// Load the configured initial scene. Its components start on the first tick.
    pub fn start(&mut self) -> EngineResult<()> {
        let initial = self.ctx.config.initial_scene.clone();
        log::info!("starting {} at scene {}", self.ctx.config.game_title, initial);
        self.ctx.load_scene(&initial);
        self.ctx.swap_scene()
    }

    pub fn is_running(&self) -> bool {
        self.ctx.is_running()
    }

    /// Run one frame. The first fatal error aborts the frame and is returned.
    pub fn tick(&mut self, dt: f32, input: &mut InputQueue, sink: &mut dyn RenderSink) -> EngineResult<()> {
        let ctx = &mut self.ctx;

        // Early update
        ctx.swap_scene()?;
        ctx.input.apply(input.drain());
        ctx.time.tick(dt);

        // Behaviors
        lifecycle::run_start(ctx)?;
        lifecycle::run_update(ctx)?;
        lifecycle::run_late_update(ctx)?;
        lifecycle::run_destroy(ctx)?;
        ctx.events.resolve();

        // Physics
        let contacts = ctx.physics.step(ctx.time.delta());
        contact::dispatch_contacts(ctx, &contacts)?;

        sink.render(ctx);

        // Late update
        ctx.input.end_frame();
        ctx.scene.flush();
        ctx.advance_frame();
        Ok(())
    }
}
