use zap_runtime::{
    AssetPaths, Engine, EngineContext, EngineResult, FrameAccumulator, GameConfig, InputEvent,
    InputQueue, NullSink, RenderSink, ScriptRuntime,
};

/// Wires the engine to a host loop.
///
/// The host reports wall-clock frame time; the runner turns it into whole
/// engine frames of the configured length, so behaviors always see the same
/// delta regardless of how fast the host spins.
pub struct GameRunner {
    engine: Engine,
    input: InputQueue,
    frames: FrameAccumulator,
    sink: Box<dyn RenderSink>,
    initialized: bool,
}

impl GameRunner {
    pub fn new(config: GameConfig, paths: AssetPaths, runtime: Box<dyn ScriptRuntime>) -> Self {
        let frames = FrameAccumulator::new(config.frame_dt());
        Self {
            engine: Engine::new(config, paths, runtime),
            input: InputQueue::new(),
            frames,
            sink: Box::new(NullSink),
            initialized: false,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn RenderSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Load the initial scene. Call once after construction.
    pub fn init(&mut self) -> EngineResult<()> {
        self.engine.start()?;
        self.initialized = true;
        Ok(())
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Advance by `dt` seconds of host time, running as many engine frames
    /// as fit. Stops early once a behavior has asked to quit.
    pub fn tick(&mut self, dt: f32) -> EngineResult<()> {
        if !self.initialized {
            return Ok(());
        }
        let due = self.frames.advance(dt);
        for _ in 0..due {
            if !self.engine.is_running() {
                break;
            }
            self.engine
                .tick(self.frames.frame_dt(), &mut self.input, self.sink.as_mut())?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn frame(&self) -> u64 {
        self.engine.context().frame()
    }

    pub fn context(&self) -> &EngineContext {
        self.engine.context()
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        self.engine.context_mut()
    }
}
