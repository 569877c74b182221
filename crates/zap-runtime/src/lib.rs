pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod script;
pub mod input;
pub mod assets;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience
pub use api::config::{AssetPaths, GameConfig, CONFIG_FILE};
pub use api::context::EngineContext;
pub use api::engine::{Engine, NullSink, RenderSink};
pub use api::types::{ActorId, ComponentRef};
pub use assets::documents::{ActorDoc, ComponentDoc, OverrideValue, SceneDoc};
pub use components::component::{Capabilities, Component, ContactCallback};
pub use components::registry::ComponentRegistry;
pub use crate::core::actor::Actor;
pub use crate::core::physics::{
    BodyDesc, BodyType, Collision, ColliderDesc, ColliderMaterial, FixtureCategory,
    FixtureDesc, PhysicsBody, PhysicsWorld, RaycastHit, NO_CONTACT,
};
pub use crate::core::scene::Scene;
pub use crate::core::time::{FrameAccumulator, Time};
pub use error::{EngineError, EngineResult, ScriptError, ScriptResult};
pub use input::queue::{InputEvent, InputQueue, InputState};
pub use script::behavior::{Behavior, Callback, Value};
pub use script::runtime::{BindingRuntime, ScriptRuntime};
