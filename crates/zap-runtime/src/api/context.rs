use glam::Vec2;

use crate::api::config::{AssetPaths, GameConfig};
use crate::api::types::{ActorId, ComponentRef, IdAllocator};
use crate::assets::templates::{SceneDb, TemplateDb};
use crate::components::registry::ComponentRegistry;
use crate::core::actor::Actor;
use crate::core::physics::{PhysicsWorld, RaycastHit};
use crate::core::scene::Scene;
use crate::core::time::Time;
use crate::error::{EngineResult, ScriptResult};
use crate::input::queue::InputState;
use crate::script::behavior::{Behavior, Callback, Value};
use crate::script::runtime::ScriptRuntime;
use crate::systems::{events, lifecycle};

/// Mutable access to engine state, passed to every behavior callback.
///
/// Structural changes made through it (instantiating or destroying actors,
/// adding or removing components, loading a scene) are deferred: the frame
/// loop applies them at its flush point, never in the middle of a dispatch.
pub struct EngineContext {
    pub config: GameConfig,
    pub scene: Scene,
    pub registry: ComponentRegistry,
    pub templates: TemplateDb,
    pub scenes: SceneDb,
    pub physics: PhysicsWorld,
    pub events: events::EventBus,
    pub input: InputState,
    pub time: Time,
    ids: IdAllocator,
    next_component_key: u64,
    next_scene: Option<String>,
    frame: u64,
    running: bool,
}

impl EngineContext {
    pub fn new(config: GameConfig, paths: AssetPaths, runtime: Box<dyn ScriptRuntime>) -> Self {
        let physics = PhysicsWorld::new(config.gravity);
        Self {
            scene: Scene::new(""),
            registry: ComponentRegistry::new(paths.clone(), runtime),
            templates: TemplateDb::new(paths.clone()),
            scenes: SceneDb::new(paths),
            physics,
            events: events::EventBus::new(),
            input: InputState::new(),
            time: Time::new(),
            ids: IdAllocator::new(),
            next_component_key: 0,
            next_scene: None,
            frame: 0,
            running: true,
            config,
        }
    }

    // -- Actors --

    /// First actor called `name`. Actors instantiated this frame are included;
    /// destroyed ones are not.
    pub fn find_actor(&self, name: &str) -> Option<ActorId> {
        self.scene.find(name)
    }

    pub fn find_all_actors(&self, name: &str) -> Vec<ActorId> {
        self.scene.find_all(name)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.scene.actor(id)
    }

    pub fn actor_name(&self, id: ActorId) -> Option<&str> {
        self.scene.actor(id).map(Actor::name)
    }

    /// Create an actor from a template. It has an id and is findable right
    /// away; its components are scheduled at the next flush. An unknown
    /// template is fatal.
    pub fn instantiate(&mut self, template: &str) -> EngineResult<ActorId> {
        let actor = self.templates.instantiate(template, &mut self.registry)?;
        Ok(self.scene.spawn(actor, &mut self.ids))
    }

    /// Destroy an actor at the next flush. Its components are disabled now.
    pub fn destroy_actor(&mut self, id: ActorId) {
        self.scene.destroy_actor(id);
    }

    /// Keep an actor alive across scene loads.
    pub fn dont_destroy(&mut self, id: ActorId) {
        if let Some(actor) = self.scene.actor_mut(id) {
            actor.set_persistent(true);
        }
    }

    // -- Components --

    /// Add a component of `type_name` under a fresh `r<n>` key. It is findable
    /// at once and scheduled at the next flush; on a persistent actor it never
    /// receives OnStart. Returns `None` for actors that
    /// are gone or being destroyed; an unknown type is fatal.
    pub fn add_component(&mut self, actor: ActorId, type_name: &str) -> EngineResult<Option<Behavior>> {
        if self.scene.is_pending_removal(actor) || self.scene.actor(actor).is_none() {
            return Ok(None);
        }
        let key = format!("r{}", self.next_component_key);
        self.next_component_key += 1;

        let component = self.registry.load(&key, type_name)?;
        let behavior = component.behavior().clone();
        if let Some(target) = self.scene.actor_mut(actor) {
            target.insert_runtime_component(component);
        }
        self.scene.mark_dirty(actor);
        Ok(Some(behavior))
    }

    /// Remove the component behind `behavior`. Idempotent.
    pub fn remove_component(&mut self, actor: ActorId, behavior: &Behavior) {
        if self.scene.is_pending_removal(actor) {
            return;
        }
        let Some(removed) = self.scene.actor_mut(actor).and_then(|a| a.remove_component(behavior)) else {
            return;
        };
        self.scene.mark_dirty(actor);
        if removed.caps.destroy {
            self.scene
                .queue_destroy(ComponentRef::new(actor, removed.key), removed.behavior);
        }
    }

    pub fn get_component(&self, actor: ActorId, type_name: &str) -> Option<Behavior> {
        self.scene
            .actor(actor)?
            .component(type_name)
            .map(|c| c.behavior().clone())
    }

    pub fn get_component_by_key(&self, actor: ActorId, key: &str) -> Option<Behavior> {
        self.scene
            .actor(actor)?
            .component_by_key(key)
            .map(|c| c.behavior().clone())
    }

    pub fn get_components(&self, actor: ActorId, type_name: &str) -> Vec<Behavior> {
        self.scene
            .actor(actor)
            .map(|a| {
                a.components_of(type_name)
                    .into_iter()
                    .map(|c| c.behavior().clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    // -- Scenes --

    /// Switch to `name` at the start of the next frame. Destroy callbacks of
    /// the outgoing scene's non-persistent actors are queued now.
    pub fn load_scene(&mut self, name: &str) {
        self.next_scene = Some(name.to_string());
        self.scene.begin_unload();
    }

    pub fn current_scene(&self) -> &str {
        self.scene.name()
    }

    pub fn pending_scene(&self) -> Option<&str> {
        self.next_scene.as_deref()
    }

    /// Perform a requested scene change: run outstanding destroy callbacks,
    /// carry persistent actors over and populate the new scene.
    pub(crate) fn swap_scene(&mut self) -> EngineResult<()> {
        let Some(name) = self.next_scene.take() else {
            return Ok(());
        };
        lifecycle::run_destroy(self)?;

        let loaded = self.scenes.load(&name, &mut self.templates, &mut self.registry)?;
        let outgoing = std::mem::replace(&mut self.scene, Scene::new(&name));
        self.scene.populate(outgoing.carry_over(), loaded, &mut self.ids);

        log::info!("loaded scene {} ({} actors)", name, self.scene.len());
        Ok(())
    }

    // -- Physics --

    pub fn raycast(&mut self, origin: Vec2, direction: Vec2, distance: f32) -> Option<RaycastHit> {
        self.physics.raycast(origin, direction, distance)
    }

    pub fn raycast_all(&mut self, origin: Vec2, direction: Vec2, distance: f32) -> Vec<RaycastHit> {
        self.physics.raycast_all(origin, direction, distance)
    }

    // -- Events --

    pub fn publish(&mut self, event_type: &str, payload: impl Into<Value>) -> ScriptResult {
        events::publish(self, event_type, payload.into())
    }

    pub fn subscribe(&mut self, event_type: &str, component: &Behavior, function: Callback) {
        self.events.subscribe(event_type, component, function);
    }

    pub fn unsubscribe(&mut self, event_type: &str, component: &Behavior, function: Callback) {
        self.events.unsubscribe(event_type, component, function);
    }

    // -- Application --

    /// Frames completed since the engine started.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub(crate) fn advance_frame(&mut self) {
        self.frame += 1;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Block the frame loop thread.
    pub fn sleep(&self, millis: u64) {
        std::thread::sleep(std::time::Duration::from_millis(millis));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::component::ON_DESTROY;
    use crate::testing::{Log, Project};

    fn loaded(project: &Project) -> EngineContext {
        let mut ctx = project.context();
        ctx.load_scene("main");
        ctx.swap_scene().unwrap();
        ctx
    }

    #[test]
    fn runtime_keys_are_monotonic() {
        let project = Project::new();
        project.component_type("Tag", "{}");
        project.scene("main", r#"{"actors": [{"name": "hero"}]}"#);
        let mut ctx = loaded(&project);
        let hero = ctx.find_actor("hero").unwrap();

        let first = ctx.add_component(hero, "Tag").unwrap().unwrap();
        let second = ctx.add_component(hero, "Tag").unwrap().unwrap();
        assert_eq!(first.get("key"), Value::from("r0"));
        assert_eq!(second.get("key"), Value::from("r1"));
        assert_eq!(ctx.get_components(hero, "Tag").len(), 2);
        assert!(ctx.get_component_by_key(hero, "r1").unwrap().ptr_eq(&second));
    }

    #[test]
    fn unknown_component_type_is_fatal() {
        let project = Project::new();
        project.scene("main", r#"{"actors": [{"name": "hero"}]}"#);
        let mut ctx = loaded(&project);
        let hero = ctx.find_actor("hero").unwrap();
        assert!(ctx.add_component(hero, "Ghost").is_err());
    }

    #[test]
    fn add_component_to_destroyed_actor_is_ignored() {
        let project = Project::new();
        project.component_type("Tag", "{}");
        project.scene("main", r#"{"actors": [{"name": "hero"}]}"#);
        let mut ctx = loaded(&project);
        let hero = ctx.find_actor("hero").unwrap();
        ctx.destroy_actor(hero);
        assert!(ctx.add_component(hero, "Tag").unwrap().is_none());
        assert!(ctx.add_component(ActorId(99), "Tag").unwrap().is_none());
    }

    #[test]
    fn remove_component_queues_destroy_once() {
        let project = Project::new();
        let log = Log::default();
        let mut ctx = project.context();
        let template = Behavior::new();
        let destroyed = log.clone();
        template.set_callback(ON_DESTROY, move |_, this, _| {
            destroyed.push(format!("destroy {:?}", this.get("key")));
            Ok(())
        });
        ctx.registry.define("Fragile", template);
        project.scene("main", r#"{"actors": [{"name": "hero", "components": {"a": {"type": "Fragile"}}}]}"#);
        ctx.load_scene("main");
        ctx.swap_scene().unwrap();

        let hero = ctx.find_actor("hero").unwrap();
        let a = ctx.get_component_by_key(hero, "a").unwrap();
        ctx.remove_component(hero, &a);
        ctx.remove_component(hero, &a);
        assert!(ctx.get_component_by_key(hero, "a").is_none());

        lifecycle::run_destroy(&mut ctx).unwrap();
        lifecycle::run_destroy(&mut ctx).unwrap();
        assert_eq!(log.take(), ["destroy \"a\""]);
    }

    #[test]
    fn instantiated_actors_are_addressable_before_flush() {
        let project = Project::new();
        project.component_type("Tag", r#"{"label": "t"}"#);
        project.template("Enemy", r#"{"name": "enemy", "components": {"tag": {"type": "Tag"}}}"#);
        project.scene("main", r#"{"actors": []}"#);
        let mut ctx = loaded(&project);

        let id = ctx.instantiate("Enemy").unwrap();
        assert_eq!(ctx.actor_name(id), Some("enemy"));
        assert!(ctx.get_component(id, "Tag").is_some());
        assert_eq!(ctx.find_actor("enemy"), Some(id));

        let second = ctx.instantiate("Enemy").unwrap();
        ctx.destroy_actor(second);
        assert_eq!(ctx.find_all_actors("enemy"), [id]);

        ctx.scene.flush();
        assert_eq!(ctx.find_all_actors("enemy"), [id]);
        assert!(ctx.instantiate("Missing").is_err());
    }

    #[test]
    fn quit_stops_running() {
        let project = Project::new();
        let mut ctx = project.context();
        assert!(ctx.is_running());
        ctx.quit();
        assert!(!ctx.is_running());
    }
}
