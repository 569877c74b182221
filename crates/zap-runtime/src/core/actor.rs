use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::api::types::ActorId;
use crate::assets::documents::ActorDoc;
use crate::components::component::{Capabilities, Component, ContactCallback};
use crate::components::registry::ComponentRegistry;
use crate::error::{EngineError, EngineResult};
use crate::script::behavior::Behavior;

/// Derived lookups over an actor's components, all keyed in key order.
#[derive(Debug, Default)]
struct ComponentIndex {
    by_type: HashMap<String, BTreeSet<String>>,
    collision_enter: BTreeSet<String>,
    collision_exit: BTreeSet<String>,
    trigger_enter: BTreeSet<String>,
    trigger_exit: BTreeSet<String>,
}

impl ComponentIndex {
    fn contact_mut(&mut self, callback: ContactCallback) -> &mut BTreeSet<String> {
        match callback {
            ContactCallback::CollisionEnter => &mut self.collision_enter,
            ContactCallback::CollisionExit => &mut self.collision_exit,
            ContactCallback::TriggerEnter => &mut self.trigger_enter,
            ContactCallback::TriggerExit => &mut self.trigger_exit,
        }
    }

    fn contact(&self, callback: ContactCallback) -> &BTreeSet<String> {
        match callback {
            ContactCallback::CollisionEnter => &self.collision_enter,
            ContactCallback::CollisionExit => &self.collision_exit,
            ContactCallback::TriggerEnter => &self.trigger_enter,
            ContactCallback::TriggerExit => &self.trigger_exit,
        }
    }

    fn insert(&mut self, component: &Component) {
        let key = component.key().to_string();
        self.by_type
            .entry(component.type_name().to_string())
            .or_default()
            .insert(key.clone());
        let caps = component.capabilities();
        for callback in CONTACT_CALLBACKS {
            if caps.handles(callback) {
                self.contact_mut(callback).insert(key.clone());
            }
        }
    }

    fn remove(&mut self, component: &Component) {
        if let Some(keys) = self.by_type.get_mut(component.type_name()) {
            keys.remove(component.key());
            if keys.is_empty() {
                self.by_type.remove(component.type_name());
            }
        }
        for callback in CONTACT_CALLBACKS {
            self.contact_mut(callback).remove(component.key());
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

const CONTACT_CALLBACKS: [ContactCallback; 4] = [
    ContactCallback::CollisionEnter,
    ContactCallback::CollisionExit,
    ContactCallback::TriggerEnter,
    ContactCallback::TriggerExit,
];

/// What `remove_component` took out, so the scene can schedule its destroy callback.
#[derive(Debug, Clone)]
pub struct RemovedComponent {
    pub key: String,
    pub behavior: Behavior,
    pub caps: Capabilities,
}

/// A named set of components.
///
/// The component map and the indices change immediately; the scene's
/// scheduling only catches up at the next flush, through `drain_added`
/// and `drain_removed`.
#[derive(Debug)]
pub struct Actor {
    name: String,
    template_name: Option<String>,
    id: Option<ActorId>,
    persistent: bool,
    components: BTreeMap<String, Component>,
    index: ComponentIndex,
    pending_add: Vec<String>,
    pending_remove: Vec<String>,
}

impl Actor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            template_name: None,
            id: None,
            persistent: false,
            components: BTreeMap::new(),
            index: ComponentIndex::default(),
            pending_add: Vec::new(),
            pending_remove: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn template_name(&self) -> Option<&str> {
        self.template_name.as_deref()
    }

    pub fn set_template_name(&mut self, template: &str) {
        self.template_name = Some(template.to_string());
    }

    pub fn id(&self) -> Option<ActorId> {
        self.id
    }

    /// Assign the actor's id and stamp it on every component.
    pub fn set_id(&mut self, id: ActorId) {
        self.id = Some(id);
        for component in self.components.values_mut() {
            component.attach(id);
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    /// Merge a declarative component block into this actor.
    ///
    /// A key that already exists is replaced by a clone of the existing
    /// component, so overrides layer on top of template values. A new key
    /// is loaded fresh from its declared type.
    pub fn apply_definition(&mut self, doc: &ActorDoc, registry: &mut ComponentRegistry) -> EngineResult<()> {
        for (key, component_doc) in &doc.components {
            let component = match self.components.get(key) {
                Some(existing) => {
                    if let Some(type_name) = &component_doc.type_name {
                        if type_name != existing.type_name() {
                            log::warn!(
                                "{}: component `{}` keeps type {} (document says {})",
                                self.name,
                                key,
                                existing.type_name(),
                                type_name
                            );
                        }
                    }
                    registry.clone_component(existing, key)
                }
                None => {
                    let type_name = component_doc
                        .type_name
                        .as_deref()
                        .ok_or_else(|| EngineError::UntypedComponent { key: key.clone() })?;
                    registry.load(key, type_name)?
                }
            };
            for (name, value) in &component_doc.overrides {
                component.apply_override(name, value);
            }
            self.components.insert(key.clone(), component);
        }
        if let Some(id) = self.id {
            self.set_id(id);
        }
        self.rebuild_indices();
        Ok(())
    }

    pub fn rebuild_indices(&mut self) {
        self.index.clear();
        for component in self.components.values() {
            self.index.insert(component);
        }
    }

    /// Insert a component created at runtime. It is indexed and findable right
    /// away; the scene schedules it at the next flush.
    pub fn insert_runtime_component(&mut self, mut component: Component) {
        if let Some(id) = self.id {
            component.attach(id);
        }
        let key = component.key().to_string();
        self.index.insert(&component);
        self.components.insert(key.clone(), component);
        self.pending_add.push(key);
    }

    /// Remove the component whose behavior object is `behavior`.
    /// Returns `None` if it is not (or no longer) part of this actor.
    pub fn remove_component(&mut self, behavior: &Behavior) -> Option<RemovedComponent> {
        let key = self
            .components
            .values()
            .find(|c| c.behavior().ptr_eq(behavior))
            .map(|c| c.key().to_string())?;
        let component = self.components.remove(&key)?;

        component.set_enabled(false);
        self.index.remove(&component);
        self.pending_add.retain(|k| k != &key);
        self.pending_remove.push(key.clone());

        Some(RemovedComponent {
            key,
            behavior: component.behavior().clone(),
            caps: component.capabilities(),
        })
    }

    /// Disable every component. Used when the actor is destroyed.
    pub fn disable_all(&self) {
        for component in self.components.values() {
            component.set_enabled(false);
        }
    }

    /// A deep copy: same name and template, every component cloned through the registry.
    pub fn copy(&self, registry: &ComponentRegistry) -> Actor {
        let mut copy = Actor::new(&self.name);
        copy.template_name = self.template_name.clone();
        for (key, component) in &self.components {
            copy.components
                .insert(key.clone(), registry.clone_component(component, key));
        }
        copy.rebuild_indices();
        copy
    }

    /// All components, enabled or not, in key order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component under `key`, if present and enabled.
    pub fn component_by_key(&self, key: &str) -> Option<&Component> {
        self.components.get(key).filter(|c| c.is_enabled())
    }

    /// First enabled component of `type_name`, in key order.
    pub fn component(&self, type_name: &str) -> Option<&Component> {
        self.components_of(type_name).into_iter().next()
    }

    /// Every enabled component of `type_name`, in key order.
    pub fn components_of(&self, type_name: &str) -> Vec<&Component> {
        self.index
            .by_type
            .get(type_name)
            .map(|keys| {
                keys.iter()
                    .filter_map(|key| self.component_by_key(key))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Key and behavior of every component indexed for `callback`, in key order.
    /// Returned by value so dispatch can run while the actor changes.
    pub fn handlers(&self, callback: ContactCallback) -> Vec<(String, Behavior)> {
        self.index
            .contact(callback)
            .iter()
            .filter_map(|key| {
                self.components
                    .get(key)
                    .map(|c| (key.clone(), c.behavior().clone()))
            })
            .collect()
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.pending_add.is_empty() || !self.pending_remove.is_empty()
    }

    pub(crate) fn drain_added(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_add)
    }

    pub(crate) fn drain_removed(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_remove)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::documents::ComponentDoc;
    use crate::components::component::{ON_COLLISION_ENTER, ON_TRIGGER_ENTER};
    use crate::script::behavior::Value;
    use crate::testing::memory_registry;

    fn doc(entries: &[(&str, Option<&str>, &[(&str, f64)])]) -> ActorDoc {
        let mut doc = ActorDoc::default();
        for (key, type_name, overrides) in entries {
            let mut component = ComponentDoc {
                type_name: type_name.map(str::to_string),
                ..ComponentDoc::default()
            };
            for (name, value) in overrides.iter() {
                component
                    .overrides
                    .insert(name.to_string(), crate::assets::documents::OverrideValue::Float(*value));
            }
            doc.components.insert(key.to_string(), component);
        }
        doc
    }

    fn registry() -> (ComponentRegistry, crate::testing::Project) {
        memory_registry(|registry| {
            let mover = Behavior::new();
            mover.set("speed", 1.0);
            registry.define("Mover", mover);

            let sensor = Behavior::new();
            sensor.set_callback(ON_TRIGGER_ENTER, |_, _, _| Ok(()));
            sensor.set_callback(ON_COLLISION_ENTER, |_, _, _| Ok(()));
            registry.define("Sensor", sensor);
        })
    }

    #[test]
    fn apply_definition_loads_and_overrides() {
        let (mut registry, _project) = registry();
        let mut actor = Actor::new("hero");
        actor
            .apply_definition(&doc(&[("b", Some("Mover"), &[("speed", 4.0)]), ("a", Some("Mover"), &[])]), &mut registry)
            .unwrap();

        let movers: Vec<&str> = actor.components_of("Mover").iter().map(|c| c.key()).collect();
        assert_eq!(movers, ["a", "b"]);
        assert_eq!(actor.component("Mover").unwrap().key(), "a");
        assert_eq!(actor.component_by_key("b").unwrap().behavior().get("speed"), Value::Float(4.0));
    }

    #[test]
    fn apply_definition_layers_on_existing_keys() {
        let (mut registry, _project) = registry();
        let mut actor = Actor::new("hero");
        actor
            .apply_definition(&doc(&[("a", Some("Mover"), &[("speed", 2.0)])]), &mut registry)
            .unwrap();
        let before = actor.component_by_key("a").unwrap().behavior().clone();

        actor.apply_definition(&doc(&[("a", None, &[])]), &mut registry).unwrap();
        let after = actor.component_by_key("a").unwrap().behavior().clone();

        assert!(!before.ptr_eq(&after));
        assert_eq!(after.get("speed"), Value::Float(2.0));
    }

    #[test]
    fn untyped_new_component_is_an_error() {
        let (mut registry, _project) = registry();
        let mut actor = Actor::new("hero");
        let err = actor.apply_definition(&doc(&[("a", None, &[])]), &mut registry).unwrap_err();
        assert!(matches!(err, EngineError::UntypedComponent { .. }));
    }

    #[test]
    fn unknown_type_is_an_error() {
        let (mut registry, _project) = registry();
        let mut actor = Actor::new("hero");
        let err = actor
            .apply_definition(&doc(&[("a", Some("Ghost"), &[])]), &mut registry)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingComponentType(_)));
    }

    #[test]
    fn lookups_skip_disabled_components() {
        let (mut registry, _project) = registry();
        let mut actor = Actor::new("hero");
        actor
            .apply_definition(&doc(&[("a", Some("Mover"), &[]), ("b", Some("Mover"), &[])]), &mut registry)
            .unwrap();

        actor.component_by_key("a").unwrap().set_enabled(false);
        assert!(actor.component_by_key("a").is_none());
        assert_eq!(actor.component("Mover").unwrap().key(), "b");
        assert_eq!(actor.components_of("Mover").len(), 1);
        // Still present, only hidden.
        assert_eq!(actor.len(), 2);
    }

    #[test]
    fn contact_handlers_are_indexed_by_capability() {
        let (mut registry, _project) = registry();
        let mut actor = Actor::new("hero");
        actor
            .apply_definition(&doc(&[("z", Some("Sensor"), &[]), ("m", Some("Mover"), &[]), ("c", Some("Sensor"), &[])]), &mut registry)
            .unwrap();

        let keys: Vec<String> = actor
            .handlers(ContactCallback::TriggerEnter)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["c", "z"]);
        assert!(actor.handlers(ContactCallback::TriggerExit).is_empty());
    }

    #[test]
    fn runtime_add_then_remove_is_cancelled() {
        let (mut registry, _project) = registry();
        let mut actor = Actor::new("hero");
        actor.set_id(ActorId(1));

        let sensor = registry.load("r0", "Sensor").unwrap();
        let behavior = sensor.behavior().clone();
        actor.insert_runtime_component(sensor);
        assert_eq!(behavior.get("actor"), Value::Actor(ActorId(1)));
        assert_eq!(actor.handlers(ContactCallback::CollisionEnter).len(), 1);

        let removed = actor.remove_component(&behavior).unwrap();
        assert_eq!(removed.key, "r0");
        assert!(!behavior.get("enabled").is_truthy());
        assert!(actor.handlers(ContactCallback::CollisionEnter).is_empty());
        assert!(actor.drain_added().is_empty());
        assert_eq!(actor.drain_removed(), ["r0"]);
    }

    #[test]
    fn removal_is_idempotent() {
        let (mut registry, _project) = registry();
        let mut actor = Actor::new("hero");
        actor.apply_definition(&doc(&[("a", Some("Mover"), &[])]), &mut registry).unwrap();
        let behavior = actor.component_by_key("a").unwrap().behavior().clone();

        assert!(actor.remove_component(&behavior).is_some());
        assert!(actor.remove_component(&behavior).is_none());
        assert_eq!(actor.drain_removed().len(), 1);
        assert!(actor.is_empty());
    }

    #[test]
    fn copies_are_isolated_both_ways() {
        let (mut registry, _project) = registry();
        let mut original = Actor::new("hero");
        original.set_template_name("Hero");
        original
            .apply_definition(&doc(&[("a", Some("Mover"), &[("speed", 3.0)])]), &mut registry)
            .unwrap();

        let copy = original.copy(&registry);
        assert_eq!(copy.name(), "hero");
        assert_eq!(copy.template_name(), Some("Hero"));
        assert!(copy.id().is_none());

        let original_mover = original.component_by_key("a").unwrap().behavior().clone();
        let copy_mover = copy.component_by_key("a").unwrap().behavior().clone();
        assert_eq!(copy_mover.get("speed"), Value::Float(3.0));

        copy_mover.set("speed", 8.0);
        assert_eq!(original_mover.get("speed"), Value::Float(3.0));
        original_mover.set("speed", 5.0);
        assert_eq!(copy_mover.get("speed"), Value::Float(8.0));
    }
}
