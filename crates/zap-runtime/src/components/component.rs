use crate::api::types::{ActorId, ComponentRef};
use crate::assets::documents::OverrideValue;
use crate::script::behavior::{Behavior, Value};

pub const ON_START: &str = "OnStart";
pub const ON_UPDATE: &str = "OnUpdate";
pub const ON_LATE_UPDATE: &str = "OnLateUpdate";
pub const ON_DESTROY: &str = "OnDestroy";
pub const ON_COLLISION_ENTER: &str = "OnCollisionEnter";
pub const ON_COLLISION_EXIT: &str = "OnCollisionExit";
pub const ON_TRIGGER_ENTER: &str = "OnTriggerEnter";
pub const ON_TRIGGER_EXIT: &str = "OnTriggerExit";

/// The four contact callbacks, each with its own per-actor handler index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactCallback {
    CollisionEnter,
    CollisionExit,
    TriggerEnter,
    TriggerExit,
}

impl ContactCallback {
    pub fn name(self) -> &'static str {
        match self {
            ContactCallback::CollisionEnter => ON_COLLISION_ENTER,
            ContactCallback::CollisionExit => ON_COLLISION_EXIT,
            ContactCallback::TriggerEnter => ON_TRIGGER_ENTER,
            ContactCallback::TriggerExit => ON_TRIGGER_EXIT,
        }
    }
}

/// Which lifecycle and contact callbacks a component had when it was created.
/// Never recomputed, so scripts adding or removing callbacks later change nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub start: bool,
    pub update: bool,
    pub late_update: bool,
    pub destroy: bool,
    pub collision_enter: bool,
    pub collision_exit: bool,
    pub trigger_enter: bool,
    pub trigger_exit: bool,
}

impl Capabilities {
    pub fn probe(behavior: &Behavior) -> Self {
        let has = |name: &str| behavior.callback(name).is_some();
        Self {
            start: has(ON_START),
            update: has(ON_UPDATE),
            late_update: has(ON_LATE_UPDATE),
            destroy: has(ON_DESTROY),
            collision_enter: has(ON_COLLISION_ENTER),
            collision_exit: has(ON_COLLISION_EXIT),
            trigger_enter: has(ON_TRIGGER_ENTER),
            trigger_exit: has(ON_TRIGGER_EXIT),
        }
    }

    pub fn handles(&self, callback: ContactCallback) -> bool {
        match callback {
            ContactCallback::CollisionEnter => self.collision_enter,
            ContactCallback::CollisionExit => self.collision_exit,
            ContactCallback::TriggerEnter => self.trigger_enter,
            ContactCallback::TriggerExit => self.trigger_exit,
        }
    }
}

/// A behavior object bound to a key on an actor.
///
/// `key`, `type` and `enabled` are mirrored onto the behavior object so game
/// code can read them; `enabled` is owned by the behavior, so a script that
/// flips it is obeyed on the next lookup or dispatch.
#[derive(Debug, Clone)]
pub struct Component {
    type_name: String,
    key: String,
    actor: Option<ActorId>,
    behavior: Behavior,
    caps: Capabilities,
}

impl Component {
    /// Only the registry builds components, so capabilities are probed in one place.
    pub(crate) fn new(type_name: &str, key: &str, behavior: Behavior) -> Self {
        behavior.set("key", key);
        behavior.set("type", type_name);
        behavior.set("enabled", true);
        let caps = Capabilities::probe(&behavior);
        Self {
            type_name: type_name.to_string(),
            key: key.to_string(),
            actor: None,
            behavior,
            caps,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn actor(&self) -> Option<ActorId> {
        self.actor
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn is_enabled(&self) -> bool {
        is_enabled(&self.behavior)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.behavior.set("enabled", enabled);
    }

    /// Record the owning actor, here and on the behavior's `actor` field.
    pub fn attach(&mut self, actor: ActorId) {
        self.actor = Some(actor);
        self.behavior.set("actor", actor);
    }

    pub fn reference(&self) -> Option<ComponentRef> {
        self.actor.map(|actor| ComponentRef::new(actor, self.key.clone()))
    }

    /// Assign a document override. Unknown property names are passed through as-is.
    pub fn apply_override(&self, name: &str, value: &OverrideValue) {
        self.behavior.set(name, Value::from(value));
    }
}

/// Whether a component's behavior object is currently enabled.
pub fn is_enabled(behavior: &Behavior) -> bool {
    behavior.get("enabled").is_truthy()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted(callbacks: &[&str]) -> Behavior {
        let template = Behavior::new();
        for name in callbacks {
            template.set_callback(name, |_, _, _| Ok(()));
        }
        Behavior::inheriting(&template)
    }

    #[test]
    fn capabilities_follow_callbacks() {
        let c = Component::new("Mover", "a", scripted(&[ON_START, ON_UPDATE, ON_TRIGGER_EXIT]));
        let caps = c.capabilities();
        assert!(caps.start);
        assert!(caps.update);
        assert!(!caps.late_update);
        assert!(!caps.destroy);
        assert!(caps.handles(ContactCallback::TriggerExit));
        assert!(!caps.handles(ContactCallback::CollisionEnter));
    }

    #[test]
    fn capabilities_are_fixed_at_creation() {
        let c = Component::new("Mover", "a", scripted(&[]));
        c.behavior().set_callback(ON_UPDATE, |_, _, _| Ok(()));
        assert!(!c.capabilities().update);
    }

    #[test]
    fn identity_is_mirrored_on_the_behavior() {
        let mut c = Component::new("Mover", "a", scripted(&[]));
        assert_eq!(c.behavior().get("key"), Value::from("a"));
        assert_eq!(c.behavior().get("type"), Value::from("Mover"));
        assert!(c.reference().is_none());

        c.attach(ActorId(4));
        assert_eq!(c.behavior().get("actor"), Value::Actor(ActorId(4)));
        assert_eq!(c.reference(), Some(ComponentRef::new(ActorId(4), "a")));
    }

    #[test]
    fn enabled_lives_on_the_behavior() {
        let c = Component::new("Mover", "a", scripted(&[]));
        assert!(c.is_enabled());
        c.behavior().set("enabled", false);
        assert!(!c.is_enabled());
        c.set_enabled(true);
        assert!(c.is_enabled());
    }

    #[test]
    fn overrides_set_fields() {
        let c = Component::new("Mover", "a", scripted(&[]));
        c.apply_override("speed", &OverrideValue::Float(2.5));
        c.apply_override("whatever", &OverrideValue::Str("x".into()));
        assert_eq!(c.behavior().get("speed"), Value::Float(2.5));
        assert_eq!(c.behavior().get("whatever"), Value::from("x"));
    }
}
