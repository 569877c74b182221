use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::api::types::{ActorId, ComponentRef, IdAllocator};
use crate::components::component::Capabilities;
use crate::core::actor::Actor;
use crate::script::behavior::Behavior;

/// Which scheduling sets a component belongs to. Membership follows the
/// component's fixed capabilities, never its enabled state.
#[derive(Debug, Default)]
struct Schedule {
    start: BTreeSet<ComponentRef>,
    update: BTreeSet<ComponentRef>,
    late_update: BTreeSet<ComponentRef>,
    destroy: BTreeSet<ComponentRef>,
}

impl Schedule {
    fn register(&mut self, target: ComponentRef, caps: Capabilities, start: bool) {
        if caps.start && start {
            self.start.insert(target.clone());
        }
        if caps.update {
            self.update.insert(target.clone());
        }
        if caps.late_update {
            self.late_update.insert(target.clone());
        }
        if caps.destroy {
            self.destroy.insert(target);
        }
    }

    fn unregister(&mut self, target: &ComponentRef) {
        self.start.remove(target);
        self.update.remove(target);
        self.late_update.remove(target);
        self.destroy.remove(target);
    }

    fn unregister_actor(&mut self, actor: ActorId) {
        for set in [&mut self.start, &mut self.update, &mut self.late_update, &mut self.destroy] {
            set.retain(|target| target.actor != actor);
        }
    }
}

/// Persistent actors handed from one scene to the next.
#[derive(Debug, Default)]
pub struct Carried {
    pub actors: Vec<Actor>,
    /// Components that were registered but had not started yet.
    pub pending_start: BTreeSet<ComponentRef>,
}

/// Actor storage plus everything the frame loop needs to schedule callbacks.
///
/// Actors enter `actors` and `names` as soon as they are spawned, so they are
/// addressable by id and findable by name, but only become active and
/// scheduled at the next `flush`. Components of persistent actors never join
/// the start queue.
pub struct Scene {
    name: String,
    actors: BTreeMap<ActorId, Actor>,
    active: BTreeSet<ActorId>,
    names: HashMap<String, Vec<ActorId>>,
    schedule: Schedule,
    destroy_queue: BTreeMap<ComponentRef, Behavior>,
    add_actor_queue: Vec<ActorId>,
    remove_actor_queue: Vec<ActorId>,
    dirty: BTreeSet<ActorId>,
}

impl Scene {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            actors: BTreeMap::new(),
            active: BTreeSet::new(),
            names: HashMap::new(),
            schedule: Schedule::default(),
            destroy_queue: BTreeMap::new(),
            add_actor_queue: Vec::new(),
            remove_actor_queue: Vec::new(),
            dirty: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fill a freshly created scene. Carried actors keep their ids and only
    /// start components that had not started before; loaded actors get new ids.
    pub fn populate(&mut self, carried: Carried, loaded: Vec<Actor>, ids: &mut IdAllocator) {
        for actor in carried.actors {
            let Some(id) = actor.id() else {
                continue;
            };
            self.actors.insert(id, actor);
            self.register_actor(id, Some(&carried.pending_start));
        }
        for mut actor in loaded {
            let id = ids.next_id();
            actor.set_id(id);
            self.actors.insert(id, actor);
            self.register_actor(id, None);
        }
    }

    /// Add an actor at runtime. It gets its id and name entry now and is
    /// scheduled at the next flush.
    pub fn spawn(&mut self, mut actor: Actor, ids: &mut IdAllocator) -> ActorId {
        let id = ids.next_id();
        actor.set_id(id);
        self.index_name(id, actor.name());
        self.actors.insert(id, actor);
        self.add_actor_queue.push(id);
        id
    }

    /// Request an actor's removal. Its components are disabled immediately and
    /// destroy callbacks queued; a pending addition is cancelled. Repeated calls
    /// are no-ops. Returns whether anything happened.
    pub fn destroy_actor(&mut self, id: ActorId) -> bool {
        if self.is_pending_removal(id) {
            return false;
        }
        let Some(actor) = self.actors.get(&id) else {
            return false;
        };

        actor.disable_all();
        let doomed: Vec<(ComponentRef, Behavior)> = actor
            .components()
            .filter(|c| c.capabilities().destroy)
            .map(|c| (ComponentRef::new(id, c.key()), c.behavior().clone()))
            .collect();
        for (target, behavior) in doomed {
            self.queue_destroy(target, behavior);
        }

        self.add_actor_queue.retain(|queued| *queued != id);
        self.remove_actor_queue.push(id);
        true
    }

    pub fn is_pending_removal(&self, id: ActorId) -> bool {
        self.remove_actor_queue.contains(&id)
    }

    pub fn is_active(&self, id: ActorId) -> bool {
        self.active.contains(&id)
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// Note that an actor's component set changed, for the next flush.
    pub fn mark_dirty(&mut self, id: ActorId) {
        self.dirty.insert(id);
    }

    /// First actor called `name`, in registration order.
    pub fn find(&self, name: &str) -> Option<ActorId> {
        self.find_all(name).into_iter().next()
    }

    /// Every actor called `name` that is not being destroyed, in registration order.
    pub fn find_all(&self, name: &str) -> Vec<ActorId> {
        self.names
            .get(name)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| !self.is_pending_removal(*id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Active actor ids in id order.
    pub fn active_actors(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.active.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// The behavior behind `target`, if the component exists and is enabled.
    pub fn enabled_behavior(&self, target: &ComponentRef) -> Option<Behavior> {
        self.actors
            .get(&target.actor)?
            .component_by_key(&target.key)
            .map(|c| c.behavior().clone())
    }

    pub fn queue_destroy(&mut self, target: ComponentRef, behavior: Behavior) {
        self.destroy_queue.insert(target, behavior);
    }

    pub fn take_start_queue(&mut self) -> Vec<ComponentRef> {
        std::mem::take(&mut self.schedule.start).into_iter().collect()
    }

    pub fn update_targets(&self) -> Vec<ComponentRef> {
        self.schedule.update.iter().cloned().collect()
    }

    pub fn late_update_targets(&self) -> Vec<ComponentRef> {
        self.schedule.late_update.iter().cloned().collect()
    }

    pub fn take_destroy_queue(&mut self) -> Vec<(ComponentRef, Behavior)> {
        std::mem::take(&mut self.destroy_queue).into_iter().collect()
    }

    pub fn has_pending_destroy(&self) -> bool {
        !self.destroy_queue.is_empty()
    }

    pub fn is_scheduled_for_update(&self, target: &ComponentRef) -> bool {
        self.schedule.update.contains(target)
    }

    pub fn is_scheduled_for_start(&self, target: &ComponentRef) -> bool {
        self.schedule.start.contains(target)
    }

    pub fn is_destroy_capable(&self, target: &ComponentRef) -> bool {
        self.schedule.destroy.contains(target)
    }

    /// Apply every deferred change: actor removals, actor additions,
    /// component removals, component additions.
    pub fn flush(&mut self) {
        for id in std::mem::take(&mut self.remove_actor_queue) {
            self.unregister_actor(id);
            self.actors.remove(&id);
            self.dirty.remove(&id);
        }

        for id in std::mem::take(&mut self.add_actor_queue) {
            if self.actors.contains_key(&id) {
                self.register_actor(id, None);
            }
        }

        let dirty: Vec<ActorId> = std::mem::take(&mut self.dirty).into_iter().collect();
        let mut added = Vec::new();
        for id in dirty {
            let Some(actor) = self.actors.get_mut(&id) else {
                continue;
            };
            for key in actor.drain_removed() {
                self.schedule.unregister(&ComponentRef::new(id, key));
            }
            added.push((id, actor.drain_added()));
        }

        for (id, keys) in added {
            if !self.active.contains(&id) {
                continue;
            }
            let Some(actor) = self.actors.get(&id) else {
                continue;
            };
            let start = !actor.is_persistent();
            for key in keys {
                if let Some(component) = actor.components().find(|c| c.key() == key) {
                    self.schedule
                        .register(ComponentRef::new(id, key.clone()), component.capabilities(), start);
                }
            }
        }
    }

    /// Queue destroy callbacks for every non-persistent actor, ahead of a scene change.
    pub fn begin_unload(&mut self) {
        let doomed: Vec<(ComponentRef, Behavior)> = self
            .actors
            .iter()
            .filter(|(id, actor)| !actor.is_persistent() && !self.is_pending_removal(**id))
            .flat_map(|(id, actor)| {
                actor
                    .components()
                    .filter(|c| c.capabilities().destroy)
                    .map(move |c| (ComponentRef::new(*id, c.key()), c.behavior().clone()))
            })
            .collect();
        for (target, behavior) in doomed {
            self.queue_destroy(target, behavior);
        }
    }

    /// Tear the scene down, keeping only persistent actors that are not being destroyed.
    pub fn carry_over(mut self) -> Carried {
        let pending_start = std::mem::take(&mut self.schedule.start);
        let removed = std::mem::take(&mut self.remove_actor_queue);
        let actors = std::mem::take(&mut self.actors)
            .into_iter()
            .filter(|(id, actor)| actor.is_persistent() && !removed.contains(id))
            .map(|(_, actor)| actor)
            .collect();
        Carried {
            actors,
            pending_start,
        }
    }

    // -- registration (the only writers of active / names / schedule) --

    fn register_actor(&mut self, id: ActorId, carried_start: Option<&BTreeSet<ComponentRef>>) {
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        // Everything the actor holds is registered now; nothing left to flush.
        actor.drain_added();
        actor.drain_removed();

        if !self.active.insert(id) {
            return;
        }
        let Some(actor) = self.actors.get(&id) else {
            return;
        };
        let name = actor.name().to_string();
        let persistent = actor.is_persistent();
        for component in actor.components() {
            let target = ComponentRef::new(id, component.key());
            let start = match carried_start {
                Some(pending) => pending.contains(&target),
                None => !persistent,
            };
            self.schedule.register(target, component.capabilities(), start);
        }
        self.index_name(id, &name);
    }

    fn unregister_actor(&mut self, id: ActorId) {
        if let Some(actor) = self.actors.get(&id) {
            if let Some(ids) = self.names.get_mut(actor.name()) {
                ids.retain(|named| *named != id);
                if ids.is_empty() {
                    self.names.remove(actor.name());
                }
            }
        }
        if self.active.remove(&id) {
            self.schedule.unregister_actor(id);
        }
    }

    fn index_name(&mut self, id: ActorId, name: &str) {
        let ids = self.names.entry(name.to_string()).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
}
