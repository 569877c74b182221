use std::collections::HashMap;

use crate::api::context::EngineContext;
use crate::api::types::ComponentRef;
use crate::error::{ScriptError, ScriptResult};
use crate::script::behavior::{Behavior, Callback, Value};
use crate::systems::dispatch;

enum Change {
    Subscribe(String, Behavior, Callback),
    Unsubscribe(String, Behavior, Callback),
}

/// Publish/subscribe between behaviors.
///
/// Subscription changes are queued and only take effect at `resolve`, which
/// the frame loop calls once per frame after the destroy phase. Publishing
/// is immediate.
#[derive(Default)]
pub struct EventBus {
    subscribers: HashMap<String, Vec<(Behavior, Callback)>>,
    pending: Vec<Change>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, event_type: &str, component: &Behavior, function: Callback) {
        self.pending
            .push(Change::Subscribe(event_type.to_string(), component.clone(), function));
    }

    pub fn unsubscribe(&mut self, event_type: &str, component: &Behavior, function: Callback) {
        self.pending
            .push(Change::Unsubscribe(event_type.to_string(), component.clone(), function));
    }

    /// Apply queued subscription changes in the order they were requested.
    pub fn resolve(&mut self) {
        for change in std::mem::take(&mut self.pending) {
            match change {
                Change::Subscribe(event_type, component, function) => {
                    self.subscribers
                        .entry(event_type)
                        .or_default()
                        .push((component, function));
                }
                Change::Unsubscribe(event_type, component, function) => {
                    if let Some(list) = self.subscribers.get_mut(&event_type) {
                        list.retain(|(c, f)| !(c.ptr_eq(&component) && f.ptr_eq(&function)));
                        if list.is_empty() {
                            self.subscribers.remove(&event_type);
                        }
                    }
                }
            }
        }
    }

    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.subscribers.get(event_type).map_or(0, Vec::len)
    }

    fn snapshot(&self, event_type: &str) -> Vec<(Behavior, Callback)> {
        self.subscribers.get(event_type).cloned().unwrap_or_default()
    }
}

/// Call every current subscriber of `event_type` with `payload`.
/// A subscriber's raised error is logged and the rest still run.
pub fn publish(ctx: &mut EngineContext, event_type: &str, payload: Value) -> ScriptResult {
    for (component, function) in ctx.events.snapshot(event_type) {
        match function.call(ctx, &component, std::slice::from_ref(&payload)) {
            Ok(()) => {}
            Err(ScriptError::Raised(message)) => {
                log::error!("{} event `{}`: {}", subscriber_label(ctx, &component), event_type, message);
            }
            Err(fatal) => return Err(fatal),
        }
    }
    Ok(())
}

/// Where a subscriber lives, in the same form as callback error reports.
fn subscriber_label(ctx: &EngineContext, component: &Behavior) -> String {
    let key = component.get("key");
    match (component.get("actor").as_actor(), key.as_str()) {
        (Some(actor), Some(key)) => dispatch::label(ctx, &ComponentRef::new(actor, key)),
        _ => "detached subscriber".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Log, Project};

    fn listener(log: &Log, label: &'static str) -> Callback {
        let log = log.clone();
        Callback::new(move |_, this, args| {
            let who = this.get("name");
            log.push(format!("{label}:{}:{:?}", who.as_str().unwrap_or("?"), args[0]));
            if label == "bad" {
                return Err(ScriptError::raised("listener failed"));
            }
            Ok(())
        })
    }

    #[test]
    fn subscriptions_apply_at_resolve() {
        let project = Project::new();
        let mut ctx = project.context();
        let log = Log::default();
        let component = Behavior::new();
        component.set("name", "ui");

        ctx.events.subscribe("score", &component, listener(&log, "ok"));
        publish(&mut ctx, "score", Value::Int(1)).unwrap();
        assert!(log.take().is_empty());

        ctx.events.resolve();
        publish(&mut ctx, "score", Value::Int(2)).unwrap();
        assert_eq!(log.take(), ["ok:ui:2"]);
    }

    #[test]
    fn failing_subscriber_does_not_stop_others() {
        let project = Project::new();
        let mut ctx = project.context();
        let log = Log::default();
        let component = Behavior::new();

        ctx.events.subscribe("hit", &component, listener(&log, "bad"));
        ctx.events.subscribe("hit", &component, listener(&log, "ok"));
        ctx.events.resolve();
        publish(&mut ctx, "hit", Value::from("x")).unwrap();
        assert_eq!(log.take().len(), 2);
    }

    #[test]
    fn subscribers_are_labelled_by_owner() {
        let project = Project::new();
        project.component_type("Hud", "{}");
        project.scene("main", r#"{"actors": [{"name": "hud", "components": {"score": {"type": "Hud"}}}]}"#);
        let mut ctx = project.context();
        ctx.load_scene("main");
        ctx.swap_scene().unwrap();
        let hud = ctx.find_actor("hud").unwrap();
        let component = ctx.get_component_by_key(hud, "score").unwrap();

        assert_eq!(subscriber_label(&ctx, &component), "hud [score]");
        assert_eq!(subscriber_label(&ctx, &Behavior::new()), "detached subscriber");
    }

    #[test]
    fn unsubscribe_matches_component_and_function() {
        let project = Project::new();
        let mut ctx = project.context();
        let log = Log::default();
        let a = Behavior::new();
        let b = Behavior::new();
        let function = listener(&log, "ok");

        ctx.events.subscribe("tick", &a, function.clone());
        ctx.events.subscribe("tick", &b, function.clone());
        ctx.events.resolve();
        assert_eq!(ctx.events.subscriber_count("tick"), 2);

        ctx.events.unsubscribe("tick", &a, function.clone());
        assert_eq!(ctx.events.subscriber_count("tick"), 2);
        ctx.events.resolve();
        assert_eq!(ctx.events.subscriber_count("tick"), 1);

        ctx.events.unsubscribe("tick", &b, function);
        ctx.events.resolve();
        assert_eq!(ctx.events.subscriber_count("tick"), 0);
    }
}
