use glam::Vec2;

use crate::api::context::EngineContext;
use crate::api::types::ComponentRef;
use crate::components::component::{is_enabled, ContactCallback};
use crate::core::physics::{Collision, ContactEvent, ContactPhase, ContactSide, FixtureCategory, NO_CONTACT};
use crate::error::EngineResult;
use crate::script::behavior::Value;
use crate::systems::dispatch::invoke;

/// Route one step's contacts to the owning actors' handler indices.
///
/// Each side is handled on its own: side A's handlers run first, then side
/// B's. Both sides receive the same relative velocity, A's minus B's.
/// Contacts involving a phantom fixture are dropped entirely.
pub fn dispatch_contacts(ctx: &mut EngineContext, events: &[ContactEvent]) -> EngineResult<()> {
    for event in events {
        if event.a.category == FixtureCategory::Phantom || event.b.category == FixtureCategory::Phantom {
            continue;
        }
        let relative_velocity = event.a.velocity - event.b.velocity;
        deliver(ctx, event, &event.a, &event.b, relative_velocity)?;
        deliver(ctx, event, &event.b, &event.a, relative_velocity)?;
    }
    Ok(())
}

/// The callback a fixture category receives for a contact phase.
pub fn classify(category: FixtureCategory, phase: ContactPhase) -> Option<ContactCallback> {
    match (category, phase) {
        (FixtureCategory::Collider, ContactPhase::Begin) => Some(ContactCallback::CollisionEnter),
        (FixtureCategory::Collider, ContactPhase::End) => Some(ContactCallback::CollisionExit),
        (FixtureCategory::Trigger, ContactPhase::Begin) => Some(ContactCallback::TriggerEnter),
        (FixtureCategory::Trigger, ContactPhase::End) => Some(ContactCallback::TriggerExit),
        (FixtureCategory::Phantom, _) => None,
    }
}

fn deliver(
    ctx: &mut EngineContext,
    event: &ContactEvent,
    own: &ContactSide,
    other: &ContactSide,
    relative_velocity: Vec2,
) -> EngineResult<()> {
    let Some(callback) = classify(own.category, event.phase) else {
        return Ok(());
    };
    let (point, normal) = match (callback, event.geometry) {
        (ContactCallback::CollisionEnter, Some(geometry)) => geometry,
        _ => (NO_CONTACT, NO_CONTACT),
    };
    let collision = Collision {
        other: other.actor,
        point,
        normal,
        relative_velocity,
    };

    let handlers = match ctx.scene.actor(own.actor) {
        Some(actor) => actor.handlers(callback),
        None => return Ok(()),
    };
    for (key, behavior) in handlers {
        if !is_enabled(&behavior) {
            continue;
        }
        let target = ComponentRef::new(own.actor, key);
        invoke(ctx, &target, &behavior, callback.name(), &[Value::Collision(collision)])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::ActorId;
    use crate::components::component::{ON_COLLISION_ENTER, ON_COLLISION_EXIT, ON_TRIGGER_ENTER};
    use crate::error::ScriptError;
    use crate::script::behavior::Behavior;
    use crate::testing::{Log, Project};

    fn side(actor: u32, category: FixtureCategory, velocity: Vec2) -> ContactSide {
        ContactSide {
            actor: ActorId(actor),
            category,
            velocity,
        }
    }

    fn recorder(log: &Log, name: &str) -> Behavior {
        let template = Behavior::new();
        for callback in [ON_COLLISION_ENTER, ON_COLLISION_EXIT, ON_TRIGGER_ENTER] {
            let log = log.clone();
            let name = name.to_string();
            template.set_callback(callback, move |_, _, args| {
                let c = args[0].as_collision().copied().ok_or_else(|| ScriptError::raised("no collision"))?;
                log.push(format!("{name} {callback} other={} point={:?} rel={:?}", c.other.0, c.point, c.relative_velocity));
                Ok(())
            });
        }
        template
    }

    fn setup() -> (Project, crate::api::context::EngineContext, Log) {
        let project = Project::new();
        let log = Log::default();
        let mut ctx = project.context();
        ctx.registry.define("Recorder", recorder(&log, "rec"));
        project.scene(
            "arena",
            r#"{"actors": [
                {"name": "a", "components": {"h1": {"type": "Recorder"}, "h2": {"type": "Recorder"}}},
                {"name": "b", "components": {"h": {"type": "Recorder"}}}
            ]}"#,
        );
        ctx.load_scene("arena");
        ctx.swap_scene().unwrap();
        (project, ctx, log)
    }

    #[test]
    fn classification() {
        assert_eq!(classify(FixtureCategory::Collider, ContactPhase::Begin), Some(ContactCallback::CollisionEnter));
        assert_eq!(classify(FixtureCategory::Trigger, ContactPhase::End), Some(ContactCallback::TriggerExit));
        assert_eq!(classify(FixtureCategory::Phantom, ContactPhase::Begin), None);
    }

    #[test]
    fn collision_begin_reaches_both_sides_with_one_relative_velocity() {
        let (_project, mut ctx, log) = setup();
        let event = ContactEvent {
            phase: ContactPhase::Begin,
            a: side(1, FixtureCategory::Collider, Vec2::new(1.0, 0.0)),
            b: side(2, FixtureCategory::Collider, Vec2::new(-1.0, 0.0)),
            geometry: Some((Vec2::new(0.5, 0.0), Vec2::X)),
        };
        dispatch_contacts(&mut ctx, &[event]).unwrap();

        let entries = log.take();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].contains("OnCollisionEnter other=2 point=Vec2(0.5, 0.0) rel=Vec2(2.0, 0.0)"));
        assert!(entries[1].contains("other=2"));
        assert!(entries[2].contains("other=1 point=Vec2(0.5, 0.0) rel=Vec2(2.0, 0.0)"));
    }

    #[test]
    fn triggers_and_ends_get_the_sentinel() {
        let (_project, mut ctx, log) = setup();
        let events = [
            ContactEvent {
                phase: ContactPhase::Begin,
                a: side(1, FixtureCategory::Trigger, Vec2::ZERO),
                b: side(2, FixtureCategory::Trigger, Vec2::ZERO),
                geometry: None,
            },
            ContactEvent {
                phase: ContactPhase::End,
                a: side(1, FixtureCategory::Collider, Vec2::ZERO),
                b: side(2, FixtureCategory::Collider, Vec2::ZERO),
                geometry: Some((Vec2::ONE, Vec2::X)),
            },
        ];
        dispatch_contacts(&mut ctx, &events).unwrap();

        let entries = log.take();
        assert_eq!(entries.len(), 6);
        assert!(entries.iter().take(3).all(|e| e.contains("OnTriggerEnter") && e.contains("point=Vec2(-999.0, -999.0)")));
        assert!(entries.iter().skip(3).all(|e| e.contains("OnCollisionExit") && e.contains("point=Vec2(-999.0, -999.0)")));
    }

    #[test]
    fn mixed_categories_are_classified_per_side() {
        let (_project, mut ctx, log) = setup();
        let event = ContactEvent {
            phase: ContactPhase::Begin,
            a: side(1, FixtureCategory::Collider, Vec2::ZERO),
            b: side(2, FixtureCategory::Trigger, Vec2::ZERO),
            geometry: Some((Vec2::new(0.5, 0.0), Vec2::X)),
        };
        dispatch_contacts(&mut ctx, &[event]).unwrap();

        let entries = log.take();
        assert_eq!(entries.len(), 3);
        assert!(entries[..2].iter().all(|e| e.contains("OnCollisionEnter other=2 point=Vec2(0.5, 0.0)")));
        assert!(entries[2].contains("OnTriggerEnter other=1 point=Vec2(-999.0, -999.0)"));
    }

    #[test]
    fn phantom_contacts_dispatch_nothing() {
        let (_project, mut ctx, log) = setup();
        let event = ContactEvent {
            phase: ContactPhase::Begin,
            a: side(1, FixtureCategory::Phantom, Vec2::ZERO),
            b: side(2, FixtureCategory::Collider, Vec2::ZERO),
            geometry: None,
        };
        dispatch_contacts(&mut ctx, &[event]).unwrap();
        assert!(log.take().is_empty());
    }

    #[test]
    fn disabled_handlers_are_skipped() {
        let (_project, mut ctx, log) = setup();
        let a = ctx.find_actor("a").unwrap();
        ctx.get_component_by_key(a, "h1").unwrap().set("enabled", false);
        let event = ContactEvent {
            phase: ContactPhase::Begin,
            a: side(1, FixtureCategory::Trigger, Vec2::ZERO),
            b: side(2, FixtureCategory::Trigger, Vec2::ZERO),
            geometry: None,
        };
        dispatch_contacts(&mut ctx, &[event]).unwrap();
        assert_eq!(log.take().len(), 2);
    }
}
