//! The engine-native `Rigidbody` component.
//!
//! A rigidbody is configured through plain fields (see [`PROPERTIES`]) and
//! owns one physics body from `OnStart` until `OnDestroy`. Until the body
//! exists, position and rotation read and write the `x`, `y` and `rotation`
//! fields directly.

use glam::Vec2;

use crate::api::context::EngineContext;
use crate::api::types::ComponentRef;
use crate::components::component::{ON_DESTROY, ON_START};
use crate::core::physics::{
    BodyDesc, BodyType, ColliderDesc, ColliderMaterial, FixtureCategory, FixtureDesc, PhysicsBody,
};
use crate::error::{EngineError, ScriptError, ScriptResult};
use crate::script::behavior::Behavior;

pub const TYPE_NAME: &str = "Rigidbody";

enum PropertyDefault {
    Num(f64),
    Flag(bool),
    Text(&'static str),
}

/// Every configurable property with its default.
const PROPERTIES: &[(&str, PropertyDefault)] = &[
    ("x", PropertyDefault::Num(0.0)),
    ("y", PropertyDefault::Num(0.0)),
    ("body_type", PropertyDefault::Text("dynamic")),
    ("precise", PropertyDefault::Flag(false)),
    ("gravity_scale", PropertyDefault::Num(1.0)),
    ("density", PropertyDefault::Num(1.0)),
    ("angular_friction", PropertyDefault::Num(0.3)),
    ("rotation", PropertyDefault::Num(0.0)),
    ("has_collider", PropertyDefault::Flag(true)),
    ("has_trigger", PropertyDefault::Flag(false)),
    ("collider_type", PropertyDefault::Text("box")),
    ("width", PropertyDefault::Num(1.0)),
    ("height", PropertyDefault::Num(1.0)),
    ("radius", PropertyDefault::Num(0.5)),
    ("friction", PropertyDefault::Num(0.3)),
    ("bounciness", PropertyDefault::Num(0.3)),
    ("trigger_type", PropertyDefault::Text("box")),
    ("trigger_width", PropertyDefault::Num(1.0)),
    ("trigger_height", PropertyDefault::Num(1.0)),
    ("trigger_radius", PropertyDefault::Num(0.5)),
];

/// A fresh rigidbody with default properties and its lifecycle callbacks.
pub fn new_behavior() -> Behavior {
    let behavior = Behavior::new();
    for (name, default) in PROPERTIES {
        match default {
            PropertyDefault::Num(n) => behavior.set(name, *n),
            PropertyDefault::Flag(b) => behavior.set(name, *b),
            PropertyDefault::Text(s) => behavior.set(name, *s),
        }
    }
    behavior.set_callback(ON_START, |ctx, this, _| create_body(ctx, this));
    behavior.set_callback(ON_DESTROY, |ctx, this, _| {
        destroy_body(ctx, this);
        Ok(())
    });
    behavior
}

/// A new native object carrying the same property values as `existing`.
pub fn duplicate(existing: &Behavior) -> Behavior {
    let behavior = new_behavior();
    for (name, _) in PROPERTIES {
        behavior.set(name, existing.get(name));
    }
    behavior
}

fn owner(this: &Behavior) -> Option<ComponentRef> {
    let actor = this.get("actor").as_actor()?;
    let key = this.get("key");
    Some(ComponentRef::new(actor, key.as_str()?))
}

fn number(this: &Behavior, name: &str) -> ScriptResult<f32> {
    this.get(name)
        .as_float()
        .map(|n| n as f32)
        .ok_or_else(|| ScriptError::raised(format!("Rigidbody.{name} must be a number")))
}

fn flag(this: &Behavior, name: &str) -> bool {
    this.get(name).is_truthy()
}

fn text(this: &Behavior, name: &str) -> ScriptResult<String> {
    this.get(name)
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ScriptError::raised(format!("Rigidbody.{name} must be a string")))
}

fn unknown(property: &str, value: String) -> ScriptError {
    ScriptError::Fatal(EngineError::InvalidProperty {
        component: TYPE_NAME,
        property: property.to_string(),
        value,
    })
}

fn shape(this: &Behavior, kind: &str, width: &str, height: &str, radius: &str) -> ScriptResult<ColliderDesc> {
    match text(this, kind)?.as_str() {
        "box" => Ok(ColliderDesc::Cuboid {
            half_width: number(this, width)? * 0.5,
            half_height: number(this, height)? * 0.5,
        }),
        "circle" => Ok(ColliderDesc::Ball {
            radius: number(this, radius)?,
        }),
        other => Err(unknown(kind, other.to_string())),
    }
}

/// Translate the rigidbody's fields into a body description and its fixtures.
/// An unknown body or shape type is authored-data breakage and fatal.
pub fn describe(this: &Behavior) -> ScriptResult<(BodyDesc, Vec<FixtureDesc>)> {
    let body_type_name = text(this, "body_type")?;
    let body_type = BodyType::from_name(&body_type_name).ok_or_else(|| unknown("body_type", body_type_name))?;

    let desc = BodyDesc::new(body_type)
        .with_position(Vec2::new(number(this, "x")?, number(this, "y")?))
        .with_rotation(number(this, "rotation")?.to_radians())
        .with_gravity_scale(number(this, "gravity_scale")?)
        .with_angular_damping(number(this, "angular_friction")?)
        .with_ccd(flag(this, "precise"));

    let material = ColliderMaterial {
        restitution: number(this, "bounciness")?,
        friction: number(this, "friction")?,
        density: number(this, "density")?,
    };

    let mut fixtures = Vec::new();
    if flag(this, "has_collider") {
        let shape = shape(this, "collider_type", "width", "height", "radius")?;
        fixtures.push(FixtureDesc::new(shape, FixtureCategory::Collider).with_material(material));
    }
    if flag(this, "has_trigger") {
        let shape = shape(this, "trigger_type", "trigger_width", "trigger_height", "trigger_radius")?;
        fixtures.push(FixtureDesc::new(shape, FixtureCategory::Trigger).with_material(material));
    }
    if fixtures.is_empty() {
        // Without any fixture the body would have no mass.
        let shape = ColliderDesc::Cuboid {
            half_width: number(this, "width")? * 0.5,
            half_height: number(this, "height")? * 0.5,
        };
        fixtures.push(FixtureDesc::new(shape, FixtureCategory::Phantom).with_material(material));
    }

    Ok((desc, fixtures))
}

fn create_body(ctx: &mut EngineContext, this: &Behavior) -> ScriptResult {
    let owner = owner(this).ok_or_else(|| ScriptError::raised("Rigidbody started without an owning actor"))?;
    if ctx.physics.body_for(&owner).is_some() {
        return Ok(());
    }
    let (desc, fixtures) = describe(this)?;
    let body = ctx.physics.create_body(owner.actor, &desc);
    for fixture in &fixtures {
        ctx.physics.attach_fixture(&body, fixture);
    }
    ctx.physics.bind(owner, body);
    Ok(())
}

fn destroy_body(ctx: &mut EngineContext, this: &Behavior) {
    if let Some(body) = owner(this).and_then(|owner| ctx.physics.unbind(&owner)) {
        ctx.physics.remove_body(&body);
    }
}

/// The live body behind a rigidbody component, once it has started.
pub fn body(ctx: &EngineContext, this: &Behavior) -> Option<PhysicsBody> {
    owner(this).and_then(|owner| ctx.physics.body_for(&owner))
}

pub fn position(ctx: &EngineContext, this: &Behavior) -> Vec2 {
    match body(ctx, this) {
        Some(body) => ctx.physics.body_position(&body).0,
        None => Vec2::new(
            this.get("x").as_float().unwrap_or(0.0) as f32,
            this.get("y").as_float().unwrap_or(0.0) as f32,
        ),
    }
}

pub fn set_position(ctx: &mut EngineContext, this: &Behavior, pos: Vec2) {
    match body(ctx, this) {
        Some(body) => ctx.physics.set_position(&body, pos),
        None => {
            this.set("x", pos.x);
            this.set("y", pos.y);
        }
    }
}

/// Rotation in degrees.
pub fn rotation(ctx: &EngineContext, this: &Behavior) -> f32 {
    match body(ctx, this) {
        Some(body) => ctx.physics.body_position(&body).1.to_degrees(),
        None => this.get("rotation").as_float().unwrap_or(0.0) as f32,
    }
}

/// Set rotation in degrees.
pub fn set_rotation(ctx: &mut EngineContext, this: &Behavior, degrees: f32) {
    match body(ctx, this) {
        Some(body) => ctx.physics.set_rotation(&body, degrees.to_radians()),
        None => this.set("rotation", degrees),
    }
}

pub fn velocity(ctx: &EngineContext, this: &Behavior) -> Vec2 {
    body(ctx, this)
        .map(|body| ctx.physics.velocity(&body))
        .unwrap_or(Vec2::ZERO)
}

pub fn set_velocity(ctx: &mut EngineContext, this: &Behavior, vel: Vec2) {
    if let Some(body) = body(ctx, this) {
        ctx.physics.set_velocity(&body, vel);
    }
}

/// Angular velocity in degrees per second.
pub fn angular_velocity(ctx: &EngineContext, this: &Behavior) -> f32 {
    body(ctx, this)
        .map(|body| ctx.physics.angular_velocity(&body).to_degrees())
        .unwrap_or(0.0)
}

pub fn set_angular_velocity(ctx: &mut EngineContext, this: &Behavior, degrees_per_second: f32) {
    if let Some(body) = body(ctx, this) {
        ctx.physics.set_angular_velocity(&body, degrees_per_second.to_radians());
    }
}

pub fn add_force(ctx: &mut EngineContext, this: &Behavior, force: Vec2) {
    if let Some(body) = body(ctx, this) {
        ctx.physics.apply_force(&body, force);
    }
}

pub fn apply_impulse(ctx: &mut EngineContext, this: &Behavior, impulse: Vec2) {
    if let Some(body) = body(ctx, this) {
        ctx.physics.apply_impulse(&body, impulse);
    }
}

pub fn add_torque(ctx: &mut EngineContext, this: &Behavior, torque: f32) {
    if let Some(body) = body(ctx, this) {
        ctx.physics.apply_torque(&body, torque);
    }
}

pub fn apply_angular_impulse(ctx: &mut EngineContext, this: &Behavior, impulse: f32) {
    if let Some(body) = body(ctx, this) {
        ctx.physics.apply_angular_impulse(&body, impulse);
    }
}

pub fn gravity_scale(ctx: &EngineContext, this: &Behavior) -> f32 {
    match body(ctx, this) {
        Some(body) => ctx.physics.gravity_scale(&body),
        None => this.get("gravity_scale").as_float().unwrap_or(1.0) as f32,
    }
}

pub fn set_gravity_scale(ctx: &mut EngineContext, this: &Behavior, scale: f32) {
    match body(ctx, this) {
        Some(body) => ctx.physics.set_gravity_scale(&body, scale),
        None => this.set("gravity_scale", scale),
    }
}

/// Unit vector the body's top faces. Rotation 0 faces -y.
pub fn up_direction(ctx: &EngineContext, this: &Behavior) -> Vec2 {
    let angle = rotation(ctx, this).to_radians();
    Vec2::new(angle.sin(), -angle.cos())
}

/// Unit vector the body's right side faces. Rotation 0 faces +x.
pub fn right_direction(ctx: &EngineContext, this: &Behavior) -> Vec2 {
    let angle = rotation(ctx, this).to_radians();
    Vec2::new(angle.cos(), angle.sin())
}

/// Rotate so the body's top faces `direction`. A zero vector is ignored.
pub fn set_up_direction(ctx: &mut EngineContext, this: &Behavior, direction: Vec2) {
    if let Some(dir) = direction.try_normalize() {
        set_rotation(ctx, this, dir.x.atan2(-dir.y).to_degrees());
    }
}

/// Rotate so the body's right side faces `direction`. A zero vector is ignored.
pub fn set_right_direction(ctx: &mut EngineContext, this: &Behavior, direction: Vec2) {
    if let Some(dir) = direction.try_normalize() {
        set_rotation(ctx, this, dir.y.atan2(dir.x).to_degrees());
    }
}
