use glam::Vec2;
use rapier2d::prelude::*;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::api::types::{ActorId, ComponentRef};

// ---------------------------------------------------------------------------
// Conversion helpers (private) — glam ↔ nalgebra
// ---------------------------------------------------------------------------

fn vec2_to_na(v: Vec2) -> nalgebra::Vector2<f32> {
    nalgebra::Vector2::new(v.x, v.y)
}

fn na_to_vec2(v: &nalgebra::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

fn na_point_to_vec2(p: &nalgebra::Point2<f32>) -> Vec2 {
    Vec2::new(p.x, p.y)
}

fn na_iso_to_pos_rot(iso: &nalgebra::Isometry2<f32>) -> (Vec2, f32) {
    let pos = Vec2::new(iso.translation.x, iso.translation.y);
    let rot = iso.rotation.angle();
    (pos, rot)
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Point and normal reported for contacts without manifold geometry
/// (trigger overlaps, contact ends).
pub const NO_CONTACT: Vec2 = Vec2::splat(-999.0);

/// The kind of rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
    Kinematic,
}

impl BodyType {
    /// Parse the names used in component properties: `dynamic`, `static`, `kinematic`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dynamic" => Some(BodyType::Dynamic),
            "static" => Some(BodyType::Fixed),
            "kinematic" => Some(BodyType::Kinematic),
            _ => None,
        }
    }

    fn to_rapier(self) -> RigidBodyType {
        match self {
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Fixed => RigidBodyType::Fixed,
            BodyType::Kinematic => RigidBodyType::KinematicVelocityBased,
        }
    }
}

/// Shape description for a fixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderDesc {
    Ball { radius: f32 },
    Cuboid { half_width: f32, half_height: f32 },
}

impl ColliderDesc {
    fn build_collider(&self) -> ColliderBuilder {
        match *self {
            ColliderDesc::Ball { radius } => ColliderBuilder::ball(radius),
            ColliderDesc::Cuboid { half_width, half_height } => {
                ColliderBuilder::cuboid(half_width, half_height)
            }
        }
    }
}

/// Physical material properties for a fixture.
#[derive(Debug, Clone, Copy)]
pub struct ColliderMaterial {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
}

impl Default for ColliderMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.3,
            density: 1.0,
        }
    }
}

/// How a fixture takes part in contacts.
///
/// Colliders only touch colliders, triggers only overlap triggers, and
/// phantoms touch nothing (they give a body mass without any contact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureCategory {
    Phantom,
    Collider,
    Trigger,
}

impl FixtureCategory {
    fn groups(self) -> InteractionGroups {
        match self {
            FixtureCategory::Phantom => InteractionGroups::new(Group::GROUP_1, Group::NONE),
            FixtureCategory::Collider => InteractionGroups::new(Group::GROUP_2, Group::GROUP_2),
            FixtureCategory::Trigger => InteractionGroups::new(Group::GROUP_3, Group::GROUP_3),
        }
    }

    fn is_sensor(self) -> bool {
        self != FixtureCategory::Collider
    }

    fn to_user_data(self) -> u128 {
        match self {
            FixtureCategory::Phantom => 0,
            FixtureCategory::Collider => 1,
            FixtureCategory::Trigger => 2,
        }
    }

    fn from_user_data(data: u128) -> Self {
        match data {
            1 => FixtureCategory::Collider,
            2 => FixtureCategory::Trigger,
            _ => FixtureCategory::Phantom,
        }
    }
}

/// One shape attached to a body.
#[derive(Debug, Clone, Copy)]
pub struct FixtureDesc {
    pub shape: ColliderDesc,
    pub category: FixtureCategory,
    pub material: ColliderMaterial,
}

impl FixtureDesc {
    pub fn new(shape: ColliderDesc, category: FixtureCategory) -> Self {
        Self {
            shape,
            category,
            material: ColliderMaterial::default(),
        }
    }

    pub fn with_material(mut self, material: ColliderMaterial) -> Self {
        self.material = material;
        self
    }
}

/// Builder for describing a rigid body before creation.
#[derive(Debug, Clone)]
pub struct BodyDesc {
    pub body_type: BodyType,
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub gravity_scale: f32,
    pub fixed_rotation: bool,
    pub ccd: bool,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl BodyDesc {
    pub fn new(body_type: BodyType) -> Self {
        Self {
            body_type,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            gravity_scale: 1.0,
            fixed_rotation: false,
            ccd: false,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    pub fn dynamic() -> Self {
        Self::new(BodyType::Dynamic)
    }

    /// A fixed (static) body. Ignores gravity and never rotates.
    pub fn fixed() -> Self {
        Self {
            gravity_scale: 0.0,
            fixed_rotation: true,
            ..Self::new(BodyType::Fixed)
        }
    }

    pub fn with_position(mut self, pos: Vec2) -> Self {
        self.position = pos;
        self
    }

    /// Rotation in radians.
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.velocity = vel;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_fixed_rotation(mut self, fixed: bool) -> Self {
        self.fixed_rotation = fixed;
        self
    }

    /// Continuous collision detection, for fast movers.
    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    pub fn with_angular_damping(mut self, damping: f32) -> Self {
        self.angular_damping = damping;
        self
    }
}

/// Handle to a body in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsBody {
    pub body_handle: RigidBodyHandle,
}

/// Whether a contact just began or just ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Begin,
    End,
}

/// One participant of a contact, resolved from its fixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactSide {
    pub actor: ActorId,
    pub category: FixtureCategory,
    pub velocity: Vec2,
}

/// A contact begin/end between two fixtures, as collected during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub a: ContactSide,
    pub b: ContactSide,
    /// World-space contact point and normal. Only present for solid contacts that began.
    pub geometry: Option<(Vec2, Vec2)>,
}

/// The record handed to contact callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision {
    pub other: ActorId,
    pub point: Vec2,
    pub normal: Vec2,
    /// Receiver's velocity minus the other body's velocity.
    pub relative_velocity: Vec2,
}

/// A ray query result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub actor: ActorId,
    pub point: Vec2,
    pub normal: Vec2,
    pub is_trigger: bool,
}

// ---------------------------------------------------------------------------
// Event collector (no crossbeam)
// ---------------------------------------------------------------------------

type CollectedEvent = (CollisionEvent, Option<(Vec2, Vec2)>);

struct DirectEventCollector {
    collisions: Mutex<Vec<CollectedEvent>>,
}

impl DirectEventCollector {
    fn new() -> Self {
        Self {
            collisions: Mutex::new(Vec::new()),
        }
    }

    fn drain_collisions(&self) -> Vec<CollectedEvent> {
        std::mem::take(&mut *self.collisions.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Manifold point and normal of a solid contact, read while the pair is still live.
fn contact_geometry(colliders: &ColliderSet, pair: &ContactPair) -> Option<(Vec2, Vec2)> {
    let manifold = pair.manifolds.iter().find(|m| !m.points.is_empty())?;
    let normal = na_to_vec2(&manifold.data.normal);
    let point = match manifold.data.solver_contacts.first() {
        Some(contact) => na_point_to_vec2(&contact.point),
        None => {
            let tracked = manifold.points.first()?;
            let collider = colliders.get(pair.collider1)?;
            na_point_to_vec2(&(collider.position() * tracked.local_p1))
        }
    };
    Some((point, normal))
}

impl EventHandler for DirectEventCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        let geometry = match (event, contact_pair) {
            (CollisionEvent::Started(_, _, flags), Some(pair)) if !flags.contains(CollisionEventFlags::SENSOR) => {
                contact_geometry(colliders, pair)
            }
            _ => None,
        };
        self.collisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((event, geometry));
    }

    fn handle_contact_force_event(
        &self,
        _dt: f32,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: f32,
    ) {
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps all Rapier2D boilerplate into a single struct, and remembers which
/// component owns which body.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector2<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    event_collector: DirectEventCollector,
    bindings: HashMap<ComponentRef, PhysicsBody>,
}

impl PhysicsWorld {
    /// Create a new physics world with the given gravity vector.
    /// Positive Y points down.
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity: vec2_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            event_collector: DirectEventCollector::new(),
            bindings: HashMap::new(),
        }
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = vec2_to_na(gravity);
    }

    pub fn gravity(&self) -> Vec2 {
        na_to_vec2(&self.gravity)
    }

    /// Create a rigid body without fixtures.
    /// The ActorId is stored in the body's `user_data` for contact lookups.
    pub fn create_body(&mut self, actor: ActorId, desc: &BodyDesc) -> PhysicsBody {
        let rb = RigidBodyBuilder::new(desc.body_type.to_rapier())
            .translation(vec2_to_na(desc.position))
            .rotation(desc.rotation)
            .linvel(vec2_to_na(desc.velocity))
            .gravity_scale(desc.gravity_scale)
            .locked_axes(if desc.fixed_rotation {
                LockedAxes::ROTATION_LOCKED
            } else {
                LockedAxes::empty()
            })
            .ccd_enabled(desc.ccd)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .user_data(actor.0 as u128)
            .build();

        PhysicsBody {
            body_handle: self.bodies.insert(rb),
        }
    }

    /// Attach a fixture to a body. The category is stored in the collider's `user_data`.
    pub fn attach_fixture(&mut self, body: &PhysicsBody, fixture: &FixtureDesc) -> ColliderHandle {
        let mut builder = fixture
            .shape
            .build_collider()
            .restitution(fixture.material.restitution)
            .friction(fixture.material.friction)
            .density(fixture.material.density)
            .sensor(fixture.category.is_sensor())
            .collision_groups(fixture.category.groups())
            .user_data(fixture.category.to_user_data());

        match fixture.category {
            FixtureCategory::Phantom => {}
            FixtureCategory::Collider => {
                builder = builder.active_events(ActiveEvents::COLLISION_EVENTS);
            }
            FixtureCategory::Trigger => {
                builder = builder
                    .active_events(ActiveEvents::COLLISION_EVENTS)
                    .active_collision_types(ActiveCollisionTypes::all());
            }
        }

        self.colliders
            .insert_with_parent(builder.build(), body.body_handle, &mut self.bodies)
    }

    /// Remove a body and all its fixtures from the simulation.
    pub fn remove_body(&mut self, body: &PhysicsBody) {
        self.bindings.retain(|_, bound| bound != body);
        self.bodies.remove(
            body.body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    // -- Component bindings --

    pub fn bind(&mut self, owner: ComponentRef, body: PhysicsBody) {
        self.bindings.insert(owner, body);
    }

    pub fn body_for(&self, owner: &ComponentRef) -> Option<PhysicsBody> {
        self.bindings.get(owner).copied()
    }

    pub fn unbind(&mut self, owner: &ComponentRef) -> Option<PhysicsBody> {
        self.bindings.remove(owner)
    }

    /// Advance the simulation by `dt` seconds and return the contacts that began or ended.
    /// A non-positive `dt` leaves the world untouched.
    pub fn step(&mut self, dt: f32) -> Vec<ContactEvent> {
        if dt <= 0.0 {
            return Vec::new();
        }
        self.integration_parameters.dt = dt;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.event_collector,
        );

        let mut contacts = Vec::new();
        for (event, geometry) in self.event_collector.drain_collisions() {
            let (h1, h2, phase) = match event {
                CollisionEvent::Started(h1, h2, _) => (h1, h2, ContactPhase::Begin),
                CollisionEvent::Stopped(h1, h2, _) => (h1, h2, ContactPhase::End),
            };

            // Fixtures removed during the step can no longer be resolved.
            if let (Some(a), Some(b)) = (self.contact_side(h1), self.contact_side(h2)) {
                contacts.push(ContactEvent {
                    phase,
                    a,
                    b,
                    geometry: if phase == ContactPhase::Begin { geometry } else { None },
                });
            }
        }
        contacts
    }

    /// Apply a force to a body (continuous — call every frame).
    pub fn apply_force(&mut self, body: &PhysicsBody, force: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.add_force(vec2_to_na(force), true);
        }
    }

    /// Apply an instantaneous impulse to a body.
    pub fn apply_impulse(&mut self, body: &PhysicsBody, impulse: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.apply_impulse(vec2_to_na(impulse), true);
        }
    }

    pub fn apply_torque(&mut self, body: &PhysicsBody, torque: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.add_torque(torque, true);
        }
    }

    pub fn apply_angular_impulse(&mut self, body: &PhysicsBody, impulse: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.apply_torque_impulse(impulse, true);
        }
    }

    pub fn set_gravity_scale(&mut self, body: &PhysicsBody, scale: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_gravity_scale(scale, true);
        }
    }

    pub fn gravity_scale(&self, body: &PhysicsBody) -> f32 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.gravity_scale())
            .unwrap_or(1.0)
    }

    pub fn set_velocity(&mut self, body: &PhysicsBody, vel: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_linvel(vec2_to_na(vel), true);
        }
    }

    pub fn velocity(&self, body: &PhysicsBody) -> Vec2 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_to_vec2(rb.linvel()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn set_angular_velocity(&mut self, body: &PhysicsBody, angvel: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_angvel(angvel, true);
        }
    }

    pub fn angular_velocity(&self, body: &PhysicsBody) -> f32 {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.angvel())
            .unwrap_or(0.0)
    }

    /// Teleport a body.
    pub fn set_position(&mut self, body: &PhysicsBody, pos: Vec2) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_translation(vec2_to_na(pos), true);
        }
    }

    /// Set a body's rotation in radians.
    pub fn set_rotation(&mut self, body: &PhysicsBody, rotation: f32) {
        if let Some(rb) = self.bodies.get_mut(body.body_handle) {
            rb.set_rotation(nalgebra::UnitComplex::new(rotation), true);
        }
    }

    /// Get the current position and rotation (radians) of a body.
    pub fn body_position(&self, body: &PhysicsBody) -> (Vec2, f32) {
        self.bodies
            .get(body.body_handle)
            .map(|rb| na_iso_to_pos_rot(rb.position()))
            .unwrap_or((Vec2::ZERO, 0.0))
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of fixtures attached to a body.
    pub fn fixture_count(&self, body: &PhysicsBody) -> usize {
        self.bodies
            .get(body.body_handle)
            .map(|rb| rb.colliders().len())
            .unwrap_or(0)
    }

    // -- Queries --

    /// The closest non-phantom fixture hit by the ray, if any.
    pub fn raycast(&mut self, origin: Vec2, direction: Vec2, distance: f32) -> Option<RaycastHit> {
        self.raycast_all(origin, direction, distance).into_iter().next()
    }

    /// Every non-phantom fixture hit by the ray, nearest first.
    pub fn raycast_all(&mut self, origin: Vec2, direction: Vec2, distance: f32) -> Vec<RaycastHit> {
        if distance <= 0.0 || direction.length_squared() == 0.0 {
            return Vec::new();
        }
        let dir = direction.normalize();

        // Bodies created since the last step are not in the pipeline yet.
        self.query_pipeline.update(&self.colliders);

        let ray = Ray::new(nalgebra::Point2::new(origin.x, origin.y), vec2_to_na(dir));
        let mut hits: Vec<(f32, RaycastHit)> = Vec::new();
        self.query_pipeline.intersections_with_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            distance,
            true,
            QueryFilter::default(),
            |handle, intersection| {
                let Some(collider) = self.colliders.get(handle) else {
                    return true;
                };
                let category = FixtureCategory::from_user_data(collider.user_data);
                if category == FixtureCategory::Phantom {
                    return true;
                }
                if let Some(actor) = self.collider_to_actor(handle) {
                    let toi = intersection.time_of_impact;
                    hits.push((
                        toi,
                        RaycastHit {
                            actor,
                            point: origin + dir * toi,
                            normal: na_to_vec2(&intersection.normal),
                            is_trigger: category == FixtureCategory::Trigger,
                        },
                    ));
                }
                true
            },
        );

        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, hit)| hit).collect()
    }

    // -- private helpers --

    fn collider_to_actor(&self, collider_handle: ColliderHandle) -> Option<ActorId> {
        let collider = self.colliders.get(collider_handle)?;
        let body_handle = collider.parent()?;
        let body = self.bodies.get(body_handle)?;
        Some(ActorId(body.user_data as u32))
    }

    fn contact_side(&self, collider_handle: ColliderHandle) -> Option<ContactSide> {
        let collider = self.colliders.get(collider_handle)?;
        let body = self.bodies.get(collider.parent()?)?;
        Some(ContactSide {
            actor: ActorId(body.user_data as u32),
            category: FixtureCategory::from_user_data(collider.user_data),
            velocity: na_to_vec2(body.linvel()),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
