pub mod component;
pub mod registry;
pub mod rigidbody;
