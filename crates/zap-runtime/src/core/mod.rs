pub mod actor;
pub mod physics;
pub mod scene;
pub mod time;
