pub mod builtins;
pub mod runner;

pub use runner::GameRunner;
