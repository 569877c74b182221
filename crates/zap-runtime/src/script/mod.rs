pub mod behavior;
pub mod runtime;
