pub mod contact;
pub mod dispatch;
pub mod events;
pub mod lifecycle;
