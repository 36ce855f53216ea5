// Core module - Session engine and its collaborators
pub mod dispatch;
pub mod identity;
pub mod memory;
pub mod platform;
pub mod protocol;
pub mod recovery;
pub mod session;
pub mod shell;
