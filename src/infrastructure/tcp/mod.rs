// TCP module - Single-client session transport
pub mod server;

pub use server::{Reply, SessionTransport};
