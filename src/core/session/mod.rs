// Session module - Connection lifecycle and the serve loop
pub mod session;
pub mod state;

pub use session::{RunExit, RunMode, Session, SessionDeps};
pub use state::{ShellState, TransportState};
