pub mod events;
pub mod flow;
pub mod session;
pub mod state;
pub mod sync;

pub use events::EngineEvent;
pub use session::Session;
pub use state::{FlowState, SyncState};
