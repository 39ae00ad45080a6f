pub mod assets;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;

pub use router::build_router;
pub use server::{GatewayServer, migrate_database};
pub use state::{AppState, SharedState};
