pub mod config;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use config::{Environment, Settings};
pub use router::{App, create_app, create_router};
pub use state::AppState;
