pub mod error;
pub mod extract;
pub mod middleware;
pub mod questions;
pub mod rooms;
pub mod routes;
pub mod secrets;
pub mod state;

pub use routes::router;
pub use state::{AppState, AppStateInner};
