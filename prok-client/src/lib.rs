// Library interface for the prok client (used by the binary and the tests)
#[macro_use]
pub mod logging;

pub mod api;
pub mod auth;
pub mod compose;
pub mod config;
pub mod debounce;
pub mod feed;
pub mod scroll;
pub mod server_config;
pub mod session;
