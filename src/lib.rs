// Library surface shared by the binary and the integration tests.
pub mod aggregate;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod lesson;
pub mod logging;
pub mod scorer;
pub mod selection;
pub mod session;
pub mod stats;
pub mod util;
