pub mod config;
pub mod error;
pub mod export;
pub mod kernel;
pub mod prefs;
pub mod runtime;
pub mod services;

pub use error::{DashboardError, Result};
pub use kernel::reactor::Reactor;
pub use runtime::{Runtime, RuntimeHandle};
