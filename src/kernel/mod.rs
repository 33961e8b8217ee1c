pub mod connection;
pub mod effect;
pub mod event;
pub mod reactor;
pub mod state;
pub mod stats;
pub mod telemetry;
pub mod time;
pub mod window;
