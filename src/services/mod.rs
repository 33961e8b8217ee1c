pub mod device;
pub mod sse;
