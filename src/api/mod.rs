// Caller-facing helpers — tracing setup and the HTTP client used by front ends.

pub mod client;
pub mod simple;
