// Orchestration core — gate, cache, retry, median sampling and the request path
// that ties them together.

pub mod cache;
pub mod cancel;
pub mod gate;
pub mod median;
pub mod orchestrator;
pub mod retry;
pub mod runner;
pub mod stats;
