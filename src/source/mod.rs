// Engine adapters — the boundary to the external page-quality engine.

pub mod lighthouse;
pub mod process;
pub mod traits;
