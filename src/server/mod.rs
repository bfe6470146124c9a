// HTTP surface — audit endpoint, stats and server lifecycle.

pub mod handler;
