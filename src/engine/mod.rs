//! The guess evaluation and scoring engine: pure, synchronous transforms
//! over a session snapshot. All I/O and suspension happens at the boundary
//! (store, transport); nothing in here reads the clock or blocks.

pub mod codec;
pub mod coloring;
pub mod models;
pub mod normalize;
pub mod oracle;
pub mod records;
pub mod scoring;
pub mod session;
