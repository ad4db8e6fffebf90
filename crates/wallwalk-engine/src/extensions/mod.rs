// extensions/mod.rs
//
// Presentation helpers layered over the simulation core.
// Nothing in here mutates grid state.

pub mod easing;

pub use easing::Easing;
