pub mod flags;
pub mod grid;
pub mod math;
pub mod scene;
pub mod time;
pub mod world;
