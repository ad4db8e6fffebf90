pub mod pose;

pub use pose::{PoseBuffer, PoseInstance};
