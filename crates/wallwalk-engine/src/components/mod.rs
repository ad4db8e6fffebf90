pub mod effector;
pub mod entity;
pub mod moves;
pub mod obstacle;
pub mod requests;
pub mod surface;
