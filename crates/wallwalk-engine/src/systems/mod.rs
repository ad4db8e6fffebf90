pub mod brain;
pub mod motion;
pub mod placement;
pub mod registry;
pub mod stepping;
