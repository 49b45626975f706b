pub mod commands;
pub mod model;
pub mod status;
pub mod transform;
