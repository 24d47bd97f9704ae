pub mod config;
pub mod domain;
pub mod error;
pub mod geometry;
pub mod heal;
pub mod math;
pub mod mesh;
pub mod model;
pub mod operations;
pub mod results;
pub mod simulation;
pub mod solver;

pub use error::{FlowMcError, Result};
