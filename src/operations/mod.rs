pub mod boolean;
pub mod creation;
pub mod modification;
pub mod query;
pub mod transform;
