pub mod config;
pub mod curve;
pub mod region;

pub use config::{GeometryConfig, OpeningMode};
pub use curve::{Curve, EllipticArc, Segment};
pub use region::{RegionTag, Side};
