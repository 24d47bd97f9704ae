mod boundary;
mod select_by_intersect;

pub use boundary::Boundary;
pub use select_by_intersect::SelectByIntersect;
