mod keep_only;
mod set_mesh_step;
mod tag_region;

pub use keep_only::KeepOnly;
pub use set_mesh_step::SetMeshStep;
pub use tag_region::TagRegion;
