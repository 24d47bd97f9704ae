mod classify;
mod cut;
mod fragment;

pub use classify::{classify_loop, LoopClassification, LoopRef};
pub use cut::Cut;
pub use fragment::Fragment;

pub(crate) use fragment::curves_coincide;
