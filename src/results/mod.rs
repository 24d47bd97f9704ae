//! Result format, extraction and validation.

mod collect;
mod format;
mod observe;
mod validate;

pub use collect::{collect_results, ExtractConfig};
pub use format::{output_times, OutputTimes, QuantitySpec};
pub use observe::{ObserveData, ObservePoint, ObserveRecord, OBSERVE_FILE};
pub use validate::validate;
