//! Validation of detections against ground truth and evaluation curves.

pub mod matching;
pub mod perf;
pub mod run;
pub mod valset;

pub use matching::{match_dets, validate, validate_tagged, TmplValDet, TmplValImage, ValDet, ValImage};
pub use perf::{Perf, PerfPath};
pub use run::{evaluate_batch, evaluate_image, Annotated, ValidateConfig};
pub use valset::{ValScore, ValSet};
