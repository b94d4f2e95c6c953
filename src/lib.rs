//! slidedet is a CPU sliding-window detection library.
//!
//! It computes dense correlation responses of feature templates over
//! multi-scale feature pyramids, choosing between naive, FFT and dense
//! matrix algorithms by estimated cost. On top of the correlation engine it
//! provides candidate extraction, greedy non-maximum suppression (exhaustive
//! or indexed by pyramid cell) and greedy validation against ground truth
//! with ROC-style operating points.
//!
//! Optional features: `rayon` (parallel kernels, levels and batches),
//! `tracing` (spans and events), `serde` (configuration types) and
//! `image-io` (loading images from disk).

pub mod detect;
pub mod eval;
pub mod feature;
pub mod image;
pub mod kernel;
mod trace;
pub mod util;

pub use detect::{
    detect_batch, detect_multi_scale, detect_multi_scale_many, detect_pyramid, suppress, Det,
    DetectConfig, FeatTemplate, MultiScaleConfig, Overlap, OverlapTest, PadRect, Rect, TmplDet,
};
pub use eval::{
    match_dets, validate, validate_tagged, Perf, PerfPath, TmplValImage, ValImage, ValSet,
    ValidateConfig,
};
pub use feature::{
    FeaturePyramid, FeaturePyramidGenerator, FeatureTransform, Margin, Pad, PyramidGeometry,
    Transform,
};
pub use image::pyramid::{GeoSeq, ImagePyramid, ImagePyramidGenerator};
pub use image::resize::Interp;
pub use image::{Image, MultiImage};
pub use kernel::scorer::{AffineScorer, Scorer};
pub use kernel::{corr, corr_multi, corr_multi_bank, Algo, Bank, MultiBank};
pub use util::{SlideDetError, SlideDetResult};
