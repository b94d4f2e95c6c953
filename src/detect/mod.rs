//! Detection: candidate extraction, non-maximum suppression and the
//! multi-scale search pipeline.

pub mod det;
pub mod lookup;
pub mod nms;
pub mod overlap;
pub mod points;
pub mod rect;
pub mod search;
pub mod template;

pub use det::{merge_all_dets, merge_dets, sort_dets, Det, TmplDet};
pub use lookup::{suppress_pyramid_exhaustive, suppress_pyramid_indexed};
pub use nms::{suppress, suppress_indices};
pub use overlap::{Overlap, OverlapTest};
pub use points::{PointFilter, PyrDet, ScoredPoint};
pub use rect::{set_aspect, AspectMode, PadRect, Rect};
pub use search::{
    detect_batch, detect_multi_scale, detect_multi_scale_many, detect_points, detect_pyramid, DetectConfig,
    MultiScaleConfig,
};
pub use template::FeatTemplate;
