//! Offset-frame validation and warping.
//!
//! A model carries rigid offset frames (attachment points) whose placement
//! should follow a landmark warp. A thin-plate spline does not transform
//! orientations rigidly, so a frame is only warped exactly when it is
//! spanned by three landmarks:
//!
//! - [`OffsetFrame`] / [`FrameDefinition`] - A frame and its landmark association
//! - [`FrameGraph`] - The trait a model implements to expose its frames
//! - [`FrameSet`] - An in-memory frame list
//! - [`validate_frames`] - Classifies every frame as Ok, Warning or Error
//! - [`warp_frames`] - Applies a solved warp to every frame, all or nothing
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**.
//!
//! # Fallback Strategies
//!
//! | Strategy | Frame state | Effect |
//! |----------|-------------|--------|
//! | [`Error`](OffsetFrameFallbackStrategy::Error) | Error | The whole warp fails |
//! | [`Ignore`](OffsetFrameFallbackStrategy::Ignore) | Warning | Frame left unwarped |
//! | [`WarpPosition`](OffsetFrameFallbackStrategy::WarpPosition) | Warning | Origin warped, orientation kept |
//!
//! Frames that resolve to three unique, non-collinear landmark pairs are
//! rebuilt from the warped landmarks and validate as Ok under any strategy.
//! A rebuilt frame keeps its offset from the basis of its source landmarks.
//!
//! # Coordinate System
//!
//! Frame transforms are expressed in the source landmark space. The rebuilt
//! basis is right-handed: x toward the axis landmark, z normal to the
//! landmark plane.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod error;
mod frame;
mod validation;
mod warp;

pub use error::{ModelWarpError, ModelWarpResult};
pub use frame::{
    DEGENERACY_EPSILON, FrameDefinition, FrameGraph, FrameId, FrameSet, OffsetFrame,
    frame_from_points,
};
pub use validation::{
    FrameResolution, ValidationCheck, ValidationCheckState, ValidationReport, ValidationSubject,
    resolve_frame, validate_document, validate_frames,
};
pub use warp::{FrameDisposition, FrameWarpOutput, warp_frame, warp_frames, warp_model};

pub use warp_document::OffsetFrameFallbackStrategy;
