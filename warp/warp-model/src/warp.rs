//! Offset-frame warping.

use crate::validation::{FrameResolution, assess, frame_checks};
use crate::{
    FrameGraph, FrameId, ModelWarpError, ModelWarpResult, OffsetFrame, ValidationCheckState,
    ValidationReport, frame_from_points,
};
use nalgebra::{Isometry3, Translation3};
use tracing::{debug, info, warn};
use warp_document::{LandmarkDocument, OffsetFrameFallbackStrategy};
use warp_tps::{TpsCoefficients, solve_pairs, warp_point};

/// What a model warp did to one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameDisposition {
    /// Rebuilt from its warped landmarks.
    Rebuilt,
    /// Origin warped, orientation kept.
    PositionOnly,
    /// Left as it was.
    Unchanged,
}

/// Summary of a model warp.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameWarpOutput {
    /// Per-frame outcome, in graph order.
    pub dispositions: Vec<(FrameId, FrameDisposition)>,
    /// The validation pass the warp was gated on.
    pub report: ValidationReport,
}

impl FrameWarpOutput {
    /// Number of frames with the given outcome.
    #[must_use]
    pub fn count(&self, disposition: FrameDisposition) -> usize {
        self.dispositions
            .iter()
            .filter(|(_, d)| *d == disposition)
            .count()
    }

    /// Outcome for frame `id`.
    #[must_use]
    pub fn disposition(&self, id: FrameId) -> Option<FrameDisposition> {
        self.dispositions
            .iter()
            .find(|(f, _)| *f == id)
            .map(|(_, d)| *d)
    }
}

/// Warps every offset frame of `graph`.
///
/// The document's blend factor applies to every frame. Frames are
/// validated first; under [`OffsetFrameFallbackStrategy::Error`] any frame
/// that cannot be rebuilt from its landmarks blocks the whole warp. All new
/// transforms are computed before any is written, so the graph is either
/// fully updated or untouched.
///
/// # Errors
///
/// Returns an error if:
/// - Any frame check is `Error` ([`ModelWarpError::BlockedByValidation`])
/// - A warped frame is degenerate or non-finite
///
/// # Example
///
/// ```
/// use warp_document::{LandmarkDocument, OffsetFrameFallbackStrategy};
/// use warp_model::{FrameDefinition, FrameId, FrameGraph, FrameSet, OffsetFrame, warp_frames};
/// use warp_tps::{TpsSolverInputs, solve_pairs};
/// use warp_types::InputSide;
/// use nalgebra::{Isometry3, Point3, Vector3};
///
/// let mut doc = LandmarkDocument::new();
/// for (name, p) in [("o", [0.0, 0.0, 0.0]), ("x", [1.0, 0.0, 0.0]), ("y", [0.0, 1.0, 0.0]), ("z", [0.0, 0.0, 1.0])] {
///     let p = Point3::from(p);
///     doc.add_landmark_to_input(InputSide::Source, p, Some(name)).unwrap();
///     doc.add_landmark_to_input(InputSide::Destination, p + Vector3::new(5.0, 0.0, 0.0), Some(name)).unwrap();
/// }
/// let coefs = solve_pairs(&doc.participating_pairs(), &TpsSolverInputs::default()).unwrap();
///
/// let mut frames = FrameSet::new().with_frame(
///     OffsetFrame::new(FrameId::new(1), "base", Isometry3::identity())
///         .with_definition(FrameDefinition::landmarks("o", "x", "y")),
/// );
///
/// warp_frames(&coefs, &doc, &mut frames, OffsetFrameFallbackStrategy::Error).unwrap();
/// let moved = frames.frame(FrameId::new(1)).unwrap().local_transform;
/// assert!((moved.translation.vector - Vector3::new(5.0, 0.0, 0.0)).norm() < 1e-6);
/// ```
pub fn warp_frames<G>(
    coefs: &TpsCoefficients,
    document: &LandmarkDocument,
    graph: &mut G,
    strategy: OffsetFrameFallbackStrategy,
) -> ModelWarpResult<FrameWarpOutput>
where
    G: FrameGraph + ?Sized,
{
    let (report, resolutions) = assess(document, &*graph, strategy);

    let errors = report.frame_errors();
    if !errors.is_empty() {
        warn!(
            frames = errors.len(),
            strategy = strategy.label(),
            "Model warp blocked by validation"
        );
        return Err(ModelWarpError::BlockedByValidation { errors });
    }

    let blend = document.settings().blend_factor;
    let mut updates = Vec::new();
    let mut dispositions = Vec::with_capacity(resolutions.len());
    for (id, resolution) in &resolutions {
        let frame = graph
            .frame(*id)
            .ok_or(ModelWarpError::UnknownFrame { id: *id })?;
        let planned = plan_frame(coefs, frame, resolution, strategy, blend)?;
        let disposition = match planned {
            Some((transform, disposition)) => {
                updates.push((*id, transform));
                disposition
            }
            None => FrameDisposition::Unchanged,
        };
        dispositions.push((*id, disposition));
    }

    for (id, transform) in updates {
        let applied = graph.set_local_transform(id, transform);
        debug_assert!(applied, "frame {id} vanished during warp");
    }

    let output = FrameWarpOutput {
        dispositions,
        report,
    };
    info!(
        frames = output.dispositions.len(),
        rebuilt = output.count(FrameDisposition::Rebuilt),
        position_only = output.count(FrameDisposition::PositionOnly),
        unchanged = output.count(FrameDisposition::Unchanged),
        blend,
        "Frame warp complete"
    );
    Ok(output)
}

/// Warps a single offset frame.
///
/// # Errors
///
/// Returns [`ModelWarpError::UnknownFrame`] if `id` is not in `graph`, and
/// otherwise the same errors as [`warp_frames`].
pub fn warp_frame<G>(
    coefs: &TpsCoefficients,
    document: &LandmarkDocument,
    graph: &mut G,
    id: FrameId,
    strategy: OffsetFrameFallbackStrategy,
) -> ModelWarpResult<FrameDisposition>
where
    G: FrameGraph + ?Sized,
{
    let frame = graph.frame(id).ok_or(ModelWarpError::UnknownFrame { id })?;
    let (resolution, checks) = frame_checks(document, frame, strategy);

    let errors: Vec<_> = checks
        .into_iter()
        .filter(|c| c.state == ValidationCheckState::Error)
        .collect();
    if !errors.is_empty() {
        return Err(ModelWarpError::BlockedByValidation { errors });
    }

    let planned = plan_frame(
        coefs,
        frame,
        &resolution,
        strategy,
        document.settings().blend_factor,
    )?;
    Ok(match planned {
        Some((transform, disposition)) => {
            graph.set_local_transform(id, transform);
            disposition
        }
        None => FrameDisposition::Unchanged,
    })
}

/// Solves the document and warps every frame with its own settings.
///
/// # Errors
///
/// Returns [`ModelWarpError::Solver`] if the document cannot be solved, and
/// otherwise the same errors as [`warp_frames`].
pub fn warp_model<G>(document: &LandmarkDocument, graph: &mut G) -> ModelWarpResult<FrameWarpOutput>
where
    G: FrameGraph + ?Sized,
{
    let settings = document.settings();
    let coefs = solve_pairs(&document.participating_pairs(), &settings.solver)?;
    warp_frames(&coefs, document, graph, settings.fallback_strategy)
}

/// Computes the new transform of one frame without writing it.
fn plan_frame(
    coefs: &TpsCoefficients,
    frame: &OffsetFrame,
    resolution: &FrameResolution,
    strategy: OffsetFrameFallbackStrategy,
    blend: f64,
) -> ModelWarpResult<Option<(Isometry3<f64>, FrameDisposition)>> {
    let id = frame.id;
    match (resolution, strategy) {
        (FrameResolution::Exact(pairs), _) => {
            let [src_origin, src_axis, src_plane] = pairs.map(|p| p.source);
            let [origin, axis, plane] = pairs.map(|p| warp_point(coefs, &p.source, blend));
            let (Some(source), Some(warped)) = (
                frame_from_points(&src_origin, &src_axis, &src_plane),
                frame_from_points(&origin, &axis, &plane),
            ) else {
                return Err(ModelWarpError::DegenerateFrame { id });
            };
            // Keep the frame's offset from its landmark frame
            let transform = warped * source.inverse() * frame.local_transform;
            debug!(%id, name = %frame.name, "Rebuilt frame from landmarks");
            Ok(Some((transform, FrameDisposition::Rebuilt)))
        }
        (FrameResolution::Inexact { reason, .. }, OffsetFrameFallbackStrategy::WarpPosition) => {
            let origin = warp_point(coefs, &frame.origin(), blend);
            if !origin.iter().all(|c| c.is_finite()) {
                return Err(ModelWarpError::DegenerateFrame { id });
            }
            warn!(%id, name = %frame.name, %reason, "Warping frame origin only");
            let transform = Isometry3::from_parts(
                Translation3::from(origin.coords),
                frame.local_transform.rotation,
            );
            Ok(Some((transform, FrameDisposition::PositionOnly)))
        }
        (FrameResolution::Inexact { reason, .. }, OffsetFrameFallbackStrategy::Ignore) => {
            warn!(%id, name = %frame.name, %reason, "Leaving frame unwarped");
            Ok(None)
        }
        (FrameResolution::Inexact { reason, .. }, OffsetFrameFallbackStrategy::Error) => {
            // Callers reject Error-state frames before planning
            warn!(%id, name = %frame.name, %reason, "Frame is not warpable");
            Ok(None)
        }
    }
}
