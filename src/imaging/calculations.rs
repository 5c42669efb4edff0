//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// What a resize step should do to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePlan {
    /// Leave the image as it is.
    Keep,
    /// Shrink to fit the box, preserving aspect ratio.
    Fit { width: u32, height: u32 },
    /// Force the exact box, ignoring aspect ratio.
    Exact { width: u32, height: u32 },
}

/// Decide how to resize `source` for a `target` box.
///
/// Without `upscale`, resizing only happens when a source dimension exceeds
/// the box, and the result fits inside it. With `upscale`, the result is the
/// box itself regardless of direction.
///
/// # Examples
/// ```
/// # use thumbnail_works::imaging::calculations::{plan_resize, ResizePlan};
/// assert_eq!(plan_resize((256, 256), (32, 32), false), ResizePlan::Fit { width: 32, height: 32 });
/// assert_eq!(plan_resize((20, 10), (40, 40), false), ResizePlan::Keep);
/// assert_eq!(plan_resize((20, 10), (40, 40), true), ResizePlan::Exact { width: 40, height: 40 });
/// ```
pub fn plan_resize(source: (u32, u32), target: (u32, u32), upscale: bool) -> ResizePlan {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    if source == target {
        return ResizePlan::Keep;
    }
    if upscale {
        return ResizePlan::Exact {
            width: tgt_w,
            height: tgt_h,
        };
    }
    if src_w <= tgt_w && src_h <= tgt_h {
        return ResizePlan::Keep;
    }
    let (width, height) = fit_within(source, target);
    ResizePlan::Fit { width, height }
}

/// Largest dimensions with the source aspect ratio that fit inside `target`.
///
/// Neither returned dimension is ever zero.
pub fn fit_within(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let ratio = (tgt_w as f64 / src_w as f64).min(tgt_h as f64 / src_h as f64);
    let w = ((src_w as f64 * ratio).round() as u32).clamp(1, tgt_w.max(1));
    let h = ((src_h as f64 * ratio).round() as u32).clamp(1, tgt_h.max(1));
    (w, h)
}
