//! Width-bounded aggregation of a sample series into bars.
//!
//! Each bar needs at least 3px (a 2px bar plus 1px gap), so a strip of
//! `width` pixels can legibly show `width / 3` bars. Longer series are cut
//! into contiguous groups of equal size (the last group may be shorter) and
//! every group becomes one bucket carrying its majority status.

use super::models::{Bucket, Sample, Status};

/// Footprint of one bar in pixels, gap included.
pub const MIN_BAR_FOOTPRINT: u32 = 3;

/// Width assumed when the strip has not been laid out yet.
pub const FALLBACK_WIDTH: u32 = 800;

/// Narrow bar width, used for crowded strips.
pub const NARROW_BAR_PX: u32 = 2;

/// Default bar width.
pub const WIDE_BAR_PX: u32 = 3;

/// Replace a non-positive measured width with [`FALLBACK_WIDTH`].
pub fn effective_width(measured: i64) -> u32 {
    if measured <= 0 {
        FALLBACK_WIDTH
    } else {
        u32::try_from(measured).unwrap_or(u32::MAX)
    }
}

/// Number of bars a strip of `available_px` can hold.
pub fn max_bars(available_px: u32) -> usize {
    (available_px / MIN_BAR_FOOTPRINT) as usize
}

/// Samples per bucket for a series of `len` samples.
pub fn group_size(len: usize, available_px: u32) -> usize {
    // A strip narrower than one footprint still gets a single bar.
    let max_bars = max_bars(available_px).max(1);
    if len <= max_bars {
        1
    } else {
        len.div_ceil(max_bars)
    }
}

/// Collapse `samples` into ordered buckets that fit in `available_px`.
///
/// Every sample lands in exactly one bucket and bucket order follows sample
/// order. Ties between up and down resolve to up.
pub fn aggregate(samples: &[Sample], available_px: u32) -> Vec<Bucket> {
    if samples.is_empty() {
        return Vec::new();
    }

    let size = group_size(samples.len(), available_px);

    tracing::debug!(
        "Bucketizer: width={}px points={} max_bars={} group_size={}",
        available_px,
        samples.len(),
        max_bars(available_px),
        size
    );

    samples.chunks(size).map(bucket_from_run).collect()
}

fn bucket_from_run(run: &[Sample]) -> Bucket {
    let up_count = run.iter().filter(|s| s.status.is_up()).count();
    let down_count = run.len() - up_count;
    let dominant_status = if up_count >= down_count {
        Status::Up
    } else {
        Status::Down
    };

    // chunks() never yields an empty slice
    let start_time = run.first().map(|s| s.timestamp.clone()).unwrap_or_default();
    let end_time = run.last().map(|s| s.timestamp.clone()).unwrap_or_default();

    Bucket {
        dominant_status,
        sample_count: run.len(),
        up_count,
        down_count,
        start_time,
        end_time,
    }
}

/// Pixel width for each bar, chosen from the bucket count (not the sample count).
pub fn bar_width(bucket_count: usize, available_px: u32) -> u32 {
    if bucket_count.saturating_mul(4) > available_px as usize {
        NARROW_BAR_PX
    } else {
        WIDE_BAR_PX
    }
}
