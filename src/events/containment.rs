use super::{DateRange, Episode};

/// Tests whether `episode` lies strictly inside one of `ranges`.
///
/// `ranges` must be sorted ascending by start and non-overlapping. The
/// single-range fast path additionally assumes the ranges cover the overall
/// span without gaps; callers whose ranges may leave gaps must not rely on
/// the result for episodes falling into a gap.
pub fn episode_in_ranges(episode: &Episode, ranges: &[DateRange]) -> bool {
    let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
        return false;
    };

    if !(episode.start > first.start && episode.end < last.end) {
        return false;
    }

    if ranges.len() == 1 {
        return true;
    }

    let mid = ranges.len() / 2;
    if episode.end < ranges[mid - 1].end {
        episode_in_ranges(episode, &ranges[..mid])
    } else {
        episode_in_ranges(episode, &ranges[mid..])
    }
}
