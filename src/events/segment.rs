use chrono::{DateTime, Duration, Utc};

use super::{Episode, TimeBucket};

/// Engine-active seconds marking a half-full minute bucket. An opening
/// bucket at or under this suggests the engine started partway through the
/// bucket; a closing bucket under it suggests it stopped early in the bucket.
const HALF_BUCKET_SECONDS: f64 = 30.0;
/// Engine-active seconds of a fully active minute bucket.
const FULL_BUCKET_SECONDS: f64 = 60.0;

const HALF_BUCKET_SHIFT: i64 = 30;
const FULL_BUCKET_SHIFT: i64 = 60;

/// Turns the per-minute duration-sum series into contiguous active episodes
/// with sub-bucket boundary refinement. Missing sums count as 0; a bucket
/// never both opens and closes an episode; an episode still open at the end
/// of the series is dropped.
pub fn segment_episodes(buckets: &[TimeBucket]) -> Vec<Episode> {
    let mut episodes = Vec::new();
    let mut open: Option<DateTime<Utc>> = None;

    for bucket in buckets {
        let sum = bucket.sum.unwrap_or(0.0);
        match open {
            None if sum > 0.0 => {
                let start = if sum > HALF_BUCKET_SECONDS {
                    bucket.time
                } else {
                    bucket.time + Duration::seconds(HALF_BUCKET_SHIFT)
                };
                open = Some(start);
            }
            Some(start) if sum < FULL_BUCKET_SECONDS => {
                let end = if sum < HALF_BUCKET_SECONDS {
                    bucket.time - Duration::seconds(FULL_BUCKET_SHIFT)
                } else {
                    bucket.time - Duration::seconds(HALF_BUCKET_SHIFT)
                };
                episodes.push(Episode::new(start, end));
                open = None;
            }
            _ => {}
        }
    }

    episodes
}
