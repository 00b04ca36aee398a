use chrono::{DateTime, Duration, Utc};

use super::{Episode, Message};

/// Tolerance within which an ignition message may be attributed to an
/// episode boundary.
const MATCH_WINDOW_MINUTES: i64 = 30;

/// Which episode boundary a pass matches messages against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    Stop,
}

struct Fold {
    episodes: Vec<Episode>,
    remaining: Vec<Message>,
}

/// Attaches to each episode the nearest qualifying message from `pool`, and
/// returns the episodes with the leftover pool. `Boundary::Start` visits
/// episodes chronologically and matches messages shortly before each start;
/// `Boundary::Stop` runs the same fold over the reversed sequence (so the
/// "previously processed" episode is the chronologically following one) and
/// restores chronological order afterwards.
///
/// A message is claimed by at most one episode, and never across the
/// neighboring episode's opposite boundary.
pub fn attach_messages(
    episodes: Vec<Episode>,
    pool: Vec<Message>,
    boundary: Boundary,
) -> (Vec<Episode>, Vec<Message>) {
    let mut ordered = episodes;
    if boundary == Boundary::Stop {
        ordered.reverse();
    }

    let folded = ordered.into_iter().fold(
        Fold {
            episodes: Vec::new(),
            remaining: pool,
        },
        |accumulator, episode| step(accumulator, episode, boundary),
    );

    let Fold {
        mut episodes,
        remaining,
    } = folded;
    if boundary == Boundary::Stop {
        episodes.reverse();
    }
    (episodes, remaining)
}

fn step(mut accumulator: Fold, mut episode: Episode, boundary: Boundary) -> Fold {
    let opposite_bound = accumulator.episodes.last().map(|previous| match boundary {
        Boundary::Start => previous.end,
        Boundary::Stop => previous.start,
    });

    if let Some(index) = best_candidate(&accumulator.remaining, &episode, opposite_bound, boundary)
    {
        let message = accumulator.remaining.remove(index);
        match boundary {
            Boundary::Start => episode.engine_run_start = Some(message.utc),
            Boundary::Stop => episode.engine_run_stop = Some(message.utc),
        }
    }

    accumulator.episodes.push(episode);
    accumulator
}

/// Index of the qualifying message nearest the boundary, scanning outward
/// from the episode toward (but not past) the opposite bound. Selection
/// compares timestamps only; the pool's order carries no meaning.
fn best_candidate(
    remaining: &[Message],
    episode: &Episode,
    opposite_bound: Option<DateTime<Utc>>,
    boundary: Boundary,
) -> Option<usize> {
    let window = Duration::minutes(MATCH_WINDOW_MINUTES);
    let mut best: Option<(usize, DateTime<Utc>)> = None;

    for (index, message) in remaining.iter().enumerate() {
        let qualifies = match boundary {
            Boundary::Start => {
                message.utc < episode.start
                    && opposite_bound.map_or(true, |bound| message.utc > bound)
                    && message.utc > episode.start - window
            }
            Boundary::Stop => {
                message.utc > episode.end
                    && opposite_bound.map_or(true, |bound| message.utc < bound)
                    && message.utc < episode.end + window
            }
        };
        if !qualifies {
            continue;
        }

        let closer = match (&best, boundary) {
            (None, _) => true,
            (Some((_, best_utc)), Boundary::Start) => message.utc > *best_utc,
            (Some((_, best_utc)), Boundary::Stop) => message.utc < *best_utc,
        };
        if closer {
            best = Some((index, message.utc));
        }
    }

    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MessageKind;
    use chrono::TimeZone;

    fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 9, 24, hour, minute, 0).unwrap()
    }

    fn episode(start: DateTime<Utc>, end: DateTime<Utc>) -> Episode {
        Episode::new(start, end)
    }

    fn start_message(utc: DateTime<Utc>) -> Message {
        Message {
            utc,
            kind: MessageKind::Start,
        }
    }

    fn stop_message(utc: DateTime<Utc>) -> Message {
        Message {
            utc,
            kind: MessageKind::Stop,
        }
    }

    #[test]
    fn picks_the_nearest_start_message_inside_the_window() {
        let episodes = vec![episode(ts(10, 0), ts(10, 30))];
        let pool = vec![
            start_message(ts(9, 55)),
            start_message(ts(9, 20)), // outside the 30-minute window
        ];

        let (matched, remaining) = attach_messages(episodes, pool, Boundary::Start);

        assert_eq!(matched[0].engine_run_start, Some(ts(9, 55)));
        assert_eq!(remaining, vec![start_message(ts(9, 20))]);
    }

    #[test]
    fn prefers_the_latest_qualifying_start_message() {
        let episodes = vec![episode(ts(10, 0), ts(10, 30))];
        let pool = vec![
            start_message(ts(9, 40)),
            start_message(ts(9, 58)),
            start_message(ts(9, 50)),
        ];

        let (matched, remaining) = attach_messages(episodes, pool, Boundary::Start);

        assert_eq!(matched[0].engine_run_start, Some(ts(9, 58)));
        assert_eq!(remaining.len(), 2);
    }

    #[test]
    fn prefers_the_earliest_qualifying_stop_message() {
        let episodes = vec![episode(ts(10, 0), ts(10, 30))];
        let pool = vec![
            stop_message(ts(10, 50)),
            stop_message(ts(10, 33)),
            stop_message(ts(10, 41)),
        ];

        let (matched, remaining) = attach_messages(episodes, pool, Boundary::Stop);

        assert_eq!(matched[0].engine_run_stop, Some(ts(10, 33)));
        assert_eq!(remaining.len(), 2);
    }

    #[test]
    fn a_message_on_the_boundary_does_not_qualify() {
        let episodes = vec![episode(ts(10, 0), ts(10, 30))];
        let pool = vec![start_message(ts(10, 0))];

        let (matched, remaining) = attach_messages(episodes, pool, Boundary::Start);

        assert_eq!(matched[0].engine_run_start, None);
        assert_eq!(remaining.len(), 1);
    }

    #[test]
    fn never_assigns_the_same_message_twice() {
        let episodes = vec![
            episode(ts(10, 0), ts(10, 20)),
            episode(ts(10, 25), ts(10, 50)),
        ];
        // Qualifies for the first episode only; after removal the second
        // episode has nothing left to claim.
        let pool = vec![start_message(ts(9, 55))];

        let (matched, remaining) = attach_messages(episodes, pool, Boundary::Start);

        assert_eq!(matched[0].engine_run_start, Some(ts(9, 55)));
        assert_eq!(matched[1].engine_run_start, None);
        assert!(remaining.is_empty());
    }

    #[test]
    fn start_matching_never_crosses_the_previous_episode_end() {
        let episodes = vec![
            episode(ts(10, 0), ts(10, 40)),
            episode(ts(10, 55), ts(11, 30)),
        ];
        // Inside the second episode's window but before the first episode's
        // end; it may not be pulled backward across that boundary.
        let pool = vec![start_message(ts(10, 35))];

        let (matched, remaining) = attach_messages(episodes, pool, Boundary::Start);

        assert_eq!(matched[1].engine_run_start, None);
        assert_eq!(remaining.len(), 1);
    }

    #[test]
    fn stop_matching_never_crosses_the_following_episode_start() {
        let episodes = vec![
            episode(ts(10, 0), ts(10, 40)),
            episode(ts(10, 55), ts(11, 30)),
        ];
        // After the first episode's end but past the following episode's
        // start; the reverse pass must leave it unclaimed.
        let pool = vec![stop_message(ts(11, 0))];

        let (matched, remaining) = attach_messages(episodes, pool, Boundary::Stop);

        assert_eq!(matched[0].engine_run_stop, None);
        assert_eq!(remaining.len(), 1);
    }

    #[test]
    fn stop_pass_restores_chronological_order() {
        let episodes = vec![
            episode(ts(10, 0), ts(10, 20)),
            episode(ts(11, 0), ts(11, 20)),
        ];
        let pool = vec![stop_message(ts(10, 25)), stop_message(ts(11, 23))];

        let (matched, remaining) = attach_messages(episodes, pool, Boundary::Stop);

        assert_eq!(matched[0].start, ts(10, 0));
        assert_eq!(matched[1].start, ts(11, 0));
        assert_eq!(matched[0].engine_run_stop, Some(ts(10, 25)));
        assert_eq!(matched[1].engine_run_stop, Some(ts(11, 23)));
        assert!(remaining.is_empty());
    }

    #[test]
    fn selection_does_not_depend_on_pool_order() {
        let episodes = vec![episode(ts(10, 0), ts(10, 30))];
        let ascending = vec![start_message(ts(9, 50)), start_message(ts(9, 58))];
        let descending = vec![start_message(ts(9, 58)), start_message(ts(9, 50))];

        let (matched_asc, _) = attach_messages(episodes.clone(), ascending, Boundary::Start);
        let (matched_desc, _) = attach_messages(episodes, descending, Boundary::Start);

        assert_eq!(
            matched_asc[0].engine_run_start,
            matched_desc[0].engine_run_start
        );
        assert_eq!(matched_asc[0].engine_run_start, Some(ts(9, 58)));
    }

    #[test]
    fn assigned_and_remaining_partition_the_pool() {
        let episodes = vec![
            episode(ts(10, 0), ts(10, 20)),
            episode(ts(11, 0), ts(11, 20)),
        ];
        let pool = vec![
            start_message(ts(9, 45)),
            start_message(ts(10, 50)),
            start_message(ts(8, 0)),
        ];

        let (matched, remaining) = attach_messages(episodes, pool.clone(), Boundary::Start);

        let mut seen: Vec<DateTime<Utc>> = matched
            .iter()
            .filter_map(|episode| episode.engine_run_start)
            .chain(remaining.iter().map(|message| message.utc))
            .collect();
        seen.sort();
        let mut expected: Vec<DateTime<Utc>> = pool.iter().map(|message| message.utc).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }
}
