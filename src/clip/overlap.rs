// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Overlap resolution for a track's clip list.

use tracing::debug;

use super::edit::{trim_end, trim_start};
use super::{Clip, ClipId};
use crate::timing::TimelineClock;

/// Trim `loser` so it no longer overlaps `winner`
///
/// A loser starting before the winner keeps only its material up to the
/// winner's start. A loser starting inside the winner keeps only what lies
/// past the winner's effective end.
fn trim_against(loser: &Clip, winner: &Clip, clock: &TimelineClock) -> Option<Clip> {
    let trimmed = if loser.start < winner.start {
        trim_end(loser, winner.start)
    } else {
        trim_start(loser, winner.effective_end(), clock)
    };

    match trimmed {
        Some(ref clip) => debug!(
            "Clip {} trimmed to {}..{} by clip {}",
            clip.id,
            clip.start,
            clip.effective_end(),
            winner.id
        ),
        None => debug!("Clip {} removed, covered by clip {}", loser.id, winner.id),
    }
    trimmed
}

/// Remove every overlap from a clip list
///
/// The clip named by `just_placed` always wins. Remaining conflicts go to
/// the later-starting clip, or for equal starts to the one later in the
/// list. The result is sorted by start; running it again is a no-op.
pub fn resolve_overlaps(
    clips: &[Clip],
    just_placed: Option<ClipId>,
    clock: &TimelineClock,
) -> Vec<Clip> {
    let winner = just_placed.and_then(|id| clips.iter().find(|clip| clip.id == id));

    let mut pending: Vec<Clip> = clips
        .iter()
        .filter_map(|clip| match winner {
            Some(winner) if clip.id != winner.id && clip.overlaps(winner) => {
                trim_against(clip, winner, clock)
            }
            _ => Some(clip.clone()),
        })
        .collect();
    pending.sort_by(|a, b| a.start.cmp(&b.start));

    let mut resolved: Vec<Clip> = Vec::with_capacity(pending.len());
    for clip in pending {
        while let Some(last) = resolved.last() {
            if !last.overlaps(&clip) {
                break;
            }
            // Sorted input: `last` never starts after `clip`
            match trim_end(last, clip.start) {
                Some(trimmed) => {
                    debug!("Clip {} tail trimmed to {} by clip {}", trimmed.id, clip.start, clip.id);
                    let len = resolved.len();
                    resolved[len - 1] = trimmed;
                }
                None => {
                    debug!("Clip {} removed, replaced by clip {}", last.id, clip.id);
                    resolved.pop();
                }
            }
        }
        resolved.push(clip);
    }
    resolved
}

/// Whether any two clips' occupied regions intersect
pub fn has_overlaps(clips: &[Clip]) -> bool {
    let mut sorted: Vec<&Clip> = clips.iter().collect();
    sorted.sort_by(|a, b| a.start.cmp(&b.start));

    let mut reach = None;
    for clip in sorted {
        if let Some(end) = reach {
            if clip.start < end {
                return true;
            }
        }
        reach = Some(match reach {
            Some(end) if end > clip.effective_end() => end,
            _ => clip.effective_end(),
        });
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipKind;
    use crate::position::Position;
    use crate::timing::TimeSignature;

    fn pos(measure: u32, beat: u32, fraction: u32) -> Position {
        Position::new(measure, beat, fraction, TimeSignature::FOUR_FOUR).unwrap()
    }

    fn clip(id: u64, start: Position, end: Position) -> Clip {
        Clip::new(ClipId(id), format!("Clip {}", id), ClipKind::Audio, start, end).unwrap()
    }

    #[test]
    fn test_later_start_wins() {
        let clock = TimelineClock::default();
        let clips = vec![clip(1, pos(1, 1, 0), pos(2, 1, 0)), clip(2, pos(1, 3, 0), pos(2, 3, 0))];

        let resolved = resolve_overlaps(&clips, None, &clock);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].end, pos(1, 3, 0));
        assert_eq!(resolved[1], clips[1]);
        assert!(!has_overlaps(&resolved));
    }

    #[test]
    fn test_just_placed_wins_over_later_clip() {
        let clock = TimelineClock::default();
        let clips = vec![clip(1, pos(1, 1, 0), pos(2, 1, 0)), clip(2, pos(1, 3, 0), pos(2, 3, 0))];

        let resolved = resolve_overlaps(&clips, Some(ClipId(1)), &clock);
        assert_eq!(resolved[0], clips[0]);
        // Clip 2 loses its head up to the end of clip 1
        assert_eq!(resolved[1].id, ClipId(2));
        assert_eq!((resolved[1].start, resolved[1].end), (pos(2, 1, 0), pos(2, 3, 0)));
    }

    #[test]
    fn test_covered_clip_is_removed() {
        let clock = TimelineClock::default();
        let clips = vec![clip(1, pos(1, 2, 0), pos(1, 3, 0)), clip(2, pos(1, 1, 0), pos(2, 1, 0))];

        let resolved = resolve_overlaps(&clips, Some(ClipId(2)), &clock);
        assert_eq!(resolved, vec![clips[1].clone()]);
    }

    #[test]
    fn test_looped_tail_is_trimmed() {
        let clock = TimelineClock::default();
        let looped = clip(1, pos(1, 1, 0), pos(1, 2, 0))
            .with_loop_end(pos(3, 1, 0))
            .unwrap();
        let clips = vec![looped, clip(2, pos(2, 1, 0), pos(2, 2, 0))];

        let resolved = resolve_overlaps(&clips, Some(ClipId(2)), &clock);
        assert_eq!(resolved[0].end, pos(1, 2, 0));
        assert_eq!(resolved[0].loop_end, Some(pos(2, 1, 0)));
        assert!(!has_overlaps(&resolved));
    }

    #[test]
    fn test_equal_starts_later_in_list_wins() {
        let clock = TimelineClock::default();
        let clips = vec![clip(1, pos(1, 1, 0), pos(2, 1, 0)), clip(2, pos(1, 1, 0), pos(1, 2, 0))];

        let resolved = resolve_overlaps(&clips, None, &clock);
        assert_eq!(resolved, vec![clips[1].clone()]);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let clock = TimelineClock::default();
        let clips = vec![
            clip(3, pos(3, 1, 0), pos(5, 1, 0)),
            clip(1, pos(1, 1, 0), pos(4, 1, 0)),
            clip(2, pos(2, 1, 0), pos(2, 3, 0)),
        ];

        let once = resolve_overlaps(&clips, Some(ClipId(2)), &clock);
        assert!(!has_overlaps(&once));
        assert_eq!(resolve_overlaps(&once, None, &clock), once);
        assert_eq!(resolve_overlaps(&once, Some(ClipId(2)), &clock), once);
    }

    #[test]
    fn test_has_overlaps_sees_past_short_clips() {
        let clips = vec![
            clip(1, pos(1, 1, 0), pos(4, 1, 0)),
            clip(2, pos(2, 1, 0), pos(2, 2, 0)),
            clip(3, pos(3, 1, 0), pos(3, 2, 0)),
        ];
        assert!(has_overlaps(&clips));
        assert!(!has_overlaps(&clips[1..]));
    }
}
