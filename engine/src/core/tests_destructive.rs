//! Destructive and Edge Case Tests for the Cue Engine
//!
//! These tests drive the store through hostile edit sequences and check the
//! invariants every other module relies on: intervals stay positive, approved
//! neighbours never overlap, flagging is idempotent and matching is stable.

use crate::core::commands::{
    AddCueCommand, Command, CommandExecutor, CommandOutcome, CommandResult, DeleteCueCommand,
    MergeCuesCommand, ShiftCuesCommand, SplitCueCommand, UpdateCueCommand,
};
use crate::core::cues::{parse_srt, Cue, CueStore, TrackMeta};
use crate::core::matching::match_cue_lines;
use crate::core::validation::{
    apply_edit, mark_cues, ErrorTag, ProposedEdit, SubtitleSpecification, ValidationContext,
};
use crate::core::{MediaChunk, TimeRange, TIME_EPSILON};

fn store_with(intervals: &[(f64, f64)]) -> CueStore {
    let mut store = CueStore::default();
    store.load_cues(
        intervals
            .iter()
            .enumerate()
            .map(|(i, (start, end))| Cue::new(*start, *end, &format!("cue {i}")))
            .collect(),
        vec![],
    );
    store
}

fn assert_positive_intervals(store: &CueStore) {
    for (i, cue) in store.cues().iter().enumerate() {
        assert!(
            cue.end() > cue.start(),
            "cue {i} has non-positive interval {:?}",
            cue.interval
        );
    }
}

fn assert_sorted(store: &CueStore) {
    for pair in store.cues().windows(2) {
        assert!(
            pair[0].start() <= pair[1].start(),
            "{:?} sorts after {:?}",
            pair[0].interval,
            pair[1].interval
        );
    }
}

fn assert_no_overlap(store: &CueStore) {
    for pair in store.cues().windows(2) {
        assert!(
            pair[0].end() <= pair[1].start() + TIME_EPSILON,
            "{:?} overlaps {:?}",
            pair[0].interval,
            pair[1].interval
        );
    }
}

#[test]
fn test_destructive_time_range_inversion() {
    let range = TimeRange::new(10.0, 5.0);
    assert_eq!(range.start_sec, 5.0);
    assert_eq!(range.end_sec, 10.0);
}

#[test]
fn test_destructive_media_chunk_inversion() {
    let chunk = MediaChunk::new(5000, 1000);
    assert_eq!(chunk.start_ms, 1000);
    assert_eq!(chunk.end_ms, 5000);
}

#[test]
fn test_destructive_collapse_end_onto_start() {
    let mut store = store_with(&[(1.0, 2.0)]);
    let result = UpdateCueCommand::for_cue(&store, 0)
        .unwrap()
        .with_end(1.0)
        .execute(&mut store)
        .unwrap();

    assert!(result.violations.contains(&ErrorTag::InvalidRangeEnd));
    assert_positive_intervals(&store);
    assert!((store.cues()[0].end() - 1.5).abs() < 1e-9);
}

#[test]
fn test_destructive_end_before_start() {
    let mut store = store_with(&[(1.0, 2.0)]);
    UpdateCueCommand::for_cue(&store, 0)
        .unwrap()
        .with_end(0.2)
        .execute(&mut store)
        .unwrap();
    assert_positive_intervals(&store);
}

#[test]
fn test_destructive_negative_start() {
    let mut store = store_with(&[(1.0, 2.0)]);
    let result = UpdateCueCommand::for_cue(&store, 0)
        .unwrap()
        .with_start(-4.0)
        .execute(&mut store)
        .unwrap();
    assert!(result.violations.contains(&ErrorTag::InvalidRangeStart));
    assert_eq!(store.cues()[0].start(), 0.0);
}

#[test]
fn test_destructive_nan_edit_is_rejected() {
    let mut store = store_with(&[(1.0, 2.0)]);
    let before = store.cues().to_vec();
    let err = UpdateCueCommand::for_cue(&store, 0)
        .unwrap()
        .with_start(f64::NAN)
        .execute(&mut store)
        .unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(store.cues(), before.as_slice());
}

#[test]
fn test_destructive_edit_pipeline_keeps_neighbours_apart() {
    let ctx = ValidationContext::new(
        SubtitleSpecification::enabled()
            .with_min_duration_ms(1500)
            .with_max_duration_ms(4000),
        false,
    );
    let previous = Cue::new(0.0, 2.0, "p");
    let next = Cue::new(3.0, 5.0, "n");
    let current = Cue::new(2.0, 3.0, "c");

    let times = [-1.0, 0.0, 1.0, 2.1, 2.9, 4.0, 5.0, 10.0];
    let start_edits = times.map(|t| ProposedEdit::from_cue(&current).with_start(t));
    let end_edits = times.map(|t| ProposedEdit::from_cue(&current).with_end(t));
    // Both edges at once, in order and swapped
    let current_ref = &current;
    let both_edits = times.into_iter().flat_map(move |a| {
        times
            .into_iter()
            .map(move |b| ProposedEdit::from_cue(current_ref).with_start(a).with_end(b))
    });
    for proposed in start_edits.into_iter().chain(end_edits).chain(both_edits) {
        let (start, end) = (proposed.start_sec, proposed.end_sec);
        let corrected = apply_edit(&current, proposed, Some(&previous), Some(&next), ctx).cue;
        assert!(
            corrected.start() >= previous.end() - TIME_EPSILON,
            "({start}, {end}) overlapped previous: {:?}",
            corrected.interval
        );
        assert!(
            corrected.end() <= next.start() + TIME_EPSILON,
            "({start}, {end}) overlapped next: {:?}",
            corrected.interval
        );
        assert!(corrected.end() > corrected.start());
    }
}

#[test]
fn test_destructive_random_walk_keeps_invariants() {
    let mut store = store_with(&[(0.0, 1.0), (1.0, 2.0), (2.5, 4.0), (4.0, 6.0)]);
    let mut executor = CommandExecutor::new();

    // Deterministic pseudo-random walk over the edit surface
    let mut seed: u64 = 0x5eed;
    let mut next = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (seed >> 33) as usize
    };

    for _ in 0..400 {
        let len = store.len();
        let index = next() % len;
        let offset = (next() % 4000) as f64 / 1000.0 - 2.0;
        let stretch = (next() % 3000) as f64 / 1000.0 - 1.0;
        // Rejections are fine; the store must still hold its invariants
        let _ = match next() % 8 {
            0 => {
                let cue = &store.cues()[index];
                let cmd = UpdateCueCommand::new(index, &cue.edit_token)
                    .with_start(cue.start() + offset);
                executor.execute(Box::new(cmd), &mut store)
            }
            1 => {
                let cue = &store.cues()[index];
                let cmd =
                    UpdateCueCommand::new(index, &cue.edit_token).with_end(cue.end() + offset);
                executor.execute(Box::new(cmd), &mut store)
            }
            2 => {
                let cue = &store.cues()[index];
                let cmd = UpdateCueCommand::new(index, &cue.edit_token)
                    .with_start(cue.start() + offset)
                    .with_end(cue.end() + offset + stretch);
                executor.execute(Box::new(cmd), &mut store)
            }
            3 => {
                let cue = &store.cues()[index];
                let cmd = UpdateCueCommand::new(index, &cue.edit_token)
                    .with_start(cue.end() + offset)
                    .with_end(cue.start() + offset);
                executor.execute(Box::new(cmd), &mut store)
            }
            4 => executor.execute(Box::new(AddCueCommand::new(index + 1)), &mut store),
            5 => executor.execute(Box::new(DeleteCueCommand::new(index)), &mut store),
            6 => executor.execute(Box::new(SplitCueCommand::new(index)), &mut store),
            _ => {
                let undone = executor.undo(&mut store);
                undone.map(|_| CommandResult::new("undo"))
            }
        };

        assert!(!store.is_empty());
        assert_positive_intervals(&store);
        assert_sorted(&store);
        assert_no_overlap(&store);
        assert!(store.editing_index < store.len());
    }
}

#[test]
fn test_destructive_edit_cannot_jump_past_next_cue() {
    let mut store = store_with(&[(0.0, 1.0), (1.0, 2.0), (3.0, 4.0)]);
    let result = UpdateCueCommand::for_cue(&store, 1)
        .unwrap()
        .with_start(20.0)
        .with_end(21.0)
        .execute(&mut store)
        .unwrap();

    assert!(result.violations.contains(&ErrorTag::TimeGapOverlap));
    assert_positive_intervals(&store);
    assert_sorted(&store);
    assert_no_overlap(&store);
    assert!(store.cues().iter().all(|c| !c.corrupted));
}

#[test]
fn test_destructive_mark_cues_is_idempotent() {
    let mut cues = vec![
        Cue::new(0.0, 2.0, "a"),
        Cue::new(1.0, 1.2, "b"),
        Cue::new(1.1, 9.0, "c"),
        Cue::new(9.0, 9.1, "d"),
    ];
    let ctx = ValidationContext::new(
        SubtitleSpecification::enabled().with_min_duration_ms(500),
        false,
    );

    mark_cues(&mut cues, &ctx);
    let first: Vec<bool> = cues.iter().map(|c| c.corrupted).collect();
    mark_cues(&mut cues, &ctx);
    let second: Vec<bool> = cues.iter().map(|c| c.corrupted).collect();

    assert_eq!(first, second);
    assert_eq!(first, vec![true, true, true, true]);
}

#[test]
fn test_destructive_matcher_is_deterministic_and_complete() {
    let target = vec![
        Cue::new(0.0, 1.0, "a"),
        Cue::new(0.5, 3.0, "b"),
        Cue::new(3.0, 3.1, "c"),
        Cue::new(7.0, 9.0, "d"),
    ];
    let source = vec![
        Cue::new(0.0, 2.0, "x"),
        Cue::new(2.0, 2.5, "y"),
        Cue::new(5.0, 6.0, "z"),
    ];

    let first = match_cue_lines(&target, &source, 1);
    let second = match_cue_lines(&target, &source, 1);
    assert_eq!(first, second);

    let targets: usize = first.rows.iter().map(|r| r.target_cues.len()).sum();
    let sources: usize = first.rows.iter().map(|r| r.source_cues.len()).sum();
    assert_eq!(targets, target.len());
    assert_eq!(sources, source.len());
    assert!(first
        .rows
        .iter()
        .all(|r| !r.target_cues.is_empty() || !r.source_cues.is_empty()));
}

#[test]
fn test_destructive_stale_token_after_undo() {
    let mut store = store_with(&[(0.0, 1.0)]);
    let mut executor = CommandExecutor::new();
    let token = store.cues()[0].edit_token.clone();

    executor
        .execute(
            Box::new(UpdateCueCommand::new(0, &token).with_text("one")),
            &mut store,
        )
        .unwrap();
    executor.undo(&mut store).unwrap();

    // The original token is gone even though the content is back
    let result = executor
        .execute(
            Box::new(UpdateCueCommand::new(0, &token).with_text("late")),
            &mut store,
        )
        .unwrap();
    assert_eq!(result.outcome, CommandOutcome::Discarded);
    assert_eq!(store.cues()[0].text, "cue 0");
    assert!(executor.can_redo());
}

#[test]
fn test_destructive_merge_everything_then_undo() {
    let mut store = store_with(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)]);
    let mut executor = CommandExecutor::new();

    executor
        .execute(Box::new(MergeCuesCommand::new(vec![2, 0, 1, 1])), &mut store)
        .unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.cues()[0].text, "cue 0\ncue 1\ncue 2");

    executor.undo(&mut store).unwrap();
    assert_eq!(store.len(), 3);
}

#[test]
fn test_destructive_merge_row_out_of_range() {
    let mut store = store_with(&[(0.0, 1.0), (1.0, 2.0)]);
    let mut executor = CommandExecutor::new();
    let err = executor
        .execute(Box::new(MergeCuesCommand::new(vec![0, 9])), &mut store)
        .unwrap_err();
    assert_eq!(err.tag(), Some(ErrorTag::MergeError));
    assert!(!executor.can_undo());
}

#[test]
fn test_destructive_shift_inside_chunk_edge() {
    let mut store = CueStore::new(
        TrackMeta::caption("en").with_media_chunk(MediaChunk::new(1000, 5000)),
        SubtitleSpecification::default(),
    );
    store.load_cues(
        vec![Cue::new(1.0, 2.0, "a"), Cue::new(3.0, 4.0, "b")],
        vec![],
    );

    // Landing exactly on the chunk end is allowed
    ShiftCuesCommand::all(1.0).execute(&mut store).unwrap();
    assert_eq!(store.cues()[1].end(), 5.0);

    let err = ShiftCuesCommand::all(0.001).execute(&mut store).unwrap_err();
    assert_eq!(err.tag(), Some(ErrorTag::OutOfChunkRange));
}

#[test]
fn test_destructive_import_garbage() {
    let content = "not a subtitle\n\n\n1\n00:00:05,000 --> 00:00:04,000\nbackwards\n";
    let cues = parse_srt(content).unwrap_or_default();
    assert!(cues.iter().all(|c| c.end() > c.start()));

    let mut store = CueStore::default();
    store.load_cues(cues, vec![]);
    assert!(!store.is_empty());
}
