//! Tests for pattern expansion.

use super::{regenerate, tap_pattern, EchoPattern};
use crate::types::{EchoParams, LaneLink};

/// Two taps, two iterations: the device's start-up configuration
fn two_tap_params() -> EchoParams {
    EchoParams {
        iterations: 2,
        stretch: 0.75,
        decay: 0.66,
        note_incr: 0,
        bases: [500, 1000, 0, 0],
        dur_base: 100.0,
        dur_decay: 0.5,
        ..EchoParams::default()
    }
}

#[test]
fn test_two_tap_scenario_event_count() {
    let (events, lanes) = regenerate(&two_tap_params());
    // 3 root notes, then 2 per depth-1 branch (their zero tap is skipped)
    assert_eq!(events.len(), 7);
    assert_eq!(lanes.len(), 3);
}

#[test]
fn test_two_tap_scenario_offsets() {
    let (events, _) = regenerate(&two_tap_params());
    let offsets: Vec<i64> = events.iter().map(|e| e.offset_ms).collect();
    assert_eq!(offsets, vec![0, 500, 875, 1000, 1250, 1375, 1750]);
}

#[test]
fn test_two_tap_scenario_coefficients() {
    let (events, _) = regenerate(&two_tap_params());
    let by_id = |id: usize| events.iter().find(|e| e.id == id).unwrap();

    // Root lane: decay^(0 + idx/4)
    assert_eq!(by_id(0).velocity_coeff, 1.0);
    assert_eq!(by_id(1).velocity_coeff, 0.66f64.powf(0.25));
    assert_eq!(by_id(2).velocity_coeff, 0.66f64.powf(0.5));
    // Depth-1 lanes: decay^(1 + idx/4), tap index counts the skipped zero tap
    assert_eq!(by_id(3).velocity_coeff, 0.66f64.powf(1.25));
    assert_eq!(by_id(4).velocity_coeff, 0.66f64.powf(1.5));

    let durations: Vec<i64> = (0..7).map(|id| by_id(id).duration).collect();
    assert_eq!(durations, vec![100, 84, 70, 42, 35, 42, 35]);
}

#[test]
fn test_two_tap_scenario_lanes() {
    let (_, lanes) = regenerate(&two_tap_params());

    assert!(lanes[0].is_root());
    assert_eq!(lanes[0].notes.len(), 3);
    assert_eq!(
        lanes[1].link,
        Some(LaneLink {
            offset_ms: 500,
            parent_lane_index: 0
        })
    );
    assert_eq!(
        lanes[2].link,
        Some(LaneLink {
            offset_ms: 1000,
            parent_lane_index: 0
        })
    );
    let lane1: Vec<i64> = lanes[1].notes.iter().map(|n| n.offset_ms).collect();
    assert_eq!(lane1, vec![875, 1250]);
}

#[test]
fn test_zero_iterations_emit_one_root_lane() {
    let params = EchoParams {
        iterations: 0,
        bases: [120, 0, 480, 240],
        ..two_tap_params()
    };
    let (events, lanes) = regenerate(&params);

    assert_eq!(events.len(), tap_pattern(&params).len());
    assert!(events.iter().all(|e| e.level == 0));
    assert_eq!(lanes.len(), 1);
    assert!(lanes[0].is_root());
}

#[test]
fn test_all_zero_bases_give_a_single_hit() {
    let params = EchoParams {
        iterations: 4,
        bases: [0; 4],
        ..two_tap_params()
    };
    let (events, lanes) = regenerate(&params);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].offset_ms, 0);
    assert_eq!(events[0].level, 0);
    assert_eq!(lanes.len(), 1);
}

#[test]
fn test_levels_stay_in_range_and_skip_zero_taps() {
    let params = EchoParams {
        iterations: 4,
        note_incr: 3,
        bases: [90, 250, 0, 600],
        ..two_tap_params()
    };
    let (events, _) = regenerate(&params);

    assert!(events.iter().all(|e| e.level <= params.iterations));
    // Below the root a note at its lane origin can only come from a zero tap
    let (_, lanes) = regenerate(&params);
    for lane in lanes.iter().filter(|l| !l.is_root()) {
        assert!(lane.notes.iter().all(|n| n.offset_ms > lane.origin_ms()));
        assert!(lane.notes.iter().all(|n| n.level > 0));
    }
}

#[test]
fn test_flat_list_is_sorted() {
    let params = EchoParams {
        iterations: 4,
        stretch: 1.3,
        bases: [700, 90, 310, 0],
        ..two_tap_params()
    };
    let (events, _) = regenerate(&params);
    assert!(events.windows(2).all(|w| w[0].offset_ms <= w[1].offset_ms));
}

#[test]
fn test_regenerate_is_idempotent() {
    let params = EchoParams {
        iterations: 3,
        stretch: 0.61,
        decay: 0.8,
        note_incr: -5,
        bases: [130, 770, 415, 0],
        dur_base: 240.0,
        dur_decay: 0.7,
        ..EchoParams::default()
    };
    assert_eq!(regenerate(&params), regenerate(&params));
}

#[test]
fn test_pitch_delta_grows_per_level() {
    let params = EchoParams {
        iterations: 3,
        note_incr: 2,
        ..two_tap_params()
    };
    let (events, _) = regenerate(&params);
    for e in &events {
        assert_eq!(e.pitch_delta, 2 * e.level as i32);
    }
}

#[test]
fn test_three_level_tree_shape() {
    let params = EchoParams {
        iterations: 3,
        note_incr: 2,
        ..two_tap_params()
    };
    let (events, lanes) = regenerate(&params);

    assert_eq!(events.len(), 15);
    let links: Vec<Option<(i64, usize)>> = lanes
        .iter()
        .map(|l| l.link.map(|k| (k.offset_ms, k.parent_lane_index)))
        .collect();
    assert_eq!(
        links,
        vec![
            None,
            Some((500, 0)),
            Some((875, 1)),
            Some((1250, 1)),
            Some((1000, 0)),
            Some((1375, 4)),
            Some((1750, 4)),
        ]
    );
}

#[test]
fn test_lane_notes_precede_descendants() {
    let params = EchoParams {
        iterations: 3,
        ..two_tap_params()
    };
    let (_, lanes) = regenerate(&params);

    // Ids are handed out in generation order, so each lane's ids must be
    // smaller than those of any lane appended after it.
    let mut last_id = None;
    for (idx, lane) in lanes.iter().enumerate() {
        for note in &lane.notes {
            if let Some(prev) = last_id {
                assert!(note.id > prev);
            }
            last_id = Some(note.id);
        }
        match lane.link {
            None => assert_eq!(idx, 0, "only the root lane is unlinked"),
            Some(link) => assert!(
                link.parent_lane_index < idx,
                "lane {} links forward to {}",
                idx,
                link.parent_lane_index
            ),
        }
    }
}

#[test]
fn test_deep_single_tap_chain() {
    // One tap and no shrinking: every level adds exactly one lane of one note
    let params = EchoParams {
        iterations: 200_000,
        stretch: 1.0,
        bases: [1, 0, 0, 0],
        ..two_tap_params()
    };
    let (events, lanes) = regenerate(&params);

    assert_eq!(lanes.len(), 200_000);
    assert_eq!(events.len(), 200_001);
    assert_eq!(events.last().map(|e| e.offset_ms), Some(200_000));
    assert_eq!(
        lanes.last().and_then(|l| l.link),
        Some(LaneLink {
            offset_ms: 199_999,
            parent_lane_index: 199_998
        })
    );
}

#[test]
fn test_truncation_drift_is_reproduced() {
    // 101 + 70.7 floors to 171 before the next level adds 49.49, giving 220,
    // whereas flooring the exact sum 221.19 would give 221.
    let params = EchoParams {
        iterations: 3,
        stretch: 0.7,
        bases: [101, 0, 0, 0],
        ..two_tap_params()
    };
    let (events, _) = regenerate(&params);
    let offsets: Vec<i64> = events.iter().map(|e| e.offset_ms).collect();
    assert_eq!(offsets, vec![0, 101, 171, 220]);
}

#[test]
fn test_degenerate_numbers_propagate() {
    let params = EchoParams {
        iterations: 1,
        decay: 0.0,
        dur_base: -50.0,
        ..two_tap_params()
    };
    let (events, _) = regenerate(&params);

    // 0^0 is 1 for the hit, every later tap decays to silence
    assert_eq!(events[0].velocity_coeff, 1.0);
    assert!(events[1..].iter().all(|e| e.velocity_coeff == 0.0));
    assert!(events.iter().all(|e| e.duration < 0));
}

#[test]
fn test_echo_pattern_summary() {
    let pattern = EchoPattern::generate(&two_tap_params(), 7);
    assert_eq!(pattern.generation, 7);
    assert_eq!(pattern.taps, vec![0, 500, 1000]);
    assert_eq!(pattern.summary.total_notes, 7);
    assert_eq!(pattern.summary.total_duration_ms, 1785);
}
