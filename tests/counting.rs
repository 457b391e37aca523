mod common;

use common::{config, det, entrance, entrance_points, frames, walk_in, Lcg, WALK_IN_CROSSING};
use curve_counter::{
    BoundaryConfig, BoundaryCurve, Counting, CountingSession, Direction, Frame, InDirection,
    Orientation, RegionStrategy, SessionState, Totals,
};
use nalgebra as na;
use std::collections::HashMap;

#[test]
fn walk_in_counts_once_with_negative_orientation() {
    let mut session = CountingSession::with_orientation(
        entrance(),
        config(10, 2),
        Orientation::Negative,
        InDirection::Auto,
    )
    .unwrap();

    let events = session.update(&frames(1, &walk_in(), 0)).unwrap();

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.track_id, 1);
    assert_eq!(event.direction, Direction::In);
    assert_eq!(event.frame_index, WALK_IN_CROSSING as u64);
    assert!(event.path_crossed);

    assert_eq!(session.totals(), Totals { in_count: 1, out_count: 0 });
}

#[test]
fn inside_region_holds_the_far_side_of_the_walk() {
    let mut session = CountingSession::with_orientation(
        entrance(),
        config(10, 2),
        Orientation::Negative,
        InDirection::Auto,
    )
    .unwrap();
    session.update(&frames(1, &walk_in(), 0)).unwrap();

    let region = session.inside_region().unwrap();
    assert_eq!(
        region.strategy(),
        RegionStrategy::NormalOffset(Some(Orientation::Negative))
    );
    assert_eq!(region.len(), 2 * entrance_points().len());

    for (i, [x, y]) in walk_in().into_iter().enumerate() {
        let inside = region.contains(na::Point2::new(x, y));
        assert_eq!(inside, i >= WALK_IN_CROSSING, "anchor {} ({}, {})", i, x, y);
    }
}

#[test]
fn gray_zone_delays_the_crossing() {
    let mut cfg = config(10, 2);
    cfg.gray_zone_width = 5.0;

    let mut session = CountingSession::with_orientation(
        entrance(),
        cfg,
        Orientation::Negative,
        InDirection::Auto,
    )
    .unwrap();

    let events = session.update(&frames(1, &walk_in(), 0)).unwrap();

    // Anchors 13 and 14 sit within 5px of the curve.
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].frame_index, WALK_IN_CROSSING as u64 + 2);
    assert!(!events[0].path_crossed);
}

#[test]
fn calibrates_then_counts_the_reverse_walk() {
    let mut session = CountingSession::new(entrance(), config(31, 1)).unwrap();

    let calibration = frames(1, &walk_in(), 0);
    let events = session.update(&calibration).unwrap();
    assert!(events.is_empty());
    assert_eq!(session.state(), SessionState::Operational);

    let result = *session.orientation().unwrap();
    assert!(result.resolved);
    assert_eq!(result.orientation, Orientation::Positive);
    assert_eq!(result.crossings_used, 1);
    assert_eq!(result.confidence, 1.0);

    let diag = session.diagnostics().unwrap();
    assert_eq!(diag.num_samples, 31);
    assert_eq!(diag.num_crossings, 1);
    assert!(diag.candidates.negative == 0.0 && diag.candidates.positive > 0.0);

    let mut walk_out = walk_in();
    walk_out.reverse();
    let events = session.update(&frames(2, &walk_out, 31)).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].track_id, 2);
    assert_eq!(events[0].direction, Direction::In);
    assert_eq!(events[0].frame_index, 31 + (walk_out.len() - WALK_IN_CROSSING) as u64);
    assert_eq!(session.totals(), Totals { in_count: 1, out_count: 0 });
}

#[test]
fn boundary_file_caches_calibration_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("curve_config.json");
    BoundaryConfig::new(entrance_points()).save(&path).unwrap();

    // First run calibrates and writes the result back.
    let mut boundary = BoundaryConfig::load(&path).unwrap();
    let mut session = CountingSession::from_boundary(&boundary, config(31, 1)).unwrap();
    assert_eq!(session.state(), SessionState::Calibrating);
    session.update(&frames(1, &walk_in(), 0)).unwrap();

    boundary.record_calibration(
        session.orientation().unwrap(),
        session.diagnostics().unwrap(),
    );
    boundary.record_region(session.inside_region().unwrap());
    boundary.save(&path).unwrap();

    // Second run starts operational from the cached orientation.
    let boundary = BoundaryConfig::load(&path).unwrap();
    assert_eq!(boundary.orientation, Some(Orientation::Positive));
    assert_eq!(boundary.region_depth, Some(50.0));
    assert_eq!(boundary.inside_region.as_ref().map(|r| r.len()), Some(18));
    assert_eq!(boundary.orientation_diagnostics.as_ref().unwrap().num_crossings, 1);
    let region_diag = boundary.region_diagnostics.as_ref().unwrap();
    assert_eq!(region_diag.method, "normal_offset");
    assert_eq!(region_diag.status, "ok (orientation=+1)");

    let mut session = CountingSession::from_boundary(&boundary, config(31, 1)).unwrap();
    assert_eq!(session.state(), SessionState::Operational);

    let events = session.update(&frames(7, &walk_in(), 100)).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].direction, Direction::Out);
}

#[test]
fn jittery_tracks_fire_at_most_once() {
    let curve = BoundaryCurve::from_pairs(&[[100.0, 240.0], [860.0, 240.0]]).unwrap();
    let mut session = CountingSession::with_orientation(
        curve,
        config(10, 2),
        Orientation::Positive,
        InDirection::Auto,
    )
    .unwrap();

    let mut rng = Lcg::new(7);
    let mut all_events = Vec::new();

    for index in 0..200u64 {
        let dets = (0..20u64)
            .map(|id| {
                let x = 150.0 + 30.0 * id as f32;
                let y = 160.0 + 160.0 * rng.next_f32();
                det(id, [x, y])
            })
            .collect();

        let report = session
            .process_frame(&Frame::new(index, (960, 480), dets))
            .unwrap();
        all_events.extend(report.events);
    }

    let mut per_track: HashMap<u64, usize> = HashMap::new();
    for event in &all_events {
        *per_track.entry(event.track_id).or_default() += 1;
    }
    assert!(per_track.values().all(|n| *n == 1));

    let totals = session.totals();
    assert_eq!((totals.in_count + totals.out_count) as usize, all_events.len());

    let tracks = Counting::tracks(&session);
    assert_eq!(tracks.len(), 20);
    for track in tracks.iter() {
        assert_eq!(track.is_counted(), per_track.contains_key(&track.track_id));
        assert!(track.history_len <= 64);
    }
}

#[test]
fn track_reappearing_after_end_starts_over() {
    let curve = BoundaryCurve::from_pairs(&[[100.0, 240.0], [860.0, 240.0]]).unwrap();
    let mut session = CountingSession::with_orientation(
        curve,
        config(10, 2),
        Orientation::Positive,
        InDirection::Auto,
    )
    .unwrap();

    let down = [[400.0, 200.0], [400.0, 280.0]];
    assert_eq!(session.update(&frames(3, &down, 0)).unwrap().len(), 1);
    assert_eq!(session.update(&frames(3, &down, 2)).unwrap().len(), 0);

    assert!(session.end_track(3));
    assert!(!session.end_track(3));

    assert_eq!(session.update(&frames(3, &down, 4)).unwrap().len(), 1);
    assert_eq!(Counting::totals(&session), Totals { in_count: 2, out_count: 0 });
}

#[test]
fn explicit_direction_region_and_count_agree() {
    let boundary = BoundaryConfig {
        in_direction: "right".into(),
        ..BoundaryConfig::new(vec![[480.0, 50.0], [480.0, 430.0]])
    };

    let mut session = CountingSession::from_boundary(&boundary, config(10, 2)).unwrap();
    assert_eq!(session.state(), SessionState::Operational);

    let walk = [[400.0, 240.0], [460.0, 240.0], [520.0, 240.0], [560.0, 240.0]];
    let events = session.update(&frames(1, &walk, 0)).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].direction, Direction::In);
    assert_eq!(events[0].frame_index, 2);

    let region = session.inside_region().unwrap();
    assert!(region.contains(na::Point2::new(560.0, 240.0)));
    assert!(!region.contains(na::Point2::new(400.0, 240.0)));
    assert_eq!(
        boundary.preset_orientation(Some(common::FRAME_SIZE)).unwrap(),
        session.orientation().map(|o| o.orientation)
    );
}
