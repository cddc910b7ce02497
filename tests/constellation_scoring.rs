use constellation::lowlevel::{score_keypoints, MISSING_CELL_PENALTY};
use constellation::{
    best_match, rank_matches, score, score_aligned, score_with, ConstellationConfig,
    ConstellationError, Keypoint, Signature,
};

fn grid_keypoints(n: usize) -> Vec<Keypoint> {
    let mut out = Vec::with_capacity(n * n);
    for row in 0..n {
        for col in 0..n {
            let x = col as f64 / n as f64 + 0.01;
            let y = row as f64 / n as f64 + 0.02;
            out.push(Keypoint::new(row, col, x, y, Some(0.5)));
        }
    }
    out
}

fn grid_signature(n: usize) -> Signature {
    Signature::from_keypoints(grid_keypoints(n)).unwrap()
}

fn shifted(base: &Signature, row: usize, col: usize, dx: f64) -> Signature {
    let keypoints = base
        .keypoints()
        .iter()
        .map(|kp| {
            let mut kp = *kp;
            if kp.row == row && kp.col == col {
                kp.x += dx;
            }
            kp
        })
        .collect();
    Signature::from_keypoints(keypoints).unwrap()
}

#[test]
fn identical_signatures_score_100() {
    let sig = grid_signature(8);
    let report = score(&sig, &sig).unwrap();
    assert_eq!(report.score, 100.0);
    assert_eq!(report.avg_distance, 0.0);
    assert_eq!(report.tight_matches, 64);
    assert_eq!(report.missing_cells, 0);
    assert_eq!(report.cell_count, 64);
}

#[test]
fn single_cell_shift_costs_its_share() {
    let base = grid_signature(8);
    let moved = shifted(&base, 0, 0, 0.1);
    let report = score(&moved, &base).unwrap();

    assert!((report.avg_distance - 0.1 / 64.0).abs() < 1e-9);
    assert!((report.score - 99.21875).abs() < 1e-6);
    assert_eq!(report.tight_matches, 63);
}

#[test]
fn each_drift_step_costs_its_share() {
    let base = grid_signature(8);
    let mut last_score = 100.0;
    let mut last_avg = 0.0;
    for step in 1..=8 {
        let moved = shifted(&base, 3, 2, step as f64 * 0.05);
        let report = score(&moved, &base).unwrap();
        assert!(report.score < last_score);
        assert!((report.avg_distance - last_avg - 0.05 / 64.0).abs() < 1e-12);
        last_score = report.score;
        last_avg = report.avg_distance;
    }
}

#[test]
fn score_is_order_independent() {
    let base = grid_signature(8);
    let moved = shifted(&base, 5, 1, 0.07);
    let mut reversed = moved.clone().into_keypoints();
    reversed.reverse();
    let reversed = Signature::from_keypoints(reversed).unwrap();

    let a = score(&moved, &base).unwrap();
    let b = score(&reversed, &base).unwrap();
    assert_eq!(a, b);
}

#[test]
fn brightness_does_not_affect_score() {
    let base = grid_signature(4);
    let dimmed: Vec<Keypoint> = base
        .keypoints()
        .iter()
        .map(|kp| Keypoint {
            brightness: None,
            ..*kp
        })
        .collect();
    let dimmed = Signature::from_keypoints(dimmed).unwrap();
    assert_eq!(score(&dimmed, &base).unwrap().score, 100.0);
}

#[test]
fn missing_cell_takes_fixed_penalty() {
    let full = grid_keypoints(8);
    let mut partial = full.clone();
    partial.retain(|kp| !(kp.row == 4 && kp.col == 4));

    let report = score_keypoints(&partial, &full, 8, 0.05).unwrap();
    assert_eq!(report.missing_cells, 1);
    assert!((report.avg_distance - MISSING_CELL_PENALTY / 64.0).abs() < 1e-12);
    assert!((report.score - 96.09375).abs() < 1e-9);

    // Missing on the reference side costs the same.
    let swapped = score_keypoints(&full, &partial, 8, 0.05).unwrap();
    assert_eq!(swapped.score, report.score);
}

#[test]
fn reference_cells_outside_the_grid_are_rejected() {
    let query = grid_keypoints(4);
    let mut reference = grid_keypoints(4);
    reference.push(Keypoint::new(6, 6, 0.5, 0.5, None));
    assert_eq!(
        score_keypoints(&query, &reference, 4, 0.05).unwrap_err(),
        ConstellationError::CellOutOfGrid {
            row: 6,
            col: 6,
            grid_size: 4,
        }
    );
}

#[test]
fn signatures_on_different_grids_do_not_compare() {
    let small = grid_signature(1);
    let full = grid_signature(8);
    let expected = ConstellationError::GridSizeMismatch {
        query: 1,
        reference: 8,
    };
    assert_eq!(score(&small, &full).unwrap_err(), expected);
    assert_eq!(
        best_match(&small, &[full], &ConstellationConfig::default()).unwrap_err(),
        expected
    );
}

#[test]
fn malformed_keypoints_are_rejected() {
    let mut dup = grid_keypoints(2);
    dup[1] = Keypoint::new(0, 0, 0.1, 0.1, None);
    assert_eq!(
        Signature::from_keypoints(dup).unwrap_err(),
        ConstellationError::DuplicateCell { row: 0, col: 0 }
    );

    let mut out_of_range = grid_keypoints(2);
    out_of_range[3].y = 1.5;
    assert!(matches!(
        Signature::from_keypoints(out_of_range),
        Err(ConstellationError::CoordinateOutOfRange { field: "y", .. })
    ));

    let mut nan = grid_keypoints(2);
    nan[0].x = f64::NAN;
    assert!(Signature::from_keypoints(nan).is_err());

    assert_eq!(
        Signature::from_keypoints(grid_keypoints(3)[..5].to_vec()).unwrap_err(),
        ConstellationError::InvalidKeypointCount { count: 5 }
    );
    assert_eq!(
        Signature::from_keypoints(Vec::new()).unwrap_err(),
        ConstellationError::InvalidKeypointCount { count: 0 }
    );

    let mut outside = grid_keypoints(2);
    outside[2] = Keypoint::new(2, 0, 0.1, 0.1, None);
    assert!(matches!(
        score_keypoints(&outside, &grid_keypoints(2), 2, 0.05),
        Err(ConstellationError::CellOutOfGrid { .. })
    ));
}

#[test]
fn score_floors_at_zero() {
    let base = grid_signature(1);
    let far = Signature::from_keypoints(vec![Keypoint::new(0, 0, 1.0, 1.0, None)]).unwrap();
    let report = score(&far, &base).unwrap();
    assert_eq!(report.score, 0.0);
    assert!(report.avg_distance > 0.2);
}

#[test]
fn threshold_is_strict() {
    let base = grid_signature(8);
    let report = score(&base, &base).unwrap();
    assert!(report.is_match(99.9));
    assert!(!report.is_match(100.0));
}

#[test]
fn tight_radius_is_configurable() {
    let base = grid_signature(8);
    let moved = shifted(&base, 0, 0, 0.1);
    let cfg = ConstellationConfig {
        tight_radius: 0.2,
        ..ConstellationConfig::default()
    };
    assert_eq!(score_with(&moved, &base, &cfg).unwrap().tight_matches, 64);
}

#[test]
fn best_match_prefers_first_on_ties() {
    let base = grid_signature(8);
    let candidates = vec![
        shifted(&base, 0, 0, 0.3),
        base.clone(),
        base.clone(),
        shifted(&base, 1, 1, 0.05),
    ];
    let cfg = ConstellationConfig::default();

    let best = best_match(&base, &candidates, &cfg).unwrap().unwrap();
    assert_eq!(best.index, 1);
    assert_eq!(best.score, 100.0);

    let ranked = rank_matches(&base, &candidates, 3, &cfg).unwrap();
    let order: Vec<usize> = ranked.iter().map(|m| m.index).collect();
    assert_eq!(order, vec![1, 2, 3]);

    let empty: Vec<Signature> = Vec::new();
    assert!(best_match(&base, &empty, &cfg).unwrap().is_none());
}

#[test]
fn aligned_scoring_pairs_by_position() {
    let base = grid_signature(2);
    let mut reversed = base.clone().into_keypoints();
    reversed.reverse();
    let reversed = Signature::from_keypoints(reversed).unwrap();

    assert_eq!(score(&reversed, &base).unwrap().score, 100.0);
    assert!(score_aligned(&reversed, &base).score < 100.0);
    assert_eq!(score_aligned(&base, &base).score, 100.0);
}

#[test]
fn json_round_trip_keeps_optional_brightness() {
    let sig = Signature::from_keypoints(vec![
        Keypoint::new(0, 0, 0.1, 0.2, Some(0.9)),
        Keypoint::new(0, 1, 0.6, 0.2, None),
        Keypoint::new(1, 0, 0.1, 0.7, None),
        Keypoint::new(1, 1, 0.6, 0.7, Some(0.3)),
    ])
    .unwrap();

    let text = sig.to_json_pretty();
    assert!(text.contains("\"b\": 0.9"));
    let parsed = Signature::from_json(&text).unwrap();
    assert_eq!(parsed, sig);

    let legacy = r#"[{"row":0,"col":0,"x":0.5,"y":0.5}]"#;
    let legacy = Signature::from_json(legacy).unwrap();
    assert_eq!(legacy.grid_size(), 1);
    assert_eq!(legacy.keypoints()[0].brightness, None);

    let bad = r#"[{"row":0,"col":0,"x":0.5,"y":2.0}]"#;
    assert!(Signature::from_json(bad).is_err());
    assert!(serde_json::from_str::<Signature>(bad).is_err());
}
