use constellation::lowlevel::GridCell;
use constellation::{
    compare_strands, extract_signature, score, Keypoint, OwnedRaster, Pixel, Rgb, Signature,
    Strand,
};
use proptest::prelude::*;

fn signature_from(points: &[(f64, f64)], n: usize) -> Signature {
    let keypoints = points
        .iter()
        .enumerate()
        .map(|(idx, &(x, y))| Keypoint::new(idx / n, idx % n, x, y, None))
        .collect();
    Signature::from_keypoints(keypoints).unwrap()
}

fn arb_points(n: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((0.0f64..=1.0, 0.0f64..=1.0), n * n)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn score_stays_in_range_and_is_symmetric(a in arb_points(4), b in arb_points(4)) {
        let sa = signature_from(&a, 4);
        let sb = signature_from(&b, 4);
        let ab = score(&sa, &sb).unwrap();
        let ba = score(&sb, &sa).unwrap();

        prop_assert!((0.0..=100.0).contains(&ab.score));
        prop_assert!((ab.score - ba.score).abs() < 1e-9);
        prop_assert_eq!(score(&sa, &sa).unwrap().score, 100.0);
    }

    #[test]
    fn extracted_keypoints_are_relative(
        width in 8usize..64,
        height in 8usize..64,
        seed in any::<u8>(),
    ) {
        let raster = OwnedRaster::from_fn(width, height, |x, y| {
            let v = (x * 7 + y * 13 + seed as usize) % 256;
            Rgb::new(v as u8, seed, (255 - v) as u8)
        })
        .unwrap();
        let signature = extract_signature(raster.view()).unwrap();

        prop_assert_eq!(signature.cell_count(), 64);
        for kp in signature.keypoints() {
            prop_assert!(kp.x < 1.0 && kp.y < 1.0);
            let px = (kp.x * width as f64).round() as usize;
            let py = (kp.y * height as f64).round() as usize;
            let cell = GridCell::bounds(kp.row, kp.col, width, height, 8);
            prop_assert!((cell.start_x..cell.start_x + cell.width).contains(&px));
            prop_assert!((cell.start_y..cell.start_y + cell.height).contains(&py));
        }
    }

    #[test]
    fn channel_shifts_within_tolerance_always_match(
        colours in prop::collection::vec(any::<(u8, u8, u8)>(), 1..64),
        shift in -5i16..=5,
    ) {
        let nudge = |c: u8| (c as i16 + shift).clamp(0, 255) as u8;
        let reference: Vec<Pixel> = colours
            .iter()
            .enumerate()
            .map(|(i, &(r, g, b))| Pixel::new(0, i as u32, r, g, b))
            .collect();
        let candidate: Vec<Pixel> = reference
            .iter()
            .map(|px| Pixel::new(px.x, px.y, nudge(px.r), nudge(px.g), nudge(px.b)))
            .collect();

        let reference = Strand::new(1, "Bottom", 0, 0, reference).unwrap();
        let candidate = Strand::new(1, "Bottom", 0, 0, candidate).unwrap();
        let report = compare_strands(&[reference], &[candidate]);
        prop_assert_eq!(report.overall_match_percentage, 100.0);
    }
}
