use constellation::lowlevel::StrandRegion;
use constellation::{
    compare_strands, compare_strands_with, extract_strands, extract_strands_with, CompareConfig,
    ConstellationError, OwnedRaster, Pixel, Rgb, Strand, Verdict,
};

fn uniform_strand(id: u32, x: u32, start_y: u32, len: u32, rgb: (u8, u8, u8)) -> Strand {
    let pixels = (0..len)
        .map(|i| Pixel::new(x, start_y + i, rgb.0, rgb.1, rgb.2))
        .collect();
    Strand::new(id, format!("S{id}"), x, start_y, pixels).unwrap()
}

fn recolor(strand: &Strand, mut f: impl FnMut(usize, Pixel) -> Pixel) -> Strand {
    let pixels = strand
        .pixels()
        .iter()
        .enumerate()
        .map(|(i, px)| f(i, *px))
        .collect();
    Strand::new(
        strand.id(),
        strand.name(),
        strand.start_x(),
        strand.start_y(),
        pixels,
    )
    .unwrap()
}

fn gradient(width: usize, height: usize) -> OwnedRaster {
    OwnedRaster::from_fn(width, height, |x, y| {
        Rgb::new((x * 3 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8)
    })
    .unwrap()
}

#[test]
fn strand_geometry_follows_the_fixed_layout() {
    let raster = gradient(100, 90);
    let [bottom, middle, top] = extract_strands(raster.view()).unwrap();

    assert_eq!((bottom.id(), bottom.name()), (1, "Bottom"));
    assert_eq!((middle.id(), middle.name()), (2, "Middle"));
    assert_eq!((top.id(), top.name()), (3, "Top"));

    assert_eq!((bottom.start_x(), bottom.start_y()), (15, 60));
    assert_eq!((middle.start_x(), middle.start_y()), (50, 30));
    assert_eq!((top.start_x(), top.start_y()), (80, 0));
    for strand in [&bottom, &middle, &top] {
        assert_eq!(strand.len(), 30);
        assert_eq!(strand.end_y(), Some(strand.start_y() + 29));
    }

    let px = bottom.pixels()[0];
    assert_eq!(px, Pixel::new(15, 60, 45, 44, 75));
}

#[test]
fn odd_heights_truncate_the_band() {
    let raster = gradient(10, 10);
    let [bottom, middle, top] = extract_strands(raster.view()).unwrap();
    assert_eq!((bottom.start_x(), bottom.start_y(), bottom.len()), (1, 7, 3));
    assert_eq!((middle.start_x(), middle.start_y(), middle.len()), (5, 3, 3));
    assert_eq!((top.start_x(), top.start_y(), top.len()), (8, 0, 3));
}

#[test]
fn explicit_band_height_is_validated() {
    let raster = gradient(20, 12);
    let strands = extract_strands_with(raster.view(), 12).unwrap();
    assert!(strands.iter().all(|s| s.len() == 12 && s.start_y() == 0));

    assert_eq!(
        extract_strands_with(raster.view(), 13).unwrap_err(),
        ConstellationError::InvalidBandHeight {
            band_height: 13,
            height: 12,
        }
    );
    assert!(extract_strands(gradient(20, 2).view()).is_err());
}

#[test]
fn region_names_parse_case_insensitively() {
    assert_eq!(StrandRegion::from_name("BOTTOM"), Some(StrandRegion::Bottom));
    assert_eq!(StrandRegion::from_name("Middle"), Some(StrandRegion::Middle));
    assert_eq!(StrandRegion::from_name("left"), None);
    assert_eq!(StrandRegion::Top.to_string(), "Top");
}

#[test]
fn strand_rejects_gaps_and_wrong_columns() {
    let gap = vec![Pixel::new(4, 0, 0, 0, 0), Pixel::new(4, 2, 0, 0, 0)];
    assert!(matches!(
        Strand::new(1, "Bottom", 4, 0, gap),
        Err(ConstellationError::MalformedStrand { id: 1, .. })
    ));
    let column = vec![Pixel::new(5, 0, 0, 0, 0)];
    assert!(Strand::new(2, "Middle", 4, 0, column).is_err());
}

#[test]
fn identical_strands_match_fully() {
    let raster = gradient(64, 48);
    let strands = extract_strands(raster.view()).unwrap();
    let report = compare_strands(&strands, &strands);

    assert_eq!(report.overall_match_percentage, 100.0);
    assert!(report.all_strands_match);
    assert!(!report.dimension_mismatch);
    assert_eq!(report.verdict(&CompareConfig::default()), Verdict::Authentic);
    for strand in &report.strands {
        assert_eq!(strand.match_percentage, 100.0);
        assert!(strand.sample_mismatches.is_empty());
    }
}

#[test]
fn tolerance_boundary_is_inclusive() {
    let reference = uniform_strand(1, 3, 0, 2, (100, 100, 100));
    let candidate = recolor(&reference, |i, px| match i {
        0 => Pixel::new(px.x, px.y, 105, 95, 105),
        _ => Pixel::new(px.x, px.y, 106, 100, 100),
    });

    let report = compare_strands(&[reference], &[candidate]);
    let strand = &report.strands[0];
    assert_eq!(strand.matching_pixels, 1);
    assert_eq!(strand.mismatching_pixels, 1);
    assert_eq!(strand.match_percentage, 50.0);

    let sample = &strand.sample_mismatches[0];
    assert_eq!(sample.position, 1);
    assert_eq!((sample.delta.r, sample.delta.g, sample.delta.b), (6, 0, 0));
}

#[test]
fn mismatch_samples_are_capped() {
    let reference = uniform_strand(1, 0, 0, 20, (10, 10, 10));
    let candidate = recolor(&reference, |_, px| Pixel::new(px.x, px.y, 200, 10, 10));
    let report = compare_strands(&[reference], &[candidate]);

    let strand = &report.strands[0];
    assert_eq!(strand.mismatching_pixels, 20);
    assert_eq!(strand.sample_mismatches.len(), 5);
    let positions: Vec<usize> = strand.sample_mismatches.iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    assert_eq!(report.verdict(&CompareConfig::default()), Verdict::Failed);
}

#[test]
fn length_difference_beyond_slack_is_flagged() {
    let reference = uniform_strand(1, 0, 0, 30, (1, 2, 3));
    let within = uniform_strand(1, 0, 0, 20, (1, 2, 3));
    let beyond = uniform_strand(1, 0, 0, 19, (1, 2, 3));

    assert!(!compare_strands(&[reference.clone()], &[within]).dimension_mismatch);
    assert!(compare_strands(&[reference], &[beyond]).dimension_mismatch);
}

#[test]
fn short_candidate_scores_per_strand_against_reference_length() {
    let reference = uniform_strand(1, 0, 0, 20, (50, 50, 50));
    let candidate = uniform_strand(1, 0, 0, 10, (50, 50, 50));
    let report = compare_strands(&[reference], &[candidate]);

    assert_eq!(report.strands[0].total_pixels, 20);
    assert_eq!(report.strands[0].match_percentage, 50.0);
    assert!(!report.strands[0].is_match);
    // The aggregate only counts pixels that were actually compared.
    assert_eq!(report.overall_match_percentage, 100.0);
    assert!(!report.dimension_mismatch);
}

#[test]
fn empty_reference_yields_zero_percent() {
    let empty = Strand::new(1, "Bottom", 0, 0, Vec::new()).unwrap();
    let report = compare_strands(&[empty.clone()], &[empty]);
    assert_eq!(report.strands[0].match_percentage, 0.0);
    assert_eq!(report.overall_match_percentage, 0.0);
    assert!(!report.all_strands_match);
}

#[test]
fn verdict_buckets_follow_thresholds() {
    let reference = uniform_strand(1, 0, 0, 100, (0, 0, 0));
    let cfg = CompareConfig::default();
    let with_bad = |bad: usize| {
        let candidate = recolor(&reference, |i, px| {
            if i < bad {
                Pixel::new(px.x, px.y, 255, 255, 255)
            } else {
                px
            }
        });
        compare_strands_with(&[reference.clone()], &[candidate], &cfg)
    };

    assert_eq!(with_bad(5).verdict(&cfg), Verdict::Authentic);
    assert_eq!(with_bad(6).verdict(&cfg), Verdict::Modified);
    assert_eq!(with_bad(20).verdict(&cfg), Verdict::Modified);
    assert_eq!(with_bad(21).verdict(&cfg), Verdict::Failed);

    let report = with_bad(10);
    assert_eq!(report.strands[0].match_percentage, 90.0);
    assert!(!report.strands[0].is_match);
    assert!(with_bad(9).strands[0].is_match);
}

#[test]
fn unnamed_candidate_strands_get_a_numbered_label() {
    let reference = uniform_strand(2, 0, 0, 3, (9, 9, 9));
    let candidate = Strand::new(2, "", 0, 0, reference.pixels().to_vec()).unwrap();
    let report = compare_strands(&[reference], &[candidate]);
    assert_eq!(report.strands[0].name, "Strand 2");
}
