use graphseg::graph::{build_edges, color_distance, edge_count};
use graphseg::smoothing::{axis_kernel, smooth};
use graphseg::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> PixelGrid {
    let mut data = Vec::with_capacity((width * height) as usize);
    for row in 0..height {
        for col in 0..width {
            data.push(f(row, col));
        }
    }
    PixelGrid::new(width, height, 1, data).expect("valid grid")
}

/// Deterministic xorshift noise
fn noise(width: u32, height: u32, channels: u8, mut seed: u32) -> PixelGrid {
    let len = (width * height) as usize * channels as usize;
    let data = (0..len)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed >> 24) as u8
        })
        .collect();
    PixelGrid::new(width, height, channels, data).expect("valid grid")
}

/// Vertical bands of two columns each: 0, 60, 200
fn three_bands() -> PixelGrid {
    gray(6, 4, |_, col| match col / 2 {
        0 => 0,
        1 => 60,
        _ => 200,
    })
}

#[test]
fn test_uniform_image_is_one_segment() {
    let image = gray(4, 4, |_, _| 128);
    let labels = segment(&image, 0.5, 300.0, 1).expect("segmentation");

    assert_eq!(labels.num_segments(), 1);
    assert!(labels.labels().iter().all(|&l| l == 0));
}

#[test]
fn test_contrasting_halves_form_two_segments() {
    let image = gray(4, 4, |_, col| if col < 2 { 0 } else { 255 });
    let labels = segment(&image, 0.0, 1.0, 1).expect("segmentation");

    assert_eq!(labels.num_segments(), 2);
    for row in 0..4 {
        for col in 0..4 {
            let expected = if col < 2 { 0 } else { 1 };
            assert_eq!(labels.get(row, col), expected, "pixel ({row}, {col})");
        }
    }

    let left: Vec<bool> = (0..16).map(|i| i % 4 < 2).collect();
    assert_eq!(labels.mask(0), left);
}

#[test]
fn test_min_size_covering_image_collapses_noise() {
    init_logging();
    let image = noise(8, 8, 1, 0x1234_5678);
    for k in [0.0, 1.0, 300.0, 1.0e6] {
        let labels = segment(&image, 0.5, k, 64).expect("segmentation");
        assert_eq!(labels.num_segments(), 1, "k = {k}");
    }
}

#[test]
fn test_min_size_larger_than_image() {
    let image = noise(5, 3, 3, 42);
    let labels = segment(&image, 0.0, 0.0, 1000).expect("segmentation");
    assert_eq!(labels.num_segments(), 1);
}

#[test]
fn test_increasing_k_never_adds_segments() {
    let image = three_bands();
    let counts: Vec<usize> = [0.0, 100.0, 500.0, 1000.0, 1500.0, 5000.0]
        .into_iter()
        .map(|k| segment(&image, 0.0, k, 0).expect("segmentation").num_segments())
        .collect();

    assert_eq!(counts, vec![3, 3, 2, 2, 1, 1]);
    assert!(counts.windows(2).all(|w| w[1] <= w[0]));

    let halves = gray(4, 4, |_, col| if col < 2 { 0 } else { 255 });
    let counts: Vec<usize> = [0.0, 1.0, 100.0, 1000.0, 10_000.0]
        .into_iter()
        .map(|k| segment(&halves, 0.0, k, 0).expect("segmentation").num_segments())
        .collect();
    assert_eq!(counts, vec![2, 2, 2, 2, 1]);
}

#[test]
fn test_labels_follow_row_major_discovery() {
    let labels = segment(&three_bands(), 0.0, 0.0, 0).expect("segmentation");

    assert_eq!(labels.num_segments(), 3);
    for row in 0..4 {
        for col in 0..6 {
            assert_eq!(labels.get(row, col), (col / 2) as i32);
        }
    }
    assert_eq!(labels.segment_sizes(), vec![8, 8, 8]);
}

#[test]
fn test_segmentation_is_deterministic() {
    init_logging();
    let image = noise(32, 24, 3, 7);
    let first = segment(&image, 0.8, 150.0, 10).expect("segmentation");
    for _ in 0..3 {
        assert_eq!(segment(&image, 0.8, 150.0, 10).expect("segmentation"), first);
    }
}

#[test]
fn test_zero_and_negative_sigma_are_identity() {
    let image = noise(7, 5, 3, 99);
    let expected: Vec<f32> = image.as_bytes().iter().map(|&v| f32::from(v)).collect();

    for sigma in [0.0, -1.0] {
        let smoothed = smooth(&image, sigma).expect("smoothing");
        assert_eq!(smoothed.as_slice(), expected.as_slice());
    }

    assert!(segment(&image, 0.0, 300.0, 5).is_ok());
    assert!(segment(&image, -3.0, 300.0, 5).is_ok());
}

#[test]
fn test_smoothing_preserves_constant_image_and_range() {
    let flat = gray(9, 9, |_, _| 77);
    let smoothed = smooth(&flat, 2.0).expect("smoothing");
    assert!(smoothed.as_slice().iter().all(|&v| (v - 77.0).abs() < 1e-3));

    let image = noise(6, 6, 4, 5);
    let smoothed = smooth(&image, 1.5).expect("smoothing");
    assert_eq!(smoothed.channels(), 4);
    assert_eq!(smoothed.as_slice().len(), image.as_bytes().len());
    assert!(smoothed
        .as_slice()
        .iter()
        .all(|&v| (-1e-3..=255.001).contains(&v)));
}

#[test]
fn test_smoothing_single_pixel() {
    let image = PixelGrid::new(1, 1, 3, vec![10, 20, 30]).unwrap();
    let smoothed = smooth(&image, 3.0).expect("smoothing");
    for (got, want) in smoothed.as_slice().iter().zip([10.0f32, 20.0, 30.0]) {
        assert!((got - want).abs() < 1e-3);
    }

    let labels = segment(&image, 3.0, 300.0, 100).expect("segmentation");
    assert_eq!(labels.labels(), &[0]);
}

#[test]
fn test_tiny_sigma_behaves_as_identity() {
    let flat = gray(4, 4, |_, _| 128);
    let smoothed = smooth(&flat, 1e-200).expect("smoothing");
    assert!(smoothed.as_slice().iter().all(|&v| v == 128.0));
    assert_eq!(segment(&flat, 1e-200, 300.0, 1).unwrap().num_segments(), 1);

    let image = noise(5, 4, 3, 21);
    let expected: Vec<f32> = image.as_bytes().iter().map(|&v| f32::from(v)).collect();
    let smoothed = smooth(&image, 1e-200).expect("smoothing");
    assert_eq!(smoothed.as_slice(), expected.as_slice());
}

#[test]
fn test_huge_sigma_flattens_small_image() {
    let image = noise(5, 4, 3, 33);
    for sigma in [1e6, 1e12, 1e300] {
        let smoothed = smooth(&image, sigma).expect("smoothing");
        let values = smoothed.as_slice();
        assert_eq!(values.len(), image.as_bytes().len());
        assert!(values.iter().all(|v| (-1e-3..=255.001).contains(v)));

        for c in 0..3 {
            let channel: Vec<f32> = values.iter().skip(c).step_by(3).copied().collect();
            let lo = channel.iter().copied().fold(f32::INFINITY, f32::min);
            let hi = channel.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            assert!(hi - lo < 1.0, "sigma = {sigma}, channel {c}: spread {}", hi - lo);
        }
    }

    assert!(segment(&image, 1e12, 300.0, 1).is_ok());
}

#[test]
fn test_kernel_folds_onto_reflect_period() {
    let plain = axis_kernel(1.0, 32).expect("kernel");
    assert_eq!(plain.origin(), -4);
    assert_eq!(plain.weights().len(), 9);

    let folded = axis_kernel(50.0, 6).expect("kernel");
    assert_eq!(folded.origin(), 0);
    assert_eq!(folded.weights().len(), 10);
    let sum: f32 = folded.weights().iter().sum();
    assert!((sum - 1.0).abs() < 1e-4);

    assert_eq!(axis_kernel(1e9, 1).unwrap().weights(), &[1.0]);
}

#[test]
fn test_edges_cover_eight_neighbourhood_once() {
    let image = smooth(&noise(3, 2, 1, 11), 0.0).unwrap();
    let edges = build_edges(&image).expect("edges");

    assert_eq!(edge_count(3, 2), 11);
    assert_eq!(edges.len(), 11);
    assert!(edges.windows(2).all(|w| w[0].weight <= w[1].weight));
    assert!(edges.iter().all(|e| e.weight >= 0.0));

    let mut pairs: Vec<(usize, usize)> = edges.iter().map(|e| (e.a.min(e.b), e.a.max(e.b))).collect();
    pairs.sort_unstable();
    pairs.dedup();
    assert_eq!(
        pairs,
        vec![
            (0, 1),
            (0, 3),
            (0, 4),
            (1, 2),
            (1, 3),
            (1, 4),
            (1, 5),
            (2, 4),
            (2, 5),
            (3, 4),
            (4, 5),
        ]
    );
}

#[test]
fn test_edge_count_degenerate_shapes() {
    assert_eq!(edge_count(1, 1), 0);
    assert_eq!(edge_count(5, 1), 4);
    assert_eq!(edge_count(1, 5), 4);
    assert_eq!(edge_count(0, 5), 0);
}

#[test]
fn test_color_distance_is_euclidean() {
    assert_eq!(color_distance(&[0.0, 0.0, 0.0], &[3.0, 4.0, 0.0]), 5.0);
    assert_eq!(color_distance(&[10.0], &[4.0]), 6.0);
    assert_eq!(color_distance(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0, 3.0, 4.0]), 0.0);
}

#[test]
fn test_invalid_pixel_grids_rejected() {
    for result in [
        PixelGrid::new(0, 4, 1, Vec::new()),
        PixelGrid::new(4, 0, 1, Vec::new()),
        PixelGrid::new(2, 2, 2, vec![0; 8]),
        PixelGrid::new(2, 2, 3, vec![0; 11]),
        PixelGrid::new(MAX_DIMENSION + 1, 1, 1, Vec::new()),
    ] {
        match result {
            Err(GraphSegError::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }
}

#[test]
fn test_invalid_parameters_rejected() {
    let image = gray(4, 4, |_, _| 0);
    for (sigma, k) in [(0.5, -1.0), (0.5, f32::NAN), (f64::NAN, 300.0), (f64::INFINITY, 300.0)] {
        let err = segment(&image, sigma, k, 10).expect_err("invalid parameters");
        assert!(matches!(err, GraphSegError::InvalidInput(_)));
        assert!(err.is_caller_error());
    }
}

#[test]
fn test_segmenter_properties() {
    let mut segmenter = Segmenter::default();
    assert_eq!(segmenter.sigma(), 0.5);
    assert_eq!(segmenter.k(), 300.0);
    assert_eq!(segmenter.min_size(), 100);

    segmenter.set_sigma(0.0);
    segmenter.set_k(1.0);
    segmenter.set_min_size(1);
    assert_eq!(segmenter.params(), SegmentationParams::new(0.0, 1.0, 1));

    let built = Segmenter::default().with_sigma(0.0).with_k(1.0).with_min_size(1);
    assert_eq!(built, segmenter);

    let image = gray(4, 4, |_, col| if col < 2 { 0 } else { 255 });
    assert_eq!(segmenter.process_image(&image).unwrap().num_segments(), 2);
}

#[test]
fn test_segmenter_accepts_dynamic_images() {
    let rgb = image::RgbImage::from_pixel(6, 4, image::Rgb([12, 200, 40]));
    let labels = Segmenter::default()
        .process_dynamic(&image::DynamicImage::ImageRgb8(rgb))
        .expect("segmentation");
    assert_eq!(labels.num_segments(), 1);
    assert_eq!((labels.width(), labels.height()), (6, 4));
}

#[test]
fn test_pixel_grid_from_dynamic_layouts() {
    let luma_alpha = image::DynamicImage::new_luma_a8(3, 2);
    assert_eq!(PixelGrid::from_dynamic(&luma_alpha).unwrap().channels(), 4);

    let luma16 = image::DynamicImage::new_luma16(3, 2);
    assert_eq!(PixelGrid::from_dynamic(&luma16).unwrap().channels(), 1);

    let rgba = image::DynamicImage::new_rgba8(3, 2);
    let grid = PixelGrid::try_from(&rgba).unwrap();
    assert_eq!(grid.channels(), 4);
    assert_eq!(grid.pixel(1, 2).len(), 4);
}

#[test]
fn test_label_grid_summary_and_colors() {
    let labels = segment(&three_bands(), 0.0, 0.0, 0).unwrap();
    let summary = labels.summary();
    assert_eq!(summary.num_segments, 3);
    assert_eq!(summary.min_segment_size, 8);
    assert_eq!(summary.max_segment_size, 8);
    assert!((summary.mean_segment_size - 8.0).abs() < f64::EPSILON);

    let colors = labels.colorize();
    assert_eq!(colors.dimensions(), (6, 4));
    assert_eq!(colors.get_pixel(0, 0), colors.get_pixel(1, 3));
    assert_ne!(colors.get_pixel(0, 0), colors.get_pixel(2, 0));
}

#[test]
fn test_params_deserialize_with_defaults() {
    let params: SegmentationParams = serde_json::from_str(r#"{"k": 50.0}"#).unwrap();
    assert_eq!(params, SegmentationParams::new(DEFAULT_SIGMA, 50.0, DEFAULT_MIN_SIZE));
    assert!(params.validate().is_ok());
}

#[test]
fn test_constants() {
    assert_eq!(DEFAULT_SIGMA, 0.5);
    assert_eq!(DEFAULT_K, 300.0);
    assert_eq!(DEFAULT_MIN_SIZE, 100);
    assert_eq!(MAX_DIMENSION, 65536);
}
