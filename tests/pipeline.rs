use image::{DynamicImage, GrayImage, Luma};
use sobel_vision::core_modules::convolution;
use sobel_vision::core_modules::marshal;
use sobel_vision::{
    EdgeConfig, EdgeError, EdgePipeline, Grid, Kernel, Operator, ParallelEdgePipeline,
    ProcessingMode, WorkerPool,
};

fn impulse() -> Grid {
    let mut grid = Grid::new(3, 3).unwrap();
    grid.set(1, 1, 1.0);
    grid
}

fn diagonal_step(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        Luma([if x + y > width.min(height) { 230 } else { 20 }])
    })
}

#[test]
fn impulse_golden_through_public_api() {
    let _ = env_logger::builder().is_test(true).try_init();
    for config in [EdgeConfig::sequential(), EdgeConfig::with_workers(2)] {
        let map = EdgePipeline::new(config).unwrap().detect(&impulse()).unwrap();

        assert_eq!(
            map.gradient_x,
            Grid::from_rows(&[[1.0, 0.0, -1.0], [2.0, 0.0, -2.0], [1.0, 0.0, -1.0]]).unwrap()
        );
        assert_eq!(
            map.gradient_y,
            Grid::from_rows(&[[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]]).unwrap()
        );

        // Corners have magnitude sqrt(2), edge midpoints 2, the centre 0.
        let image = map.to_image().unwrap();
        assert_eq!(
            image.as_raw(),
            &vec![180, 255, 180, 255, 0, 255, 180, 255, 180]
        );
    }
}

#[test]
fn convolution_is_identical_for_every_worker_count() {
    let _ = env_logger::builder().is_test(true).try_init();
    let data = (0..29 * 13).map(|i| ((i * 7919) % 257) as f64 / 256.0).collect();
    let grid = Grid::from_vec(29, 13, data).unwrap();
    let kernel = Kernel::sobel_x();
    let expected = convolution::convolve_sequential(&grid, &kernel).unwrap();

    for workers in 1..=grid.height() + 5 {
        let pool = WorkerPool::new(workers).unwrap();
        let actual = convolution::convolve_parallel(&grid, &kernel, &pool).unwrap();
        assert_eq!(actual, expected, "workers = {workers}");
    }
}

#[test]
fn file_round_trip_writes_edge_map() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    let sequential_out = dir.path().join("sequential.png");
    let parallel_out = dir.path().join("out").join("parallel.png");
    diagonal_step(32, 24).save(&input).unwrap();

    let sequential = EdgePipeline::new(EdgeConfig::sequential()).unwrap();
    sequential.detect_file(&input, &sequential_out).unwrap();
    let parallel = EdgePipeline::new(EdgeConfig::with_workers(5)).unwrap();
    let map = parallel.detect_file(&input, &parallel_out).unwrap();

    let a = marshal::open(&sequential_out).unwrap().to_luma8();
    let b = marshal::open(&parallel_out).unwrap().to_luma8();
    assert_eq!(a.dimensions(), (32, 24));
    assert_eq!(a, b);
    assert_eq!(b, map.to_image().unwrap());
    assert!(a.as_raw().iter().any(|&v| v == 255));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_file_pipeline_matches_sync() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    let sync_out = dir.path().join("sync.png");
    let async_out = dir.path().join("async.png");
    diagonal_step(40, 17).save(&input).unwrap();

    let config = EdgeConfig {
        workers: 3,
        mode: ProcessingMode::Parallel,
        operator: Operator::Scharr,
    };
    let sync_map = EdgePipeline::new(config.clone())
        .unwrap()
        .detect_file(&input, &sync_out)
        .unwrap();
    let async_map = ParallelEdgePipeline::new(config)
        .unwrap()
        .detect_file(&input, &async_out)
        .await
        .unwrap();

    assert_eq!(async_map.edges, sync_map.edges);
    let a = marshal::open(&sync_out).unwrap().to_luma8();
    let b = marshal::open(&async_out).unwrap().to_luma8();
    assert_eq!(a, b);
}

#[test]
fn uniform_image_produces_black_interior() {
    let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(9, 7, Luma([128])));
    let out = EdgePipeline::new(EdgeConfig::with_workers(4))
        .unwrap()
        .detect_image(&image)
        .unwrap();
    for y in 1..6 {
        for x in 1..8 {
            assert_eq!(out.get_pixel(x, y).0, [0]);
        }
    }
}

#[test]
fn preconditions_fail_fast() {
    assert!(matches!(
        Grid::new(0, 4),
        Err(EdgeError::InvalidDimensions { .. })
    ));
    assert!(matches!(
        Kernel::new(2, 3, vec![0.0; 6]),
        Err(EdgeError::InvalidDimensions { .. })
    ));
    assert!(matches!(
        Grid::from_rows(&[vec![1.0, 2.0], vec![3.0]]),
        Err(EdgeError::RaggedRows { row: 1, .. })
    ));
}
