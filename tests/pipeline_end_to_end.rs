use anchordet::{
    AnchorDetError, AnchorSpec, Detection, DetectorOutput, ImageView, Keypoint, KeypointSet,
    Letterbox, Pipeline, PipelineConfig, TensorView, Unmap,
};

const TOL: f32 = 1e-2;

fn config(num_classes: usize, num_keypoints: usize) -> PipelineConfig {
    PipelineConfig {
        input_width: 64,
        input_height: 64,
        num_classes,
        num_keypoints,
        anchor_specs: vec![AnchorSpec::new(8.0, vec![(16.0, 16.0)]).unwrap()],
        ..PipelineConfig::default()
    }
}

/// 8x8 grid, one anchor slot per cell.
fn write_cell(data: &mut [f32], detect_dim: usize, row: usize, col: usize, values: &[f32]) {
    let i = row * 8 + col;
    data[i * detect_dim..i * detect_dim + values.len()].copy_from_slice(values);
}

fn boxes(output: &DetectorOutput) -> &[Detection] {
    match output {
        DetectorOutput::Boxes(items) => items,
        other => panic!("expected plain boxes, got {other:?}"),
    }
}

#[test]
fn frame_detections_land_in_source_coordinates() {
    let pipeline = Pipeline::new(config(2, 0)).unwrap();

    let pixels = vec![128u8; 320 * 240 * 3];
    let frame = ImageView::from_slice(&pixels, 320, 240, 3).unwrap();
    let prepared = pipeline.preprocess(frame).unwrap();
    assert_eq!(prepared.image.width(), 64);
    assert_eq!(prepared.image.height(), 64);
    assert_eq!(prepared.letterbox.padding().top, 8);

    let dd = 7;
    let mut data = vec![0.0f32; 8 * 8 * dd];
    // Strong class-0 object and an overlapping weaker duplicate.
    write_cell(&mut data, dd, 3, 4, &[0.5, 0.5, 0.5, 0.5, 0.9, 0.9, 0.1]);
    write_cell(&mut data, dd, 3, 5, &[0.25, 0.5, 0.5, 0.5, 0.6, 0.9, 0.1]);
    // Separate class-1 object in the corner.
    write_cell(&mut data, dd, 7, 7, &[0.5, 0.5, 0.5, 0.5, 0.8, 0.2, 0.7]);
    let head = TensorView::new(&data, [1, 8, 8, dd]).unwrap();

    let result = pipeline.postprocess(&[head], &prepared.letterbox).unwrap();
    assert!(result.skipped_heads.is_empty());
    let dets = boxes(&result.output);
    assert_eq!(dets.len(), 2);

    let first = &dets[0];
    assert_eq!(first.class_id, 0);
    assert!((first.score - 0.81).abs() < 1e-5);
    assert!((first.x1 - 140.0).abs() < TOL);
    assert!((first.y1 - 60.0).abs() < TOL);
    assert!((first.x2 - 220.0).abs() < TOL);
    assert!((first.y2 - 140.0).abs() < TOL);
    assert_eq!((first.image_width, first.image_height), (320, 240));

    let second = &dets[1];
    assert_eq!(second.class_id, 1);
    assert!((second.score - 0.56).abs() < 1e-5);
    // Network box (52, 52, 68, 68) maps to (260, 220, 340, 300).
    assert!((second.x1 - 260.0).abs() < TOL);
    assert!((second.y2 - 300.0).abs() < TOL);

    let clamped = second.clone().clamp_to_image();
    assert_eq!(clamped.x2, 320.0);
    assert_eq!(clamped.y2, 240.0);
}

#[test]
fn empty_frame_is_a_valid_empty_result() {
    let pipeline = Pipeline::new(config(1, 0)).unwrap();
    let data = vec![0.0f32; 8 * 8 * 6];
    let head = TensorView::new(&data, [1, 8, 8, 6]).unwrap();
    let letterbox = pipeline.letterbox_for(64, 64).unwrap();

    let result = pipeline.postprocess(&[head], &letterbox).unwrap();
    assert!(result.output.is_empty());
    assert!(result.skipped_heads.is_empty());
    assert_eq!(result.output, DetectorOutput::Boxes(Vec::new()));
}

#[test]
fn malformed_head_is_reported_not_fatal() {
    let pipeline = Pipeline::new(config(1, 0)).unwrap();
    let data = vec![0.5f32; 8 * 8 * 7];
    let head = TensorView::new(&data, [1, 8, 8, 7]).unwrap();
    let letterbox = pipeline.letterbox_for(64, 64).unwrap();

    let result = pipeline.postprocess(&[head], &letterbox).unwrap();
    assert!(result.output.is_empty());
    assert_eq!(
        result.skipped_heads[0].reason,
        AnchorDetError::MalformedHead {
            head: 0,
            channels: 7,
            expected: 6,
        }
    );
}

#[test]
fn invalid_frame_geometry_is_an_error() {
    let pipeline = Pipeline::new(config(1, 0)).unwrap();
    assert!(matches!(
        pipeline.letterbox_for(0, 100),
        Err(AnchorDetError::InvalidGeometry { .. })
    ));
}

#[test]
fn max_detections_caps_output() {
    let pipeline = Pipeline::new(PipelineConfig {
        max_detections: Some(1),
        ..config(1, 0)
    })
    .unwrap();
    let dd = 6;
    let mut data = vec![0.0f32; 8 * 8 * dd];
    write_cell(&mut data, dd, 0, 0, &[0.5, 0.5, 0.5, 0.5, 0.7, 1.0]);
    write_cell(&mut data, dd, 6, 6, &[0.5, 0.5, 0.5, 0.5, 0.95, 1.0]);
    let head = TensorView::new(&data, [1, 8, 8, dd]).unwrap();
    let letterbox = pipeline.letterbox_for(64, 64).unwrap();

    let result = pipeline.postprocess(&[head], &letterbox).unwrap();
    let dets = boxes(&result.output);
    assert_eq!(dets.len(), 1);
    assert!((dets[0].score - 0.95).abs() < 1e-6);
}

#[test]
fn pose_heads_produce_unmapped_keypoints() {
    let pipeline = Pipeline::new(config(1, 1)).unwrap();
    let dd = 5 + 1 + 3;
    let mut data = vec![0.0f32; 8 * 8 * dd];
    write_cell(
        &mut data,
        dd,
        2,
        2,
        &[0.5, 0.5, 0.5, 0.5, 0.9, 1.0, 0.5, 0.5, 0.7],
    );
    let head = TensorView::new(&data, [1, 8, 8, dd]).unwrap();
    // 128x64 source: scale 0.5, 16 rows of padding on top.
    let letterbox = pipeline.letterbox_for(128, 64).unwrap();
    assert_eq!(letterbox.padding().top, 16);

    let result = pipeline.postprocess(&[head], &letterbox).unwrap();
    let dets = match &result.output {
        DetectorOutput::BoxesWithKeypoints(items) => items,
        other => panic!("expected pose output, got {other:?}"),
    };
    assert_eq!(dets.len(), 1);
    let kp = dets[0].keypoints[0];
    // Network (20, 20) -> source (40, 8).
    assert!((kp.x - 40.0).abs() < TOL);
    assert!((kp.y - 8.0).abs() < TOL);
    assert!((kp.score - 0.7).abs() < 1e-6);
}

#[test]
fn keypoint_sets_share_the_same_unmapping() {
    let letterbox = Letterbox::compute(640, 480, 640, 640).unwrap();
    let set = KeypointSet {
        score: 0.9,
        image_width: 640,
        image_height: 640,
        keypoints: vec![
            Keypoint {
                x: 10.0,
                y: 80.0,
                score: 1.0,
            },
            Keypoint {
                x: 320.0,
                y: 560.0,
                score: 0.5,
            },
        ],
    };

    let output = DetectorOutput::Keypoints(vec![set]).unmap(&letterbox);
    let sets = match output {
        DetectorOutput::Keypoints(sets) => sets,
        other => panic!("expected keypoints, got {other:?}"),
    };
    assert_eq!((sets[0].image_width, sets[0].image_height), (640, 480));
    assert_eq!(sets[0].keypoints[0].y, 0.0);
    assert_eq!(sets[0].keypoints[1].y, 480.0);
    assert_eq!(sets[0].keypoints[1].x, 320.0);
}

#[test]
fn detections_rescale_to_a_view() {
    let det = Detection {
        x1: 10.0,
        y1: 20.0,
        x2: 110.0,
        y2: 220.0,
        score: 0.5,
        class_id: 3,
        image_width: 200,
        image_height: 400,
        keypoints: vec![Keypoint {
            x: 100.0,
            y: 100.0,
            score: 1.0,
        }],
    };
    let view = det.rescale_to_view(100, 100);
    assert_eq!((view.x1, view.y1, view.x2, view.y2), (5.0, 5.0, 55.0, 55.0));
    assert_eq!((view.keypoints[0].x, view.keypoints[0].y), (50.0, 25.0));
    assert_eq!((view.image_width, view.image_height), (100, 100));
}

#[test]
fn letterbox_for_another_network_size_is_rejected() {
    let pipeline = Pipeline::new(config(1, 0)).unwrap();
    let data = vec![0.0f32; 8 * 8 * 6];
    let head = TensorView::new(&data, [1, 8, 8, 6]).unwrap();
    let foreign = Letterbox::compute(1000, 500, 320, 320).unwrap();

    assert_eq!(
        pipeline.postprocess(&[head], &foreign),
        Err(AnchorDetError::InvalidGeometry {
            src_width: 1000,
            src_height: 500,
            dst_width: 320,
            dst_height: 320,
        })
    );
    assert!(pipeline
        .postprocess(&[head], &pipeline.letterbox_for(1000, 500).unwrap())
        .is_ok());
}
