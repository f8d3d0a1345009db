//! Integration tests driven by the hand-built cases in `synthetic_cases/`.
//!
//! Each case lists sparse head cells and the source-space detections the
//! full post-processing chain must produce for them.

use anchordet::{AnchorSpec, DetectorOutput, OwnedTensor, Pipeline, PipelineConfig, TensorView};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Coordinate tolerance in source pixels.
const POSITION_TOLERANCE_PX: f32 = 1e-2;

const SCORE_TOLERANCE: f32 = 1e-5;

#[derive(Debug, Deserialize)]
struct CaseFile {
    cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PipelineOverrides {
    input_size: [usize; 2],
    num_classes: usize,
    confidence_threshold: f32,
    class_agnostic_nms: bool,
}

impl Default for PipelineOverrides {
    fn default() -> Self {
        let cfg = PipelineConfig::default();
        Self {
            input_size: [cfg.input_width, cfg.input_height],
            num_classes: cfg.num_classes,
            confidence_threshold: cfg.confidence_threshold,
            class_agnostic_nms: cfg.class_agnostic_nms,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Cell {
    row: usize,
    col: usize,
    anchor: usize,
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct Head {
    stride: f32,
    anchors: Vec<[f32; 2]>,
    /// Grid height and width.
    grid: [usize; 2],
    cells: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
struct Expected {
    class_id: usize,
    score: f32,
    bbox: [f32; 4],
}

#[derive(Debug, Deserialize)]
struct Case {
    case_id: String,
    source_size: [usize; 2],
    #[serde(default)]
    pipeline: PipelineOverrides,
    heads: Vec<Head>,
    expected: Vec<Expected>,
}

fn cases_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("synthetic_cases")
        .join("cases.json")
}

fn build_pipeline(case: &Case) -> Result<Pipeline, String> {
    // Anchor tables pair with heads by ascending grid height.
    let mut tables: Vec<&Head> = case.heads.iter().collect();
    tables.sort_by_key(|head| head.grid[0]);
    let anchor_specs = tables
        .into_iter()
        .map(|head| {
            let sizes = head.anchors.iter().map(|&[w, h]| (w, h)).collect();
            AnchorSpec::new(head.stride, sizes)
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("bad anchors: {e}"))?;

    let overrides = &case.pipeline;
    Pipeline::new(PipelineConfig {
        input_width: overrides.input_size[0],
        input_height: overrides.input_size[1],
        num_classes: overrides.num_classes,
        confidence_threshold: overrides.confidence_threshold,
        class_agnostic_nms: overrides.class_agnostic_nms,
        anchor_specs,
        ..PipelineConfig::default()
    })
    .map_err(|e| format!("bad pipeline config: {e}"))
}

fn build_head(head: &Head, detect_dim: usize) -> Result<OwnedTensor, String> {
    let [height, width] = head.grid;
    let num_anchors = head.anchors.len();
    let channels = num_anchors * detect_dim;
    let mut data = vec![0.0f32; height * width * channels];
    for cell in &head.cells {
        if cell.values.len() > detect_dim || cell.anchor >= num_anchors {
            return Err(format!("cell {cell:?} does not fit the head"));
        }
        let slot = (cell.row * width + cell.col) * num_anchors + cell.anchor;
        let start = slot * detect_dim;
        data[start..start + cell.values.len()].copy_from_slice(&cell.values);
    }
    OwnedTensor::new(data, [1, height, width, channels]).map_err(|e| e.to_string())
}

fn run_case(case: &Case) -> Result<(), String> {
    let pipeline = build_pipeline(case)?;
    let detect_dim = pipeline.decoder().config().detect_dim();
    let tensors = case
        .heads
        .iter()
        .map(|head| build_head(head, detect_dim))
        .collect::<Result<Vec<_>, _>>()?;
    let views: Vec<TensorView<'_>> = tensors.iter().map(OwnedTensor::view).collect();

    let [src_w, src_h] = case.source_size;
    let letterbox = pipeline
        .letterbox_for(src_w, src_h)
        .map_err(|e| e.to_string())?;
    let result = pipeline
        .postprocess(&views, &letterbox)
        .map_err(|e| e.to_string())?;

    if !result.skipped_heads.is_empty() {
        return Err(format!("unexpected skipped heads: {:?}", result.skipped_heads));
    }
    let dets = match &result.output {
        DetectorOutput::Boxes(items) => items,
        other => return Err(format!("expected plain boxes, got {other:?}")),
    };
    if dets.len() != case.expected.len() {
        return Err(format!(
            "expected {} detections, got {}: {dets:?}",
            case.expected.len(),
            dets.len()
        ));
    }

    for (idx, (det, want)) in dets.iter().zip(&case.expected).enumerate() {
        if det.class_id != want.class_id {
            return Err(format!(
                "detection {idx}: class {} != {}",
                det.class_id, want.class_id
            ));
        }
        if (det.score - want.score).abs() > SCORE_TOLERANCE {
            return Err(format!(
                "detection {idx}: score {} != {}",
                det.score, want.score
            ));
        }
        let got = [det.x1, det.y1, det.x2, det.y2];
        for (g, w) in got.iter().zip(want.bbox.iter()) {
            if (g - w).abs() > POSITION_TOLERANCE_PX {
                return Err(format!(
                    "detection {idx}: box {got:?} != {:?}",
                    want.bbox
                ));
            }
        }
        if (det.image_width, det.image_height) != (src_w, src_h) {
            return Err(format!(
                "detection {idx}: image size {}x{} != {src_w}x{src_h}",
                det.image_width, det.image_height
            ));
        }
    }
    Ok(())
}

#[test]
fn synthetic_cases_match_ground_truth() {
    let path = cases_path();
    let text = fs::read_to_string(&path).expect("failed to read synthetic cases");
    let file: CaseFile = serde_json::from_str(&text).expect("failed to parse synthetic cases");
    assert!(!file.cases.is_empty());

    let failures: Vec<String> = file
        .cases
        .iter()
        .filter_map(|case| {
            run_case(case)
                .err()
                .map(|err| format!("{}: {err}", case.case_id))
        })
        .collect();

    assert!(failures.is_empty(), "failed cases:\n{}", failures.join("\n"));
}
