use anchordet::io::image_dimensions;
use anchordet::{
    AnchorSpec, Detection, DetectorOutput, Keypoint, KeypointSet, NmsMethod, OwnedTensor,
    Pipeline, PipelineConfig, ScoreMode, TensorView,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "anchordet CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScoreModeConfig {
    Objectness,
    Confidence,
}

impl From<ScoreModeConfig> for ScoreMode {
    fn from(value: ScoreModeConfig) -> Self {
        match value {
            ScoreModeConfig::Objectness => ScoreMode::Objectness,
            ScoreModeConfig::Confidence => ScoreMode::Confidence,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum NmsMethodConfig {
    Hard,
    Soft { sigma: f32, score_threshold: f32 },
}

impl From<NmsMethodConfig> for NmsMethod {
    fn from(value: NmsMethodConfig) -> Self {
        match value {
            NmsMethodConfig::Hard => NmsMethod::Hard,
            NmsMethodConfig::Soft {
                sigma,
                score_threshold,
            } => NmsMethod::Soft {
                sigma,
                score_threshold,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnchorConfig {
    stride: f32,
    sizes: Vec<[f32; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PipelineConfigJson {
    input_width: usize,
    input_height: usize,
    num_classes: usize,
    num_keypoints: usize,
    confidence_threshold: f32,
    score_mode: ScoreModeConfig,
    nms_iou_threshold: f32,
    class_agnostic_nms: bool,
    nms: NmsMethodConfig,
    max_detections: Option<usize>,
    pad_value: u8,
    anchors: Option<Vec<AnchorConfig>>,
}

impl Default for PipelineConfigJson {
    fn default() -> Self {
        let cfg = PipelineConfig::default();
        Self {
            input_width: cfg.input_width,
            input_height: cfg.input_height,
            num_classes: cfg.num_classes,
            num_keypoints: cfg.num_keypoints,
            confidence_threshold: cfg.confidence_threshold,
            score_mode: ScoreModeConfig::Objectness,
            nms_iou_threshold: cfg.nms_iou_threshold,
            class_agnostic_nms: cfg.class_agnostic_nms,
            nms: NmsMethodConfig::Hard,
            max_detections: cfg.max_detections,
            pad_value: cfg.pad_value,
            anchors: None,
        }
    }
}

impl PipelineConfigJson {
    fn into_config(self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        let anchor_specs = match self.anchors {
            Some(tables) => tables
                .into_iter()
                .map(|table| {
                    let sizes = table.sizes.into_iter().map(|[w, h]| (w, h)).collect();
                    AnchorSpec::new(table.stride, sizes)
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => AnchorSpec::yolov5_default(),
        };
        Ok(PipelineConfig {
            input_width: self.input_width,
            input_height: self.input_height,
            num_classes: self.num_classes,
            num_keypoints: self.num_keypoints,
            confidence_threshold: self.confidence_threshold,
            score_mode: self.score_mode.into(),
            nms_iou_threshold: self.nms_iou_threshold,
            class_agnostic_nms: self.class_agnostic_nms,
            nms_method: self.nms.into(),
            max_detections: self.max_detections,
            pad_value: self.pad_value,
            anchor_specs,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HeadConfig {
    path: PathBuf,
    dims: [usize; 4],
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    image_path: Option<PathBuf>,
    image_width: Option<usize>,
    image_height: Option<usize>,
    heads: Vec<HeadConfig>,
    output_path: Option<PathBuf>,
    clamp_to_image: bool,
    pipeline: PipelineConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: None,
            image_width: None,
            image_height: None,
            heads: Vec::new(),
            output_path: None,
            clamp_to_image: true,
            pipeline: PipelineConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct KeypointRecord {
    x: f32,
    y: f32,
    score: f32,
}

impl From<Keypoint> for KeypointRecord {
    fn from(value: Keypoint) -> Self {
        Self {
            x: value.x,
            y: value.y,
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    class_id: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    keypoints: Vec<KeypointRecord>,
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        Self {
            x1: value.x1,
            y1: value.y1,
            x2: value.x2,
            y2: value.y2,
            score: value.score,
            class_id: value.class_id,
            keypoints: value.keypoints.into_iter().map(KeypointRecord::from).collect(),
        }
    }
}

impl From<KeypointSet> for DetectionRecord {
    fn from(value: KeypointSet) -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: 0.0,
            score: value.score,
            class_id: 0,
            keypoints: value.keypoints.into_iter().map(KeypointRecord::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SkippedRecord {
    head: usize,
    reason: String,
}

#[derive(Debug, Serialize)]
struct Output {
    kind: &'static str,
    image_width: usize,
    image_height: usize,
    detections: Vec<DetectionRecord>,
    skipped_heads: Vec<SkippedRecord>,
}

fn read_f32_le(path: &Path) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(format!("{} is not a whole number of f32 values", path.display()).into());
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("anchordet=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.heads.is_empty() {
        return Err("at least one head must be listed in the config".into());
    }

    let source = (&config.image_path, config.image_width, config.image_height);
    let (image_width, image_height) = match source {
        (Some(path), _, _) => image_dimensions(path)?,
        (None, Some(width), Some(height)) => (width, height),
        _ => return Err("either image_path or image_width and image_height must be set".into()),
    };

    let pipeline = Pipeline::new(config.pipeline.into_config()?)?;
    let letterbox = pipeline.letterbox_for(image_width, image_height)?;

    let tensors = config
        .heads
        .iter()
        .map(|head| -> Result<OwnedTensor, Box<dyn std::error::Error>> {
            Ok(OwnedTensor::new(read_f32_le(&head.path)?, head.dims)?)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let views: Vec<TensorView<'_>> = tensors.iter().map(OwnedTensor::view).collect();

    let result = pipeline.postprocess(&views, &letterbox)?;
    tracing::info!(
        detections = result.output.len(),
        skipped_heads = result.skipped_heads.len(),
        "postprocess complete"
    );
    let clamp = |det: Detection| {
        if config.clamp_to_image {
            det.clamp_to_image()
        } else {
            det
        }
    };
    let (kind, detections): (&'static str, Vec<DetectionRecord>) = match result.output {
        DetectorOutput::Boxes(items) => (
            "boxes",
            items.into_iter().map(clamp).map(DetectionRecord::from).collect(),
        ),
        DetectorOutput::BoxesWithKeypoints(items) => (
            "boxes_with_keypoints",
            items.into_iter().map(clamp).map(DetectionRecord::from).collect(),
        ),
        DetectorOutput::Keypoints(items) => (
            "keypoints",
            items.into_iter().map(DetectionRecord::from).collect(),
        ),
    };
    let skipped_heads = result
        .skipped_heads
        .into_iter()
        .map(|skipped| SkippedRecord {
            head: skipped.head,
            reason: skipped.reason.to_string(),
        })
        .collect();

    let output = Output {
        kind,
        image_width,
        image_height,
        detections,
        skipped_heads,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
