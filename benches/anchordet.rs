use anchordet::lowlevel::letterbox_u8;
use anchordet::{ImageView, OwnedTensor, Pipeline, PipelineConfig, TensorView};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

/// Deterministic pseudo-random head with roughly `hit_rate` of the slots
/// above the default objectness threshold.
fn make_head(height: usize, width: usize, detect_dim: usize, hit_rate: u32) -> OwnedTensor {
    let channels = 3 * detect_dim;
    let mut data = Vec::with_capacity(height * width * channels);
    let mut state = 0x9e37_79b9u32;
    for idx in 0..height * width * channels {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let unit = (state % 1000) as f32 / 1000.0;
        let value = if idx % detect_dim == 4 {
            if state % 1000 < hit_rate {
                0.5 + unit * 0.5
            } else {
                unit * 0.2
            }
        } else {
            unit
        };
        data.push(value);
    }
    OwnedTensor::new(data, [1, height, width, channels]).unwrap()
}

fn make_image(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            for c in 0..3 {
                data.push((((x * 13) ^ (y * 7) ^ (c * 31)) & 0xFF) as u8);
            }
        }
    }
    data
}

fn bench_postprocess(c: &mut Criterion) {
    let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
    let detect_dim = pipeline.decoder().config().detect_dim();
    let heads = [
        make_head(80, 80, detect_dim, 5),
        make_head(40, 40, detect_dim, 5),
        make_head(20, 20, detect_dim, 5),
    ];
    let views: Vec<TensorView<'_>> = heads.iter().map(|h| h.view()).collect();
    let letterbox = pipeline.letterbox_for(1280, 720).unwrap();

    c.bench_function("postprocess_yolov5s_640", |b| {
        b.iter(|| black_box(pipeline.postprocess(&views, &letterbox).unwrap()));
    });

    c.bench_function("decode_only_yolov5s_640", |b| {
        b.iter(|| black_box(pipeline.decoder().decode(&views, 0)));
    });
}

fn bench_letterbox(c: &mut Criterion) {
    let width = 1280;
    let height = 720;
    let image = make_image(width, height);
    let view = ImageView::from_slice(&image, width, height, 3).unwrap();

    c.bench_function("letterbox_1280x720_to_640", |b| {
        b.iter(|| black_box(letterbox_u8(view, 640, 640, 114).unwrap()));
    });
}

criterion_group!(benches, bench_postprocess, bench_letterbox);
criterion_main!(benches);
