use chrono::{Duration, NaiveDate};
use criterion::*;
use ndarray::Array2;
use thermal_series::{
    frame::{FrameEntry, FrameSequence},
    mask,
    series::{build_point_series, build_region_series},
    source::MemorySource,
    CameraType, Coord, PointSet, Polygon, Shape,
};

const ROWS: usize = 252;
const COLS: usize = 336;

fn synthetic(frames: usize) -> (MemorySource, FrameSequence) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut source = MemorySource::default();
    let mut entries = vec![];
    for i in 0..frames {
        let grid = Array2::from_shape_fn((ROWS, COLS), |(r, c)| {
            20. + (r as f64 * 0.05).sin() + (c as f64 * 0.03).cos() + i as f64 * 0.1
        });
        let id = format!("frame_{:04}", i);
        let timestamp = start + Duration::seconds(60 * i as i64);
        source.insert(id.clone(), timestamp, grid);
        entries.push(FrameEntry { id, timestamp });
    }
    let seq = FrameSequence::new(entries, Shape::new(ROWS, COLS), CameraType::Generic).unwrap();
    (source, seq)
}

fn polygon() -> Vec<Coord> {
    vec![
        Coord::new(40.5, 30.2),
        Coord::new(300.1, 50.7),
        Coord::new(280.9, 220.4),
        Coord::new(120.3, 240.8),
        Coord::new(60.6, 150.1),
    ]
}

fn series(c: &mut Criterion) {
    c.bench_function("polygon_mask", |b| {
        let vertices = polygon();
        b.iter(|| mask::contains(Shape::new(ROWS, COLS), black_box(&vertices)))
    });

    let (source, seq) = synthetic(50);

    c.bench_function("point_series", |b| {
        let points: PointSet = (0..10).map(|i| (i as f64 * 30., i as f64 * 20.)).collect();
        b.iter(|| build_point_series(&source, &seq, black_box(&points)))
    });

    c.bench_function("region_series", |b| {
        let polygon = Polygon::new(polygon()).unwrap();
        b.iter(|| build_region_series(&source, &seq, black_box(&polygon)))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = series
}

criterion_main!(benches);
