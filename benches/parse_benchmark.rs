use bvh_motion::parse::load_bvh_from_string;
use bvh_motion::player::MotionPlayer;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fmt::Write;

/// A single chain of `depth` joints with three rotation channels each, and `frames` rows of motion.
fn synthetic_bvh(depth: usize, frames: usize) -> String {
    let mut text = String::from(
        "HIERARCHY\nROOT Hips\n{\n\tOFFSET 0 0 0\n\
         \tCHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation\n",
    );
    for i in 0..depth {
        let _ = writeln!(
            text,
            "JOINT Joint{}\n{{\n\tOFFSET 0 1.5 0\n\tCHANNELS 3 Zrotation Xrotation Yrotation",
            i
        );
    }
    text.push_str("End Site\n{\n\tOFFSET 0 1 0\n}\n");
    for _ in 0..=depth {
        text.push_str("}\n");
    }
    let channels = 6 + 3 * depth;
    let _ = write!(text, "MOTION\nFrames: {}\nFrame Time:\t0.0083333\n", frames);
    for frame in 0..frames {
        let row: Vec<String> = (0..channels)
            .map(|c| format!("{:.4}", (frame * 7 + c) as f64 * 0.01))
            .collect();
        text.push_str(&row.join(" "));
        text.push('\n');
    }
    text
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let bvh_string = synthetic_bvh(40, 600);

    let mut group = c.benchmark_group("sample-size-example");
    group.sample_size(10);
    group.bench_function("parse 40 joints x 600 frames", |b| {
        b.iter(|| black_box(load_bvh_from_string(&bvh_string).unwrap()))
    });
    group.bench_function("play 40 joints x 600 frames", |b| {
        let skeleton = load_bvh_from_string(&bvh_string).unwrap();
        b.iter(|| {
            let mut skeleton = skeleton.clone();
            let mut player = MotionPlayer::new(&mut skeleton);
            while player.step().unwrap() {}
            black_box(skeleton.absolute_positions())
        })
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
