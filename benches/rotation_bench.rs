use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rjs_structures::block::BlockData;
use rjs_structures::builder::StructureBuilder;
use rjs_structures::rotation::RotationHelper;
use std::time::Duration;

fn make_palette_input(size: i32) -> Vec<BlockData> {
    let mut blocks = Vec::with_capacity((size * size) as usize);
    for i in 0..(size * size) {
        let name = match i % 4 {
            0 => "minecraft:stone",
            1 => "minecraft:dirt",
            2 => "minecraft:oak_planks",
            _ => "minecraft:spruce_stairs",
        };
        blocks.push(BlockData::new(name).with_property("facing", "north"));
    }
    blocks
}

fn bench_rotate_position(c: &mut Criterion) {
    let mut group = c.benchmark_group("rotate_position");
    group.measurement_time(Duration::from_secs(3));

    for &size in &[16, 48] {
        group.bench_function(format!("{size}_piece"), |b| {
            b.iter(|| {
                for x in 0..size {
                    for z in 0..size {
                        black_box(RotationHelper::rotate_position(x, z, 90, size, size));
                    }
                }
            });
        });
    }
    group.finish();
}

fn bench_rotate_block_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("rotate_block_state");
    let blocks = make_palette_input(48);

    group.bench_function("48x48_palette_inputs", |b| {
        b.iter(|| {
            for block in &blocks {
                black_box(RotationHelper::rotate_block_state(block, 90));
            }
        });
    });
    group.finish();
}

fn bench_build_palette(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_palette");
    for &size in &[16, 48] {
        let blocks = make_palette_input(size);
        group.bench_function(format!("{size}x{size}"), |b| {
            b.iter(|| {
                black_box(StructureBuilder::build_palette(&blocks));
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_rotate_position,
    bench_rotate_block_state,
    bench_build_palette
);
criterion_main!(benches);
