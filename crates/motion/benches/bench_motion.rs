use std::hint::black_box;
use std::time::Instant;

use lanternfield_common::PopulationConfig;
use lanternfield_motion::Population;

fn make_population(instance_count: usize) -> Population {
    let config = PopulationConfig {
        instance_count,
        ..PopulationConfig::default()
    };
    Population::generate(&config, 42)
}

fn bench_generate(instance_count: usize, iterations: usize) {
    let config = PopulationConfig {
        instance_count,
        ..PopulationConfig::default()
    };

    let start = Instant::now();
    for i in 0..iterations {
        black_box(Population::generate(black_box(&config), i as u64));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  generate ({instance_count} lanterns, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_displace(instance_count: usize, iterations: usize) {
    let population = make_population(instance_count);

    let start = Instant::now();
    let mut acc = 0.0_f32;
    for frame in 0..iterations {
        let t = frame as f32 / 60.0;
        for p in population.displaced(black_box(t)) {
            acc += p.y;
        }
    }
    black_box(acc);
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  displace ({instance_count} lanterns, {iterations} frames): {per_iter:?}/frame, total {elapsed:?}"
    );
}

fn bench_bounds(instance_count: usize, iterations: usize) {
    let population = make_population(instance_count);

    let start = Instant::now();
    for frame in 0..iterations {
        black_box(population.bounds(frame as f32 * 0.5));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  bounds ({instance_count} lanterns, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("=== lanternfield-motion benchmarks ===");
    println!();

    println!("[population generation]");
    bench_generate(500, 200);
    bench_generate(10_000, 20);
    println!();

    println!("[per-frame displacement]");
    bench_displace(500, 1_000);
    bench_displace(10_000, 100);
    println!();

    println!("[bounds]");
    bench_bounds(500, 1_000);
    bench_bounds(10_000, 100);
}
