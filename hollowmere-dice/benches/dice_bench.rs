use criterion::{criterion_group, criterion_main, Criterion};
use hollowmere_dice::{Advantage, Dice};

fn bench_roll(c: &mut Criterion) {
    let mut dice = Dice::from_seed(1);
    c.bench_function("roll_3d6+2", |b| {
        b.iter(|| dice.roll("3d6+2").unwrap());
    });
}

fn bench_d20(c: &mut Criterion) {
    let mut dice = Dice::from_seed(1);
    c.bench_function("roll_d20_advantage", |b| {
        b.iter(|| dice.roll_d20(3, Advantage::Advantage));
    });
}

criterion_group!(benches, bench_roll, bench_d20);
criterion_main!(benches);
