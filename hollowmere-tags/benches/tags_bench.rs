use criterion::{criterion_group, criterion_main, Criterion};

use hollowmere_tags::{parse_tags, strip_tags};

const SAMPLE_TURN: &str = "\
The goblins shriek and leap from the brush! [COMBAT: goblin, goblin, goblin | SURPRISE] \
You feel the weight of your pack and decide to press on regardless. \
[ROLL: Stealth DC 15] A merchant calls out from the stall. [BUY: healing_potion, 20] \
[GOLD: 5] [XP: 10 | clever deduction]";

fn bench_parse_tags(c: &mut Criterion) {
    c.bench_function("parse_tags_mixed_turn", |b| {
        b.iter(|| parse_tags(SAMPLE_TURN));
    });
}

fn bench_strip_tags(c: &mut Criterion) {
    c.bench_function("strip_tags_mixed_turn", |b| {
        b.iter(|| strip_tags(SAMPLE_TURN));
    });
}

criterion_group!(benches, bench_parse_tags, bench_strip_tags);
criterion_main!(benches);
