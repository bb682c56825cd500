use criterion::{criterion_group, criterion_main, Criterion};

use hollowmere_character::Character;
use hollowmere_combat::{player_attack, start_combat};
use hollowmere_content::ContentCatalog;
use hollowmere_dice::Dice;
use hollowmere_npc::Party;

fn bench_start_combat(c: &mut Criterion) {
    let catalog = ContentCatalog::bundled();
    let scenario = catalog.scenario("goblin_cave").unwrap();
    let mut dice = Dice::from_seed(1);
    let character = Character::create(&mut dice, &catalog, "Rowan", "fighter", "human").unwrap();
    let party = Party::new();

    c.bench_function("start_combat_four_goblins", |b| {
        b.iter(|| {
            let mut dice = Dice::from_seed(1);
            start_combat(
                scenario,
                &[
                    "goblin".to_string(),
                    "goblin".to_string(),
                    "goblin".to_string(),
                    "goblin".to_string(),
                ],
                false,
                &character,
                &party,
                &mut dice,
            )
            .unwrap()
        });
    });
}

fn bench_player_attack(c: &mut Criterion) {
    let catalog = ContentCatalog::bundled();
    let scenario = catalog.scenario("goblin_cave").unwrap();
    let mut dice = Dice::from_seed(1);
    let character = Character::create(&mut dice, &catalog, "Rowan", "fighter", "human").unwrap();
    let party = Party::new();
    let mut setup_dice = Dice::from_seed(1);
    let base_state = start_combat(scenario, &["goblin".to_string()], false, &character, &party, &mut setup_dice)
        .unwrap();

    c.bench_function("player_attack_vs_goblin", |b| {
        b.iter(|| {
            let mut state = base_state.clone();
            let mut dice = Dice::from_seed(2);
            player_attack(&mut state, &character, "1d8+2", 0, false, false, &mut dice).unwrap()
        });
    });
}

criterion_group!(benches, bench_start_combat, bench_player_attack);
criterion_main!(benches);
