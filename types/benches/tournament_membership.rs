use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use podium_types::{
    prize::{distribute, preview},
    PrizeSettings, RankedEntry, Tournament, TournamentConfig, TournamentKind,
};

fn participant(i: usize) -> String {
    format!("participant-{i:08}")
}

fn setup_tournament(size: usize) -> Tournament {
    let mut tournament = Tournament::new(
        1,
        TournamentConfig {
            kind: TournamentKind::Daily,
            game_id: "bench".to_string(),
            start_at_ms: 0,
            end_at_ms: 1,
            entry_fee: 500,
            max_participants: (size + 2) as u32,
            prize_weights: Vec::new(),
        },
        0,
    );
    for i in 1..=size {
        tournament.add_participant(participant(i));
    }
    tournament
}

fn tournament_membership(c: &mut Criterion) {
    let mut group = c.benchmark_group("tournament_membership");
    for size in [10usize, 100, 1_000, 10_000] {
        let base = setup_tournament(size);
        let hit = participant(size / 2 + 1);
        let miss = participant(size + 1);

        group.bench_function(BenchmarkId::new("contains_hit", size), |b| {
            b.iter(|| black_box(base.contains_participant(&hit)))
        });

        group.bench_function(BenchmarkId::new("contains_miss", size), |b| {
            b.iter(|| black_box(base.contains_participant(&miss)))
        });

        group.bench_function(BenchmarkId::new("add_existing", size), |b| {
            let mut t = base.clone();
            b.iter(|| black_box(t.add_participant(hit.clone())))
        });

        group.bench_function(BenchmarkId::new("add_new_remove", size), |b| {
            let mut t = base.clone();
            b.iter(|| {
                black_box(t.add_participant(miss.clone()));
                t.participants.remove(&miss);
            })
        });
    }
    group.finish();
}

fn prize_distribution(c: &mut Criterion) {
    let settings = PrizeSettings::default();
    let ranking: Vec<RankedEntry> = (0..5)
        .map(|i| RankedEntry {
            rank: i + 1,
            participant_id: participant(i as usize),
            score: 10_000 - i as u64,
            submitted_at_ms: 0,
        })
        .collect();

    let mut group = c.benchmark_group("prize_distribution");
    group.bench_function("distribute_hyperbolic", |b| {
        b.iter(|| black_box(distribute(black_box(22_500), &ranking, &settings, &[])))
    });
    group.bench_function("distribute_weighted", |b| {
        let weights = [0.4, 0.25, 0.15, 0.1, 0.1];
        b.iter(|| black_box(distribute(black_box(22_500), &ranking, &settings, &weights)))
    });
    group.bench_function("preview", |b| {
        b.iter(|| black_box(preview(black_box(1_000), 500, &settings, &[])))
    });
    group.finish();
}

criterion_group!(benches, tournament_membership, prize_distribution);
criterion_main!(benches);
