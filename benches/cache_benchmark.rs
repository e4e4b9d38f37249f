use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bgg_suggest::{
    cache::{CacheKey, SqliteCache, SuggestCache},
    core::GameId,
    Game, GameStats, Player,
};
use std::collections::HashMap;

fn create_games(count: u32) -> Vec<Game> {
    (0..count)
        .map(|i| {
            let mut game = Game::new(i, format!("Game {}", i)).with_players(2, 2 + i % 4);
            game.playing_time = Some(30 + i % 90);
            game.average_weight = Some(1.0 + (i % 40) as f64 / 10.0);
            game
        })
        .collect()
}

fn create_player(games: u32) -> Player {
    let stats: HashMap<GameId, GameStats> = (0..games)
        .map(|i| {
            let mut stats = GameStats::new(i);
            stats.owned = true;
            stats.rating = Some((i % 10) as f64 / 10.0);
            (i, stats)
        })
        .collect();
    Player::new("alice", stats)
}

async fn setup_cache() -> SqliteCache {
    let cache = SqliteCache::new(":memory:").await.unwrap();

    // Populate with test data
    cache.save_games(&create_games(500)).await.unwrap();
    cache.save_player(&create_player(200)).await.unwrap();

    cache
}

fn bench_cache_get(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let cache = runtime.block_on(setup_cache());

    c.bench_function("cache_get_player_hit", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(cache.get_player("alice").await.unwrap())
        });
    });

    c.bench_function("cache_get_player_miss", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(cache.get_player("nobody").await.unwrap())
        });
    });

    let mut group = c.benchmark_group("cache_get_games");
    for size in [10u32, 100, 500] {
        let ids: Vec<GameId> = (0..size).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &ids, |b, ids| {
            b.to_async(&runtime).iter(|| async {
                black_box(cache.get_games(ids).await.unwrap())
            });
        });
    }
    group.finish();
}

fn bench_cache_save(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let games = create_games(100);

    c.bench_function("cache_save_games_100", |b| {
        b.to_async(&runtime).iter(|| async {
            let cache = SqliteCache::new(":memory:").await.unwrap();
            black_box(cache.save_games(&games).await.unwrap())
        });
    });
}

fn bench_cache_increment(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let cache = runtime.block_on(setup_cache());
    let key = CacheKey::Game(50);

    c.bench_function("cache_increment_hit", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(cache.increment_hit(&key).await.unwrap())
        });
    });
}

fn bench_cache_stats(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let cache = runtime.block_on(setup_cache());

    c.bench_function("cache_stats", |b| {
        b.to_async(&runtime).iter(|| async {
            black_box(cache.stats().await.unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_cache_get,
    bench_cache_save,
    bench_cache_increment,
    bench_cache_stats
);
criterion_main!(benches);
