use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use minidb::{MemoryStorage, QueryExecutor};
use std::hint::black_box;
use std::sync::Arc;

fn setup_populated_db(n: usize) -> QueryExecutor {
    let executor = QueryExecutor::new(Arc::new(MemoryStorage::new()));
    executor
        .execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR(32), age INTEGER)")
        .unwrap();

    for i in 0..n {
        executor
            .execute(&format!(
                "INSERT INTO users (id, name, age) VALUES ({i}, 'user{i}', {})",
                i % 100
            ))
            .unwrap();
    }
    executor
}

fn setup_orders(executor: &QueryExecutor, n: usize) {
    executor
        .execute("CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER)")
        .unwrap();
    for i in 0..n {
        executor
            .execute(&format!(
                "INSERT INTO orders (id, user_id) VALUES ({i}, {})",
                i % 50
            ))
            .unwrap();
    }
}

fn bench_insert_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("Insert_SQL_Pipeline");

    for n in [100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter_with_setup(
                || setup_populated_db(n),
                |executor| {
                    executor
                        .execute(black_box(
                            "INSERT INTO users (id, name, age) VALUES (999999, 'new', 42)",
                        ))
                        .unwrap();
                    black_box(executor);
                },
            );
        });
    }
    group.finish();
}

fn bench_select_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Select_Where_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let executor = setup_populated_db(n);
            b.iter(|| {
                let res = executor
                    .execute("SELECT name FROM users WHERE age = 42")
                    .unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

fn bench_update_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Update_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter_with_setup(
                || setup_populated_db(n),
                |executor| {
                    executor
                        .execute("UPDATE users SET age = 99 WHERE age > 50")
                        .unwrap();
                    black_box(executor);
                },
            );
        });
    }
    group.finish();
}

fn bench_delete_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Delete_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter_with_setup(
                || setup_populated_db(n),
                |executor| {
                    executor.execute("DELETE FROM users WHERE age > 90").unwrap();
                    black_box(executor);
                },
            );
        });
    }
    group.finish();
}

fn bench_join_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Nested_Loop_Join");

    for n in [100, 500].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let executor = setup_populated_db(n);
            setup_orders(&executor, n);
            b.iter(|| {
                let res = executor
                    .execute(
                        "SELECT users.name, orders.id FROM users INNER JOIN orders ON users.id = orders.user_id",
                    )
                    .unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert_sql,
    bench_select_scaling,
    bench_update_performance,
    bench_delete_performance,
    bench_join_scaling
);
criterion_main!(benches);
