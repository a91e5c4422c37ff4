use std::collections::HashSet;

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::Rng;

use api::discussion::comment::order::{CommentOrder, OrderBy, OrderDirection};
use api::discussion::comment::tree;
use api::discussion::store::CommentRecord;

pub fn criterion_benchmark(c: &mut Criterion) {
    let order = CommentOrder {
        by: OrderBy::Hot,
        direction: OrderDirection::Desc,
    };

    let mut group = c.benchmark_group("discussion_comments");
    for n in [10, 100, 1000, 10000, 100000].iter() {
        let comments = generate_comments(*n);
        group.bench_function(BenchmarkId::new("assemble_measure_sort", n), |b| {
            b.iter(|| assemble_measure_sort(comments.clone(), &order))
        });
        group.bench_function(BenchmarkId::new("windowed_page", n), |b| {
            b.iter(|| windowed_page(comments.clone(), &order))
        });
    }
    group.finish();
}

fn generate_comments(n: usize) -> Vec<CommentRecord> {
    let mut rng = rand::rng();
    let mut comments = Vec::with_capacity(n);
    for i in 0..n {
        // roughly 60% replies, parents always created earlier
        let parent_id = if i > 0 && rng.random_bool(0.6) {
            Some(rng.random_range(0..i) as i32 + 1)
        } else {
            None
        };
        comments.push(CommentRecord {
            id: i as i32 + 1,
            parent_id,
            discussion_id: 1,
            user_id: rng.random_range(1..1000),
            content: "content".to_string(),
            published: true,
            admin_unpublished: false,
            up_votes: rng.random_range(0..100),
            down_votes: rng.random_range(0..20),
            hotness: rng.random::<f64>(),
            created_at: NaiveDate::from_ymd_opt(2023, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
                + chrono::Duration::seconds(i as i64),
            votes: vec![],
        });
    }
    comments
}

fn assemble_measure_sort(rows: Vec<CommentRecord>, order: &CommentOrder) -> tree::Tree {
    let (mut t, _) = tree::assemble(None, rows, None, order);
    tree::measure(&mut t);
    tree::sort(&mut t, order);
    t
}

fn windowed_page(rows: Vec<CommentRecord>, order: &CommentOrder) -> tree::Tree {
    let (mut t, covered) = tree::assemble(None, rows, None, order);
    tree::measure(&mut t);
    tree::sort(&mut t, order);
    let visible: HashSet<i32> = tree::page_window(&covered, order, 200, None)
        .into_iter()
        .collect();
    tree::prune(&mut t, &visible, order);
    t
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
