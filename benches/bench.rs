//! Criterion benchmarks for Vellum.
//!
//! Covers the per-hit hot paths of result rendering:
//! - Phrase highlighting with exact and fuzzy terms
//! - Full-text fragment selection
//! - Fuzzy term matching and edit distance
//! - Term browsing over many documents

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;
use vellum::browse::TermCollector;
use vellum::fuzzy::FuzzySearchTerm;
use vellum::highlight::{
    HighlightConfig, apply_highlighting_to_phrase, truncate_fulltext_with_rng,
};
use vellum::index::{DocType, IndexDocument, fields};
use vellum::util::levenshtein::damerau_levenshtein_distance;

const WORDS: &[&str] = &[
    "the", "heron", "stood", "in", "shallow", "water", "while", "a", "bird", "sang", "über",
    "Fluß", "garden", "morning", "chronicle", "of", "monastery", "abbey", "letter", "Müller",
    "parish", "register", "birds", "northern", "coast",
];

/// Generate a pseudo-random page text of `word_count` words.
fn generate_text(seed: usize, word_count: usize) -> String {
    (0..word_count)
        .map(|j| WORDS[(seed * 7 + j * 13) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn generate_documents(count: usize) -> Vec<IndexDocument> {
    (0..count)
        .map(|i| {
            IndexDocument::builder()
                .field(fields::IDDOC, i.to_string())
                .doc_type(DocType::Docstrct)
                .field_values("MD_SUBJECT", [WORDS[i % WORDS.len()], WORDS[(i * 3) % WORDS.len()]])
                .build()
        })
        .collect()
}

/// Benchmark phrase highlighting.
fn bench_highlighting(c: &mut Criterion) {
    let mut group = c.benchmark_group("highlighting");

    let label = "Chronicle of the abbey of St. Müller, with letters on the birds of the Fluß";
    let exact = vec!["bird".to_string(), "muller".to_string()];
    let fuzzy = vec!["chronikle~1".to_string(), "abey~1".to_string()];

    group.bench_function("label_exact_terms", |b| {
        b.iter(|| black_box(apply_highlighting_to_phrase(black_box(label), &exact)))
    });

    group.bench_function("label_fuzzy_terms", |b| {
        b.iter(|| black_box(apply_highlighting_to_phrase(black_box(label), &fuzzy)))
    });

    let page = generate_text(3, 400);
    group.throughput(Throughput::Bytes(page.len() as u64));
    group.bench_function("page_exact_terms", |b| {
        b.iter(|| black_box(apply_highlighting_to_phrase(black_box(&page), &exact)))
    });

    group.finish();
}

/// Benchmark full-text fragment selection.
fn bench_fragments(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragments");

    let config = HighlightConfig::new().fragment_length(200);
    let terms = vec!["heron".to_string(), "register".to_string()];
    let missing = vec!["zeppelin".to_string()];

    for words in [200, 2000] {
        let text = generate_text(words, words);
        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_function(format!("first_match_{words}_words"), |b| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| {
                black_box(truncate_fulltext_with_rng(
                    &config,
                    &terms,
                    black_box(&text),
                    200,
                    true,
                    true,
                    &mut rng,
                ))
            })
        });

        group.bench_function(format!("all_matches_{words}_words"), |b| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| {
                black_box(truncate_fulltext_with_rng(
                    &config,
                    &terms,
                    black_box(&text),
                    200,
                    false,
                    false,
                    &mut rng,
                ))
            })
        });

        group.bench_function(format!("fallback_{words}_words"), |b| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| {
                black_box(truncate_fulltext_with_rng(
                    &config,
                    &missing,
                    black_box(&text),
                    200,
                    true,
                    true,
                    &mut rng,
                ))
            })
        });
    }

    group.finish();
}

/// Benchmark fuzzy matching.
fn bench_fuzzy(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuzzy");

    let term = FuzzySearchTerm::with_optimal_distance("chronicle");
    let candidates = generate_text(1, 100);
    let candidates: Vec<&str> = candidates.split(' ').collect();

    group.throughput(Throughput::Elements(candidates.len() as u64));
    group.bench_function("matches_batch", |b| {
        b.iter(|| {
            for candidate in &candidates {
                black_box(term.matches(black_box(candidate)));
            }
        })
    });

    group.bench_function("damerau_levenshtein", |b| {
        b.iter(|| {
            black_box(damerau_levenshtein_distance(
                black_box("monastery"),
                black_box("monsatery"),
            ))
        })
    });

    group.finish();
}

/// Benchmark term browsing at different collection sizes.
fn bench_browse(c: &mut Criterion) {
    let mut group = c.benchmark_group("browse");
    group.sample_size(20);

    for size in [1_000, 10_000] {
        let docs = generate_documents(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("collect_{size}_documents"), |b| {
            b.iter(|| {
                let collector = TermCollector::new("MD_SUBJECT");
                black_box(collector.collect(black_box(&docs)))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_highlighting,
    bench_fragments,
    bench_fuzzy,
    bench_browse
);
criterion_main!(benches);
