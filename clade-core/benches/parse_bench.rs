use criterion::{Criterion, black_box, criterion_group, criterion_main};

use clade_core::interpret::{BasicParser, NameParser};
use clade_graph::Rank;

const NAMES: &[&str] = &[
    "Abies",
    "Abies alba",
    "Abies alba Mill.",
    "Picea abies (L.) H. Karst.",
    "Abies alba subsp. apennina Brullo, Scelsi & Spamp.",
    "Poa secunda J. Presl var. incurva (Scribn. & T.A. Williams) Beetle",
    "Pinus sect. Strobus Sweet",
    "Festuca × brinkmannii A. Braun",
    "Tobacco mosaic virus",
];

fn parse(c: &mut Criterion) {
    let parser = BasicParser;
    c.bench_function("parse_mixed_names", |b| {
        b.iter(|| {
            for name in NAMES {
                black_box(parser.parse(black_box(name), None));
            }
        })
    });
    c.bench_function("parse_binomial_with_rank_hint", |b| {
        b.iter(|| black_box(parser.parse(black_box("Abies alba Mill."), Some(Rank::Species))))
    });
}

fn parse_authorship(c: &mut Criterion) {
    let parser = BasicParser;
    c.bench_function("parse_authorship", |b| {
        b.iter(|| black_box(parser.parse_authorship(black_box("(L.) H. Karst., 1881"))))
    });
}

criterion_group!(benches, parse, parse_authorship);
criterion_main!(benches);
