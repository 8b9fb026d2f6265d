//! Extraction hot-path benchmarks: cleaning rules, row parsing, and
//! full-page raw row extraction over representative markup.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use findata_crawler_lib::application::DatasetProfile;
use findata_crawler_lib::domain::{CleanRule, RawRow, RowParser};
use findata_crawler_lib::infrastructure::TableExtractor;
use findata_crawler_lib::test_utils::{gold_rows, tabulator_page};

fn bench_clean_rules(c: &mut Criterion) {
    let samples = [
        (CleanRule::Integer, "1,234,567"),
        (CleanRule::SignedNumber, "+12.40"),
        (CleanRule::Percent, "+2.35%"),
        (CleanRule::UnitMagnitude, "1.5M"),
        (CleanRule::Decimal, "12.84x"),
        (CleanRule::Text, "  NVIDIA   Corporation  "),
    ];

    c.bench_function("clean_rules", |b| {
        b.iter(|| {
            for (rule, raw) in samples {
                black_box(rule.apply(black_box(raw)));
            }
        })
    });
}

fn bench_row_parse(c: &mut Criterion) {
    let parser = RowParser::new(DatasetProfile::gold_price().schema);
    let row = RawRow::from(vec!["2024.01.01", "1,234", "1,000", "900", "700"]);

    c.bench_function("row_parse", |b| {
        b.iter(|| black_box(parser.parse(black_box(&row), 0)))
    });
}

fn bench_extract_rows(c: &mut Criterion) {
    let extractor = TableExtractor::new(DatasetProfile::gold_price().table_candidates);
    let page = tabulator_page(&gold_rows(0, 30));

    c.bench_function("extract_rows_30", |b| {
        b.iter(|| black_box(extractor.extract_rows(black_box(&page), 0)))
    });
}

criterion_group!(benches, bench_clean_rules, bench_row_parse, bench_extract_rows);
criterion_main!(benches);
