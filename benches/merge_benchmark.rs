//! Benchmarks for shipdoc merge performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks merge synthetic packing-list records into a synthetic
//! template.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use shipdoc::{DataRecord, Document, MergeEngine, MergeOptions, Paragraph, Table, TableRow};

/// Creates a template with a header block and one item table.
fn create_template() -> Document {
    let mut doc = Document::new();
    doc.add_paragraph(Paragraph::heading("PACKING LIST", 1));
    for key in ["consignee_address", "delivery_address", "po_no", "date", "hs_code"] {
        doc.add_paragraph(Paragraph::with_text(format!("{}: «{}»", key, key)));
    }

    let mut table = Table::with_header(1);
    table.add_row(TableRow::from_strings(["No", "Material", "Boxes", "Net", "Gross"]));
    table.add_row(TableRow::from_strings([
        "«item_number»",
        "«material»",
        "«box_count»",
        "«net_weight»",
        "«gross_weight»",
    ]));
    doc.add_table(table);
    doc.add_paragraph(Paragraph::with_text("Total boxes: «total_boxes»"));
    doc
}

/// Creates a record with the given number of items.
fn create_record(item_count: usize) -> DataRecord {
    let items: Vec<_> = (1..=item_count)
        .map(|i| {
            json!({
                "item_number": i,
                "material": "GRP",
                "box_count": i % 7 + 1,
                "net_weight": "12.5",
                "gross_weight": "14"
            })
        })
        .collect();

    DataRecord::from_json(json!({
        "consignee_address": "Acme Ltd",
        "delivery_address": "Warehouse 4",
        "po_no": "PO-2231",
        "date": "2026-10-16",
        "hs_code": "3925",
        "total_boxes": "40",
        "items": items
    }))
    .unwrap()
}

/// Benchmark a single merge at various item counts.
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    let template = create_template();
    let engine = MergeEngine::default();

    for item_count in [1, 20, 200].iter() {
        let record = create_record(*item_count);

        group.bench_function(format!("{}_items", item_count), |b| {
            b.iter(|| engine.merge(black_box(template.clone()), black_box(&record)));
        });
    }

    group.finish();
}

/// Benchmark coalesce mode against per-run substitution.
fn bench_coalesce(c: &mut Criterion) {
    let mut template = Document::new();
    for _ in 0..50 {
        template.add_paragraph(Paragraph::with_runs(["Invoice «invoice", "_no» of «da", "te»"]));
    }
    let record = DataRecord::from_json(json!({"invoice_no": "PI-1", "date": "2026-10-16"})).unwrap();
    let engine = MergeEngine::new(MergeOptions::new().coalesce()).unwrap();

    c.bench_function("coalesce_50_paragraphs", |b| {
        b.iter(|| engine.merge(black_box(template.clone()), black_box(&record)));
    });
}

/// Benchmark parallel and sequential batches.
fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let template = create_template();
    let records: Vec<_> = (0..64).map(|_| create_record(20)).collect();

    for (name, options) in [
        ("parallel", MergeOptions::new()),
        ("sequential", MergeOptions::new().sequential()),
    ] {
        let engine = MergeEngine::new(options).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| engine.merge_batch(black_box(&template), black_box(&records)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_merge, bench_coalesce, bench_batch);
criterion_main!(benches);
