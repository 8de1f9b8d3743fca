//! Performance benchmarks for formsync-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use formsync_engine::{
    validate_form, validate_form_with_logic, Condition, ElementType, FormElement, FormSchema,
    FormValues, LogicAction, LogicRule, MemoryStorage, OfflineQueue, ValidationRule,
};
use serde_json::json;

/// A schema with `sections` sections of five fields each.
fn create_test_schema(sections: usize) -> FormSchema {
    let elements = (0..sections)
        .map(|s| {
            FormElement::container(
                format!("section_{}", s),
                ElementType::Section,
                vec![
                    FormElement::new(format!("name_{}", s), ElementType::Text)
                        .required()
                        .with_rule(ValidationRule::min_length(2, "short"))
                        .with_rule(ValidationRule::max_length(80, "long")),
                    FormElement::new(format!("email_{}", s), ElementType::Email).required(),
                    FormElement::new(format!("age_{}", s), ElementType::Number)
                        .with_rule(ValidationRule::min(0.0, "negative"))
                        .with_rule(ValidationRule::max(150.0, "too old")),
                    FormElement::new(format!("zip_{}", s), ElementType::Text)
                        .with_rule(ValidationRule::pattern(r"^\d{5}$", "zip")),
                    FormElement::new(format!("notes_{}", s), ElementType::Textarea),
                ],
            )
        })
        .collect();

    let mut schema = FormSchema::new(elements);
    for s in 1..sections {
        schema = schema.with_logic(LogicRule::new(
            format!("rule_{}", s),
            vec![Condition::equals(format!("name_{}", s - 1), json!("skip"))],
            LogicAction::Hide,
            format!("section_{}", s),
        ));
    }
    schema
}

fn create_values(sections: usize) -> FormValues {
    let mut values = FormValues::new();
    for s in 0..sections {
        values.insert(format!("name_{}", s), json!("Test User"));
        values.insert(format!("email_{}", s), json!("user@example.com"));
        values.insert(format!("age_{}", s), json!(30));
        values.insert(format!("zip_{}", s), json!("12345"));
    }
    values
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");

    for sections in [1, 10, 100] {
        let schema = create_test_schema(sections);
        let values = create_values(sections);

        group.bench_with_input(
            BenchmarkId::new("validate_form", sections),
            &sections,
            |b, _| b.iter(|| validate_form(black_box(&schema), black_box(&values))),
        );

        group.bench_with_input(
            BenchmarkId::new("validate_form_with_logic", sections),
            &sections,
            |b, _| b.iter(|| validate_form_with_logic(black_box(&schema), black_box(&values))),
        );
    }

    group.finish();
}

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("offline_queue");

    for size in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("queue_submission", size), &size, |b, &size| {
            b.iter_with_setup(
                || {
                    let queue: OfflineQueue<_> = OfflineQueue::new(MemoryStorage::new());
                    for _ in 0..size {
                        queue.queue_submission("form", create_values(1));
                    }
                    queue
                },
                |queue| queue.queue_submission(black_box("form"), create_values(1)),
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validation, bench_queue);
criterion_main!(benches);
