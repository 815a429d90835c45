use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use hivemark_core::{Renderer, RendererOptions, SanitizerConfig, TagTransformingSanitizer};
use std::hint::black_box;

fn generate_post() -> String {
    let mut s = String::with_capacity(120_000);
    s.push_str("# Benchmark Post\n\n");
    for i in 0..2_000 {
        s.push_str(&format!(
            "Paragraph {i} by @alice about #rust with a link https://example.com/{i} and **bold** text.\n\n"
        ));
        if i % 100 == 0 {
            s.push_str("https://www.youtube.com/watch?v=dQw4w9WgXcQ\n\n");
            s.push_str("> ![Spoiler] the ending\n\n");
            s.push_str("```rust\nfn main() { println!(\"hi\"); }\n```\n\n");
        }
    }
    s
}

fn benchmark_pipeline(c: &mut Criterion) {
    let input = generate_post();
    let options = RendererOptions::builder("https://hive.blog").build().unwrap();
    let sanitizer = TagTransformingSanitizer::new(SanitizerConfig::new(&options).unwrap());
    let renderer = Renderer::new(options).unwrap();
    let rendered = renderer.render(&input, None).unwrap();

    let mut group = c.benchmark_group("render_throughput");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("markdown_post", |b| {
        b.iter(|| renderer.render(black_box(&input), None).unwrap())
    });

    // Already rendered HTML skips markdown and exercises the rewrite passes.
    group.bench_function("rerender_html", |b| {
        b.iter(|| renderer.render(black_box(&rendered), None).unwrap())
    });

    group.bench_function("sanitize_only", |b| {
        b.iter(|| sanitizer.sanitize(black_box(&rendered)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, benchmark_pipeline);
criterion_main!(benches);
