use richdoc::{
    CharacterStyle, Codec, Document, DocumentEditor, HtmlCodec, MarkdownCodec, Paragraph,
    ParagraphType, Span, StructuralStyle, TextRange, render,
};
use std::time::{Duration, Instant};

/// Performance benchmark suite for richdoc operations
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - HTML and Markdown decoding
/// - HTML and Markdown encoding
/// - Style mutation over ranges
/// - Terminal rendering
const SMALL_DOC_PARAGRAPHS: usize = 10;
const MEDIUM_DOC_PARAGRAPHS: usize = 100;
const LARGE_DOC_PARAGRAPHS: usize = 1000;

const ITERATIONS: usize = 100;

const SAMPLE_WORDS: [&str; 20] = [
    "Lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
    "incididunt",
    "ut",
    "labore",
    "et",
    "dolore",
    "magna",
    "aliqua",
    "veniam",
];

fn sentence(words: usize, offset: usize) -> String {
    (0..words)
        .map(|j| SAMPLE_WORDS[(j + offset) % SAMPLE_WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Create a document with mixed inline styles, links and list items
fn create_styled_document(num_paragraphs: usize) -> Document {
    let mut doc = Document::new();

    for i in 0..num_paragraphs {
        let text = sentence(12, i);
        let spans = if i % 15 == 0 {
            vec![
                Span::styled(text, CharacterStyle::bold())
                    .with_children(vec![Span::styled(" nested", CharacterStyle::italic())]),
            ]
        } else if i % 3 == 0 {
            vec![
                Span::new_text(text),
                Span::new_text(" link").with_structural(StructuralStyle::link("https://example.com")),
            ]
        } else if i % 5 == 0 {
            vec![
                Span::styled(text, CharacterStyle::italic()),
                Span::new_text(" code()").with_structural(StructuralStyle::Code),
            ]
        } else {
            vec![Span::new_text(text)]
        };

        let paragraph_type = match i % 7 {
            1 => ParagraphType::ordered(1 + (i / 7) as u32),
            2 => ParagraphType::unordered(),
            _ => ParagraphType::Default,
        };
        doc.add_paragraph(Paragraph::new().with_spans(spans).with_type(paragraph_type));
    }

    doc
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);
        println!(
            "Ops/sec:        {:.2}",
            1_000_000.0 / self.avg_duration.as_micros().max(1) as f64
        );

        if self.avg_duration.as_millis() > 100 {
            println!("\n⚠️  WARNING: Average duration > 100ms (user-perceptible lag)");
        } else if self.avg_duration.as_millis() > 16 {
            println!("\n⚠️  WARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..10 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

fn sizes() -> Vec<(&'static str, Document)> {
    vec![
        ("Small (10 paras)", create_styled_document(SMALL_DOC_PARAGRAPHS)),
        ("Medium (100 paras)", create_styled_document(MEDIUM_DOC_PARAGRAPHS)),
        ("Large (1000 paras)", create_styled_document(LARGE_DOC_PARAGRAPHS)),
    ]
}

fn iterations_for(name: &str) -> usize {
    if name.starts_with("Large") {
        10
    } else {
        ITERATIONS
    }
}

#[test]
fn bench_encoding() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                  ENCODING BENCHMARKS                           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let html = HtmlCodec::new();
    let markdown = MarkdownCodec::new();
    for (name, doc) in sizes() {
        benchmark(&format!("html encode - {}", name), iterations_for(name), || {
            let _ = html.encode(&doc);
        })
        .print();
        benchmark(&format!("markdown encode - {}", name), iterations_for(name), || {
            let _ = markdown.encode(&doc);
        })
        .print();
    }
}

#[test]
fn bench_decoding() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                  DECODING BENCHMARKS                           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let html = HtmlCodec::new();
    let markdown = MarkdownCodec::new();
    for (name, doc) in sizes() {
        let html_source = html.encode(&doc);
        let markdown_source = markdown.encode(&doc);

        benchmark(&format!("html decode - {}", name), iterations_for(name), || {
            let _ = html.decode(&html_source);
        })
        .print();
        benchmark(&format!("markdown decode - {}", name), iterations_for(name), || {
            let _ = markdown.decode(&markdown_source);
        })
        .print();
    }
}

#[test]
fn bench_style_mutation() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║               STYLE MUTATION BENCHMARKS                        ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, doc) in sizes() {
        let len = doc.len();
        let quarter = TextRange::new(len / 4, len / 2);

        benchmark(&format!("add bold to a quarter - {}", name), iterations_for(name), || {
            let mut editor = DocumentEditor::new(doc.clone());
            editor
                .add_character_style(quarter, &CharacterStyle::bold())
                .expect("range is inside the document");
        })
        .print();

        let mut bold = DocumentEditor::new(doc.clone());
        bold.add_character_style(TextRange::new(0, len), &CharacterStyle::bold())
            .expect("whole document");
        let bolded = bold.into_document();
        benchmark(&format!("remove bold everywhere - {}", name), iterations_for(name), || {
            let mut editor = DocumentEditor::new(bolded.clone());
            editor
                .remove_character_style(TextRange::new(0, len), &CharacterStyle::bold())
                .expect("whole document");
        })
        .print();

        let editor = DocumentEditor::new(doc.clone());
        benchmark(&format!("query style of a range - {}", name), ITERATIONS, || {
            let _ = editor.character_style_at(quarter).expect("range is valid");
        })
        .print();
    }
}

#[test]
fn bench_typing() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                    TYPING BENCHMARKS                           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let doc = create_styled_document(MEDIUM_DOC_PARAGRAPHS);
    let middle = doc.len() / 2;
    let mut editor = DocumentEditor::new(doc);
    let mut offset = middle;
    benchmark("insert one character mid-document", ITERATIONS, || {
        editor.insert_text(offset, "x").expect("offset is valid");
        offset += 1;
    })
    .print();
}

#[test]
fn bench_rendering() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                 RENDERING BENCHMARKS                           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, doc) in sizes() {
        for width in [40, 80, 120] {
            benchmark(
                &format!("render_document width {} - {}", width, name),
                iterations_for(name),
                || {
                    let _ = render::render_document(&doc, width);
                },
            )
            .print();
        }
    }
}
