use super::*;

fn nested_paragraph() -> Paragraph {
    // "Hello " + bold("big " + italic("world")) + "!"
    let italic = Span::styled("world", CharacterStyle::italic());
    let bold = Span::styled("big ", CharacterStyle::bold()).with_children(vec![italic]);
    Paragraph::new().with_spans(vec![Span::new_text("Hello "), bold, Span::new_text("!")])
}

fn document(paragraphs: Vec<Paragraph>) -> Document {
    Document::new().with_paragraphs(paragraphs)
}

#[test]
fn flattened_text_joins_paragraphs_with_line_breaks() {
    let doc = document(vec![
        nested_paragraph(),
        Paragraph::new(),
        Paragraph::new_text("end"),
    ]);
    assert_eq!(doc.text(), "Hello big world!\n\nend");
    assert_eq!(doc.len(), 21);
    assert_eq!(doc.paragraph_start(2), 18);
    assert_eq!(doc.paragraph_range(0), Some(TextRange::new(0, 16)));
}

#[test]
fn resolve_finds_deepest_span() {
    let doc = document(vec![nested_paragraph()]);

    let position = doc.resolve(12).expect("offset in range");
    assert_eq!(position.span, Some(SpanPath::new(0, vec![1, 0])));
    assert_eq!(position.offset, 2);

    let position = doc.resolve(6).expect("offset in range");
    assert_eq!(position.span, Some(SpanPath::new(0, vec![1])));
    assert_eq!(position.offset, 0);

    let end = doc.resolve(16).expect("paragraph end");
    assert_eq!(end.span, Some(SpanPath::new(0, vec![2])));
    assert_eq!(end.offset, 1);
}

#[test]
fn resolve_rejects_offsets_past_the_end() {
    let doc = document(vec![Paragraph::new_text("abc")]);
    assert_eq!(
        doc.resolve(4),
        Err(Error::RangeOutOfBounds {
            start: 4,
            end: 4,
            len: 3
        })
    );
}

#[test]
fn resolve_in_empty_paragraph_has_no_span() {
    let doc = document(vec![Paragraph::new_text("a"), Paragraph::new()]);
    let position = doc.resolve(2).expect("empty paragraph");
    assert_eq!(position.paragraph, 1);
    assert_eq!(position.span, None);
}

#[test]
fn resolve_start_of_empty_document() {
    let doc = Document::new();
    let position = doc.resolve(0).expect("start of document");
    assert_eq!(position.paragraph, 0);
    assert_eq!(position.span, None);
    assert_eq!(position.offset, 0);
    assert!(doc.resolve(1).is_err());
}

#[test]
fn split_inside_own_text_moves_children_right() {
    let mut doc = document(vec![nested_paragraph()]);
    let (left, right) = doc
        .split_span_at(&SpanPath::top_level(0, 1), 2)
        .expect("split inside own text");
    assert_eq!(left, SpanPath::top_level(0, 1));
    assert_eq!(right, SpanPath::top_level(0, 2));

    let spans = &doc.paragraphs[0].spans;
    assert_eq!(spans.len(), 4);
    assert_eq!(spans[1].text, "bi");
    assert!(spans[1].children.is_empty());
    assert_eq!(spans[2].text, "g ");
    assert_eq!(spans[2].children.len(), 1);
    assert_eq!(spans[1].style, CharacterStyle::bold());
    assert_eq!(spans[2].style, CharacterStyle::bold());
    assert_eq!(doc.text(), "Hello big world!");
}

#[test]
fn split_inside_child_splits_the_whole_path() {
    let mut doc = document(vec![nested_paragraph()]);
    doc.split_span_at(&SpanPath::top_level(0, 1), 6)
        .expect("split inside child");

    let spans = &doc.paragraphs[0].spans;
    assert_eq!(spans[1].text, "big ");
    assert_eq!(spans[1].children[0].text, "wo");
    assert_eq!(spans[2].text, "");
    assert_eq!(spans[2].style, CharacterStyle::bold());
    assert_eq!(spans[2].children[0].text, "rld");
    assert_eq!(spans[2].children[0].style, CharacterStyle::italic());
    assert_eq!(doc.text(), "Hello big world!");
}

#[test]
fn split_at_own_text_end_detaches_children() {
    let mut doc = document(vec![nested_paragraph()]);
    doc.split_span_at(&SpanPath::top_level(0, 1), 4)
        .expect("split between own text and children");
    let spans = &doc.paragraphs[0].spans;
    assert_eq!(spans[1].text, "big ");
    assert!(spans[1].children.is_empty());
    assert_eq!(spans[2].text, "");
    assert_eq!(spans[2].children[0].text, "world");
}

#[test]
fn split_on_span_edges_is_a_no_op() {
    let mut doc = document(vec![nested_paragraph()]);
    let before = doc.clone();
    assert!(doc.split_span_at(&SpanPath::top_level(0, 1), 0).is_none());
    assert!(doc.split_span_at(&SpanPath::top_level(0, 1), 9).is_none());
    assert_eq!(doc, before);
}

#[test]
fn spans_intersecting_walks_nested_spans_in_order() {
    let doc = document(vec![nested_paragraph(), Paragraph::new_text("tail")]);
    let spans = doc
        .spans_intersecting(TextRange::new(8, 12))
        .expect("valid range");
    assert_eq!(
        spans,
        vec![SpanPath::top_level(0, 1), SpanPath::new(0, vec![1, 0])]
    );

    let across = doc
        .spans_intersecting(TextRange::new(15, 18))
        .expect("valid range");
    assert_eq!(
        across,
        vec![SpanPath::top_level(0, 2), SpanPath::top_level(1, 0)]
    );

    assert!(
        doc.spans_intersecting(TextRange::collapsed(3))
            .expect("valid range")
            .is_empty()
    );
}

#[test]
fn spans_intersecting_validates_the_range() {
    let doc = document(vec![Paragraph::new_text("abc")]);
    assert_eq!(
        doc.spans_intersecting(TextRange::new(2, 1)),
        Err(Error::InvalidRange { start: 2, end: 1 })
    );
    assert!(matches!(
        doc.spans_intersecting(TextRange::new(0, 9)),
        Err(Error::RangeOutOfBounds { .. })
    ));
}

#[test]
fn remove_empty_only_drops_empty_leaves() {
    let mut doc = document(vec![Paragraph::new().with_spans(vec![
        Span::new_text("a"),
        Span::new(),
        Span::new().with_children(vec![Span::new_text("b")]),
    ])]);
    assert!(!doc.remove_empty(&SpanPath::top_level(0, 0)));
    assert!(doc.remove_empty(&SpanPath::top_level(0, 1)));
    assert!(!doc.remove_empty(&SpanPath::top_level(0, 1)));
    assert_eq!(doc.paragraphs[0].spans.len(), 2);
}

#[test]
fn merge_single_child_absorbs_styles_and_structure() {
    let child = Span::styled("code", CharacterStyle::italic()).with_structural(StructuralStyle::Code);
    let mut doc = document(vec![Paragraph::new().with_spans(vec![
        Span::styled("", CharacterStyle::bold()).with_children(vec![child]),
    ])]);
    assert!(doc.merge_single_child(&SpanPath::top_level(0, 0)));

    let span = &doc.paragraphs[0].spans[0];
    assert_eq!(span.text, "code");
    assert!(span.style.is_bold());
    assert!(span.style.is_italic());
    assert_eq!(span.structural, StructuralStyle::Code);
    assert!(span.children.is_empty());

    assert!(!doc.merge_single_child(&SpanPath::top_level(0, 0)));
}

#[test]
fn styled_runs_ignore_tree_shape() {
    let flat = Paragraph::new().with_spans(vec![
        Span::new_text("Hello "),
        Span::styled("big ", CharacterStyle::bold()),
        Span::styled("world", CharacterStyle::bold().merge(&CharacterStyle::italic())),
        Span::new_text("!"),
    ]);
    assert_eq!(flat.styled_runs(), nested_paragraph().styled_runs());

    let split = Paragraph::new().with_spans(vec![Span::new_text("ab"), Span::new_text("c")]);
    assert_eq!(split.styled_runs().len(), 1);
    assert_eq!(split.styled_runs()[0].text, "abc");
}

#[test]
fn delete_text_joins_paragraphs() {
    let mut doc = document(vec![nested_paragraph(), Paragraph::new_text("tail")]);
    doc.delete_text(TextRange::new(10, 19)).expect("valid range");
    assert_eq!(doc.paragraphs.len(), 1);
    assert_eq!(doc.text(), "Hello big il");
    let runs = doc.paragraphs[0].styled_runs();
    assert_eq!(runs[1].text, "big ");
    assert_eq!(runs[2].text, "il");
    assert!(runs[2].style.is_empty());
}

#[test]
fn insert_plain_text_extends_the_left_span() {
    let mut doc = document(vec![nested_paragraph()]);
    doc.insert_plain_text(9, "!!").expect("valid offset");
    assert_eq!(doc.text(), "Hello big!! world!");
    assert_eq!(doc.paragraphs[0].spans[1].text, "big!! ");

    doc.insert_plain_text(0, ">").expect("valid offset");
    assert_eq!(doc.paragraphs[0].spans[0].text, ">Hello ");
}

#[test]
fn split_paragraph_continues_lists() {
    let mut doc = document(vec![
        Paragraph::new_text("onetwo").with_type(ParagraphType::ordered(1)),
    ]);
    let index = doc.split_paragraph(3).expect("valid offset");
    assert_eq!(index, 1);
    assert_eq!(doc.text(), "one\ntwo");
    assert_eq!(doc.paragraphs[1].paragraph_type.number(), Some(2));
    assert_ne!(doc.paragraphs[0].key(), doc.paragraphs[1].key());
}

#[test]
fn paragraph_equality_ignores_identity() {
    let a = Paragraph::new_text("same");
    let b = Paragraph::new_text("same");
    assert_ne!(a.key(), b.key());
    assert_eq!(a, b);
}

#[test]
fn merge_adjacent_joins_equal_neighbours() {
    let mut doc = document(vec![Paragraph::new().with_spans(vec![
        Span::styled("ab", CharacterStyle::bold()),
        Span::new(),
        Span::styled("cd", CharacterStyle::bold()),
        Span::new_text("e"),
    ])]);
    doc.merge_adjacent(0);
    assert_eq!(
        doc.paragraphs[0].spans,
        vec![
            Span::styled("abcd", CharacterStyle::bold()),
            Span::new_text("e"),
        ]
    );
    doc.merge_adjacent(5);
}

#[test]
fn outline_lists_every_span() {
    let doc = document(vec![
        nested_paragraph(),
        Paragraph::new_text("item").with_type(ParagraphType::ordered(2)),
    ]);
    assert_eq!(
        doc.outline(),
        "paragraph 0\n  span \"Hello \"\n  span \"big \" Bold\n    span \"world\" Italic\n  span \"!\"\nparagraph 1 [ordered 2]\n  span \"item\"\n"
    );
}
