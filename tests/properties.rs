use proptest::prelude::*;
use richdoc::{
    CharacterStyle, Codec, Document, DocumentEditor, HtmlCodec, MarkdownCodec, Paragraph, Span,
    TextRange,
};

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn words() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 1..4).prop_map(|words| words.join(" "))
}

fn inline_style() -> impl Strategy<Value = CharacterStyle> {
    prop_oneof![
        Just(CharacterStyle::default()),
        Just(CharacterStyle::bold()),
        Just(CharacterStyle::italic()),
        Just(CharacterStyle::bold().merge(&CharacterStyle::italic())),
    ]
}

/// Styled pieces separated by plain spaces, so no two markers touch.
fn styled_paragraph() -> impl Strategy<Value = Paragraph> {
    prop::collection::vec((words(), inline_style()), 1..4).prop_map(|pieces| {
        let mut spans = Vec::new();
        for (idx, (text, style)) in pieces.into_iter().enumerate() {
            if idx > 0 {
                spans.push(Span::new_text(" "));
            }
            spans.push(Span::styled(text, style));
        }
        Paragraph::new().with_spans(spans)
    })
}

fn styled_document() -> impl Strategy<Value = Document> {
    prop::collection::vec(styled_paragraph(), 1..4)
        .prop_map(|paragraphs| Document::new().with_paragraphs(paragraphs))
}

fn plain_document() -> impl Strategy<Value = Document> {
    prop::collection::vec(words(), 1..4).prop_map(|lines| {
        Document::new().with_paragraphs(lines.into_iter().map(Paragraph::new_text).collect())
    })
}

/// Nested inline markup such as `w <b>x <i>y</i> z</b>`.
fn inline_markup() -> impl Strategy<Value = String> {
    word().prop_recursive(3, 16, 3, |inner| {
        (
            prop_oneof![Just("b"), Just("i"), Just("em"), Just("strong")],
            prop::collection::vec(inner, 1..4),
        )
            .prop_map(|(tag, parts)| format!("<{tag}>{}</{tag}>", parts.join(" ")))
    })
}

/// Documents with nested spans, built by decoding generated markup.
fn nested_document() -> impl Strategy<Value = Document> {
    let paragraph = prop::collection::vec(inline_markup(), 1..4)
        .prop_map(|parts| format!("<p>{}</p>", parts.join(" ")));
    prop::collection::vec(paragraph, 1..4)
        .prop_map(|paragraphs| HtmlCodec::new().decode(&paragraphs.concat()).document)
}

/// A document and a non-empty range inside it.
fn with_range(
    documents: impl Strategy<Value = Document>,
) -> impl Strategy<Value = (Document, TextRange)> {
    documents.prop_flat_map(|document| {
        let len = document.len();
        (Just(document), 0..len).prop_flat_map(move |(document, start)| {
            (Just(document), Just(start), start + 1..=len)
                .prop_map(|(document, start, end)| (document, TextRange::new(start, end)))
        })
    })
}

fn document_and_range() -> impl Strategy<Value = (Document, TextRange)> {
    with_range(plain_document())
}

fn nested_document_and_range() -> impl Strategy<Value = (Document, TextRange)> {
    with_range(nested_document())
}

fn runs(document: &Document) -> Vec<Vec<richdoc::StyledRun>> {
    document.paragraphs.iter().map(Paragraph::styled_runs).collect()
}

/// Joins the pieces left behind by splitting.
fn merged(mut document: Document) -> Document {
    for idx in 0..document.paragraphs.len() {
        document.merge_adjacent(idx);
    }
    document
}

fn assert_contained(
    editor: &DocumentEditor,
    text: &[char],
    range: TextRange,
) -> Result<(), TestCaseError> {
    for (offset, ch) in text.iter().enumerate() {
        if *ch == '\n' {
            continue;
        }
        let style = editor
            .character_style_at(TextRange::new(offset, offset + 1))
            .unwrap();
        let inside = range.start <= offset && offset < range.end;
        prop_assert_eq!(style.is_underlined(), inside, "offset {}", offset);
    }
    Ok(())
}

proptest! {
    #[test]
    fn markdown_keeps_styled_runs(document in styled_document()) {
        let codec = MarkdownCodec::new();
        let decoded = codec.decode(&codec.encode(&document));
        prop_assert!(decoded.issues.is_empty());
        prop_assert_eq!(runs(&decoded.document), runs(&document));
    }

    #[test]
    fn html_keeps_styled_runs(document in styled_document()) {
        let codec = HtmlCodec::new();
        let decoded = codec.decode(&codec.encode(&document));
        prop_assert!(decoded.issues.is_empty());
        prop_assert_eq!(runs(&decoded.document), runs(&document));
    }

    #[test]
    fn style_changes_keep_the_text((document, range) in document_and_range()) {
        let text = document.text();
        let mut editor = DocumentEditor::new(document);
        editor.add_character_style(range, &CharacterStyle::bold()).unwrap();
        prop_assert_eq!(editor.text(), text.clone());
        editor.remove_character_style(range, &CharacterStyle::italic()).unwrap();
        prop_assert_eq!(editor.text(), text);
    }

    #[test]
    fn adding_a_style_twice_changes_nothing((document, range) in document_and_range()) {
        let mut editor = DocumentEditor::new(document);
        editor.add_character_style(range, &CharacterStyle::bold()).unwrap();
        let once = editor.document().clone();
        editor.add_character_style(range, &CharacterStyle::bold()).unwrap();
        prop_assert_eq!(editor.document(), &once);
    }

    #[test]
    fn removing_an_added_style_restores_the_document((document, range) in document_and_range()) {
        let before = document.clone();
        let mut editor = DocumentEditor::new(document);
        editor.add_character_style(range, &CharacterStyle::bold()).unwrap();
        editor.remove_character_style(range, &CharacterStyle::bold()).unwrap();
        prop_assert_eq!(merged(editor.document().clone()), before);
    }

    #[test]
    fn styles_stay_inside_their_range((document, range) in document_and_range()) {
        let text: Vec<char> = document.text().chars().collect();
        let mut editor = DocumentEditor::new(document);
        editor.add_character_style(range, &CharacterStyle::underline()).unwrap();
        assert_contained(&editor, &text, range)?;
    }

    #[test]
    fn nested_spans_keep_their_text((document, range) in nested_document_and_range()) {
        let text = document.text();
        let mut editor = DocumentEditor::new(document);
        editor.add_character_style(range, &CharacterStyle::underline()).unwrap();
        prop_assert_eq!(editor.text(), text.clone());
        editor.remove_character_style(range, &CharacterStyle::bold()).unwrap();
        prop_assert_eq!(editor.text(), text);
    }

    #[test]
    fn nested_styles_stay_inside_their_range((document, range) in nested_document_and_range()) {
        let text: Vec<char> = document.text().chars().collect();
        let mut editor = DocumentEditor::new(document);
        editor.add_character_style(range, &CharacterStyle::underline()).unwrap();
        assert_contained(&editor, &text, range)?;
    }

    #[test]
    fn adding_twice_to_nested_spans_changes_nothing((document, range) in nested_document_and_range()) {
        let mut editor = DocumentEditor::new(document);
        editor.add_character_style(range, &CharacterStyle::underline()).unwrap();
        let once = editor.document().clone();
        editor.add_character_style(range, &CharacterStyle::underline()).unwrap();
        prop_assert_eq!(editor.document(), &once);
    }

    #[test]
    fn removing_from_nested_spans_restores_the_runs((document, range) in nested_document_and_range()) {
        let before = runs(&document);
        let mut editor = DocumentEditor::new(document);
        editor.add_character_style(range, &CharacterStyle::underline()).unwrap();
        editor.remove_character_style(range, &CharacterStyle::underline()).unwrap();
        prop_assert_eq!(runs(editor.document()), before);
    }
}
