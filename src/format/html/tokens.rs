//! Turns markup into a balanced stream of open, close and text tokens.
//!
//! The html5ever tokenizer does the lexing and entity decoding; the tree
//! builder is not used. The normalizer on top repairs the nesting the
//! decoder relies on: every open token is eventually matched by a close
//! token of the same name.

use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

use super::{BLOCK_ELEMENTS, VOID_ELEMENTS};
use crate::error::DecodeIssue;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MarkupToken {
    Open {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Close(String),
    Text(String),
}

#[derive(Debug)]
enum RawToken {
    Start {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    End(String),
    Text(String),
}

#[derive(Default)]
struct TokenCollector {
    tokens: RefCell<Vec<RawToken>>,
}

impl TokenSink for TokenCollector {
    type Handle = ();

    fn process_token(&self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        let mut tokens = self.tokens.borrow_mut();
        match token {
            Token::TagToken(tag) => {
                let name = tag.name.to_string();
                match tag.kind {
                    TagKind::StartTag => tokens.push(RawToken::Start {
                        name,
                        attributes: tag
                            .attrs
                            .iter()
                            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                            .collect(),
                        self_closing: tag.self_closing,
                    }),
                    TagKind::EndTag => tokens.push(RawToken::End(name)),
                }
            }
            Token::CharacterTokens(text) => match tokens.last_mut() {
                Some(RawToken::Text(previous)) => previous.push_str(&text),
                _ => tokens.push(RawToken::Text(text.to_string())),
            },
            Token::ParseError(error) => {
                tracing::trace!(target: "richdoc::html", line_number, %error, "tokenizer error");
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

fn lex(input: &str) -> Vec<RawToken> {
    let tokenizer = Tokenizer::new(TokenCollector::default(), TokenizerOpts::default());
    let queue = BufferQueue::default();
    queue.push_back(StrTendril::from_slice(input));
    let _ = tokenizer.feed(&queue);
    tokenizer.end();
    tokenizer.sink.tokens.take()
}

/// Tokenizes `input` and repairs its nesting. Every repair is reported in
/// `issues`.
pub(crate) fn tokenize(input: &str, issues: &mut Vec<DecodeIssue>) -> Vec<MarkupToken> {
    let mut normalizer = Normalizer {
        open: Vec::new(),
        out: Vec::new(),
        issues,
    };
    for token in lex(input) {
        tracing::trace!(target: "richdoc::html", ?token, "token");
        match token {
            RawToken::Start {
                name,
                attributes,
                self_closing,
            } => normalizer.open(name, attributes, self_closing),
            RawToken::End(name) => normalizer.close(&name),
            RawToken::Text(text) => normalizer.out.push(MarkupToken::Text(text)),
        }
    }
    normalizer.finish()
}

/// Tokens of a markup fragment as written, without nesting repair. Void
/// and self-closing elements still get their close token.
pub(crate) fn tokenize_fragment(input: &str) -> Vec<MarkupToken> {
    let mut out = Vec::new();
    for token in lex(input) {
        match token {
            RawToken::Start {
                name,
                attributes,
                self_closing,
            } => {
                let void = self_closing || VOID_ELEMENTS.contains(&name.as_str());
                out.push(MarkupToken::Open {
                    name: name.clone(),
                    attributes,
                });
                if void {
                    out.push(MarkupToken::Close(name));
                }
            }
            RawToken::End(name) if VOID_ELEMENTS.contains(&name.as_str()) => {}
            RawToken::End(name) => out.push(MarkupToken::Close(name)),
            RawToken::Text(text) => out.push(MarkupToken::Text(text)),
        }
    }
    out
}

struct Normalizer<'a> {
    open: Vec<String>,
    out: Vec<MarkupToken>,
    issues: &'a mut Vec<DecodeIssue>,
}

impl Normalizer<'_> {
    fn open(&mut self, name: String, attributes: Vec<(String, String)>, self_closing: bool) {
        if name == "li" {
            self.close_open_item();
        } else if closes_paragraph(&name) {
            if let Some(position) = self.open.iter().rposition(|tag| tag == "p") {
                self.close_down_to(position, &name);
            }
        }

        self.out.push(MarkupToken::Open {
            name: name.clone(),
            attributes,
        });
        if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
            self.out.push(MarkupToken::Close(name));
        } else {
            self.open.push(name);
        }
    }

    fn close(&mut self, name: &str) {
        match self.open.iter().rposition(|tag| tag == name) {
            Some(position) => {
                self.close_down_to(position + 1, name);
                self.open.pop();
                self.out.push(MarkupToken::Close(name.to_string()));
            }
            None if VOID_ELEMENTS.contains(&name) => {}
            None => self
                .issues
                .push(DecodeIssue::MalformedInput(format!("unmatched </{name}>"))),
        }
    }

    /// An `li` ends the previous item of the same list.
    fn close_open_item(&mut self) {
        let list = self
            .open
            .iter()
            .rposition(|tag| tag == "ul" || tag == "ol");
        let item = self.open.iter().rposition(|tag| tag == "li");
        if let Some(item) = item {
            if list.is_none_or(|list| item > list) {
                self.close_down_to(item, "li");
            }
        }
    }

    /// Closes every tag above `position` in the open stack.
    fn close_down_to(&mut self, position: usize, by: &str) {
        while self.open.len() > position {
            let Some(tag) = self.open.pop() else {
                break;
            };
            self.issues.push(DecodeIssue::MalformedInput(format!(
                "<{tag}> implicitly closed by <{by}>"
            )));
            self.out.push(MarkupToken::Close(tag));
        }
    }

    fn finish(mut self) -> Vec<MarkupToken> {
        while let Some(tag) = self.open.pop() {
            self.issues.push(DecodeIssue::MalformedInput(format!(
                "<{tag}> not closed before the end of input"
            )));
            self.out.push(MarkupToken::Close(tag));
        }
        self.out
    }
}

/// Block elements end an open paragraph. Headings are left inside, since
/// heading text is an inline style of the paragraph.
fn closes_paragraph(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name) && !crate::format::HEADING_TAGS.contains(&name)
}
