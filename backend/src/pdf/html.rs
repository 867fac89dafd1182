//! Reduces a rendered contract HTML document to a flat list of layout blocks.
//!
//! The document is parsed with `scraper` (html5ever), so attribute quoting,
//! character references and unclosed tags follow browser rules. Only the
//! subset of HTML that contract templates use is laid out: headings,
//! paragraphs and generic block containers, line breaks, list items,
//! `<b>`/`<strong>`, `<i>`/`<em>` and `<img>`. Everything in `<head>`,
//! `<style>` and `<script>` is dropped, unknown tags are walked through and
//! their text is kept.

use scraper::{ElementRef, Html, Node};

/// Fragments with detected styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub text: String,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, segments: Vec<TextSegment> },
    Paragraph(Vec<TextSegment>),
    ListItem(Vec<TextSegment>),
    Image { src: String },
    Break,
}

#[derive(Clone, Copy)]
enum Kind {
    Paragraph,
    Heading(u8),
    ListItem,
}

struct Builder {
    blocks: Vec<Block>,
    segments: Vec<TextSegment>,
    kind: Kind,
    bold: u32,
    italic: u32,
}

impl Builder {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            segments: Vec::new(),
            kind: Kind::Paragraph,
            bold: 0,
            italic: 0,
        }
    }

    fn style(&self) -> TextStyle {
        match (self.bold > 0, self.italic > 0) {
            (true, true) => TextStyle::BoldItalic,
            (true, false) => TextStyle::Bold,
            (false, true) => TextStyle::Italic,
            (false, false) => TextStyle::Regular,
        }
    }

    /// Appends text, collapsing runs of ASCII whitespace to a single space.
    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_ascii_whitespace() {
                let after_text = self
                    .segments
                    .last()
                    .and_then(|s| s.text.chars().last())
                    .is_some_and(|last| last != ' ');
                if after_text {
                    self.push_char(' ');
                }
                continue;
            }
            self.push_char(c);
        }
    }

    fn push_char(&mut self, c: char) {
        let style = self.style();
        match self.segments.last_mut() {
            Some(last) if last.style == style => last.text.push(c),
            _ => self.segments.push(TextSegment {
                text: c.to_string(),
                style,
            }),
        }
    }

    fn flush(&mut self) -> bool {
        if let Some(last) = self.segments.last_mut() {
            let trimmed = last.text.trim_end_matches(' ').len();
            last.text.truncate(trimmed);
            if last.text.is_empty() {
                self.segments.pop();
            }
        }
        if self.segments.is_empty() {
            return false;
        }
        let segments = std::mem::take(&mut self.segments);
        self.blocks.push(match self.kind {
            Kind::Paragraph => Block::Paragraph(segments),
            Kind::Heading(level) => Block::Heading { level, segments },
            Kind::ListItem => Block::ListItem(segments),
        });
        true
    }

    fn line_break(&mut self) {
        if !self.flush() {
            self.blocks.push(Block::Break);
        }
    }

    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.element(child);
                    }
                }
                _ => {}
            }
        }
    }

    /// Lays out `element` and its subtree as a block of `kind`.
    fn block(&mut self, element: ElementRef<'_>, kind: Kind) {
        self.flush();
        let outer = std::mem::replace(&mut self.kind, kind);
        self.walk(element);
        self.flush();
        self.kind = outer;
    }

    fn element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        match name {
            "head" | "title" | "style" | "script" | "template" | "noscript" => {}
            "b" | "strong" => {
                self.bold += 1;
                self.walk(element);
                self.bold -= 1;
            }
            "i" | "em" => {
                self.italic += 1;
                self.walk(element);
                self.italic -= 1;
            }
            "br" => self.line_break(),
            "hr" => {
                self.flush();
                self.blocks.push(Block::Break);
            }
            "img" => {
                let src = element.value().attr("src").map(str::trim).unwrap_or_default();
                if !src.is_empty() {
                    self.flush();
                    self.blocks.push(Block::Image {
                        src: src.to_string(),
                    });
                }
            }
            "li" => self.block(element, Kind::ListItem),
            "td" | "th" => {
                self.walk(element);
                self.push_text(" ");
            }
            "p" | "div" | "section" | "article" | "header" | "footer" | "main" | "table"
            | "tr" | "ul" | "ol" | "blockquote" | "body" | "html" => {
                self.block(element, Kind::Paragraph)
            }
            _ => match heading_level(name) {
                Some(level) => self.block(element, Kind::Heading(level)),
                None => self.walk(element),
            },
        }
    }
}

fn heading_level(name: &str) -> Option<u8> {
    let digit = name.strip_prefix('h')?;
    match digit.parse::<u8>() {
        Ok(level @ 1..=6) => Some(level),
        _ => None,
    }
}

pub fn parse(html: &str) -> Vec<Block> {
    let document = Html::parse_document(html);
    let mut builder = Builder::new();
    builder.element(document.root_element());
    builder.flush();
    builder.blocks
}
