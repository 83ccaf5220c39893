use regex::Regex;
use std::sync::LazyLock;

use super::document::{Block, CharFormat, Document, ListKind, Marker, Span};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<\s*(?P<close>/?)(?P<name>[a-z][a-z0-9]*)(?P<attrs>(?:\s+[a-z-]+\s*=\s*"[^"]*")*)\s*(?P<selfclose>/?)\s*>"#)
        .unwrap()
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?P<key>[a-z-]+)\s*=\s*"(?P<value>[^"]*)""#).unwrap()
});

static STYLE_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*color\s*:\s*(?P<value>[^;]+)"#).unwrap()
});

pub struct HtmlWriter;

impl HtmlWriter {
    /// Serialize a document to the canonical markup. Consecutive blocks of
    /// the same list kind are grouped into a single list element.
    pub fn write(doc: &Document) -> String {
        let mut out = String::new();
        let mut i = 0;
        while i < doc.blocks.len() {
            let block = &doc.blocks[i];
            match block.list {
                None => {
                    out.push_str("<p>");
                    Self::write_spans(&mut out, block);
                    out.push_str("</p>\n");
                    i += 1;
                }
                Some(kind) => {
                    let (open, close) = match kind {
                        ListKind::Bullet => ("<ul>", "</ul>"),
                        ListKind::Ordered => ("<ol>", "</ol>"),
                        ListKind::Checklist => ("<ul class=\"checklist\">", "</ul>"),
                    };
                    out.push_str(open);
                    out.push('\n');
                    while i < doc.blocks.len() && doc.blocks[i].list == Some(kind) {
                        let item = &doc.blocks[i];
                        match (kind, item.marker) {
                            (ListKind::Checklist, Some(Marker::Checked)) => {
                                out.push_str("  <li class=\"checked\">");
                            }
                            (ListKind::Checklist, _) => {
                                out.push_str("  <li class=\"unchecked\">");
                            }
                            _ => out.push_str("  <li>"),
                        }
                        Self::write_spans(&mut out, item);
                        out.push_str("</li>\n");
                        i += 1;
                    }
                    out.push_str(close);
                    out.push('\n');
                }
            }
        }
        out
    }

    fn write_spans(out: &mut String, block: &Block) {
        for span in &block.spans {
            if span.text.is_empty() {
                continue;
            }
            let f = &span.format;
            if let Some(ref color) = f.color {
                out.push_str(&format!("<span style=\"color:{}\">", color));
            }
            if f.bold {
                out.push_str("<b>");
            }
            if f.italic {
                out.push_str("<i>");
            }
            if f.underline {
                out.push_str("<u>");
            }
            out.push_str(&Self::escape(&span.text));
            if f.underline {
                out.push_str("</u>");
            }
            if f.italic {
                out.push_str("</i>");
            }
            if f.bold {
                out.push_str("</b>");
            }
            if f.color.is_some() {
                out.push_str("</span>");
            }
        }
    }

    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
    }
}

pub struct HtmlParser;

struct ParseState {
    blocks: Vec<Block>,
    current: Option<Block>,
    bold: usize,
    italic: usize,
    underline: usize,
    heading: usize,
    colors: Vec<Option<String>>,
    lists: Vec<ListKind>,
    skip: usize,
}

impl ParseState {
    fn format(&self) -> CharFormat {
        CharFormat {
            bold: self.bold > 0 || self.heading > 0,
            italic: self.italic > 0,
            underline: self.underline > 0,
            color: self.colors.iter().rev().find_map(|c| c.clone()),
        }
    }

    fn open_block(&mut self, list: Option<ListKind>, marker: Option<Marker>) {
        self.flush();
        self.current = Some(Block {
            spans: Vec::new(),
            list,
            marker,
            indent: 0,
        });
    }

    fn flush(&mut self) {
        if let Some(mut block) = self.current.take() {
            // Trailing markup whitespace is formatting, not content
            if let Some(last) = block.spans.last_mut() {
                let trimmed = last.text.trim_end().len();
                last.text.truncate(trimmed);
            }
            block.normalize();
            self.blocks.push(block);
        }
    }

    fn push_text(&mut self, text: &str) {
        let unescaped = unescape(text);
        let collapsed = collapse_whitespace(&unescaped);
        if self.current.is_none() {
            if collapsed.trim().is_empty() {
                return;
            }
            self.open_block(None, None);
        }
        let Some(block) = self.current.as_mut() else {
            return;
        };
        let content = if block.is_empty() {
            collapsed.trim_start().to_string()
        } else {
            collapsed
        };
        if content.is_empty() {
            return;
        }
        let format = self.format();
        let offset = block.char_len();
        block.insert(offset, &content, &format);
    }
}

impl HtmlParser {
    /// Parse markup into a document. The parser is lenient: unknown tags are
    /// ignored and mismatched closers are tolerated, matching how the notes
    /// were written by rich-text widgets rather than by hand.
    ///
    /// Older notes stored checklist items as circle-marker bullet lists;
    /// those are normalized to unchecked checklist items here, in one pass
    /// over the markup (the canonical form is written back on next save).
    pub fn parse(markup: &str) -> Document {
        let mut state = ParseState {
            blocks: Vec::new(),
            current: None,
            bold: 0,
            italic: 0,
            underline: 0,
            heading: 0,
            colors: Vec::new(),
            lists: Vec::new(),
            skip: 0,
        };

        let mut last_end = 0;
        for caps in TAG_RE.captures_iter(markup) {
            let whole = caps.get(0).unwrap();
            let text = &markup[last_end..whole.start()];
            if !text.is_empty() && state.skip == 0 {
                state.push_text(text);
            }
            last_end = whole.end();

            let closing = !caps["close"].is_empty();
            let self_closing = !caps["selfclose"].is_empty();
            let name = caps["name"].to_lowercase();
            let attrs = caps.name("attrs").map(|m| m.as_str()).unwrap_or("");

            Self::handle_tag(&mut state, &name, attrs, closing, self_closing);
        }
        let tail = &markup[last_end..];
        if !tail.is_empty() && state.skip == 0 {
            state.push_text(tail);
        }
        state.flush();

        Document::from_blocks(state.blocks)
    }

    fn handle_tag(
        state: &mut ParseState,
        name: &str,
        attrs: &str,
        closing: bool,
        self_closing: bool,
    ) {
        // Non-content subtrees (Qt's toHtml wraps documents in a full page)
        if matches!(name, "style" | "script" | "head" | "title") {
            if closing {
                state.skip = state.skip.saturating_sub(1);
            } else if !self_closing {
                state.skip += 1;
            }
            return;
        }
        if state.skip > 0 {
            return;
        }

        match name {
            "p" | "div" => {
                if closing {
                    state.flush();
                } else if state.current.is_none() {
                    state.open_block(None, None);
                } else {
                    state.flush();
                    state.open_block(None, None);
                }
            }
            "br" => {
                if state.current.is_some() {
                    let list = state.current.as_ref().and_then(|b| b.list);
                    let marker = state.current.as_ref().and_then(|b| b.marker);
                    state.open_block(list, marker);
                }
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if closing {
                    state.flush();
                    state.heading = state.heading.saturating_sub(1);
                } else {
                    state.open_block(None, None);
                    state.heading += 1;
                }
            }
            "ul" => {
                if closing {
                    state.flush();
                    state.lists.pop();
                } else {
                    state.lists.push(unordered_kind(attrs));
                }
            }
            "ol" => {
                if closing {
                    state.flush();
                    state.lists.pop();
                } else {
                    state.lists.push(ListKind::Ordered);
                }
            }
            "li" => {
                if closing {
                    state.flush();
                } else {
                    let kind = state.lists.last().copied().unwrap_or(ListKind::Bullet);
                    let marker = match kind {
                        ListKind::Checklist => {
                            if attr(attrs, "class").is_some_and(|c| c.contains("checked"))
                                && !attr(attrs, "class").is_some_and(|c| c.contains("unchecked"))
                            {
                                Some(Marker::Checked)
                            } else {
                                Some(Marker::Unchecked)
                            }
                        }
                        _ => None,
                    };
                    state.open_block(Some(kind), marker);
                }
            }
            "b" | "strong" => {
                if closing {
                    state.bold = state.bold.saturating_sub(1);
                } else {
                    state.bold += 1;
                }
            }
            "i" | "em" => {
                if closing {
                    state.italic = state.italic.saturating_sub(1);
                } else {
                    state.italic += 1;
                }
            }
            "u" => {
                if closing {
                    state.underline = state.underline.saturating_sub(1);
                } else {
                    state.underline += 1;
                }
            }
            "span" => {
                if closing {
                    state.colors.pop();
                } else {
                    let color = attr(attrs, "style").and_then(|style| style_color(&style));
                    state.colors.push(color);
                }
            }
            _ => {}
        }
    }
}

/// List kind for a `<ul>` open tag: canonical checklist class, the legacy
/// circle marker styles, or a plain bullet list.
fn unordered_kind(attrs: &str) -> ListKind {
    if attr(attrs, "class").is_some_and(|c| c.split_whitespace().any(|w| w == "checklist")) {
        return ListKind::Checklist;
    }
    if attr(attrs, "type").is_some_and(|t| t.eq_ignore_ascii_case("circle")) {
        return ListKind::Checklist;
    }
    if attr(attrs, "style")
        .is_some_and(|s| s.to_lowercase().replace(' ', "").contains("list-style-type:circle"))
    {
        return ListKind::Checklist;
    }
    ListKind::Bullet
}

fn attr(attrs: &str, key: &str) -> Option<String> {
    ATTR_RE
        .captures_iter(attrs)
        .find(|caps| caps["key"].eq_ignore_ascii_case(key))
        .map(|caps| caps["value"].to_string())
}

fn style_color(style: &str) -> Option<String> {
    STYLE_COLOR_RE
        .captures(style)
        .map(|caps| caps["value"].trim().to_lowercase())
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(blocks: Vec<Block>) -> Document {
        Document::from_blocks(blocks)
    }

    fn list_block(text: &str, kind: ListKind) -> Block {
        let mut block = Block::with_text(text);
        block.set_list(kind);
        block
    }

    #[test]
    fn write_groups_consecutive_list_items() {
        let document = doc(vec![
            Block::with_text("intro"),
            list_block("one", ListKind::Bullet),
            list_block("two", ListKind::Bullet),
        ]);
        let markup = HtmlWriter::write(&document);
        assert_eq!(markup.matches("<ul>").count(), 1);
        assert!(markup.contains("<li>one</li>"));
        assert!(markup.contains("<li>two</li>"));
        assert!(markup.starts_with("<p>intro</p>"));
    }

    #[test]
    fn checklist_serializes_distinctly_from_bullets() {
        let mut unchecked = list_block("milk", ListKind::Checklist);
        unchecked.marker = Some(Marker::Unchecked);
        let mut checked = list_block("eggs", ListKind::Checklist);
        checked.marker = Some(Marker::Checked);

        let markup = HtmlWriter::write(&doc(vec![unchecked, checked]));
        assert!(markup.contains("<ul class=\"checklist\">"));
        assert!(markup.contains("<li class=\"unchecked\">milk</li>"));
        assert!(markup.contains("<li class=\"checked\">eggs</li>"));
    }

    #[test]
    fn roundtrip_preserves_structure() {
        let mut styled = Block::new();
        styled.insert(0, "plain ", &CharFormat::default());
        styled.insert(
            6,
            "loud",
            &CharFormat {
                bold: true,
                color: Some("#cc0000".into()),
                ..CharFormat::default()
            },
        );

        let mut checked = list_block("done", ListKind::Checklist);
        checked.marker = Some(Marker::Checked);

        let document = doc(vec![
            styled,
            list_block("bullet item", ListKind::Bullet),
            list_block("first", ListKind::Ordered),
            list_block("second", ListKind::Ordered),
            checked,
            list_block("todo", ListKind::Checklist),
        ]);

        let reparsed = HtmlParser::parse(&HtmlWriter::write(&document));
        assert_eq!(reparsed, document);
    }

    #[test]
    fn legacy_circle_lists_load_as_checklists() {
        let markup = r#"<ul type="circle"><li>buy milk</li><li>call home</li></ul>"#;
        let document = HtmlParser::parse(markup);
        assert_eq!(document.blocks.len(), 2);
        for block in &document.blocks {
            assert_eq!(block.list, Some(ListKind::Checklist));
            assert_eq!(block.marker, Some(Marker::Unchecked));
        }

        let styled = r#"<ul style="list-style-type: circle;"><li>x</li></ul>"#;
        let document = HtmlParser::parse(styled);
        assert_eq!(document.blocks[0].list, Some(ListKind::Checklist));

        // Normalization is one-way: the canonical form is written back
        let rewritten = HtmlWriter::write(&document);
        assert!(rewritten.contains("class=\"checklist\""));
        assert!(!rewritten.contains("circle"));
    }

    #[test]
    fn parses_full_page_markup() {
        let markup = "<html><head><style>li { margin: 16px }</style></head>\n\
                      <body>\n<p>hello <b>world</b></p>\n</body></html>";
        let document = HtmlParser::parse(markup);
        assert_eq!(document.blocks.len(), 1);
        assert_eq!(document.blocks[0].text(), "hello world");
        assert!(!document.blocks[0].spans[0].format.bold);
        assert!(document.blocks[0].spans[1].format.bold);
    }

    #[test]
    fn color_span_parses_from_style() {
        let markup = r#"<p><span style=" color:#AA00FF;">violet</span></p>"#;
        let document = HtmlParser::parse(markup);
        let span = &document.blocks[0].spans[0];
        assert_eq!(span.format.color.as_deref(), Some("#aa00ff"));
    }

    #[test]
    fn entities_roundtrip() {
        let document = doc(vec![Block::with_text("a < b & \"c\"")]);
        let markup = HtmlWriter::write(&document);
        assert!(!markup.contains("a < b"));
        let reparsed = HtmlParser::parse(&markup);
        assert_eq!(reparsed.blocks[0].text(), "a < b & \"c\"");
    }

    #[test]
    fn empty_markup_yields_single_empty_block() {
        let document = HtmlParser::parse("");
        assert_eq!(document.blocks.len(), 1);
        assert!(document.is_empty());
    }

    #[test]
    fn nested_formatting_tags_stack() {
        let markup = "<p><b>bold <i>both</i></b></p>";
        let document = HtmlParser::parse(markup);
        let block = &document.blocks[0];
        assert_eq!(block.spans.len(), 2);
        assert!(block.spans[0].format.bold && !block.spans[0].format.italic);
        assert!(block.spans[1].format.bold && block.spans[1].format.italic);
    }
}
