/// The list kind applied to a paragraph block. A block is in at most one
/// list at a time, so the three toolbar toggles can never be checked together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bullet,
    Ordered,
    Checklist,
}

/// Checkbox state of a checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Unchecked,
    Checked,
}

impl Marker {
    pub fn toggled(self) -> Self {
        match self {
            Marker::Unchecked => Marker::Checked,
            Marker::Checked => Marker::Unchecked,
        }
    }
}

/// Character-level formatting. Color is a lowercase `#rrggbb` string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<String>,
}

impl CharFormat {
    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline && self.color.is_none()
    }
}

/// A run of text sharing one format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub format: CharFormat,
}

impl Span {
    pub fn new(text: impl Into<String>, format: CharFormat) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, CharFormat::default())
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One paragraph block. Offsets into a block are in characters, not bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub spans: Vec<Span>,
    pub list: Option<ListKind>,
    pub marker: Option<Marker>,
    pub indent: u8,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            spans: vec![Span::plain(text)],
            ..Self::default()
        }
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn char_len(&self) -> usize {
        self.spans.iter().map(Span::char_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.text.is_empty())
    }

    /// Put the block into the given list kind, resetting indentation.
    /// Checklist items always start unchecked.
    pub fn set_list(&mut self, kind: ListKind) {
        self.list = Some(kind);
        self.indent = 0;
        self.marker = match kind {
            ListKind::Checklist => Some(Marker::Unchecked),
            _ => None,
        };
    }

    /// Take the block out of any list, resetting indentation.
    pub fn clear_list(&mut self) {
        self.list = None;
        self.marker = None;
        self.indent = 0;
    }

    pub fn toggle_marker(&mut self) {
        if let Some(marker) = self.marker {
            self.marker = Some(marker.toggled());
        }
    }

    /// The format a character typed at `offset` would inherit: the format of
    /// the character before the cursor, or of the first span at block start.
    pub fn format_at(&self, offset: usize) -> CharFormat {
        if offset == 0 {
            return self
                .spans
                .first()
                .map(|s| s.format.clone())
                .unwrap_or_default();
        }
        let mut seen = 0;
        for span in &self.spans {
            let len = span.char_len();
            if offset <= seen + len {
                return span.format.clone();
            }
            seen += len;
        }
        self.spans
            .last()
            .map(|s| s.format.clone())
            .unwrap_or_default()
    }

    /// Split a span list at a character offset.
    fn split_spans(spans: &[Span], offset: usize) -> (Vec<Span>, Vec<Span>) {
        let mut before = Vec::new();
        let mut after = Vec::new();
        let mut seen = 0;
        for span in spans {
            let len = span.char_len();
            if seen + len <= offset {
                before.push(span.clone());
            } else if seen >= offset {
                after.push(span.clone());
            } else {
                let cut = offset - seen;
                let byte = span
                    .text
                    .char_indices()
                    .nth(cut)
                    .map(|(i, _)| i)
                    .unwrap_or(span.text.len());
                before.push(Span::new(&span.text[..byte], span.format.clone()));
                after.push(Span::new(&span.text[byte..], span.format.clone()));
            }
            seen += len;
        }
        (before, after)
    }

    pub fn insert(&mut self, offset: usize, text: &str, format: &CharFormat) {
        let (mut spans, after) = Self::split_spans(&self.spans, offset);
        spans.push(Span::new(text, format.clone()));
        spans.extend(after);
        self.spans = spans;
        self.normalize();
    }

    /// Remove the character range `[start, end)`.
    pub fn delete_range(&mut self, start: usize, end: usize) {
        let (mut spans, rest) = Self::split_spans(&self.spans, start);
        let (_, after) = Self::split_spans(&rest, end.saturating_sub(start));
        spans.extend(after);
        self.spans = spans;
        self.normalize();
    }

    /// Split the block at `offset`, keeping the head here and returning the
    /// tail spans.
    pub fn split_off(&mut self, offset: usize) -> Vec<Span> {
        let (before, after) = Self::split_spans(&self.spans, offset);
        self.spans = before;
        self.normalize();
        after
    }

    /// Apply a format edit to the character range `[start, end)`.
    pub fn apply_format(&mut self, start: usize, end: usize, f: &impl Fn(&mut CharFormat)) {
        let (mut spans, rest) = Self::split_spans(&self.spans, start);
        let (mut middle, after) = Self::split_spans(&rest, end.saturating_sub(start));
        for span in &mut middle {
            f(&mut span.format);
        }
        spans.extend(middle);
        spans.extend(after);
        self.spans = spans;
        self.normalize();
    }

    /// Drop empty spans and merge adjacent spans with equal formats.
    pub fn normalize(&mut self) {
        let mut merged: Vec<Span> = Vec::with_capacity(self.spans.len());
        for span in self.spans.drain(..) {
            if span.text.is_empty() {
                continue;
            }
            match merged.last_mut() {
                Some(last) if last.format == span.format => last.text.push_str(&span.text),
                _ => merged.push(span),
            }
        }
        self.spans = merged;
    }
}

/// A rich-text document: a sequence of paragraph blocks. Always holds at
/// least one block so a cursor position exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::new()],
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            Self::new()
        } else {
            Self { blocks }
        }
    }

    pub fn plain_text(&self) -> String {
        let lines: Vec<String> = self.blocks.iter().map(Block::text).collect();
        lines.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Block::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> CharFormat {
        CharFormat {
            bold: true,
            ..CharFormat::default()
        }
    }

    #[test]
    fn insert_merges_equal_formats() {
        let mut block = Block::with_text("hello");
        block.insert(5, " world", &CharFormat::default());
        assert_eq!(block.spans.len(), 1);
        assert_eq!(block.text(), "hello world");
    }

    #[test]
    fn insert_splits_on_format_change() {
        let mut block = Block::with_text("hello");
        block.insert(2, "XX", &bold());
        assert_eq!(block.text(), "heXXllo");
        assert_eq!(block.spans.len(), 3);
        assert!(block.spans[1].format.bold);
    }

    #[test]
    fn delete_range_rejoins_spans() {
        let mut block = Block::with_text("hello");
        block.insert(2, "XX", &bold());
        block.delete_range(2, 4);
        assert_eq!(block.text(), "hello");
        assert_eq!(block.spans.len(), 1);
    }

    #[test]
    fn apply_format_over_range() {
        let mut block = Block::with_text("hello world");
        block.apply_format(6, 11, &|f| f.bold = true);
        assert_eq!(block.spans.len(), 2);
        assert_eq!(block.spans[1].text, "world");
        assert!(block.spans[1].format.bold);
    }

    #[test]
    fn format_at_reflects_preceding_char() {
        let mut block = Block::with_text("ab");
        block.insert(2, "c", &bold());
        assert!(!block.format_at(1).bold);
        assert!(block.format_at(3).bold);
        assert!(!block.format_at(0).bold);
    }

    #[test]
    fn set_list_checklist_marks_unchecked() {
        let mut block = Block::with_text("milk");
        block.set_list(ListKind::Checklist);
        assert_eq!(block.list, Some(ListKind::Checklist));
        assert_eq!(block.marker, Some(Marker::Unchecked));

        block.set_list(ListKind::Bullet);
        assert_eq!(block.marker, None);
    }

    #[test]
    fn split_off_keeps_formats_on_both_sides() {
        let mut block = Block::with_text("ab");
        block.insert(2, "cd", &bold());
        let tail = block.split_off(3);
        assert_eq!(block.text(), "abc");
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].text, "d");
        assert!(tail[0].format.bold);
    }

    #[test]
    fn offsets_are_character_based() {
        let mut block = Block::with_text("héllo");
        block.insert(2, "X", &CharFormat::default());
        assert_eq!(block.text(), "héXllo");
        block.delete_range(2, 3);
        assert_eq!(block.text(), "héllo");
    }
}
