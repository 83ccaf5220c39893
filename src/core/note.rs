use super::html::HtmlParser;

/// A persisted note row. Timestamps are the store's sortable string format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: String,
    pub modified: String,
}

impl Note {
    /// Title shown on cards and tabs; empty titles fall back to a placeholder.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.title
        }
    }

    /// Plain-text preview of the content, at most `max_lines` lines and
    /// `max_chars` characters.
    pub fn snippet(&self, max_lines: usize, max_chars: usize) -> String {
        let text = HtmlParser::parse(&self.content).plain_text();
        let mut preview: String = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(max_lines)
            .collect::<Vec<_>>()
            .join("\n");
        if preview.chars().count() > max_chars {
            preview = preview.chars().take(max_chars).collect();
            preview.push('…');
        }
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str, content: &str) -> Note {
        Note {
            id: 1,
            title: title.into(),
            content: content.into(),
            created: String::new(),
            modified: String::new(),
        }
    }

    #[test]
    fn empty_title_falls_back_to_placeholder() {
        assert_eq!(note("", "").display_title(), "Untitled");
        assert_eq!(note("  ", "").display_title(), "Untitled");
        assert_eq!(note("Groceries", "").display_title(), "Groceries");
    }

    #[test]
    fn snippet_strips_markup_and_truncates() {
        let n = note("t", "<p><b>hello</b> world</p><p></p><p>second</p>");
        assert_eq!(n.snippet(4, 100), "hello world\nsecond");
        assert_eq!(n.snippet(1, 100), "hello world");
        assert_eq!(n.snippet(4, 5), "hello…");
    }
}
