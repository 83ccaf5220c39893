use super::document::{Block, CharFormat, Document, ListKind, Marker};

/// A position inside a document: block index plus character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub block: usize,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Cursor,
    pub head: Cursor,
}

impl Selection {
    pub fn ordered(&self) -> (Cursor, Cursor) {
        if (self.anchor.block, self.anchor.offset) <= (self.head.block, self.head.offset) {
            (self.anchor, self.head)
        } else {
            (self.head, self.anchor)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }
}

/// What the editor toolbar should display for the current cursor position.
/// `list` is a single option, so at most one list toggle can ever be active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolbarState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<String>,
    pub list: Option<ListKind>,
}

/// The in-memory state of one open note editor: title, document, cursor,
/// the pending insertion format, and the unsaved-changes flag.
///
/// Formatting flows one way in each direction: the `toggle_*`/`set_color`
/// methods apply user actions to the document, while `observe_cursor`
/// re-derives the insertion format after cursor movement. The toolbar renders
/// from `toolbar_state()` and never feeds back into the document.
#[derive(Debug, Clone)]
pub struct EditorSession {
    pub note_id: Option<i64>,
    pub title: String,
    pub document: Document,
    pub cursor: Cursor,
    pub selection: Option<Selection>,
    format: CharFormat,
    /// Last picked color, shown on the palette button between uses.
    pub color: String,
    pub dirty: bool,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    /// A session for a note that has never been saved.
    pub fn new() -> Self {
        Self {
            note_id: None,
            title: String::new(),
            document: Document::new(),
            cursor: Cursor {
                block: 0,
                offset: 0,
            },
            selection: None,
            format: CharFormat::default(),
            color: "#000000".to_string(),
            dirty: false,
        }
    }

    /// A session bound to an existing note.
    pub fn from_note(id: i64, title: String, document: Document) -> Self {
        let mut session = Self::new();
        session.note_id = Some(id);
        session.title = title;
        session.document = document;
        session.observe_cursor();
        session
    }

    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.dirty = true;
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Derive toolbar toggle state from the cursor position. Checklist is
    /// recognized by its marker, bullet and ordered by the block's list kind.
    pub fn toolbar_state(&self) -> ToolbarState {
        let block = &self.document.blocks[self.cursor.block];
        let list = if block.marker.is_some() {
            Some(ListKind::Checklist)
        } else {
            block.list
        };
        ToolbarState {
            bold: self.format.bold,
            italic: self.format.italic,
            underline: self.format.underline,
            color: self.format.color.clone(),
            list,
        }
    }

    /// Re-derive the insertion format after the cursor moved. This is the
    /// observe path; applying formats never goes through here.
    pub fn observe_cursor(&mut self) {
        let block = &self.document.blocks[self.cursor.block];
        self.format = block.format_at(self.cursor.offset);
    }

    // --- character formatting (apply path) ---

    pub fn toggle_bold(&mut self) {
        let on = !self.format.bold;
        self.apply_char_format(move |f| f.bold = on);
    }

    pub fn toggle_italic(&mut self) {
        let on = !self.format.italic;
        self.apply_char_format(move |f| f.italic = on);
    }

    pub fn toggle_underline(&mut self) {
        let on = !self.format.underline;
        self.apply_char_format(move |f| f.underline = on);
    }

    pub fn set_color(&mut self, color: &str) {
        let color = color.to_lowercase();
        self.color = color.clone();
        let value = Some(color);
        self.apply_char_format(move |f| f.color = value.clone());
    }

    /// Update the pending insertion format and, when a selection exists,
    /// restyle the selected characters.
    fn apply_char_format(&mut self, f: impl Fn(&mut CharFormat)) {
        f(&mut self.format);
        let Some(selection) = self.selection else {
            return;
        };
        if selection.is_empty() {
            return;
        }
        let (start, end) = selection.ordered();
        for index in start.block..=end.block {
            let block = &mut self.document.blocks[index];
            let from = if index == start.block { start.offset } else { 0 };
            let to = if index == end.block {
                end.offset
            } else {
                block.char_len()
            };
            block.apply_format(from, to, &f);
        }
        self.dirty = true;
    }

    // --- list formatting ---

    /// Toggle the block under the cursor in or out of the given list kind.
    /// Kinds are mutually exclusive per block by construction.
    pub fn toggle_list(&mut self, kind: ListKind) {
        let block = &mut self.document.blocks[self.cursor.block];
        if block.list == Some(kind) {
            block.clear_list();
        } else {
            block.set_list(kind);
        }
        self.dirty = true;
    }

    pub fn toggle_marker_at(&mut self, index: usize) {
        if let Some(block) = self.document.blocks.get_mut(index) {
            if block.marker.is_some() {
                block.toggle_marker();
                self.dirty = true;
            }
        }
    }

    // --- editing ---

    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.delete_selection();
        let format = self.format.clone();
        let block = &mut self.document.blocks[self.cursor.block];
        block.insert(self.cursor.offset, text, &format);
        self.cursor.offset += text.chars().count();
        self.dirty = true;
    }

    /// Split the current block at the cursor. The new block stays in the
    /// same list; new checklist items start unchecked. Pressing Enter on an
    /// already empty list item leaves two empty items in a row, which exits
    /// list mode: both are dropped and a plain paragraph takes their place.
    pub fn enter(&mut self) {
        self.delete_selection();
        let index = self.cursor.block;
        let block = &mut self.document.blocks[index];
        let tail = block.split_off(self.cursor.offset);
        let list = block.list;
        let indent = block.indent;
        let marker = if list == Some(ListKind::Checklist) {
            Some(Marker::Unchecked)
        } else {
            None
        };
        self.document.blocks.insert(
            index + 1,
            Block {
                spans: tail,
                list,
                marker,
                indent,
            },
        );
        self.cursor = Cursor {
            block: index + 1,
            offset: 0,
        };
        self.dirty = true;

        if list.is_some()
            && self.document.blocks[index].is_empty()
            && self.document.blocks[index + 1].is_empty()
        {
            self.document.blocks.drain(index..=index + 1);
            self.document.blocks.insert(index, Block::new());
            self.cursor = Cursor {
                block: index,
                offset: 0,
            };
        }
    }

    /// Delete backwards. Backspace on the lone empty item of a list exits
    /// list mode in place; at a block start it merges into the previous
    /// block; otherwise it removes one character.
    pub fn backspace(&mut self) {
        if self.selection.is_some_and(|s| !s.is_empty()) {
            self.delete_selection();
            return;
        }
        self.selection = None;
        let index = self.cursor.block;
        if self.cursor.offset > 0 {
            let block = &mut self.document.blocks[index];
            block.delete_range(self.cursor.offset - 1, self.cursor.offset);
            self.cursor.offset -= 1;
            self.dirty = true;
            return;
        }

        let block = &self.document.blocks[index];
        if block.list.is_some() && block.is_empty() && self.list_run_len(index) == 1 {
            self.document.blocks[index].clear_list();
            self.dirty = true;
            return;
        }

        if index > 0 {
            let spans = std::mem::take(&mut self.document.blocks[index].spans);
            self.document.blocks.remove(index);
            let prev = &mut self.document.blocks[index - 1];
            let offset = prev.char_len();
            prev.spans.extend(spans);
            prev.normalize();
            self.cursor = Cursor {
                block: index - 1,
                offset,
            };
            self.dirty = true;
            self.observe_cursor();
        }
    }

    /// Delete forwards (the Delete key).
    pub fn delete_forward(&mut self) {
        if self.selection.is_some_and(|s| !s.is_empty()) {
            self.delete_selection();
            return;
        }
        self.selection = None;
        let index = self.cursor.block;
        let len = self.document.blocks[index].char_len();
        if self.cursor.offset < len {
            self.document.blocks[index].delete_range(self.cursor.offset, self.cursor.offset + 1);
            self.dirty = true;
        } else if index + 1 < self.document.blocks.len() {
            let spans = std::mem::take(&mut self.document.blocks[index + 1].spans);
            self.document.blocks.remove(index + 1);
            let block = &mut self.document.blocks[index];
            block.spans.extend(spans);
            block.normalize();
            self.dirty = true;
        }
    }

    fn delete_selection(&mut self) {
        let Some(selection) = self.selection.take() else {
            return;
        };
        if selection.is_empty() {
            return;
        }
        let (start, end) = selection.ordered();
        if start.block == end.block {
            self.document.blocks[start.block].delete_range(start.offset, end.offset);
        } else {
            let tail = self.document.blocks[end.block].split_off(end.offset);
            self.document.blocks.drain(start.block + 1..=end.block);
            let head = &mut self.document.blocks[start.block];
            let len = head.char_len();
            head.delete_range(start.offset, len);
            head.spans.extend(tail);
            head.normalize();
        }
        self.cursor = start;
        self.dirty = true;
    }

    /// Items of the same list kind adjacent to `index`, including itself.
    fn list_run_len(&self, index: usize) -> usize {
        let Some(kind) = self.document.blocks[index].list else {
            return 0;
        };
        let mut len = 1;
        let mut i = index;
        while i > 0 && self.document.blocks[i - 1].list == Some(kind) {
            len += 1;
            i -= 1;
        }
        let mut i = index;
        while i + 1 < self.document.blocks.len() && self.document.blocks[i + 1].list == Some(kind)
        {
            len += 1;
            i += 1;
        }
        len
    }

    // --- cursor movement (each movement re-derives the toolbar state) ---

    pub fn move_left(&mut self) {
        self.selection = None;
        if self.cursor.offset > 0 {
            self.cursor.offset -= 1;
        } else if self.cursor.block > 0 {
            self.cursor.block -= 1;
            self.cursor.offset = self.document.blocks[self.cursor.block].char_len();
        }
        self.observe_cursor();
    }

    pub fn move_right(&mut self) {
        self.selection = None;
        let len = self.document.blocks[self.cursor.block].char_len();
        if self.cursor.offset < len {
            self.cursor.offset += 1;
        } else if self.cursor.block + 1 < self.document.blocks.len() {
            self.cursor.block += 1;
            self.cursor.offset = 0;
        }
        self.observe_cursor();
    }

    pub fn move_up(&mut self) {
        self.selection = None;
        if self.cursor.block > 0 {
            self.cursor.block -= 1;
            let len = self.document.blocks[self.cursor.block].char_len();
            self.cursor.offset = self.cursor.offset.min(len);
        } else {
            self.cursor.offset = 0;
        }
        self.observe_cursor();
    }

    pub fn move_down(&mut self) {
        self.selection = None;
        if self.cursor.block + 1 < self.document.blocks.len() {
            self.cursor.block += 1;
            let len = self.document.blocks[self.cursor.block].char_len();
            self.cursor.offset = self.cursor.offset.min(len);
        } else {
            self.cursor.offset = self.document.blocks[self.cursor.block].char_len();
        }
        self.observe_cursor();
    }

    /// Place the cursor at the end of a clicked block.
    pub fn click_block(&mut self, index: usize) {
        let index = index.min(self.document.blocks.len() - 1);
        self.cursor = Cursor {
            block: index,
            offset: self.document.blocks[index].char_len(),
        };
        self.selection = None;
        self.observe_cursor();
    }

    /// Select a character range (used by tests and selection gestures).
    pub fn select(&mut self, anchor: Cursor, head: Cursor) {
        self.selection = Some(Selection { anchor, head });
        self.cursor = head;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(block: usize, offset: usize) -> Cursor {
        Cursor { block, offset }
    }

    #[test]
    fn new_session_is_clean() {
        let session = EditorSession::new();
        assert!(!session.dirty);
        assert_eq!(session.document.blocks.len(), 1);
    }

    #[test]
    fn typing_and_title_edits_mark_dirty() {
        let mut session = EditorSession::new();
        session.insert_text("hi");
        assert!(session.dirty);
        session.mark_saved();
        assert!(!session.dirty);
        session.set_title("Groceries".into());
        assert!(session.dirty);
    }

    #[test]
    fn list_toggles_are_mutually_exclusive() {
        let mut session = EditorSession::new();
        session.insert_text("item");

        session.toggle_list(ListKind::Bullet);
        assert_eq!(session.toolbar_state().list, Some(ListKind::Bullet));

        session.toggle_list(ListKind::Ordered);
        assert_eq!(session.toolbar_state().list, Some(ListKind::Ordered));
        assert_eq!(session.document.blocks[0].marker, None);

        session.toggle_list(ListKind::Checklist);
        assert_eq!(session.toolbar_state().list, Some(ListKind::Checklist));
        assert_eq!(session.document.blocks[0].marker, Some(Marker::Unchecked));

        // Toggling the active kind off leaves the block outside any list
        session.toggle_list(ListKind::Checklist);
        assert_eq!(session.toolbar_state().list, None);
        assert_eq!(session.document.blocks[0].marker, None);
    }

    #[test]
    fn enter_continues_the_list() {
        let mut session = EditorSession::new();
        session.insert_text("first");
        session.toggle_list(ListKind::Checklist);
        session.toggle_marker_at(0);
        session.enter();
        session.insert_text("second");

        let blocks = &session.document.blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].marker, Some(Marker::Checked));
        assert_eq!(blocks[1].list, Some(ListKind::Checklist));
        assert_eq!(blocks[1].marker, Some(Marker::Unchecked));
    }

    #[test]
    fn double_enter_exits_list_mode() {
        let mut session = EditorSession::new();
        session.insert_text("item");
        session.toggle_list(ListKind::Bullet);
        session.enter();
        assert_eq!(session.document.blocks.len(), 2);
        session.enter();

        let blocks = &session.document.blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text(), "item");
        assert_eq!(blocks[0].list, Some(ListKind::Bullet));
        assert_eq!(blocks[1].list, None);
        assert!(blocks[1].is_empty());
        assert_eq!(session.cursor, cursor(1, 0));
    }

    #[test]
    fn backspace_on_lone_empty_list_item_exits() {
        let mut session = EditorSession::new();
        session.toggle_list(ListKind::Bullet);
        session.backspace();

        assert_eq!(session.document.blocks.len(), 1);
        assert_eq!(session.document.blocks[0].list, None);
    }

    #[test]
    fn backspace_keeps_list_when_other_items_remain() {
        let mut session = EditorSession::new();
        session.insert_text("first");
        session.toggle_list(ListKind::Bullet);
        session.enter();
        // Cursor sits on an empty second item; backspace merges upward
        session.backspace();
        assert_eq!(session.document.blocks.len(), 1);
        assert_eq!(session.document.blocks[0].list, Some(ListKind::Bullet));
        assert_eq!(session.cursor, cursor(0, 5));
    }

    #[test]
    fn backspace_merges_blocks() {
        let mut session = EditorSession::new();
        session.insert_text("ab");
        session.enter();
        session.insert_text("cd");
        session.cursor = cursor(1, 0);
        session.backspace();

        assert_eq!(session.document.blocks.len(), 1);
        assert_eq!(session.document.blocks[0].text(), "abcd");
        assert_eq!(session.cursor, cursor(0, 2));
    }

    #[test]
    fn pending_format_applies_to_typed_text() {
        let mut session = EditorSession::new();
        session.insert_text("ab");
        session.toggle_bold();
        session.insert_text("cd");

        let block = &session.document.blocks[0];
        assert_eq!(block.spans.len(), 2);
        assert!(!block.spans[0].format.bold);
        assert!(block.spans[1].format.bold);
    }

    #[test]
    fn selection_formatting_restyles_range() {
        let mut session = EditorSession::new();
        session.insert_text("hello world");
        session.select(cursor(0, 6), cursor(0, 11));
        session.toggle_bold();
        session.set_color("#CC0000");

        let block = &session.document.blocks[0];
        assert_eq!(block.spans[1].text, "world");
        assert!(block.spans[1].format.bold);
        assert_eq!(block.spans[1].format.color.as_deref(), Some("#cc0000"));
        assert_eq!(session.color, "#cc0000");
    }

    #[test]
    fn cursor_movement_reflects_format_onto_toolbar() {
        let mut session = EditorSession::new();
        session.insert_text("ab");
        session.toggle_bold();
        session.insert_text("cd");
        assert!(session.toolbar_state().bold);

        session.move_left();
        session.move_left();
        assert!(!session.toolbar_state().bold);

        session.move_right();
        session.move_right();
        assert!(session.toolbar_state().bold);
    }

    #[test]
    fn toolbar_reflects_list_at_cursor() {
        let mut session = EditorSession::new();
        session.insert_text("plain");
        session.enter();
        session.insert_text("listed");
        session.toggle_list(ListKind::Ordered);

        session.move_up();
        assert_eq!(session.toolbar_state().list, None);
        session.move_down();
        assert_eq!(session.toolbar_state().list, Some(ListKind::Ordered));
    }

    #[test]
    fn delete_selection_across_blocks() {
        let mut session = EditorSession::new();
        session.insert_text("first");
        session.enter();
        session.insert_text("middle");
        session.enter();
        session.insert_text("last");
        session.select(cursor(0, 2), cursor(2, 2));
        session.insert_text("!");

        assert_eq!(session.document.blocks.len(), 1);
        assert_eq!(session.document.blocks[0].text(), "fi!st");
    }

    #[test]
    fn marker_toggle_flips_checkbox() {
        let mut session = EditorSession::new();
        session.insert_text("milk");
        session.toggle_list(ListKind::Checklist);
        session.toggle_marker_at(0);
        assert_eq!(session.document.blocks[0].marker, Some(Marker::Checked));
        session.toggle_marker_at(0);
        assert_eq!(session.document.blocks[0].marker, Some(Marker::Unchecked));
        // No marker, no toggle
        session.toggle_list(ListKind::Checklist);
        session.toggle_marker_at(0);
        assert_eq!(session.document.blocks[0].marker, None);
    }
}
