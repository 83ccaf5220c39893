use quicknote::core::document::ListKind;

/// What the main pane is showing: the note library, or one of the open
/// editor sessions (keyed by a session counter, not the note id, so an
/// unsaved note can be open too).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavTarget {
    Library,
    Session(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone)]
pub enum Message {
    // Library
    NewNote,
    OpenNote(i64),
    ConfirmDeleteNote(i64),
    CancelDeleteNote,
    DeleteNote(i64),

    // Editor persistence and close flow
    TitleChanged(String),
    SaveActive,
    CloseActive,
    SaveAndClose,
    DiscardAndClose,
    CancelClose,

    // Editor formatting
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    ToggleColorPicker,
    SetColor(String),
    ToggleList(ListKind),
    ToggleMarker(usize),

    // Editor text input and cursor
    BodyInput(String),
    BodyEnter,
    BodyBackspace,
    BodyDelete,
    BodyMove(Direction),
    ClickBlock(usize),

    DismissError,
}
