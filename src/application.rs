use std::collections::HashMap;

use cosmic::app::{Core, Task as CosmicTask};
use cosmic::widget::{button, icon, nav_bar, row, text};
use cosmic::{executor, Application, Element};

use quicknote::config::QuickNoteConfig;
use quicknote::core::html::{HtmlParser, HtmlWriter};
use quicknote::core::note::Note;
use quicknote::core::session::EditorSession;
use quicknote::store::{NoteStore, StoreError};

use crate::message::{Direction, Message, NavTarget};
use crate::pages;

pub struct Flags {
    pub config: QuickNoteConfig,
    pub cosmic_config: cosmic::cosmic_config::Config,
}

pub struct QuickNote {
    core: Core,
    nav_model: nav_bar::Model,
    config: QuickNoteConfig,
    cosmic_config: cosmic::cosmic_config::Config,
    store: Option<NoteStore>,

    // Library
    notes: Vec<Note>,
    pending_delete: Option<i64>,

    // Open editors, keyed by a session counter so unsaved notes fit too
    sessions: HashMap<usize, EditorSession>,
    next_session: usize,
    active: NavTarget,
    pending_close: Option<usize>,
    color_picker_open: bool,

    last_error: Option<String>,
}

impl Application for QuickNote {
    type Executor = executor::Default;
    type Flags = Flags;
    type Message = Message;

    const APP_ID: &'static str = "dev.quicknote.app";

    fn core(&self) -> &Core {
        &self.core
    }

    fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    fn init(core: Core, flags: Self::Flags) -> (Self, CosmicTask<Self::Message>) {
        let config = flags.config;
        let cosmic_config = flags.cosmic_config;

        if let Err(e) = config.ensure_dirs() {
            log::error!("failed to create data directory: {e}");
        }

        let mut nav_model = nav_bar::Model::default();
        nav_model
            .insert()
            .text("Library")
            .icon(icon::from_name("view-grid-symbolic").icon())
            .data(NavTarget::Library)
            .activate();

        let (store, last_error) = match NoteStore::open(&config.db_path()) {
            Ok(store) => (Some(store), None),
            Err(e) => {
                log::error!("failed to open note store: {e}");
                (None, Some("Could not open the notes database.".to_string()))
            }
        };

        let mut app = Self {
            core,
            nav_model,
            config,
            cosmic_config,
            store,
            notes: Vec::new(),
            pending_delete: None,
            sessions: HashMap::new(),
            next_session: 0,
            active: NavTarget::Library,
            pending_close: None,
            color_picker_open: false,
            last_error,
        };
        app.refresh_notes();

        (app, CosmicTask::none())
    }

    fn nav_model(&self) -> Option<&nav_bar::Model> {
        Some(&self.nav_model)
    }

    fn on_nav_select(&mut self, id: nav_bar::Id) -> CosmicTask<Message> {
        if let Some(target) = self.nav_model.data::<NavTarget>(id).copied() {
            self.nav_model.activate(id);
            self.active = target;
            self.color_picker_open = false;
            if target == NavTarget::Library {
                self.refresh_notes();
            }
        }
        CosmicTask::none()
    }

    fn header_center(&self) -> Vec<Element<'_, Message>> {
        let title = match self.active_session() {
            Some(session) if session.title.trim().is_empty() => "Untitled".to_string(),
            Some(session) => session.title.clone(),
            None => "Notes".to_string(),
        };
        vec![text::title4(title).into()]
    }

    fn header_end(&self) -> Vec<Element<'_, Message>> {
        let mut header_row = row().spacing(4).push(
            button::icon(icon::from_name("list-add-symbolic")).on_press(Message::NewNote),
        );
        if self.active_session().is_some_and(|s| s.dirty) {
            header_row = header_row.push(
                button::icon(icon::from_name("document-save-symbolic"))
                    .on_press(Message::SaveActive),
            );
        }
        vec![header_row.into()]
    }

    fn on_escape(&mut self) -> CosmicTask<Message> {
        if self.color_picker_open {
            self.color_picker_open = false;
        } else if self.pending_close.is_some() {
            self.pending_close = None;
        } else if self.pending_delete.is_some() {
            self.pending_delete = None;
        }
        CosmicTask::none()
    }

    fn update(&mut self, message: Message) -> CosmicTask<Message> {
        match message {
            Message::NewNote => {
                self.open_session(None);
            }

            Message::OpenNote(id) => {
                let note = match self.store.as_ref().map(|s| s.load(id)) {
                    Some(Ok(note)) => Some(note),
                    Some(Err(e)) => {
                        self.report_error("Could not open the note", e);
                        None
                    }
                    None => None,
                };
                if let Some(note) = note {
                    self.open_session(Some(note));
                }
            }

            Message::ConfirmDeleteNote(id) => {
                self.pending_delete = Some(id);
            }

            Message::CancelDeleteNote => {
                self.pending_delete = None;
            }

            Message::DeleteNote(id) => {
                self.pending_delete = None;
                if let Some(store) = self.store.as_ref() {
                    match store.delete(id) {
                        Ok(()) => {
                            // An open editor for this note keeps its content
                            // as a new unsaved note
                            for session in self.sessions.values_mut() {
                                if session.note_id == Some(id) {
                                    session.note_id = None;
                                    session.dirty = true;
                                }
                            }
                        }
                        Err(e) => self.report_error("Could not delete the note", e),
                    }
                }
                self.refresh_notes();
            }

            Message::TitleChanged(value) => {
                if let NavTarget::Session(key) = self.active {
                    if let Some(session) = self.sessions.get_mut(&key) {
                        session.set_title(value);
                    }
                    self.refresh_nav_label(key);
                }
            }

            Message::SaveActive => {
                if let NavTarget::Session(key) = self.active {
                    self.save_session(key);
                }
            }

            Message::CloseActive => {
                if let NavTarget::Session(key) = self.active {
                    if self.sessions.get(&key).is_some_and(|s| s.dirty) {
                        self.pending_close = Some(key);
                    } else {
                        self.close_session(key);
                    }
                }
            }

            Message::SaveAndClose => {
                if let Some(key) = self.pending_close {
                    if self.save_session(key) {
                        self.close_session(key);
                    }
                }
            }

            Message::DiscardAndClose => {
                // Store stays untouched; the session is simply dropped
                if let Some(key) = self.pending_close {
                    self.close_session(key);
                }
            }

            Message::CancelClose => {
                self.pending_close = None;
            }

            Message::ToggleBold => {
                if let Some(session) = self.active_session_mut() {
                    session.toggle_bold();
                }
            }

            Message::ToggleItalic => {
                if let Some(session) = self.active_session_mut() {
                    session.toggle_italic();
                }
            }

            Message::ToggleUnderline => {
                if let Some(session) = self.active_session_mut() {
                    session.toggle_underline();
                }
            }

            Message::ToggleColorPicker => {
                self.color_picker_open = !self.color_picker_open;
            }

            Message::SetColor(hex) => {
                self.color_picker_open = false;
                if let Some(session) = self.active_session_mut() {
                    session.set_color(&hex);
                }
            }

            Message::ToggleList(kind) => {
                if let Some(session) = self.active_session_mut() {
                    session.toggle_list(kind);
                }
            }

            Message::ToggleMarker(index) => {
                if let Some(session) = self.active_session_mut() {
                    session.toggle_marker_at(index);
                }
            }

            Message::BodyInput(value) => {
                if let Some(session) = self.active_session_mut() {
                    session.insert_text(&value);
                }
            }

            Message::BodyEnter => {
                if let Some(session) = self.active_session_mut() {
                    session.enter();
                }
            }

            Message::BodyBackspace => {
                if let Some(session) = self.active_session_mut() {
                    session.backspace();
                }
            }

            Message::BodyDelete => {
                if let Some(session) = self.active_session_mut() {
                    session.delete_forward();
                }
            }

            Message::BodyMove(direction) => {
                if let Some(session) = self.active_session_mut() {
                    match direction {
                        Direction::Left => session.move_left(),
                        Direction::Right => session.move_right(),
                        Direction::Up => session.move_up(),
                        Direction::Down => session.move_down(),
                    }
                }
            }

            Message::ClickBlock(index) => {
                if let Some(session) = self.active_session_mut() {
                    session.click_block(index);
                }
            }

            Message::DismissError => {
                self.last_error = None;
            }
        }
        CosmicTask::none()
    }

    fn subscription(&self) -> cosmic::iced::Subscription<Message> {
        cosmic::iced::event::listen_with(|event, status, _id| match event {
            cosmic::iced::Event::Keyboard(cosmic::iced::keyboard::Event::KeyPressed {
                key,
                modifiers,
                text,
                ..
            }) => {
                use cosmic::iced::keyboard::key::Named;
                use cosmic::iced::keyboard::Key;

                if modifiers.control() {
                    return match key {
                        Key::Character(ref c) if c.as_str() == "n" => Some(Message::NewNote),
                        Key::Character(ref c) if c.as_str() == "s" => Some(Message::SaveActive),
                        _ => None,
                    };
                }

                // Text inputs capture their own keys; only route what fell through
                if status != cosmic::iced::event::Status::Ignored {
                    return None;
                }

                match key {
                    Key::Named(Named::Enter) => Some(Message::BodyEnter),
                    Key::Named(Named::Backspace) => Some(Message::BodyBackspace),
                    Key::Named(Named::Delete) => Some(Message::BodyDelete),
                    Key::Named(Named::Space) => Some(Message::BodyInput(" ".to_string())),
                    Key::Named(Named::ArrowLeft) => Some(Message::BodyMove(Direction::Left)),
                    Key::Named(Named::ArrowRight) => Some(Message::BodyMove(Direction::Right)),
                    Key::Named(Named::ArrowUp) => Some(Message::BodyMove(Direction::Up)),
                    Key::Named(Named::ArrowDown) => Some(Message::BodyMove(Direction::Down)),
                    _ => text
                        .filter(|t| !t.chars().any(char::is_control))
                        .map(|t| Message::BodyInput(t.to_string())),
                }
            }
            _ => None,
        })
    }

    fn view(&self) -> Element<'_, Message> {
        if let NavTarget::Session(key) = self.active {
            if let Some(session) = self.sessions.get(&key) {
                return pages::editor::editor_view(
                    session,
                    self.pending_close == Some(key),
                    self.color_picker_open,
                    self.last_error.as_deref(),
                );
            }
        }
        pages::library::library_view(&self.notes, self.pending_delete, self.last_error.as_deref())
    }
}

impl QuickNote {
    fn active_session(&self) -> Option<&EditorSession> {
        match self.active {
            NavTarget::Session(key) => self.sessions.get(&key),
            NavTarget::Library => None,
        }
    }

    fn active_session_mut(&mut self) -> Option<&mut EditorSession> {
        match self.active {
            NavTarget::Session(key) => self.sessions.get_mut(&key),
            NavTarget::Library => None,
        }
    }

    fn report_error(&mut self, what: &str, error: StoreError) {
        log::error!("{what}: {error}");
        self.last_error = Some(format!("{what}."));
    }

    fn refresh_notes(&mut self) {
        let Some(store) = self.store.as_ref() else {
            self.notes.clear();
            return;
        };
        match store.list_all() {
            Ok(notes) => self.notes = notes,
            Err(e) => self.report_error("Could not load the note library", e),
        }
    }

    fn nav_entity(&self, target: NavTarget) -> Option<nav_bar::Id> {
        self.nav_model
            .iter()
            .find(|&id| self.nav_model.data::<NavTarget>(id) == Some(&target))
    }

    fn nav_label(session: &EditorSession) -> String {
        if session.title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            session.title.clone()
        }
    }

    /// Open an editor for `note`, or a blank one. A note that is already
    /// open gets its existing session activated instead of a second editor.
    fn open_session(&mut self, note: Option<Note>) {
        if let Some(note) = &note {
            let existing = self
                .sessions
                .iter()
                .find(|(_, s)| s.note_id == Some(note.id))
                .map(|(&key, _)| key);
            if let Some(key) = existing {
                if let Some(id) = self.nav_entity(NavTarget::Session(key)) {
                    self.nav_model.activate(id);
                }
                self.active = NavTarget::Session(key);
                return;
            }
        }

        let key = self.next_session;
        self.next_session += 1;
        let session = match note {
            Some(note) => EditorSession::from_note(
                note.id,
                note.title.clone(),
                HtmlParser::parse(&note.content),
            ),
            None => EditorSession::new(),
        };

        self.nav_model
            .insert()
            .text(Self::nav_label(&session))
            .icon(icon::from_name("accessories-text-editor-symbolic").icon())
            .data(NavTarget::Session(key))
            .activate();
        self.sessions.insert(key, session);
        self.active = NavTarget::Session(key);
        self.color_picker_open = false;
    }

    /// Persist a session, creating the row on first save. Returns whether
    /// the save went through.
    fn save_session(&mut self, key: usize) -> bool {
        let Some(store) = self.store.as_ref() else {
            self.last_error = Some("The notes database is not available.".to_string());
            return false;
        };
        let Some(session) = self.sessions.get(&key) else {
            return false;
        };
        let content = HtmlWriter::write(&session.document);
        let result = match session.note_id {
            Some(id) => store.update(id, &session.title, &content).map(|()| id),
            None => store.create(&session.title, &content),
        };
        match result {
            Ok(id) => {
                if let Some(session) = self.sessions.get_mut(&key) {
                    session.note_id = Some(id);
                    session.mark_saved();
                }
                self.refresh_nav_label(key);
                self.refresh_notes();
                true
            }
            Err(e) => {
                self.report_error("Could not save the note", e);
                false
            }
        }
    }

    fn close_session(&mut self, key: usize) {
        self.sessions.remove(&key);
        if let Some(id) = self.nav_entity(NavTarget::Session(key)) {
            self.nav_model.remove(id);
        }
        if self.pending_close == Some(key) {
            self.pending_close = None;
        }
        if self.active == NavTarget::Session(key) {
            if let Some(id) = self.nav_entity(NavTarget::Library) {
                self.nav_model.activate(id);
            }
            self.active = NavTarget::Library;
            self.refresh_notes();
        }
    }

    fn refresh_nav_label(&mut self, key: usize) {
        let Some(session) = self.sessions.get(&key) else {
            return;
        };
        let label = Self::nav_label(session);
        if let Some(id) = self.nav_entity(NavTarget::Session(key)) {
            self.nav_model.text_set(id, label);
        }
    }
}
