use cosmic::iced::{Alignment, Length};
use cosmic::widget::{button, column, container, flex_row, icon, row, scrollable, text};
use cosmic::{theme, Element};

use quicknote::core::note::Note;

use crate::message::Message;

const CARD_WIDTH: f32 = 280.0;
const SNIPPET_LINES: usize = 4;
const SNIPPET_CHARS: usize = 160;

fn note_card(note: &Note, confirming_delete: bool) -> Element<'static, Message> {
    let note_id = note.id;
    let mut col = column().spacing(6);

    col = col.push(text::body(note.display_title().to_string()));

    let snippet = note.snippet(SNIPPET_LINES, SNIPPET_CHARS);
    if !snippet.is_empty() {
        col = col.push(text::caption(snippet).size(12.0));
    }

    // Dates are stored in a sortable format; the day prefix is enough here
    let modified_day: String = note.modified.chars().take(10).collect();
    col = col.push(text::caption(modified_day).size(11.0));

    if confirming_delete {
        col = col.push(
            row()
                .spacing(8)
                .push(button::destructive("Delete").on_press(Message::DeleteNote(note_id)))
                .push(button::standard("Cancel").on_press(Message::CancelDeleteNote)),
        );
    } else {
        col = col.push(
            button::icon(icon::from_name("edit-delete-symbolic"))
                .on_press(Message::ConfirmDeleteNote(note_id)),
        );
    }

    let card_body = container(col)
        .padding(12)
        .width(Length::Fixed(CARD_WIDTH))
        .class(theme::Container::Card);

    // While the delete confirmation is showing, the card itself is not a
    // click target, so a stray click cannot open the note being deleted.
    if confirming_delete {
        card_body.into()
    } else {
        button::custom(card_body)
            .padding(0)
            .class(theme::Button::Text)
            .on_press(Message::OpenNote(note_id))
            .into()
    }
}

pub fn library_view<'a>(
    notes: &[Note],
    pending_delete: Option<i64>,
    error: Option<&str>,
) -> Element<'a, Message> {
    let mut content = column().spacing(12);

    if let Some(error) = error {
        content = content.push(
            row()
                .spacing(8)
                .align_y(Alignment::Center)
                .push(icon::from_name("dialog-warning-symbolic").icon())
                .push(text::body(error.to_string()))
                .push(
                    button::icon(icon::from_name("window-close-symbolic"))
                        .on_press(Message::DismissError),
                ),
        );
    }

    if notes.is_empty() {
        content = content.push(
            container(
                column()
                    .spacing(8)
                    .align_x(Alignment::Center)
                    .push(text::body("No notes yet"))
                    .push(button::suggested("New note").on_press(Message::NewNote)),
            )
            .padding(32)
            .center_x(Length::Fill)
            .width(Length::Fill),
        );
    } else {
        let cards: Vec<Element<'a, Message>> = notes
            .iter()
            .map(|note| note_card(note, pending_delete == Some(note.id)))
            .collect();
        content = content.push(flex_row(cards).row_spacing(12).column_spacing(12));
    }

    container(scrollable(content.padding(16).width(Length::Fill)))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
