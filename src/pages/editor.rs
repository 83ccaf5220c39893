use cosmic::iced::widget::rich_text;
use cosmic::iced::widget::text::Span as TextSpan;
use cosmic::iced::{Alignment, Color, Font, Length};
use cosmic::widget::{button, column, container, icon, row, scrollable, text, text_input};
use cosmic::{theme, Element};

use quicknote::core::document::{Block, CharFormat, ListKind, Marker};
use quicknote::core::session::EditorSession;

use crate::message::Message;

/// Colors offered by the palette, in the order they are shown.
pub const PALETTE: &[(&str, &str)] = &[
    ("Black", "#000000"),
    ("Gray", "#666666"),
    ("Red", "#cc0000"),
    ("Orange", "#f57900"),
    ("Yellow", "#c4a000"),
    ("Green", "#4e9a06"),
    ("Blue", "#3465a4"),
    ("Purple", "#75507f"),
];

fn color_from_hex(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::from_rgb8(r, g, b))
}

fn styled(content: String, format: &CharFormat) -> TextSpan<'static> {
    let mut span = TextSpan::new(content);
    let mut font = Font::DEFAULT;
    if format.bold {
        font.weight = cosmic::iced::font::Weight::Bold;
    }
    if format.italic {
        font.style = cosmic::iced::font::Style::Italic;
    }
    span = span.font(font);
    if format.underline {
        span = span.underline(true);
    }
    if let Some(color) = format.color.as_deref().and_then(color_from_hex) {
        span = span.color(color);
    }
    span
}

fn caret() -> TextSpan<'static> {
    TextSpan::new("\u{258F}")
}

/// Text spans for one block, with a caret span spliced in when the cursor
/// sits in this block.
fn block_spans(block: &Block, cursor: Option<usize>) -> Vec<TextSpan<'static>> {
    let mut out = Vec::new();
    if cursor == Some(0) {
        out.push(caret());
    }
    let mut seen = 0;
    for span in &block.spans {
        let len = span.text.chars().count();
        match cursor {
            Some(offset) if offset > seen && offset <= seen + len => {
                let cut = offset - seen;
                let byte = span
                    .text
                    .char_indices()
                    .nth(cut)
                    .map(|(i, _)| i)
                    .unwrap_or(span.text.len());
                out.push(styled(span.text[..byte].to_string(), &span.format));
                out.push(caret());
                if byte < span.text.len() {
                    out.push(styled(span.text[byte..].to_string(), &span.format));
                }
            }
            _ => out.push(styled(span.text.clone(), &span.format)),
        }
        seen += len;
    }
    if out.is_empty() {
        out.push(TextSpan::new(" "));
    }
    out
}

fn block_view(
    index: usize,
    block: &Block,
    ordinal: Option<usize>,
    cursor: Option<usize>,
) -> Element<'static, Message> {
    let mut line = row().spacing(8).align_y(Alignment::Center);

    match block.list {
        Some(ListKind::Bullet) => {
            line = line.push(text::body("\u{2022}"));
        }
        Some(ListKind::Ordered) => {
            line = line.push(text::body(format!("{}.", ordinal.unwrap_or(1))));
        }
        Some(ListKind::Checklist) => {
            let name = match block.marker {
                Some(Marker::Checked) => "checkbox-checked-symbolic",
                _ => "checkbox-symbolic",
            };
            line = line.push(
                button::icon(icon::from_name(name)).on_press(Message::ToggleMarker(index)),
            );
        }
        None => {}
    }

    let body: Element<'static, Message> = rich_text(block_spans(block, cursor)).into();
    line = line.push(
        button::custom(container(body).width(Length::Fill))
            .padding(2)
            .class(theme::Button::Text)
            .on_press(Message::ClickBlock(index)),
    );

    line.into()
}

fn toggle_button(label: &'static str, active: bool, message: Message) -> Element<'static, Message> {
    if active {
        button::suggested(label).on_press(message).into()
    } else {
        button::standard(label).on_press(message).into()
    }
}

fn toolbar(session: &EditorSession, picker_open: bool) -> Element<'static, Message> {
    let state = session.toolbar_state();

    let mut bar = row()
        .spacing(4)
        .align_y(Alignment::Center)
        .push(toggle_button("B", state.bold, Message::ToggleBold))
        .push(toggle_button("I", state.italic, Message::ToggleItalic))
        .push(toggle_button("U", state.underline, Message::ToggleUnderline))
        .push(toggle_button("Color", picker_open, Message::ToggleColorPicker));

    bar = bar
        .push(toggle_button(
            "\u{2022} List",
            state.list == Some(ListKind::Bullet),
            Message::ToggleList(ListKind::Bullet),
        ))
        .push(toggle_button(
            "1. List",
            state.list == Some(ListKind::Ordered),
            Message::ToggleList(ListKind::Ordered),
        ))
        .push(toggle_button(
            "\u{2611} Checklist",
            state.list == Some(ListKind::Checklist),
            Message::ToggleList(ListKind::Checklist),
        ));

    bar.into()
}

fn palette_row(current: &str) -> Element<'static, Message> {
    let mut bar = row().spacing(4).align_y(Alignment::Center);
    for (name, hex) in PALETTE {
        bar = bar.push(toggle_button(
            name,
            current == *hex,
            Message::SetColor((*hex).to_string()),
        ));
    }
    bar.into()
}

fn close_prompt(session: &EditorSession) -> Element<'static, Message> {
    let title = if session.title.trim().is_empty() {
        "Untitled".to_string()
    } else {
        session.title.clone()
    };
    container(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(text::body(format!("Save changes to \u{201c}{title}\u{201d}?")))
            .push(button::suggested("Save").on_press(Message::SaveAndClose))
            .push(button::destructive("Discard").on_press(Message::DiscardAndClose))
            .push(button::standard("Cancel").on_press(Message::CancelClose)),
    )
    .padding(12)
    .width(Length::Fill)
    .class(theme::Container::Card)
    .into()
}

pub fn editor_view<'a>(
    session: &EditorSession,
    confirming_close: bool,
    picker_open: bool,
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

    if confirming_close {
        content = content.push(close_prompt(session));
    }

    content = content.push(
        row()
            .spacing(8)
            .align_y(Alignment::Center)
            .push(
                text_input::text_input("Untitled", session.title.clone())
                    .on_input(Message::TitleChanged)
                    .width(Length::Fill),
            )
            .push(
                button::icon(icon::from_name("document-save-symbolic"))
                    .on_press(Message::SaveActive),
            )
            .push(
                button::icon(icon::from_name("window-close-symbolic"))
                    .on_press(Message::CloseActive),
            ),
    );

    content = content.push(toolbar(session, picker_open));
    if picker_open {
        content = content.push(palette_row(&session.color));
    }

    let mut blocks = column().spacing(2);
    let mut ordinal = 0;
    for (index, block) in session.document.blocks.iter().enumerate() {
        if block.list == Some(ListKind::Ordered) {
            ordinal += 1;
        } else {
            ordinal = 0;
        }
        let cursor = (session.cursor.block == index).then_some(session.cursor.offset);
        blocks = blocks.push(block_view(
            index,
            block,
            (ordinal > 0).then_some(ordinal),
            cursor,
        ));
    }
    content = content.push(
        container(blocks.padding(8))
            .width(Length::Fill)
            .class(theme::Container::Card),
    );

    let status = if session.dirty {
        "Unsaved changes"
    } else {
        "All changes saved"
    };
    content = content.push(text::caption(status).size(11.0));

    container(scrollable(content.padding(16).width(Length::Fill)))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
