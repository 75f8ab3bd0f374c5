//! Answer builders for the bot's screens.

use arkive_common::{
    Answer, AnswerParams, Event, EventKind, InlineButton, Keyboard, buttons, messages,
};

/// An ephemeral plain-text reply.
pub fn message(event: &Event, text: &str) -> Answer {
    Answer::new(event, true, AnswerParams::text(text))
}

/// The folders screen: one row per folder sorted by callback data, then the
/// create/delete row. Drawn non-ephemeral, its message becomes the anchor.
pub fn folders_list(
    event: &Event,
    folder_buttons: Vec<(String, String)>,
    delete_after: bool,
) -> Answer {
    let mut rows: Vec<Vec<InlineButton>> = folder_buttons
        .into_iter()
        .map(|(data, label)| vec![InlineButton::new(label, data)])
        .collect();
    rows.sort_by(|a, b| a[0].data.cmp(&b[0].data));
    rows.push(vec![
        InlineButton::new(buttons::CREATE_FOLDER_LABEL, buttons::CREATE_FOLDER),
        InlineButton::new(buttons::DELETE_FOLDER_LABEL, buttons::DELETE_FOLDER),
    ]);

    Answer::new(
        event,
        delete_after,
        AnswerParams {
            kind: EventKind::Text,
            message: messages::FOLDERS_CAPTION.to_owned(),
            keyboard: Some(Keyboard::Inline(rows)),
            ..AnswerParams::default()
        },
    )
}

/// A note with its move/delete action row. Single-photo notes get the photo
/// marker appended so a later edit can keep the media.
pub fn note(
    event: &Event,
    note_id: i64,
    folder_id: i64,
    delete_after: bool,
    mut params: AnswerParams,
) -> Answer {
    let mut payload = format!("{}{note_id}{}{folder_id}", buttons::DELIMITER, buttons::DELIMITER);
    if params.kind == EventKind::Photo && params.file_ids.len() == 1 {
        payload.push_str(buttons::DELIMITER);
        payload.push_str(buttons::WITH_PHOTO);
    }

    let mut row = vec![
        InlineButton::new(buttons::MOVE_NOTE_LABEL, format!("{}{payload}", buttons::MOVE_NOTE)),
        InlineButton::new(buttons::DELETE_NOTE_LABEL, format!("{}{payload}", buttons::DELETE_NOTE)),
    ];
    row.sort_by(|a, b| a.data.cmp(&b.data));
    params.keyboard = Some(Keyboard::Inline(vec![row]));

    Answer::new(event, delete_after, params)
}

/// A message carrying the persistent reply-keyboard button.
pub fn folders_button(event: &Event, text: &str, button: &str, delete_after: bool) -> Answer {
    Answer::new(
        event,
        delete_after,
        AnswerParams {
            kind: EventKind::Text,
            message: text.to_owned(),
            keyboard: Some(Keyboard::Reply(button.to_owned())),
            ..AnswerParams::default()
        },
    )
}

/// Header shown when a folder is opened.
pub fn folder_header(event: &Event, folder_name: &str) -> Answer {
    let label = if folder_name == buttons::DEFAULT_FOLDER_NAME {
        buttons::DEFAULT_FOLDER_LABEL
    } else {
        folder_name
    };
    folders_button(
        event,
        &format!("{}{label}", messages::FOLDER_EMOJI),
        buttons::FOLDERS_MENU,
        true,
    )
}

/// Append the folder's notes (or the empty marker) to the outgoing queue.
pub fn collect_notes(queue: &mut Vec<Answer>, event: &Event, notes: Vec<(i64, AnswerParams)>) {
    if notes.is_empty() {
        queue.push(message(event, messages::NOTES_EMPTY));
        return;
    }
    for (note_id, params) in notes {
        queue.push(note(event, note_id, event.folder_id, true, params));
    }
}
