//! Free-form text and callback payload parsing.

use arkive_common::buttons;

pub const START: &str = "/start";
pub const INFO: &str = "/info";
pub const FOLDERS: &str = "/folders";
pub const MOVE_LAST_NOTE: &str = "/move_note";
const MOVE_LAST_NOTE_ALIAS: char = '!';

/// Split free-form input into `(command, rest)`.
///
/// A leading `!` rewrites to the save-to-folder command, the folders menu
/// label rewrites to `/folders`, and two or more consecutive leading slashes
/// demote the whole input to plain text (pasted URLs, accidental slashes).
pub fn command_and_text(text: &str) -> (String, String) {
    if text.is_empty() {
        return (String::new(), String::new());
    }

    if text.starts_with(MOVE_LAST_NOTE_ALIAS) {
        let rest = text.trim_start_matches(MOVE_LAST_NOTE_ALIAS);
        return (MOVE_LAST_NOTE.to_owned(), rest.to_owned());
    }

    if text == buttons::FOLDERS_MENU {
        return (FOLDERS.to_owned(), String::new());
    }

    if !text.starts_with('/') {
        return (String::new(), text.to_owned());
    }

    if text.chars().take_while(|&c| c == '/').count() > 1 {
        return (String::new(), text.to_owned());
    }

    match text.split_once(' ') {
        None => (text.to_owned(), String::new()),
        Some((command, rest)) => (command.to_owned(), rest.trim().to_owned()),
    }
}

/// Parse a note action payload `<prefix>:<note_id>:<folder_id>[:ph]`.
/// Malformed payloads parse to `(0, 0, false)`.
pub fn parse_button_callback(data: &str) -> (i64, i64, bool) {
    let parts: Vec<&str> = data.split(buttons::DELIMITER).collect();
    if parts.len() < 3 {
        return (0, 0, false);
    }
    let (Ok(note_id), Ok(folder_id)) = (parts[1].parse(), parts[2].parse()) else {
        return (0, 0, false);
    };
    let with_media = parts.len() == 4 && parts[3] == buttons::WITH_PHOTO;
    (note_id, folder_id, with_media)
}

/// Folder id from a `btn_<id>` selection payload.
pub fn folder_id_from_button(data: &str) -> Option<i64> {
    data.split('_').nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_empty() {
        assert_eq!(command_and_text(""), (String::new(), String::new()));
    }

    #[test]
    fn bang_alias_rewrites_to_move_note() {
        assert_eq!(command_and_text("!books"), ("/move_note".into(), "books".into()));
        assert_eq!(command_and_text("!!books"), ("/move_note".into(), "books".into()));
    }

    #[test]
    fn folders_menu_label_rewrites_to_folders() {
        assert_eq!(
            command_and_text(buttons::FOLDERS_MENU),
            ("/folders".into(), String::new())
        );
    }

    #[test]
    fn plain_text_has_no_command() {
        assert_eq!(command_and_text("just a note"), (String::new(), "just a note".into()));
    }

    #[test]
    fn double_slash_is_plain_text() {
        assert_eq!(command_and_text("//x"), (String::new(), "//x".into()));
        assert_eq!(command_and_text("///cmd arg"), (String::new(), "///cmd arg".into()));
    }

    #[test]
    fn command_splits_on_first_space() {
        assert_eq!(command_and_text("/cmd rest"), ("/cmd".into(), "rest".into()));
        assert_eq!(command_and_text("/cmd  padded  "), ("/cmd".into(), "padded".into()));
        assert_eq!(command_and_text("/cmd"), ("/cmd".into(), String::new()));
        assert_eq!(
            command_and_text("/move_note two words"),
            ("/move_note".into(), "two words".into())
        );
    }

    #[test]
    fn well_formed_payload_round_trips() {
        assert_eq!(parse_button_callback("btn_3_delete:12:5"), (12, 5, false));
        assert_eq!(parse_button_callback("btn_1_move:12:5:ph"), (12, 5, true));
    }

    #[test]
    fn malformed_payloads_parse_to_zero() {
        assert_eq!(parse_button_callback(""), (0, 0, false));
        assert_eq!(parse_button_callback("btn_1_move:12"), (0, 0, false));
        assert_eq!(parse_button_callback("btn_1_move:x:5"), (0, 0, false));
        assert_eq!(parse_button_callback("btn_1_move:12:y"), (0, 0, false));
    }

    #[test]
    fn folder_button_id() {
        assert_eq!(folder_id_from_button("btn_17"), Some(17));
        assert_eq!(folder_id_from_button("btn_x"), None);
        assert_eq!(folder_id_from_button("nope"), None);
    }
}
