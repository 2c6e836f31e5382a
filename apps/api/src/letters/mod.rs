//! Cover letters: a title plus a rich-text (HTML) body, stored one row per letter.

pub mod handlers;

use uuid::Uuid;

use crate::models::letter::NewLetter;

pub const PLACEHOLDER_LETTER_TITLE: &str = "Nouvelle lettre";
pub const DRAFT_LETTER_TYPE: &str = "draft";

pub fn letter_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        PLACEHOLDER_LETTER_TITLE.to_string()
    } else {
        title.to_string()
    }
}

pub fn new_letter(user_id: Uuid, title: &str, content: String) -> NewLetter {
    NewLetter {
        user_id,
        title: letter_title(title),
        content,
        letter_type: DRAFT_LETTER_TYPE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_gets_placeholder() {
        let letter = new_letter(Uuid::new_v4(), "   ", "<p>Hi</p>".to_string());
        assert_eq!(letter.title, PLACEHOLDER_LETTER_TITLE);
        assert_eq!(letter.letter_type, DRAFT_LETTER_TYPE);
        assert_eq!(letter_title(" Backend role "), "Backend role");
    }
}
