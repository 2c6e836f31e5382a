use validator::ValidateEmail;

use crate::document::lists::{MAX_SKILL_LEVEL, MIN_SKILL_LEVEL};
use crate::document::CvDocument;

/// Checks a document arriving at the HTTP boundary before it reaches the model or
/// the store. Returns one message per problem found; empty means valid.
pub fn validate_document(doc: &CvDocument) -> Vec<String> {
    let mut problems = Vec::new();

    if !doc.email.is_empty() && !doc.email.validate_email() {
        problems.push(format!("email '{}' is not a valid address", doc.email));
    }

    for (index, skill) in doc.skills.iter().enumerate() {
        if skill.name.trim().is_empty() {
            problems.push(format!("skills[{index}] has an empty name"));
        }
        if !(MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).contains(&skill.level) {
            problems.push(format!(
                "skills[{index}] level {} must be between {MIN_SKILL_LEVEL} and {MAX_SKILL_LEVEL}",
                skill.level
            ));
        }
    }

    let mut seen = std::collections::HashSet::new();
    for skill in doc.skills.iter() {
        if !seen.insert(skill.id.as_str()) {
            problems.push(format!("skill id '{}' is used more than once", skill.id));
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Skill;

    fn email_problems(email: &str) -> usize {
        let mut doc = CvDocument::new();
        doc.email = email.to_string();
        validate_document(&doc).len()
    }

    #[test]
    fn test_email_validation() {
        for good in ["jane.doe@example.com", "a@b.co", "first+tag@sub.example.org"] {
            assert_eq!(email_problems(good), 0, "{good}");
        }
        for bad in [
            "jane.doe",
            "@example.com",
            "jane@@example.com",
            "jane doe@example.com",
            "jane@example..com",
            "a<b>@example.com",
            "a@-.-",
            "a@b(c).com",
            "a,b@example.com",
        ] {
            assert_eq!(email_problems(bad), 1, "{bad}");
        }
    }

    #[test]
    fn test_fresh_document_is_valid() {
        assert!(validate_document(&CvDocument::new()).is_empty());
    }

    #[test]
    fn test_reports_bad_level_and_duplicate_ids() {
        let mut doc = CvDocument::new();
        for level in [0, 4] {
            doc.skills.add(Skill {
                id: "42".to_string(),
                name: "Go".to_string(),
                level,
            });
        }
        let problems = validate_document(&doc);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("level 0"));
        assert!(problems[1].contains("'42'"));
    }

    #[test]
    fn test_reports_malformed_email() {
        let mut doc = CvDocument::new();
        doc.email = "not-an-email".to_string();
        assert_eq!(validate_document(&doc).len(), 1);
    }
}
