//! Change classification between a freshly normalized article and the
//! stored version sharing its URL.

use crate::domain::Article;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No stored article shares the candidate's URL.
    New,
    /// Stored version matches the candidate field for field.
    Unchanged,
    /// At least one rendered field differs.
    Changed,
}

/// Pure field-by-field comparison on the normalized values. Publication
/// timestamps are compared in their rendered display form, so provider
/// formatting noise below second precision does not register as a change.
pub fn classify(candidate: &Article, existing: Option<&Article>) -> Outcome {
    let existing = match existing {
        Some(existing) => existing,
        None => return Outcome::New,
    };

    let changed = existing.title != candidate.title
        || existing.description != candidate.description
        || existing.content != candidate.content
        || existing.image_url != candidate.image_url
        || existing.published_at_display() != candidate.published_at_display()
        || existing.source_name != candidate.source_name
        || existing.language != candidate.language;

    if changed {
        Outcome::Changed
    } else {
        Outcome::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn stored() -> Article {
        Article {
            id: Article::generate_id("https://example.com/story"),
            title: "A headline".into(),
            description: "A description".into(),
            content: "Some content".into(),
            url: "https://example.com/story".into(),
            image_url: Some("https://example.com/story.jpg".into()),
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            source_name: "Example News".into(),
            language: "en".into(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_no_existing_is_new() {
        assert_eq!(classify(&stored(), None), Outcome::New);
    }

    #[test]
    fn test_identical_is_unchanged() {
        let existing = stored();
        let mut candidate = stored();
        // Bookkeeping timestamps are not part of the comparison.
        candidate.created_at = Utc::now();
        candidate.updated_at = Utc::now();
        assert_eq!(classify(&candidate, Some(&existing)), Outcome::Unchanged);
    }

    #[test]
    fn test_single_field_difference_is_changed() {
        let existing = stored();

        let mut candidate = stored();
        candidate.description = "A fresher description".into();
        assert_eq!(classify(&candidate, Some(&existing)), Outcome::Changed);

        let mut candidate = stored();
        candidate.image_url = None;
        assert_eq!(classify(&candidate, Some(&existing)), Outcome::Changed);

        let mut candidate = stored();
        candidate.published_at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 1).unwrap();
        assert_eq!(classify(&candidate, Some(&existing)), Outcome::Changed);
    }

    #[test]
    fn test_subsecond_timestamp_noise_is_unchanged() {
        let existing = stored();
        let mut candidate = stored();
        candidate.published_at = existing.published_at + chrono::Duration::milliseconds(300);
        assert_eq!(classify(&candidate, Some(&existing)), Outcome::Unchanged);
    }
}
