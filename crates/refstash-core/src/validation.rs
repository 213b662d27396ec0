//! Draft validation
//!
//! Vocabulary checks for incoming item drafts: item types, creator roles, and
//! field names are fixed sets, and violations are reported as validation
//! errors naming the offender so callers can correct their payloads.

use crate::error::AppError;
use crate::models::ItemDraft;

/// Item type vocabulary.
pub const ITEM_TYPES: &[&str] = &[
    "artwork",
    "audioRecording",
    "blogPost",
    "book",
    "bookSection",
    "conferencePaper",
    "document",
    "film",
    "interview",
    "journalArticle",
    "letter",
    "magazineArticle",
    "manuscript",
    "map",
    "newspaperArticle",
    "podcast",
    "presentation",
    "preprint",
    "radioBroadcast",
    "report",
    "thesis",
    "videoRecording",
    "webpage",
];

/// Creator role vocabulary.
pub const CREATOR_TYPES: &[&str] = &[
    "author",
    "contributor",
    "editor",
    "interviewee",
    "interviewer",
    "presenter",
    "reviewedAuthor",
    "seriesEditor",
    "translator",
];

/// Field name vocabulary shared by all item types.
pub const ITEM_FIELDS: &[&str] = &[
    "abstractNote",
    "accessDate",
    "archive",
    "archiveLocation",
    "blogTitle",
    "bookTitle",
    "callNumber",
    "conferenceName",
    "date",
    "DOI",
    "edition",
    "extra",
    "institution",
    "ISBN",
    "ISSN",
    "issue",
    "journalAbbreviation",
    "language",
    "libraryCatalog",
    "numPages",
    "pages",
    "place",
    "proceedingsTitle",
    "publicationTitle",
    "publisher",
    "repository",
    "rights",
    "section",
    "series",
    "seriesNumber",
    "shortTitle",
    "thesisType",
    "title",
    "university",
    "url",
    "volume",
    "websiteTitle",
    "websiteType",
];

pub fn is_known_item_type(item_type: &str) -> bool {
    ITEM_TYPES.contains(&item_type)
}

pub fn is_known_creator_type(creator_type: &str) -> bool {
    CREATOR_TYPES.contains(&creator_type)
}

pub fn is_known_field(field: &str) -> bool {
    ITEM_FIELDS.contains(&field)
}

/// Validate a draft before materialization.
///
/// Optional fields may be absent, but present data must be well-formed:
/// a known item type, known field names, string field values, and creators
/// with a usable name and known role. Nothing is created when this fails.
pub fn validate_draft(draft: &ItemDraft) -> Result<(), AppError> {
    if draft.item_type.trim().is_empty() {
        return Err(AppError::Validation("missing itemType".to_string()));
    }
    if !is_known_item_type(&draft.item_type) {
        return Err(AppError::Validation(format!(
            "unknown item type '{}'",
            draft.item_type
        )));
    }

    for name in draft.fields.keys() {
        if !is_known_field(name) {
            return Err(AppError::Validation(format!("unknown field '{}'", name)));
        }
    }
    // Surfaces non-string values with the field name.
    draft.string_fields()?;

    for creator in &draft.creators {
        if creator.is_empty() {
            return Err(AppError::Validation(
                "creator with no name parts".to_string(),
            ));
        }
        if !is_known_creator_type(&creator.creator_type) {
            return Err(AppError::Validation(format!(
                "unknown creator type '{}'",
                creator.creator_type
            )));
        }
    }

    Ok(())
}
