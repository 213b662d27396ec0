use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

/// One creator entry on a draft: either split name parts or a single-field
/// name for institutional creators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorDraft {
    #[serde(rename = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "creatorType")]
    pub creator_type: String,
}

impl CreatorDraft {
    pub fn author(first_name: &str, last_name: &str) -> Self {
        Self {
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            name: None,
            creator_type: "author".to_string(),
        }
    }

    pub fn single(name: &str, creator_type: &str) -> Self {
        Self {
            first_name: None,
            last_name: None,
            name: Some(name.to_string()),
            creator_type: creator_type.to_string(),
        }
    }

    /// True when no usable name part is present.
    pub fn is_empty(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().map(str::trim).unwrap_or("").is_empty();
        blank(&self.first_name) && blank(&self.last_name) && blank(&self.name)
    }
}

/// Attachment description on a draft; no identity until materialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// An unmaterialized item description, supplied by the caller, a translator,
/// or an importer. Unknown top-level keys land in `fields` and are checked
/// against the field vocabulary at validation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemDraft {
    #[serde(rename = "itemType", default)]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub creators: Vec<CreatorDraft>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentDraft>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl ItemDraft {
    pub fn new(item_type: &str) -> Self {
        Self {
            item_type: item_type.to_string(),
            ..Default::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.fields
            .insert(name.to_string(), Value::String(value.into()));
    }

    pub fn title(&self) -> Option<&str> {
        self.field("title")
    }

    /// Field map as strings. Non-string values are a validation error naming
    /// the offending field.
    pub fn string_fields(&self) -> Result<BTreeMap<String, String>, AppError> {
        let mut out = BTreeMap::new();
        for (name, value) in &self.fields {
            match value.as_str() {
                Some(s) => {
                    out.insert(name.clone(), s.to_string());
                }
                None => {
                    return Err(AppError::Validation(format!(
                        "field '{}' must be a string",
                        name
                    )));
                }
            }
        }
        Ok(out)
    }
}

/// The (library, collection) pair a new item is written into.
/// `collection_id` absent means the library root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Destination {
    pub library_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<Uuid>,
}

impl Destination {
    pub fn library_root(library_id: Uuid) -> Self {
        Self {
            library_id,
            collection_id: None,
        }
    }

    pub fn collection(library_id: Uuid, collection_id: Uuid) -> Self {
        Self {
            library_id,
            collection_id: Some(collection_id),
        }
    }
}

/// A tree-row target token as sent by the caller: `L<uuid>` addresses a
/// library root, `C<uuid>` a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRef {
    Library(Uuid),
    Collection(Uuid),
}

impl TargetRef {
    pub fn parse(token: &str) -> Result<Self, AppError> {
        let malformed = || AppError::Validation(format!("malformed target '{}'", token));
        let (kind, id) = token.split_at_checked(1).ok_or_else(malformed)?;
        let id = Uuid::parse_str(id).map_err(|_| malformed())?;
        match kind {
            "L" => Ok(TargetRef::Library(id)),
            "C" => Ok(TargetRef::Collection(id)),
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRef::Library(id) => write!(f, "L{}", id),
            TargetRef::Collection(id) => write!(f, "C{}", id),
        }
    }
}

/// Created-item summary returned by the save endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemSummary {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "itemType")]
    pub item_type: String,
}

/// Metadata extracted from a PDF by the recognition worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizedMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<CreatorDraft>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
}
