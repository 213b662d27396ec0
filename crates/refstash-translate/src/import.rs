//! Bibliographic-format import
//!
//! Parses raw bibliographic text (BibTeX, RIS) into item drafts. The format
//! is chosen by the declared content type; an unknown type or a body with no
//! recognizable entries is a typed error the edge maps to 400.

use async_trait::async_trait;
use thiserror::Error;

use refstash_core::models::{CreatorDraft, ItemDraft};

pub const BIBTEX_CONTENT_TYPE: &str = "application/x-bibtex";
pub const RIS_CONTENT_TYPE: &str = "application/x-research-info-systems";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Unsupported import format: {0}")]
    UnsupportedFormat(String),

    #[error("No recognizable entries in import data")]
    NoEntries,
}

#[async_trait]
pub trait BibliographicImporter: Send + Sync {
    /// Whether this importer understands the declared content type.
    fn supports(&self, content_type: &str) -> bool;

    /// Parse the body into drafts. Zero entries is an error, not an empty
    /// success.
    async fn parse(&self, content_type: &str, body: &str) -> Result<Vec<ItemDraft>, ImportError>;
}

/// Strip content-type parameters and normalize case.
fn base_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}

pub struct FormatImporter;

impl FormatImporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FormatImporter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BibliographicImporter for FormatImporter {
    fn supports(&self, content_type: &str) -> bool {
        matches!(
            base_content_type(content_type).as_str(),
            BIBTEX_CONTENT_TYPE | RIS_CONTENT_TYPE
        )
    }

    async fn parse(&self, content_type: &str, body: &str) -> Result<Vec<ItemDraft>, ImportError> {
        let drafts = match base_content_type(content_type).as_str() {
            BIBTEX_CONTENT_TYPE => bibtex::parse(body),
            RIS_CONTENT_TYPE => ris::parse(body),
            other => return Err(ImportError::UnsupportedFormat(other.to_string())),
        };
        if drafts.is_empty() {
            return Err(ImportError::NoEntries);
        }
        Ok(drafts)
    }
}

/// Parse "Last, First", "First Last", or a bare name into a creator.
fn parse_person(raw: &str, creator_type: &str) -> CreatorDraft {
    let raw = raw.trim();
    if let Some((last, first)) = raw.split_once(',') {
        return CreatorDraft {
            first_name: Some(first.trim().to_string()),
            last_name: Some(last.trim().to_string()),
            name: None,
            creator_type: creator_type.to_string(),
        };
    }
    match raw.rsplit_once(' ') {
        Some((first, last)) => CreatorDraft {
            first_name: Some(first.trim().to_string()),
            last_name: Some(last.trim().to_string()),
            name: None,
            creator_type: creator_type.to_string(),
        },
        None => CreatorDraft::single(raw, creator_type),
    }
}

mod bibtex {
    use super::*;

    pub fn parse(body: &str) -> Vec<ItemDraft> {
        let mut drafts = Vec::new();
        let mut rest = body;
        while let Some(at) = rest.find('@') {
            rest = &rest[at + 1..];
            let Some(open) = rest.find('{') else { break };
            let entry_type = rest[..open].trim().to_lowercase();
            rest = &rest[open + 1..];
            if matches!(entry_type.as_str(), "comment" | "preamble" | "string") {
                continue;
            }
            // Cite key up to the first comma; a keyless `@misc{}` entry has
            // nothing for us anyway.
            let Some(comma) = rest.find(',') else { continue };
            rest = &rest[comma + 1..];
            let (fields, remainder) = parse_fields(rest);
            rest = remainder;
            if let Some(draft) = entry_to_draft(&entry_type, &fields) {
                drafts.push(draft);
            }
        }
        drafts
    }

    /// Parse `name = value` pairs up to the entry's closing brace.
    fn parse_fields(mut input: &str) -> (Vec<(String, String)>, &str) {
        let mut fields = Vec::new();
        loop {
            input = input.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
            if input.is_empty() {
                return (fields, input);
            }
            if let Some(stripped) = input.strip_prefix('}') {
                return (fields, stripped);
            }
            let Some(eq) = input.find('=') else {
                return (fields, "");
            };
            let name = input[..eq].trim().to_lowercase();
            input = input[eq + 1..].trim_start();
            let (value, remainder) = parse_value(input);
            input = remainder;
            if !name.is_empty() && !value.is_empty() {
                fields.push((name, value));
            }
        }
    }

    fn parse_value(input: &str) -> (String, &str) {
        let mut chars = input.char_indices();
        match chars.next() {
            Some((_, '{')) => {
                let mut depth = 1usize;
                let mut value = String::new();
                for (idx, c) in chars {
                    match c {
                        '{' => {
                            depth += 1;
                        }
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                return (clean(&value), &input[idx + 1..]);
                            }
                        }
                        _ => value.push(c),
                    }
                }
                (clean(&value), "")
            }
            Some((_, '"')) => match input[1..].find('"') {
                Some(end) => (clean(&input[1..end + 1]), &input[end + 2..]),
                None => (clean(&input[1..]), ""),
            },
            Some(_) => {
                let end = input
                    .find(|c| c == ',' || c == '}')
                    .unwrap_or(input.len());
                (clean(&input[..end]), &input[end..])
            }
            None => (String::new(), ""),
        }
    }

    /// Drop protective braces and collapse whitespace.
    fn clean(value: &str) -> String {
        value
            .replace(['{', '}'], "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn map_entry_type(entry_type: &str) -> &'static str {
        match entry_type {
            "article" => "journalArticle",
            "book" | "booklet" | "proceedings" => "book",
            "inbook" | "incollection" => "bookSection",
            "inproceedings" | "conference" => "conferencePaper",
            "phdthesis" | "mastersthesis" => "thesis",
            "techreport" => "report",
            "manual" | "misc" | "unpublished" => "document",
            _ => "document",
        }
    }

    fn entry_to_draft(entry_type: &str, fields: &[(String, String)]) -> Option<ItemDraft> {
        if fields.is_empty() {
            return None;
        }
        let mut draft = ItemDraft::new(map_entry_type(entry_type));
        for (name, value) in fields {
            match name.as_str() {
                "title" => draft.set_field("title", value.clone()),
                "year" | "date" => draft.set_field("date", value.clone()),
                "journal" | "journaltitle" => draft.set_field("publicationTitle", value.clone()),
                "booktitle" => draft.set_field("bookTitle", value.clone()),
                "volume" => draft.set_field("volume", value.clone()),
                "number" => draft.set_field("issue", value.clone()),
                "pages" => draft.set_field("pages", value.clone()),
                "publisher" => draft.set_field("publisher", value.clone()),
                "address" => draft.set_field("place", value.clone()),
                "edition" => draft.set_field("edition", value.clone()),
                "institution" => draft.set_field("institution", value.clone()),
                "school" => draft.set_field("university", value.clone()),
                "series" => draft.set_field("series", value.clone()),
                "doi" => draft.set_field("DOI", value.clone()),
                "isbn" => draft.set_field("ISBN", value.clone()),
                "issn" => draft.set_field("ISSN", value.clone()),
                "url" => draft.set_field("url", value.clone()),
                "abstract" => draft.set_field("abstractNote", value.clone()),
                "language" => draft.set_field("language", value.clone()),
                "note" => draft.set_field("extra", value.clone()),
                "author" => {
                    for person in value.split(" and ") {
                        draft.creators.push(parse_person(person, "author"));
                    }
                }
                "editor" => {
                    for person in value.split(" and ") {
                        draft.creators.push(parse_person(person, "editor"));
                    }
                }
                other => {
                    tracing::debug!(field = %other, "Skipping unmapped BibTeX field");
                }
            }
        }
        Some(draft)
    }
}

mod ris {
    use super::*;

    fn map_type(ty: &str) -> &'static str {
        match ty {
            "JOUR" => "journalArticle",
            "BOOK" => "book",
            "CHAP" => "bookSection",
            "CONF" => "conferencePaper",
            "THES" => "thesis",
            "RPRT" => "report",
            "NEWS" => "newspaperArticle",
            "MGZN" => "magazineArticle",
            "BLOG" => "blogPost",
            "ELEC" => "webpage",
            _ => "document",
        }
    }

    pub fn parse(body: &str) -> Vec<ItemDraft> {
        let mut drafts = Vec::new();
        let mut current: Option<ItemDraft> = None;
        let mut start_page: Option<String> = None;
        let mut end_page: Option<String> = None;

        for line in body.lines() {
            let line = line.trim_end();
            let Some(tag) = line.get(..2) else {
                continue;
            };
            let value = line.get(6..).unwrap_or("").trim();
            match tag {
                "TY" => {
                    current = Some(ItemDraft::new(map_type(value)));
                    start_page = None;
                    end_page = None;
                }
                "ER" => {
                    if let Some(mut draft) = current.take() {
                        if let Some(sp) = start_page.take() {
                            let pages = match end_page.take() {
                                Some(ep) => format!("{}-{}", sp, ep),
                                None => sp,
                            };
                            draft.set_field("pages", pages);
                        }
                        drafts.push(draft);
                    }
                }
                _ => {
                    let Some(draft) = current.as_mut() else {
                        continue;
                    };
                    if value.is_empty() {
                        continue;
                    }
                    match tag {
                        "TI" | "T1" => draft.set_field("title", value),
                        "T2" | "JO" | "JF" => draft.set_field("publicationTitle", value),
                        "AU" | "A1" => draft.creators.push(parse_person(value, "author")),
                        "ED" => draft.creators.push(parse_person(value, "editor")),
                        "PY" | "Y1" => {
                            draft.set_field("date", value.split('/').next().unwrap_or(value))
                        }
                        "VL" => draft.set_field("volume", value),
                        "IS" => draft.set_field("issue", value),
                        "SP" => start_page = Some(value.to_string()),
                        "EP" => end_page = Some(value.to_string()),
                        "PB" => draft.set_field("publisher", value),
                        "CY" => draft.set_field("place", value),
                        "DO" => draft.set_field("DOI", value),
                        "SN" => draft.set_field("ISSN", value),
                        "UR" => draft.set_field("url", value),
                        "AB" | "N2" => draft.set_field("abstractNote", value),
                        "LA" => draft.set_field("language", value),
                        _ => {}
                    }
                }
            }
        }
        drafts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIBTEX: &str = r#"@book{test1,
  title={Test1},
  author={Owl},
  year={1000},
  publisher={Curly Braces Publishing}
}"#;

    const RIS: &str = "TY  - JOUR\nTI  - A Study of Owls\nAU  - Last, First\nPY  - 2001\nJO  - Owl Journal\nSP  - 10\nEP  - 20\nER  - \n";

    #[tokio::test]
    async fn bibtex_book_entry_parses() {
        let importer = FormatImporter::new();
        let drafts = importer.parse(BIBTEX_CONTENT_TYPE, BIBTEX).await.unwrap();
        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.item_type, "book");
        assert_eq!(draft.title(), Some("Test1"));
        assert_eq!(draft.field("date"), Some("1000"));
        assert_eq!(draft.field("publisher"), Some("Curly Braces Publishing"));
        assert_eq!(draft.creators[0].name.as_deref(), Some("Owl"));
    }

    #[tokio::test]
    async fn plain_text_is_unsupported() {
        let importer = FormatImporter::new();
        let err = importer.parse("text/plain", "Owl").await.unwrap_err();
        assert!(matches!(err, ImportError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn bibtex_body_without_entries_is_no_entries() {
        let importer = FormatImporter::new();
        let err = importer.parse(BIBTEX_CONTENT_TYPE, "Owl").await.unwrap_err();
        assert!(matches!(err, ImportError::NoEntries));
    }

    #[tokio::test]
    async fn content_type_parameters_are_ignored() {
        let importer = FormatImporter::new();
        assert!(importer.supports("application/x-bibtex; charset=utf-8"));
        let drafts = importer
            .parse("application/x-bibtex; charset=utf-8", BIBTEX)
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
    }

    #[tokio::test]
    async fn bibtex_multiple_authors_split_on_and() {
        let entry = r#"@article{k, title={T}, author={Last, First and Doe, Jane}, journal={J}}"#;
        let importer = FormatImporter::new();
        let drafts = importer.parse(BIBTEX_CONTENT_TYPE, entry).await.unwrap();
        assert_eq!(drafts[0].item_type, "journalArticle");
        assert_eq!(drafts[0].creators.len(), 2);
        assert_eq!(drafts[0].creators[1].last_name.as_deref(), Some("Doe"));
        assert_eq!(drafts[0].field("publicationTitle"), Some("J"));
    }

    #[tokio::test]
    async fn bibtex_nested_braces_are_stripped() {
        let entry = r#"@book{k, title={The {TeX}book}, author={Knuth, Donald}}"#;
        let importer = FormatImporter::new();
        let drafts = importer.parse(BIBTEX_CONTENT_TYPE, entry).await.unwrap();
        assert_eq!(drafts[0].title(), Some("The TeXbook"));
    }

    #[tokio::test]
    async fn ris_entry_parses() {
        let importer = FormatImporter::new();
        let drafts = importer.parse(RIS_CONTENT_TYPE, RIS).await.unwrap();
        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.item_type, "journalArticle");
        assert_eq!(draft.title(), Some("A Study of Owls"));
        assert_eq!(draft.field("pages"), Some("10-20"));
        assert_eq!(draft.field("publicationTitle"), Some("Owl Journal"));
        assert_eq!(draft.creators[0].last_name.as_deref(), Some("Last"));
    }

    #[tokio::test]
    async fn ris_without_terminator_yields_nothing() {
        let importer = FormatImporter::new();
        let err = importer
            .parse(RIS_CONTENT_TYPE, "TY  - JOUR\nTI  - Dangling\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::NoEntries));
    }
}
