//! Embedded citation metadata extraction
//!
//! Publishers embed bibliographic data in `<meta>` tags (`citation_*`,
//! `DC.*`). Pages carrying such tags translate into item drafts without a
//! site-specific translator; pages without them are not translatable here.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use refstash_core::models::{CreatorDraft, ItemDraft};

fn meta_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<meta\s+[^>]*>").expect("static regex"))
}

fn attr_re(name: &str) -> Regex {
    Regex::new(&format!(
        r#"(?is){}\s*=\s*["']([^"']*)["']"#,
        regex::escape(name)
    ))
    .expect("static regex")
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("static regex"))
}

/// All `<meta name=… content=…>` pairs (also accepts `property=`), with
/// multi-valued names (e.g. `citation_author`) preserved in order.
fn meta_tags(html: &str) -> Vec<(String, String)> {
    let name_re = attr_re("name");
    let property_re = attr_re("property");
    let content_re = attr_re("content");
    let mut tags = Vec::new();
    for tag in meta_tag_re().find_iter(html) {
        let tag = tag.as_str();
        let name = name_re
            .captures(tag)
            .or_else(|| property_re.captures(tag))
            .map(|c| c[1].to_string());
        let content = content_re.captures(tag).map(|c| c[1].trim().to_string());
        if let (Some(name), Some(content)) = (name, content) {
            if !content.is_empty() {
                tags.push((name.to_lowercase(), content));
            }
        }
    }
    tags
}

fn first<'a>(tags: &'a [(String, String)], names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|wanted| {
        tags.iter()
            .find(|(name, _)| name == wanted)
            .map(|(_, content)| content.as_str())
    })
}

fn all<'a>(tags: &'a [(String, String)], names: &[&str]) -> Vec<&'a str> {
    tags.iter()
        .filter(|(name, _)| names.contains(&name.as_str()))
        .map(|(_, content)| content.as_str())
        .collect()
}

/// Parse "Last, First" or "First Last" into a creator.
fn parse_author(raw: &str) -> CreatorDraft {
    let raw = raw.trim();
    if let Some((last, first)) = raw.split_once(',') {
        return CreatorDraft {
            first_name: Some(first.trim().to_string()),
            last_name: Some(last.trim().to_string()),
            name: None,
            creator_type: "author".to_string(),
        };
    }
    match raw.rsplit_once(' ') {
        Some((first, last)) => CreatorDraft {
            first_name: Some(first.trim().to_string()),
            last_name: Some(last.trim().to_string()),
            name: None,
            creator_type: "author".to_string(),
        },
        None => CreatorDraft::single(raw, "author"),
    }
}

/// Whether the page carries embedded citation metadata at all.
pub fn has_citation_metadata(html: &str) -> bool {
    meta_tags(html)
        .iter()
        .any(|(name, _)| name.starts_with("citation_") || name.starts_with("dc."))
}

/// Page `<title>` text, for webpage parents.
pub fn page_title(html: &str) -> Option<String> {
    title_re()
        .captures(html)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Extract an item draft from embedded metadata. Empty when the page has no
/// citation tags.
pub fn extract(uri: &str, html: &str) -> Vec<ItemDraft> {
    let tags = meta_tags(html);
    let by_name: HashMap<&str, &str> = tags
        .iter()
        .map(|(name, content)| (name.as_str(), content.as_str()))
        .collect();
    let has_citation = by_name
        .keys()
        .any(|name| name.starts_with("citation_") || name.starts_with("dc."));
    if !has_citation {
        return Vec::new();
    }

    let journal = first(&tags, &["citation_journal_title"]);
    let conference = first(&tags, &["citation_conference_title"]);
    let item_type = if journal.is_some() {
        "journalArticle"
    } else if conference.is_some() {
        "conferencePaper"
    } else {
        "webpage"
    };

    let mut draft = ItemDraft::new(item_type);
    if let Some(title) = first(&tags, &["citation_title", "dc.title"]).map(str::to_string) {
        draft.set_field("title", title);
    } else if let Some(title) = page_title(html) {
        draft.set_field("title", title);
    }
    if let Some(journal) = journal {
        draft.set_field("publicationTitle", journal);
    }
    if let Some(conference) = conference {
        draft.set_field("conferenceName", conference);
    }
    if let Some(date) = first(
        &tags,
        &["citation_publication_date", "citation_date", "dc.date"],
    ) {
        draft.set_field("date", date);
    }
    for (meta_name, field) in [
        ("citation_volume", "volume"),
        ("citation_issue", "issue"),
        ("citation_firstpage", "pages"),
        ("citation_doi", "DOI"),
        ("citation_issn", "ISSN"),
        ("citation_isbn", "ISBN"),
        ("citation_language", "language"),
        ("citation_publisher", "publisher"),
        ("citation_abstract", "abstractNote"),
    ] {
        if let Some(value) = first(&tags, &[meta_name]) {
            draft.set_field(field, value);
        }
    }
    draft.set_field("url", uri);

    for author in all(&tags, &["citation_author", "dc.creator"]) {
        draft.creators.push(parse_author(author));
    }

    if draft.title().is_none() {
        return Vec::new();
    }
    vec![draft]
}
