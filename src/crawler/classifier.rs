//! Sitemap document classification
//!
//! A fetched body is classified by looking at its root element first and then
//! decoding it against exactly one schema:
//!
//! | Root element   | Entry element | Result                         |
//! |----------------|---------------|--------------------------------|
//! | `sitemapindex` | `sitemap`     | [`ClassifiedDocument::Index`]  |
//! | `urlset`       | `url`         | [`ClassifiedDocument::Leaf`]   |
//! | anything else  |               | [`ClassifiedDocument::Unrecognized`] |
//!
//! Each entry contributes the text of its direct `loc` child. Namespace
//! prefixes are ignored, so `<sm:urlset>` is treated like `<urlset>`.

use quick_xml::events::Event;
use quick_xml::Reader;

/// A parsed sitemap index: references to further sitemap documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDocument {
    pub sitemaps: Vec<String>,
}

/// A parsed URL set: the final page URLs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafDocument {
    pub urls: Vec<String>,
}

/// Outcome of classifying one fetched body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedDocument {
    Index(IndexDocument),
    Leaf(LeafDocument),
    Unrecognized,
}

impl ClassifiedDocument {
    /// Short label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Index(_) => "index",
            Self::Leaf(_) => "leaf",
            Self::Unrecognized => "unrecognized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schema {
    Index,
    Leaf,
}

impl Schema {
    fn from_root(name: &[u8]) -> Option<Self> {
        match name {
            b"sitemapindex" => Some(Self::Index),
            b"urlset" => Some(Self::Leaf),
            _ => None,
        }
    }

    fn entry_tag(self) -> &'static [u8] {
        match self {
            Self::Index => b"sitemap",
            Self::Leaf => b"url",
        }
    }

    fn into_document(self, locations: Vec<String>) -> ClassifiedDocument {
        match self {
            Self::Index => ClassifiedDocument::Index(IndexDocument {
                sitemaps: locations,
            }),
            Self::Leaf => ClassifiedDocument::Leaf(LeafDocument { urls: locations }),
        }
    }
}

/// Classifies a response body
///
/// Never fails: a body with an unknown root element, no root element at all,
/// or an XML error inside the root yields [`ClassifiedDocument::Unrecognized`].
///
/// # Example
///
/// ```
/// use sitemap_tally::crawler::{classify, ClassifiedDocument};
///
/// let body = b"<urlset><url><loc>https://a.com/</loc></url></urlset>";
/// match classify(body) {
///     ClassifiedDocument::Leaf(leaf) => assert_eq!(leaf.urls, vec!["https://a.com/"]),
///     other => panic!("unexpected {:?}", other),
/// }
/// ```
pub fn classify(body: &[u8]) -> ClassifiedDocument {
    let mut reader = Reader::from_reader(body);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let (schema, has_children) = match read_root(&mut reader, &mut buf) {
        Some(root) => root,
        None => return ClassifiedDocument::Unrecognized,
    };

    if !has_children {
        return schema.into_document(Vec::new());
    }

    match read_entries(&mut reader, &mut buf, schema) {
        Some(locations) => schema.into_document(locations),
        None => ClassifiedDocument::Unrecognized,
    }
}

/// Advances to the root element and resolves its schema.
/// The flag is false for a self-closing root.
fn read_root(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Option<(Schema, bool)> {
    loop {
        let root = match reader.read_event_into(buf) {
            Ok(Event::Start(e)) => {
                Some(Schema::from_root(e.local_name().as_ref()).map(|s| (s, true)))
            }
            Ok(Event::Empty(e)) => {
                Some(Schema::from_root(e.local_name().as_ref()).map(|s| (s, false)))
            }
            Ok(Event::Eof) => return None,
            Err(e) => {
                tracing::debug!("XML error before root element: {}", e);
                return None;
            }
            // Declaration, comments, doctype, processing instructions
            Ok(_) => None,
        };
        buf.clear();

        if let Some(resolved) = root {
            return resolved;
        }
    }
}

/// Collects the `loc` of every entry under the root, stopping when the root closes.
///
/// Text of markup nested inside a `loc` is concatenated into the location.
fn read_entries(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    schema: Schema,
) -> Option<Vec<String>> {
    let entry_tag = schema.entry_tag();
    let mut locations = Vec::new();

    // Depth 1 is the root's content, 2 an entry's content.
    let mut depth = 1usize;
    let mut entry: Option<Option<String>> = None;
    let mut in_loc = false;

    loop {
        match reader.read_event_into(buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if depth == 1 && name.as_ref() == entry_tag {
                    entry = Some(None);
                } else if depth == 2 && name.as_ref() == b"loc" {
                    // First loc wins
                    if let Some(slot) = entry.as_mut() {
                        if slot.is_none() {
                            *slot = Some(String::new());
                            in_loc = true;
                        }
                    }
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                let name = e.local_name();
                if depth == 1 && name.as_ref() == entry_tag {
                    locations.push(String::new());
                } else if depth == 2 && name.as_ref() == b"loc" {
                    if let Some(slot) = entry.as_mut() {
                        slot.get_or_insert_with(String::new);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if in_loc {
                    let text = match t.unescape() {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::debug!("Bad escape in loc: {}", e);
                            return None;
                        }
                    };
                    if let Some(Some(loc)) = entry.as_mut() {
                        loc.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if in_loc {
                    if let Some(Some(loc)) = entry.as_mut() {
                        loc.push_str(&String::from_utf8_lossy(&c));
                    }
                }
            }
            Ok(Event::End(_)) => {
                depth -= 1;
                match depth {
                    0 => return Some(locations),
                    1 => {
                        if let Some(loc) = entry.take() {
                            let loc = loc.map(|l| l.trim().to_string()).unwrap_or_default();
                            locations.push(loc);
                        }
                    }
                    2 => in_loc = false,
                    _ => {}
                }
            }
            Ok(Event::Eof) => {
                tracing::debug!("Document ended before the root element closed");
                return None;
            }
            Err(e) => {
                tracing::debug!("XML error at position {}: {}", reader.buffer_position(), e);
                return None;
            }
            Ok(_) => {}
        }
        buf.clear();
    }
}
