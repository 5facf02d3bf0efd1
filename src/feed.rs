//! Feed and capabilities document parsing.
//!
//! Search responses are RSS documents whose `channel/item` children become
//! [`ResultItem`]s. A Newznab server reports failures with a bare
//! `<error code=".." description=".."/>` root element instead.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ParseError;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub title: String,
    pub pub_date: String,
    pub link: String,
    pub category: String,
    /// Size in bytes, taken from the enclosure length attribute.
    pub size_bytes: u64,
    /// Set once the item has been retrieved successfully.
    pub fetched: bool,
}

impl ResultItem {
    /// Title with double-escaped ampersands repaired.
    #[must_use]
    pub fn display_title(&self) -> String {
        self.title.replace("&amp;", "&")
    }

    /// Link with double-escaped ampersands repaired, ready to request.
    #[must_use]
    pub fn download_url(&self) -> String {
        self.link.replace("&amp;", "&")
    }
}

/// A category advertised in a caps document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub is_subcategory: bool,
}

#[derive(Default)]
struct ItemFields {
    title: Option<String>,
    pub_date: Option<String>,
    link: Option<String>,
    category: Option<String>,
    length: Option<String>,
}

impl ItemFields {
    fn set(&mut self, element: &[u8], text: String) {
        let slot = match element {
            b"title" => &mut self.title,
            b"pubDate" => &mut self.pub_date,
            b"link" => &mut self.link,
            b"category" => &mut self.category,
            _ => return,
        };
        // First occurrence wins; feeds may repeat <category>.
        if slot.is_none() {
            *slot = Some(text);
        }
    }

    fn read_enclosure(&mut self, element: &BytesStart<'_>) -> Result<(), ParseError> {
        if let Some(length) = attribute(element, "length")? {
            self.length = Some(length);
        }
        Ok(())
    }

    fn finish(self, item: usize) -> Result<ResultItem, ParseError> {
        let missing = |field| ParseError::MissingField { item, field };
        let length = self.length.ok_or_else(|| missing("enclosure"))?;
        let size_bytes = length
            .trim()
            .parse()
            .map_err(|_| ParseError::InvalidSize {
                item,
                value: length.clone(),
            })?;
        Ok(ResultItem {
            title: self.title.ok_or_else(|| missing("title"))?,
            pub_date: self.pub_date.ok_or_else(|| missing("pubDate"))?,
            link: self.link.ok_or_else(|| missing("link"))?,
            category: self.category.ok_or_else(|| missing("category"))?,
            size_bytes,
            fetched: false,
        })
    }
}

fn xml_error(err: impl std::fmt::Display) -> ParseError {
    ParseError::Xml(err.to_string())
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>, ParseError> {
    match element.try_get_attribute(name).map_err(xml_error)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned())),
        None => Ok(None),
    }
}

fn api_error(element: &BytesStart<'_>) -> Result<ParseError, ParseError> {
    Ok(ParseError::Api {
        code: attribute(element, "code")?.unwrap_or_default(),
        description: attribute(element, "description")?.unwrap_or_default(),
    })
}

/// True when an element opened under `path` is a `channel/item` record.
fn is_item(path: &[Vec<u8>], name: &[u8]) -> bool {
    name == b"item" && path.len() == 2 && path[1] == b"channel"
}

/// Parses a search response into result records.
///
/// # Errors
///
/// Returns a [`ParseError`] if the body is not well-formed XML, is a Newznab
/// error document, or contains an item missing a required field.
pub fn parse_feed(body: &[u8]) -> Result<Vec<ResultItem>, ParseError> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut items = Vec::new();
    let mut current: Option<ItemFields> = None;
    let mut text = String::new();
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if path.is_empty() {
                    saw_root = true;
                    if name == b"error" {
                        return Err(api_error(&e)?);
                    }
                }
                if is_item(&path, &name) {
                    current = Some(ItemFields::default());
                } else if let Some(fields) = current.as_mut()
                    && path.len() == 3
                    && name == b"enclosure"
                {
                    fields.read_enclosure(&e)?;
                }
                path.push(name);
                text.clear();
            }
            Event::Empty(e) => {
                let name = e.local_name().as_ref().to_vec();
                if path.is_empty() {
                    saw_root = true;
                    if name == b"error" {
                        return Err(api_error(&e)?);
                    }
                }
                if is_item(&path, &name) {
                    return Err(ParseError::MissingField {
                        item: items.len(),
                        field: "enclosure",
                    });
                }
                if let Some(fields) = current.as_mut()
                    && path.len() == 3
                {
                    if name == b"enclosure" {
                        fields.read_enclosure(&e)?;
                    } else {
                        fields.set(&name, String::new());
                    }
                }
            }
            Event::Text(t) => {
                if current.is_some() {
                    text.push_str(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::CData(c) => {
                if current.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                let name = path.pop().unwrap_or_default();
                if path.len() == 3
                    && let Some(fields) = current.as_mut()
                {
                    fields.set(&name, std::mem::take(&mut text));
                } else if path.len() == 2
                    && let Some(fields) = current.take()
                {
                    items.push(fields.finish(items.len())?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ParseError::Xml("no root element".to_string()));
    }
    if !path.is_empty() {
        return Err(ParseError::Xml("unexpected end of document".to_string()));
    }
    Ok(items)
}

fn visit_caps_element(
    element: &BytesStart<'_>,
    depth: usize,
    categories: &mut Vec<Category>,
) -> Result<(), ParseError> {
    let is_subcategory = match element.local_name().as_ref() {
        b"error" if depth == 0 => return Err(api_error(element)?),
        b"category" => false,
        b"subcat" => true,
        _ => return Ok(()),
    };
    categories.push(Category {
        id: attribute(element, "id")?.unwrap_or_default(),
        name: attribute(element, "name")?.unwrap_or_default(),
        is_subcategory,
    });
    Ok(())
}

/// Extracts categories and their subcategories from a caps document, in
/// document order.
///
/// # Errors
///
/// Returns a [`ParseError`] if the body is not well-formed XML or is a
/// Newznab error document.
pub fn parse_caps(body: &[u8]) -> Result<Vec<Category>, ParseError> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut categories = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(xml_error)? {
            Event::Start(e) => {
                saw_root = true;
                visit_caps_element(&e, depth, &mut categories)?;
                depth += 1;
            }
            Event::Empty(e) => {
                saw_root = true;
                visit_caps_element(&e, depth, &mut categories)?;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if saw_root {
        Ok(categories)
    } else {
        Err(ParseError::Xml("no root element".to_string()))
    }
}
