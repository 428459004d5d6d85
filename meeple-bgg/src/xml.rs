//! XML API2 document parsing.
//!
//! All three endpoints (`search`, `thing`, `hot`) answer with an `<items>`
//! document whose `<item>` children carry most data in `value` attributes.
//! The reader collects each item into a [`RawItem`] first and converts it
//! afterwards, so one malformed item never poisons the rest of a batch.

use std::collections::HashMap;

use meeple_catalog::{CatalogEntry, ExternalId};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::derive::{
    UNKNOWN_NAME, clean_description, looks_like_expansion, parse_decimal, parse_int,
    parse_player_count, parse_rank, parse_year,
};
use crate::error::BggError;

/// Item type the catalog uses for expansions.
pub const EXPANSION_TYPE: &str = "boardgameexpansion";

/// One row of a `search` response.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub external_id: ExternalId,
    pub name: String,
    pub year_published: Option<i32>,
    pub item_type: String,
}

impl SearchHit {
    pub fn is_expansion(&self) -> bool {
        self.item_type == EXPANSION_TYPE
    }
}

/// Values gathered from one `<item>` before any conversion.
#[derive(Debug, Default)]
struct RawItem {
    item_type: String,
    id: Option<String>,
    primary_name: Option<String>,
    any_name: Option<String>,
    description: String,
    image: String,
    thumbnail: String,
    year: Option<String>,
    min_players: Option<String>,
    max_players: Option<String>,
    average: Option<String>,
    average_weight: Option<String>,
    rank: Option<String>,
    categories: Vec<String>,
    expansion_of: Option<String>,
    /// First error met while reading this item; the item is dropped.
    error: Option<BggError>,
}

/// Elements whose text content we keep.
#[derive(Debug, Clone, Copy)]
enum TextField {
    Description,
    Image,
    Thumbnail,
}

impl RawItem {
    fn fail(&mut self, err: BggError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn name(&self) -> Option<&str> {
        self.primary_name.as_deref().or(self.any_name.as_deref())
    }

    fn external_id(&self) -> Result<ExternalId, BggError> {
        let id = self
            .id
            .as_deref()
            .ok_or_else(|| BggError::malformed("item without an id"))?;
        parse_int(id).ok_or_else(|| BggError::malformed(format!("invalid item id '{id}'")))
    }

    fn image_url(&self) -> Option<String> {
        [self.image.trim(), self.thumbnail.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Convert a `thing` item into a catalog entry.
    fn into_entry(mut self) -> Result<CatalogEntry, BggError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let external_id = self.external_id()?;
        let name = self
            .primary_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());
        let description = clean_description(&self.description);

        let mut entry = CatalogEntry::new(external_id, name);
        entry.image_url = self.image_url();
        entry.rank = self.rank.as_deref().and_then(parse_rank);
        entry.average_rating = self.average.as_deref().and_then(parse_decimal);
        entry.average_weight = self.average_weight.as_deref().and_then(parse_decimal);
        entry.year_published = self.year.as_deref().and_then(parse_year);
        entry.min_players = self.min_players.as_deref().and_then(parse_player_count);
        entry.max_players = self.max_players.as_deref().and_then(parse_player_count);
        if let (Some(min), Some(max)) = (entry.min_players, entry.max_players) {
            if min > max {
                log::warn!(
                    "Ignoring inverted player count {}-{} on item {}",
                    min,
                    max,
                    external_id
                );
                entry.max_players = None;
            }
        }
        entry.categories = self.categories.into_iter().collect();

        if let Some(base) = self.expansion_of.as_deref() {
            let base_id = parse_int(base).ok_or_else(|| {
                BggError::malformed(format!("invalid base game id '{base}' on item {external_id}"))
            })?;
            entry.is_expansion = true;
            entry.base_external_id = Some(base_id);
        } else if looks_like_expansion(&description) {
            log::warn!(
                "Guessing that '{}' ({}) is an expansion from its description",
                entry.name,
                external_id
            );
            entry.is_expansion = true;
        }

        entry.description = description;
        Ok(entry)
    }
}

/// Reject non-XML bodies and "come back later" placeholders.
fn check_document(body: &str) -> Result<&str, BggError> {
    let trimmed = body.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with('<') {
        return Err(BggError::NotXml(trimmed.chars().take(80).collect()));
    }
    let lower = trimmed.to_lowercase();
    if lower.contains("<message>") && lower.contains("try again later") {
        return Err(BggError::NotReady);
    }
    Ok(trimmed)
}

fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, BggError> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        map.insert(key, attr.unescape_value()?.to_string());
    }
    Ok(map)
}

/// Record an element found inside an item. Returns the text field to fill
/// when the element's content (not its attributes) holds the value.
fn apply_element(item: &mut RawItem, e: &BytesStart<'_>) -> Result<Option<TextField>, BggError> {
    let tag = e.name();
    let tag = tag.as_ref();
    match tag {
        b"description" => return Ok(Some(TextField::Description)),
        b"image" => return Ok(Some(TextField::Image)),
        b"thumbnail" | b"name" | b"yearpublished" | b"minplayers" | b"maxplayers"
        | b"average" | b"averageweight" | b"rank" | b"link" => {}
        _ => return Ok(None),
    }

    let mut attrs = attributes(e)?;
    let value = attrs.remove("value");
    let kind = attrs.remove("type");
    let kind = kind.as_deref();

    match tag {
        b"thumbnail" => match value {
            // The hot list puts the URL in an attribute, `thing` in the body.
            Some(v) => item.thumbnail = v,
            None => return Ok(Some(TextField::Thumbnail)),
        },
        b"name" => {
            if kind == Some("primary") && item.primary_name.is_none() {
                item.primary_name = value.clone();
            }
            if item.any_name.is_none() {
                item.any_name = value;
            }
        }
        b"yearpublished" => item.year = value,
        b"minplayers" => item.min_players = value,
        b"maxplayers" => item.max_players = value,
        b"average" => item.average = value,
        b"averageweight" => item.average_weight = value,
        b"rank" => {
            if kind == Some("subtype") && item.rank.is_none() {
                item.rank = value;
            }
        }
        b"link" => match kind {
            Some("boardgamecategory") => {
                if let Some(v) = value {
                    item.categories.push(v);
                }
            }
            Some(EXPANSION_TYPE) => {
                let inbound = attrs.get("inbound").is_some_and(|v| v == "true");
                if inbound && item.expansion_of.is_none() {
                    item.expansion_of = attrs.remove("id");
                }
            }
            _ => {}
        },
        _ => {}
    }
    Ok(None)
}

/// Read every `<item>` in the document.
fn parse_items(body: &str) -> Result<Vec<RawItem>, BggError> {
    let body = check_document(body)?;
    let mut xml = Reader::from_str(body);
    xml.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut text_field: Option<TextField> = None;

    loop {
        match xml.read_event()? {
            Event::Start(ref e) if e.name().as_ref() == b"item" => {
                current = Some(start_item(e));
            }
            Event::Empty(ref e) if e.name().as_ref() == b"item" => {
                items.push(start_item(e));
            }
            Event::Start(ref e) => {
                if let Some(ref mut item) = current {
                    text_field = match apply_element(item, e) {
                        Ok(field) => field,
                        Err(err) => {
                            item.fail(err);
                            None
                        }
                    };
                }
            }
            Event::Empty(ref e) => {
                if let Some(ref mut item) = current {
                    if let Err(err) = apply_element(item, e) {
                        item.fail(err);
                    }
                }
            }
            Event::Text(ref e) => {
                if let (Some(item), Some(field)) = (current.as_mut(), text_field) {
                    match e.unescape() {
                        Ok(text) => match field {
                            TextField::Description => item.description.push_str(&text),
                            TextField::Image => item.image.push_str(&text),
                            TextField::Thumbnail => item.thumbnail.push_str(&text),
                        },
                        Err(err) => item.fail(err.into()),
                    }
                }
            }
            Event::CData(ref e) => {
                if let (Some(item), Some(TextField::Description)) = (current.as_mut(), text_field) {
                    item.description.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(ref e) => {
                if e.name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
                text_field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

fn start_item(e: &BytesStart<'_>) -> RawItem {
    match attributes(e) {
        Ok(mut attrs) => RawItem {
            item_type: attrs.remove("type").unwrap_or_default(),
            id: attrs.remove("id"),
            ..RawItem::default()
        },
        Err(err) => RawItem {
            error: Some(err),
            ..RawItem::default()
        },
    }
}

/// Parse a `search` response. Items without a usable id are skipped.
pub fn parse_search(body: &str) -> Result<Vec<SearchHit>, BggError> {
    let hits = parse_items(body)?
        .into_iter()
        .filter(|item| item.error.is_none())
        .filter_map(|item| {
            let external_id = item.external_id().ok()?;
            Some(SearchHit {
                external_id,
                name: item.name().unwrap_or(UNKNOWN_NAME).to_string(),
                year_published: item.year.as_deref().and_then(parse_year),
                item_type: item.item_type,
            })
        })
        .collect();
    Ok(hits)
}

/// Parse a `thing` response into one conversion result per item.
///
/// The outer error covers the document as a whole; the inner results let
/// batch callers drop individual bad items.
pub fn parse_things(body: &str) -> Result<Vec<Result<CatalogEntry, BggError>>, BggError> {
    Ok(parse_items(body)?
        .into_iter()
        .map(RawItem::into_entry)
        .collect())
}

/// Parse the `hot` list. Entries lacking an id are discarded.
pub fn parse_hot(body: &str) -> Result<Vec<CatalogEntry>, BggError> {
    let entries = parse_items(body)?
        .into_iter()
        .filter(|item| item.error.is_none())
        .filter_map(|item| {
            let external_id = item.external_id().ok()?;
            let mut entry =
                CatalogEntry::new(external_id, item.name().unwrap_or(UNKNOWN_NAME));
            entry.image_url = item.image_url();
            entry.year_published = item.year.as_deref().and_then(parse_year);
            Some(entry)
        })
        .collect();
    Ok(entries)
}
