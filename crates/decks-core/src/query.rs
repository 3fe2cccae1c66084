//! Read-side parameters shared by `find`, `list`, `count` and `get`
//!
//! Parsing accepts numbers either as JSON numbers or numeric strings, since
//! gateway callers frequently forward query-string values untouched.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{DecksError, FieldError, Result};
use crate::model::CardColor;
use crate::rules::validation::as_object;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
}

impl SortField {
    pub fn parse(field: &str) -> Option<Self> {
        match field {
            "_id" | "id" => Some(SortField::Id),
            "name" => Some(SortField::Name),
            _ => None,
        }
    }

    /// Column backing this field in the deck table
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

/// Row filter; all present conditions must hold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckFilter {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Case-insensitive substring of the name
    pub search: Option<String>,
}

/// What to return for each matched record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub populate: Vec<CardColor>,
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub filter: DeckFilter,
    pub sort: Vec<SortKey>,
    pub limit: Option<u32>,
    pub offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

/// One page of a `list` call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(rows: Vec<T>, total: u64, request: PageRequest) -> Self {
        let page_size = u64::from(request.page_size.max(1));
        Self {
            rows,
            total,
            page: request.page,
            page_size: request.page_size,
            total_pages: total.div_ceil(page_size),
        }
    }
}

fn invalid(field: &str, message: &str) -> DecksError {
    DecksError::Validation {
        errors: vec![FieldError::new(field, message)],
    }
}

fn read_u32(object: &Map<String, Value>, field: &str) -> Result<Option<u32>> {
    let parsed = match object.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    parsed
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| invalid(field, "must be a non-negative integer"))
}

/// Accept either an array of strings or one string split on spaces/commas
fn read_names(object: &Map<String, Value>, field: &str) -> Result<Option<Vec<String>>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(
            s.split(|c: char| c == ',' || c.is_whitespace())
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        )),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(field, "must contain only strings"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(invalid(field, "must be a string or an array of strings")),
    }
}

fn parse_sort(object: &Map<String, Value>) -> Result<Vec<SortKey>> {
    let Some(names) = read_names(object, "sort")? else {
        return Ok(Vec::new());
    };

    names
        .iter()
        .map(|raw| {
            let (descending, name) = match raw.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, raw.as_str()),
            };
            SortField::parse(name)
                .map(|field| SortKey { field, descending })
                .ok_or_else(|| DecksError::UnsupportedSort {
                    field: name.to_string(),
                })
        })
        .collect()
}

/// Parse `search` and `query` into a filter
///
/// # Errors
///
/// `UnsupportedQueryField` for query keys other than `_id` and `name`.
pub fn parse_filter(params: &Value) -> Result<DeckFilter> {
    let object = as_object(params)?;
    let mut filter = DeckFilter {
        search: object
            .get("search")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        ..Default::default()
    };

    match object.get("query") {
        None | Some(Value::Null) => {}
        Some(Value::Object(query)) => {
            for (key, value) in query {
                let value = value
                    .as_str()
                    .ok_or_else(|| invalid("query", "values must be strings"))?
                    .to_string();
                match key.as_str() {
                    "_id" | "id" => filter.id = Some(value),
                    "name" => filter.name = Some(value),
                    other => {
                        return Err(DecksError::UnsupportedQueryField {
                            field: other.to_string(),
                        })
                    }
                }
            }
        }
        Some(_) => return Err(invalid("query", "must be an object")),
    }

    Ok(filter)
}

/// Parse `populate` and `fields`
///
/// # Errors
///
/// `Validation` if a populate entry is not a card list field.
pub fn parse_read_options(params: &Value) -> Result<ReadOptions> {
    let object = as_object(params)?;

    let populate = read_names(object, "populate")?
        .unwrap_or_default()
        .iter()
        .map(|field| {
            CardColor::from_deck_field(field)
                .ok_or_else(|| invalid("populate", "only whiteCards and blackCards can be populated"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut deduped: Vec<CardColor> = Vec::with_capacity(populate.len());
    for color in populate {
        if !deduped.contains(&color) {
            deduped.push(color);
        }
    }

    Ok(ReadOptions {
        populate: deduped,
        fields: read_names(object, "fields")?,
    })
}

/// Parse `decks.find` parameters
///
/// # Errors
///
/// `Validation`, `UnsupportedSort` or `UnsupportedQueryField` for malformed input.
pub fn parse_find(params: &Value) -> Result<(FindOptions, ReadOptions)> {
    let object = as_object(params)?;
    let find = FindOptions {
        filter: parse_filter(params)?,
        sort: parse_sort(object)?,
        limit: read_u32(object, "limit")?,
        offset: read_u32(object, "offset")?.unwrap_or(0),
    };
    Ok((find, parse_read_options(params)?))
}

/// Parse `decks.list` parameters
///
/// `page` starts at 1; `pageSize` defaults to 10 and is capped at 100.
///
/// # Errors
///
/// As `parse_find`, plus `Validation` for a zero page.
pub fn parse_list(params: &Value) -> Result<(PageRequest, FindOptions, ReadOptions)> {
    let object = as_object(params)?;
    let page = read_u32(object, "page")?.unwrap_or(1);
    if page == 0 {
        return Err(invalid("page", "must be at least 1"));
    }
    let page_size = read_u32(object, "pageSize")?
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let request = PageRequest { page, page_size };

    let find = FindOptions {
        filter: parse_filter(params)?,
        sort: parse_sort(object)?,
        limit: Some(page_size),
        offset: request.offset(),
    };

    Ok((request, find, parse_read_options(params)?))
}

/// Keep only the requested top-level fields of a record
pub fn project(record: Value, fields: &[String]) -> Value {
    match record {
        Value::Object(mut object) => {
            object.retain(|key, _| fields.iter().any(|f| f == key));
            Value::Object(object)
        }
        other => other,
    }
}
