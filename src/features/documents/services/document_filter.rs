use serde_json::Value;

use crate::core::error::{AppError, Result};
use crate::features::documents::dtos::{normalize_field, ListDocumentsQuery};
use crate::features::documents::models::Document;
use crate::shared::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

const METADATA_KEY_PREFIX: &str = "json.";

/// Document attribute a listing can be filtered on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterField {
    Name,
    Mime,
    Public,
    File,
    /// Top-level key of the document's metadata object
    Metadata(String),
}

impl FilterField {
    fn parse(key: &str) -> Result<Self> {
        match key {
            "name" => Ok(Self::Name),
            "mime" => Ok(Self::Mime),
            "public" => Ok(Self::Public),
            "file" => Ok(Self::File),
            _ => match key.strip_prefix(METADATA_KEY_PREFIX) {
                Some(inner) if !inner.is_empty() => Ok(Self::Metadata(inner.to_string())),
                _ => Err(AppError::Validation(format!(
                    "Unknown filter key '{}'; expected name, mime, public, file or json.<key>",
                    key
                ))),
            },
        }
    }
}

/// Exact-match condition on one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: FilterField,
    pub value: String,
}

impl FieldMatch {
    fn new(field: FilterField, value: String) -> Result<Self> {
        if matches!(field, FilterField::Public | FilterField::File) {
            parse_flag(&value)?;
        }
        Ok(Self { field, value })
    }

    pub fn matches(&self, document: &Document) -> bool {
        match &self.field {
            FilterField::Name => document.name == self.value,
            FilterField::Mime => document.mime == self.value,
            FilterField::Public => parse_flag(&self.value).is_ok_and(|flag| document.public == flag),
            FilterField::File => parse_flag(&self.value).is_ok_and(|flag| document.has_file == flag),
            FilterField::Metadata(key) => document
                .metadata()
                .and_then(|metadata| metadata.get(key))
                .is_some_and(|stored| metadata_value_matches(stored, &self.value)),
        }
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    value.parse::<bool>().map_err(|_| {
        AppError::Validation(format!("Filter value '{}' must be true or false", value))
    })
}

/// Strings compare verbatim; other JSON values by their JSON text
fn metadata_value_matches(stored: &Value, expected: &str) -> bool {
    match stored {
        Value::String(s) => s == expected,
        other => other.to_string() == expected,
    }
}

/// Validated listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFilter {
    pub login: Option<String>,
    pub field_match: Option<FieldMatch>,
    pub limit: usize,
}

impl DocumentFilter {
    pub fn from_query(query: &ListDocumentsQuery) -> Result<Self> {
        let login = normalize_field(query.login.as_deref());

        let field_match = match (
            normalize_field(query.key.as_deref()),
            query.value.clone().filter(|v| !v.is_empty()),
        ) {
            (None, None) => None,
            (Some(key), Some(value)) => Some(FieldMatch::new(FilterField::parse(&key)?, value)?),
            _ => {
                return Err(AppError::Validation(
                    "Filter requires both key and value".to_string(),
                ))
            }
        };

        let limit = match normalize_field(query.limit.as_deref()) {
            None => DEFAULT_LIST_LIMIT,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|limit| (1..=MAX_LIST_LIMIT).contains(limit))
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "limit must be a number between 1 and {}",
                        MAX_LIST_LIMIT
                    ))
                })?,
        };

        Ok(Self {
            login,
            field_match,
            limit,
        })
    }

    pub fn matches(&self, document: &Document) -> bool {
        self.field_match
            .as_ref()
            .is_none_or(|field_match| field_match.matches(document))
    }
}
