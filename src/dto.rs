//! Paging and sorting shapes for `GetList`, plus their normalization against configured limits.

use crate::case::{lower_first, to_camel_case, to_snake_case};
use crate::config::PagingSettings;
use crate::error::{AppError, FieldViolation};
use crate::repository::ListFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

pub const SKIP_COUNT: &str = "skipCount";
pub const MAX_RESULT_COUNT: &str = "maxResultCount";
pub const SORTING: &str = "sorting";

/// Absent fields take the defaults: `skipCount = 0`, `maxResultCount = configured default`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedAndSortedRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_result_count: Option<u64>,
    /// Comma-separated `field [asc|desc]` list, e.g. "price desc, name".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<String>,
}

impl PagedAndSortedRequest {
    pub fn page(skip_count: u64, max_result_count: u64) -> Self {
        PagedAndSortedRequest {
            skip_count: Some(skip_count),
            max_result_count: Some(max_result_count),
            sorting: None,
        }
    }

    pub fn sorted_by(mut self, sorting: impl Into<String>) -> Self {
        self.sorting = Some(sorting.into());
        self
    }

    /// Split query parameters into the paging request and exact-match filters.
    /// Filter keys are converted from camelCase to the entity's snake_case field names.
    pub fn from_query(params: &HashMap<String, String>) -> Result<(Self, ListFilter), AppError> {
        let mut request = PagedAndSortedRequest::default();
        let mut violations = Vec::new();
        let mut filter = ListFilter::default();

        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();
        for key in keys {
            let raw = &params[key];
            match key.as_str() {
                SKIP_COUNT => match raw.trim().parse() {
                    Ok(n) => request.skip_count = Some(n),
                    Err(_) => violations.push(FieldViolation::new(SKIP_COUNT, "skipCount must be a non-negative integer")),
                },
                MAX_RESULT_COUNT => match raw.trim().parse() {
                    Ok(n) => request.max_result_count = Some(n),
                    Err(_) => violations.push(FieldViolation::new(
                        MAX_RESULT_COUNT,
                        "maxResultCount must be a positive integer",
                    )),
                },
                SORTING => {
                    if !raw.trim().is_empty() {
                        request.sorting = Some(raw.clone());
                    }
                }
                _ => filter.fields.push((to_snake_case(key), raw.clone())),
            }
        }
        if violations.is_empty() {
            Ok((request, filter))
        } else {
            Err(AppError::Validation(violations))
        }
    }

    /// Query parameters for this request; the inverse of [`from_query`](Self::from_query).
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Some(skip) = self.skip_count {
            out.push((SKIP_COUNT.to_string(), skip.to_string()));
        }
        if let Some(max) = self.max_result_count {
            out.push((MAX_RESULT_COUNT.to_string(), max.to_string()));
        }
        if let Some(sorting) = &self.sorting {
            out.push((SORTING.to_string(), sorting.clone()));
        }
        out
    }

    /// Apply defaults and limits. Every violation is reported, not only the first.
    pub fn normalize(&self, paging: &PagingSettings) -> Result<PageWindow, AppError> {
        let mut violations = Vec::new();
        let take = self.max_result_count.unwrap_or(paging.default_page_size);
        if take == 0 {
            violations.push(FieldViolation::new(MAX_RESULT_COUNT, "maxResultCount must be at least 1"));
        } else if take > paging.max_page_size {
            violations.push(FieldViolation::new(
                MAX_RESULT_COUNT,
                format!("maxResultCount must be at most {}", paging.max_page_size),
            ));
        }
        let sort = match self.sorting.as_deref() {
            Some(s) => match parse_sorting(s) {
                Ok(fields) => fields,
                Err(v) => {
                    violations.push(v);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }
        Ok(PageWindow {
            skip: usize::try_from(self.skip_count.unwrap_or(0)).unwrap_or(usize::MAX),
            take: usize::try_from(take).unwrap_or(usize::MAX),
            sort,
        })
    }
}

/// Normalized paging request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: usize,
    pub take: usize,
    pub sort: Vec<SortField>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

/// Parse "price desc, name" into sort fields.
pub fn parse_sorting(s: &str) -> Result<Vec<SortField>, FieldViolation> {
    let mut out = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let mut words = part.split_whitespace();
        let field = words.next().unwrap_or_default().to_string();
        let direction = match words.next().map(|d| d.to_ascii_lowercase()) {
            None => SortDirection::Asc,
            Some(d) if d == "asc" => SortDirection::Asc,
            Some(d) if d == "desc" => SortDirection::Desc,
            Some(d) => {
                return Err(FieldViolation::new(
                    SORTING,
                    format!("unknown sort direction '{}' for {}", d, field),
                ))
            }
        };
        if words.next().is_some() {
            return Err(FieldViolation::new(SORTING, format!("malformed sort clause '{}'", part)));
        }
        out.push(SortField { field, direction });
    }
    Ok(out)
}

/// Look up a sort field on a serialized DTO; accepts the wire name, PascalCase, or snake_case.
pub fn sort_value<'a>(doc: &'a Value, field: &str) -> &'a Value {
    doc.get(field)
        .or_else(|| doc.get(lower_first(field).as_str()))
        .or_else(|| doc.get(to_camel_case(field).as_str()))
        .unwrap_or(&Value::Null)
}

/// Total order over JSON scalars: null < bool < number < string < everything else.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => a.to_string().cmp(&b.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// One page of results. `total_count` counts every match before paging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub total_count: u64,
    pub items: Vec<T>,
}

impl<T> PagedResult<T> {
    pub fn empty() -> Self {
        PagedResult {
            total_count: 0,
            items: Vec::new(),
        }
    }
}
