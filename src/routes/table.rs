//! Route table: (verb, normalized path) -> method handle. Built once at startup, read-only afterwards.

use crate::config::{HttpVerb, MethodDescriptor, ID_PLACEHOLDER};
use crate::error::{AppError, ConfigError};
use crate::service::MethodHandle;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

pub struct RouteEntry {
    /// Resolved service name.
    pub service: String,
    pub descriptor: MethodDescriptor,
    pub(crate) handle: MethodHandle,
}

impl RouteEntry {
    pub fn handle(&self) -> &MethodHandle {
        &self.handle
    }
}

/// A matched route and the `{id}` segment it captured, if any.
pub struct RouteMatch<'a> {
    pub entry: &'a RouteEntry,
    pub id: Option<String>,
}

pub struct RouteTable {
    entries: Vec<RouteEntry>,
    index: HashMap<(HttpVerb, String), usize>,
}

impl RouteTable {
    /// Rejects two bindings with the same verb and path template.
    pub fn build(bindings: Vec<(String, MethodDescriptor, MethodHandle)>) -> Result<Self, ConfigError> {
        let mut entries: Vec<RouteEntry> = Vec::with_capacity(bindings.len());
        let mut index = HashMap::with_capacity(bindings.len());
        for (service, descriptor, handle) in bindings {
            let key = (descriptor.http_verb, normalize_path(&descriptor.path));
            if let Some(&existing) = index.get(&key) {
                let first: &RouteEntry = &entries[existing];
                tracing::warn!(verb = %key.0, path = %key.1, "registration conflict");
                return Err(ConfigError::RegistrationConflict {
                    verb: key.0.to_string(),
                    path: key.1,
                    first: format!("{}.{}", first.service, first.descriptor.logical_name),
                    second: format!("{}.{}", service, descriptor.logical_name),
                });
            }
            index.insert(key, entries.len());
            entries.push(RouteEntry {
                service,
                descriptor,
                handle,
            });
        }
        Ok(RouteTable { entries, index })
    }

    /// Exact verb; path either matches a template literally or with one segment standing in
    /// for `{id}`. Literal templates win over parameterized ones.
    pub fn lookup(&self, verb: HttpVerb, path: &str) -> Result<RouteMatch<'_>, AppError> {
        let path = normalize_path(path);
        if let Some(&i) = self.index.get(&(verb, path.clone())) {
            return Ok(RouteMatch {
                entry: &self.entries[i],
                id: None,
            });
        }
        let segments: Vec<&str> = path.split('/').skip(1).collect();
        for (pos, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                continue;
            }
            let mut candidate = segments.clone();
            candidate[pos] = ID_PLACEHOLDER;
            let template = format!("/{}", candidate.join("/"));
            if let Some(&i) = self.index.get(&(verb, template)) {
                return Ok(RouteMatch {
                    entry: &self.entries[i],
                    id: Some(decode_id_segment(segment)?),
                });
            }
        }
        Err(AppError::RouteNotFound {
            verb: verb.to_string(),
            path,
        })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Undo the percent-encoding of a captured `{id}` segment.
fn decode_id_segment(segment: &str) -> Result<String, AppError> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|id| id.into_owned())
        .map_err(|_| AppError::BadRequest(format!("id segment is not valid UTF-8: {}", segment)))
}

/// Leading slash, no trailing slash, no empty segments: "book//7/" -> "/book/7".
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Capability, InputShape, OutputShape};
    use crate::response::Reply;
    use crate::service::{HandlerFuture, Invocation};
    use std::sync::Arc;

    fn handle(tag: &'static str) -> MethodHandle {
        Arc::new(move |_: Invocation| -> HandlerFuture { Box::pin(async move { Ok(Reply::Ok(serde_json::json!(tag))) }) })
    }

    fn descriptor(name: &str, verb: HttpVerb, path: &str) -> MethodDescriptor {
        MethodDescriptor {
            logical_name: name.into(),
            http_verb: verb,
            path: path.into(),
            input: InputShape::None,
            output: OutputShape::Json,
            capability: None::<Capability>,
        }
    }

    fn table() -> RouteTable {
        RouteTable::build(vec![
            ("book".into(), descriptor("get", HttpVerb::Get, "/book/{id}"), handle("get")),
            ("book".into(), descriptor("getList", HttpVerb::Get, "/book"), handle("getList")),
            ("book".into(), descriptor("getCheapest", HttpVerb::Get, "/book/cheapest"), handle("cheapest")),
            ("book".into(), descriptor("publish", HttpVerb::Post, "/book/{id}/publish"), handle("publish")),
        ])
        .unwrap()
    }

    #[test]
    fn literal_and_parameterized_matches() {
        let t = table();
        let m = t.lookup(HttpVerb::Get, "/book/42").unwrap();
        assert_eq!(m.entry.descriptor.logical_name, "get");
        assert_eq!(m.id.as_deref(), Some("42"));

        let m = t.lookup(HttpVerb::Get, "/book/").unwrap();
        assert_eq!(m.entry.descriptor.logical_name, "getList");
        assert_eq!(m.id, None);

        let m = t.lookup(HttpVerb::Get, "/book/cheapest").unwrap();
        assert_eq!(m.entry.descriptor.logical_name, "getCheapest");

        let m = t.lookup(HttpVerb::Post, "/book/7/publish").unwrap();
        assert_eq!(m.entry.descriptor.logical_name, "publish");
        assert_eq!(m.id.as_deref(), Some("7"));
    }

    #[test]
    fn captured_id_is_percent_decoded() {
        let t = table();
        let m = t.lookup(HttpVerb::Get, "/book/rust%20lang").unwrap();
        assert_eq!(m.id.as_deref(), Some("rust lang"));
        let m = t.lookup(HttpVerb::Post, "/book/a%2Fb/publish").unwrap();
        assert_eq!(m.entry.descriptor.logical_name, "publish");
        assert_eq!(m.id.as_deref(), Some("a/b"));
        assert!(matches!(
            t.lookup(HttpVerb::Get, "/book/%FF"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn verb_must_match_exactly() {
        let t = table();
        assert!(matches!(
            t.lookup(HttpVerb::Delete, "/book/42"),
            Err(AppError::RouteNotFound { .. })
        ));
        assert!(t.lookup(HttpVerb::Get, "/author/1").is_err());
        assert!(t.lookup(HttpVerb::Get, "/book/1/2").is_err());
    }

    #[test]
    fn duplicate_verb_and_path_is_a_registration_conflict() {
        let err = RouteTable::build(vec![
            ("book".into(), descriptor("get", HttpVerb::Get, "/book/{id}"), handle("a")),
            ("book".into(), descriptor("find", HttpVerb::Get, "/book/{id}/"), handle("b")),
        ])
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::RegistrationConflict { .. }));
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path("book//7/"), "/book/7");
        assert_eq!(normalize_path("/"), "/");
    }
}
