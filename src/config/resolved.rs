//! Resolved service model: descriptors derived by the convention resolver, immutable after registration.

use crate::config::{Capability, HttpVerb};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

/// Path parameter placeholder shared by every id-bearing route.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Bytes escaped when a key's canonical string is placed in a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode `id` as one path segment.
pub fn encode_id_segment(id: &str) -> String {
    utf8_percent_encode(id, PATH_SEGMENT).to_string()
}

/// What a method takes from the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputShape {
    None,
    Id,
    Body,
    IdAndBody,
    PagedRequest,
}

impl InputShape {
    pub fn takes_id(&self) -> bool {
        matches!(self, InputShape::Id | InputShape::IdAndBody)
    }
}

/// What a method hands back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputShape {
    Dto,
    PagedResult,
    Empty,
    Json,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    /// Convention-transformed name; the proxy exposes the method under it.
    pub logical_name: String,
    pub http_verb: HttpVerb,
    /// Normalized path template, e.g. `/book/{id}`.
    pub path: String,
    pub input: InputShape,
    pub output: OutputShape,
    /// Set for the five CRUD methods, None for custom methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<Capability>,
}

impl MethodDescriptor {
    pub fn takes_id(&self) -> bool {
        self.input.takes_id()
    }

    /// Concrete request path with `{id}` substituted, percent-encoded as one segment.
    pub fn expand_path(&self, id: Option<&str>) -> Option<String> {
        match (self.takes_id(), id) {
            (true, Some(id)) => Some(self.path.replacen(ID_PLACEHOLDER, &encode_id_segment(id), 1)),
            (true, None) => None,
            (false, _) => Some(self.path.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Convention-transformed name, e.g. "book".
    pub service_name: String,
    /// Name as registered, e.g. "IBookAppService".
    pub declared_name: String,
    pub methods: Vec<MethodDescriptor>,
}

impl ServiceDescriptor {
    pub fn method(&self, logical_name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.logical_name == logical_name)
    }
}

/// Everything a remote caller needs to generate proxies. Served at `/api-definition`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefinition {
    /// Prefix under which service paths are mounted, e.g. "/api/app". Empty for the root.
    pub route_prefix: String,
    pub services: Vec<ServiceDescriptor>,
}

impl ApiDefinition {
    pub fn service(&self, service_name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.service_name == service_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(path: &str) -> MethodDescriptor {
        MethodDescriptor {
            logical_name: "get".into(),
            http_verb: HttpVerb::Get,
            path: path.into(),
            input: if path.contains(ID_PLACEHOLDER) { InputShape::Id } else { InputShape::None },
            output: OutputShape::Dto,
            capability: Some(Capability::Get),
        }
    }

    #[test]
    fn expand_path_substitutes_id() {
        let m = method("/book/{id}");
        assert_eq!(m.expand_path(Some("42")).as_deref(), Some("/book/42"));
        assert_eq!(m.expand_path(None), None);
    }

    #[test]
    fn expand_path_encodes_the_id_as_one_segment() {
        let m = method("/tag/{id}");
        assert_eq!(m.expand_path(Some("rust lang")).as_deref(), Some("/tag/rust%20lang"));
        assert_eq!(m.expand_path(Some("a/b?c#d")).as_deref(), Some("/tag/a%2Fb%3Fc%23d"));
        assert_eq!(m.expand_path(Some("100%")).as_deref(), Some("/tag/100%25"));
        assert_eq!(m.expand_path(Some("café")).as_deref(), Some("/tag/caf%C3%A9"));
    }

    #[test]
    fn expand_path_ignores_id_for_collection_routes() {
        let m = method("/book");
        assert_eq!(m.expand_path(Some("42")).as_deref(), Some("/book"));
    }

    #[test]
    fn descriptor_serializes_camel_case() {
        let v = serde_json::to_value(method("/book/{id}")).unwrap();
        assert_eq!(v["logicalName"], "get");
        assert_eq!(v["httpVerb"], "GET");
        assert_eq!(v["capability"], "Get");
    }
}
