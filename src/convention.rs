//! Convention resolver: derives service names, method names, verbs, and paths from declared names.
//!
//! Everything here is a pure function of the declaration. The server route table and
//! the client proxies both go through [`resolve_service`], so they cannot drift apart.

use crate::case::lower_first;
use crate::config::{
    Capability, HttpVerb, InputShape, MethodDescriptor, OutputShape, ServiceDescriptor, ID_PLACEHOLDER,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Service suffixes removed from declared names, longest first.
const SERVICE_SUFFIXES: &[&str] = &["ApplicationService", "AppService", "Service"];
const ASYNC_SUFFIX: &str = "Async";

/// Custom method name prefixes and the verb each implies. Anything else is POST.
const VERB_PREFIXES: &[(&str, HttpVerb)] = &[
    ("Get", HttpVerb::Get),
    ("Find", HttpVerb::Get),
    ("List", HttpVerb::Get),
    ("Fetch", HttpVerb::Get),
    ("Create", HttpVerb::Post),
    ("Add", HttpVerb::Post),
    ("Insert", HttpVerb::Post),
    ("Post", HttpVerb::Post),
    ("Update", HttpVerb::Put),
    ("Put", HttpVerb::Put),
    ("Set", HttpVerb::Put),
    ("Delete", HttpVerb::Delete),
    ("Remove", HttpVerb::Delete),
];

/// A custom (non-CRUD) method as declared at registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomMethodDecl {
    pub name: String,
    pub takes_id: bool,
}

/// Declared shape of one service, before resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceDeclaration {
    pub declared_name: String,
    pub capabilities: Vec<Capability>,
    pub custom_methods: Vec<CustomMethodDecl>,
}

/// "IBookAppService" -> "BookAppService". Only when the marker is followed by an upper-case letter.
pub fn strip_interface_marker(name: &str) -> &str {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some('I'), Some(second)) if second.is_uppercase() => &name[1..],
        _ => name,
    }
}

/// Removes service suffixes until none applies. A suffix is kept when removing it would leave nothing.
pub fn strip_service_suffix(name: &str) -> &str {
    let mut current = name;
    loop {
        let next = SERVICE_SUFFIXES
            .iter()
            .find_map(|suffix| current.strip_suffix(suffix).filter(|rest| !rest.is_empty()));
        match next {
            Some(rest) => current = rest,
            None => return current,
        }
    }
}

/// Declared service name without marker or suffix, case preserved: "IBookAppService" -> "Book".
/// Used for entity names in errors and permission names.
pub fn base_name(declared: &str) -> &str {
    strip_service_suffix(strip_interface_marker(declared.trim()))
}

/// The convention transform for service names: "IBookAppService" -> "book".
/// Idempotent: `resolve_name(&resolve_name(x)) == resolve_name(x)`.
pub fn resolve_name(declared: &str) -> String {
    lower_first(base_name(declared))
}

/// Method name without a trailing "Async", case preserved.
pub fn strip_async_suffix(name: &str) -> &str {
    match name.strip_suffix(ASYNC_SUFFIX) {
        Some(rest) if !rest.is_empty() => rest,
        _ => name,
    }
}

/// The convention transform for method names: "GetAuthorListAsync" -> "getAuthorList".
pub fn resolve_method_name(declared: &str) -> String {
    lower_first(strip_async_suffix(declared.trim()))
}

/// Verb implied by a method name and the remainder after the verb prefix.
/// Prefixes only match on a word boundary, so "Settle" is not "Set" + "tle".
pub fn infer_verb(method: &str) -> (HttpVerb, &str) {
    let name = strip_async_suffix(method.trim());
    for (prefix, verb) in VERB_PREFIXES {
        if let Some(rest) = strip_prefix_ignore_first_case(name, prefix) {
            if rest.is_empty() || rest.starts_with(|c: char| c.is_uppercase()) {
                return (*verb, rest);
            }
        }
    }
    (HttpVerb::Post, name)
}

/// Accept both "GetX" and "getX".
fn strip_prefix_ignore_first_case<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    name.strip_prefix(prefix)
        .or_else(|| name.strip_prefix(lower_first(prefix).as_str()))
}

/// Fixed (verb, path suffix, input, output) per CRUD capability.
pub fn capability_route(capability: Capability) -> (HttpVerb, &'static str, InputShape, OutputShape) {
    match capability {
        Capability::Get => (HttpVerb::Get, "/{id}", InputShape::Id, OutputShape::Dto),
        Capability::GetList => (HttpVerb::Get, "", InputShape::PagedRequest, OutputShape::PagedResult),
        Capability::Create => (HttpVerb::Post, "", InputShape::Body, OutputShape::Dto),
        Capability::Update => (HttpVerb::Put, "/{id}", InputShape::IdAndBody, OutputShape::Dto),
        Capability::Delete => (HttpVerb::Delete, "/{id}", InputShape::Id, OutputShape::Empty),
    }
}

/// Descriptor for a custom method on the resolved service `service_name`.
pub fn resolve_custom_method(service_name: &str, decl: &CustomMethodDecl) -> Result<MethodDescriptor, ConfigError> {
    let logical_name = resolve_method_name(&decl.name);
    if logical_name.is_empty() || !logical_name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ConfigError::InvalidMethodName(decl.name.clone()));
    }
    let (verb, rest) = infer_verb(&decl.name);
    let segment = if rest.is_empty() { logical_name.clone() } else { lower_first(rest) };
    let path = if decl.takes_id {
        format!("/{}/{}/{}", service_name, ID_PLACEHOLDER, segment)
    } else {
        format!("/{}/{}", service_name, segment)
    };
    let input = match (decl.takes_id, verb) {
        (true, HttpVerb::Get | HttpVerb::Delete) => InputShape::Id,
        (true, _) => InputShape::IdAndBody,
        (false, HttpVerb::Get | HttpVerb::Delete) => InputShape::None,
        (false, _) => InputShape::Body,
    };
    Ok(MethodDescriptor {
        logical_name,
        http_verb: verb,
        path,
        input,
        output: OutputShape::Json,
        capability: None,
    })
}

/// Resolve a declaration into its descriptor. CRUD methods come first in canonical order
/// (duplicates collapse), then custom methods in declared order.
pub fn resolve_service(decl: &ServiceDeclaration) -> Result<ServiceDescriptor, ConfigError> {
    let service_name = resolve_name(&decl.declared_name);
    if service_name.is_empty() || !service_name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ConfigError::InvalidServiceName(decl.declared_name.clone()));
    }

    let mut methods = Vec::new();
    for capability in Capability::ALL {
        if !decl.capabilities.contains(&capability) {
            continue;
        }
        let (verb, suffix, input, output) = capability_route(capability);
        methods.push(MethodDescriptor {
            logical_name: lower_first(capability.name()),
            http_verb: verb,
            path: format!("/{}{}", service_name, suffix),
            input,
            output,
            capability: Some(capability),
        });
    }
    for custom in &decl.custom_methods {
        let method = resolve_custom_method(&service_name, custom)?;
        if methods.iter().any(|m: &MethodDescriptor| m.logical_name == method.logical_name) {
            return Err(ConfigError::DuplicateMethod {
                service: service_name.clone(),
                method: method.logical_name,
            });
        }
        methods.push(method);
    }

    Ok(ServiceDescriptor {
        service_name,
        declared_name: decl.declared_name.clone(),
        methods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(name: &str, capabilities: &[Capability]) -> ServiceDeclaration {
        ServiceDeclaration {
            declared_name: name.into(),
            capabilities: capabilities.to_vec(),
            custom_methods: Vec::new(),
        }
    }

    #[test]
    fn strips_marker_and_suffix_then_lowers_first() {
        assert_eq!(resolve_name("IBookAppService"), "book");
        assert_eq!(resolve_name("BookAppService"), "book");
        assert_eq!(resolve_name("BookStoreApplicationService"), "bookStore");
        assert_eq!(resolve_name("AuthorService"), "author");
        assert_eq!(resolve_name("Book"), "book");
        assert_eq!(resolve_name("Inventory"), "inventory");
    }

    #[test]
    fn suffix_is_kept_when_it_is_the_whole_name() {
        assert_eq!(resolve_name("Service"), "service");
        assert_eq!(resolve_name("IService"), "service");
        assert_eq!(resolve_name("AppService"), "app");
    }

    #[test]
    fn resolve_name_is_idempotent() {
        for name in [
            "IBookAppService",
            "BookServiceAppService",
            "Service",
            "AppService",
            "IIBook",
            "URLService",
            "ISettingsService",
            "book",
            "",
        ] {
            let once = resolve_name(name);
            assert_eq!(resolve_name(&once), once, "not idempotent for {name}");
        }
    }

    #[test]
    fn method_names_drop_async() {
        assert_eq!(resolve_method_name("GetAuthorListAsync"), "getAuthorList");
        assert_eq!(resolve_method_name("Async"), "async");
        assert_eq!(resolve_method_name(&resolve_method_name("PublishAsync")), "publish");
    }

    #[test]
    fn verb_prefixes_need_a_word_boundary() {
        assert_eq!(infer_verb("GetAuthorListAsync"), (HttpVerb::Get, "AuthorList"));
        assert_eq!(infer_verb("RemoveCoverAsync"), (HttpVerb::Delete, "Cover"));
        assert_eq!(infer_verb("Settle"), (HttpVerb::Post, "Settle"));
        assert_eq!(infer_verb("Publish"), (HttpVerb::Post, "Publish"));
        assert_eq!(infer_verb("setPrice"), (HttpVerb::Put, "Price"));
    }

    #[test]
    fn book_service_with_three_capabilities() {
        let d = resolve_service(&decl(
            "IBookAppService",
            &[Capability::GetList, Capability::Create, Capability::Get],
        ))
        .unwrap();
        assert_eq!(d.service_name, "book");
        let routes: Vec<(HttpVerb, &str, &str)> = d
            .methods
            .iter()
            .map(|m| (m.http_verb, m.path.as_str(), m.logical_name.as_str()))
            .collect();
        assert_eq!(
            routes,
            vec![
                (HttpVerb::Post, "/book", "create"),
                (HttpVerb::Get, "/book/{id}", "get"),
                (HttpVerb::Get, "/book", "getList"),
            ]
        );
    }

    #[test]
    fn empty_capability_set_is_legal() {
        let d = resolve_service(&decl("AuditService", &[])).unwrap();
        assert!(d.methods.is_empty());
    }

    #[test]
    fn duplicate_capabilities_collapse() {
        let d = resolve_service(&decl("Book", &[Capability::Get, Capability::Get])).unwrap();
        assert_eq!(d.methods.len(), 1);
    }

    #[test]
    fn custom_methods_follow_prefix_rules() {
        let mut declaration = decl("IBookAppService", &[Capability::Get]);
        declaration.custom_methods = vec![
            CustomMethodDecl { name: "GetCheapestAsync".into(), takes_id: false },
            CustomMethodDecl { name: "PublishAsync".into(), takes_id: true },
        ];
        let d = resolve_service(&declaration).unwrap();
        let cheapest = d.method("getCheapest").unwrap();
        assert_eq!(cheapest.http_verb, HttpVerb::Get);
        assert_eq!(cheapest.path, "/book/cheapest");
        let publish = d.method("publish").unwrap();
        assert_eq!(publish.http_verb, HttpVerb::Post);
        assert_eq!(publish.path, "/book/{id}/publish");
        assert_eq!(publish.input, InputShape::IdAndBody);
    }

    #[test]
    fn custom_method_clashing_with_crud_name_is_rejected() {
        let mut declaration = decl("Book", &[Capability::Get]);
        declaration.custom_methods = vec![CustomMethodDecl { name: "GetAsync".into(), takes_id: true }];
        assert!(matches!(
            resolve_service(&declaration),
            Err(ConfigError::DuplicateMethod { .. })
        ));
    }

    #[test]
    fn invalid_service_names_are_rejected() {
        assert!(resolve_service(&decl("", &[Capability::Get])).is_err());
        assert!(resolve_service(&decl("Book/Store", &[Capability::Get])).is_err());
    }
}
