//! Registration validation: resolved service names must be unique.

use crate::config::ServiceDescriptor;
use crate::error::ConfigError;
use std::collections::HashMap;

/// Two services whose names collide after the convention transform are fatal.
/// Route-level clashes are caught when the route table is built.
pub fn validate(descriptors: &[ServiceDescriptor]) -> Result<(), ConfigError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for d in descriptors {
        if let Some(first) = seen.insert(d.service_name.as_str(), d.declared_name.as_str()) {
            return Err(ConfigError::DuplicateService {
                name: d.service_name.clone(),
                first: first.to_string(),
                second: d.declared_name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, declared: &str) -> ServiceDescriptor {
        ServiceDescriptor {
            service_name: name.into(),
            declared_name: declared.into(),
            methods: Vec::new(),
        }
    }

    #[test]
    fn names_colliding_after_transform_are_rejected() {
        let err = validate(&[service("book", "IBookAppService"), service("book", "BookService")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateService {
                name: "book".into(),
                first: "IBookAppService".into(),
                second: "BookService".into(),
            }
        );
    }

    #[test]
    fn distinct_names_pass() {
        assert!(validate(&[service("book", "Book"), service("author", "Author")]).is_ok());
    }
}
