//! Client proxies generated from the same service descriptors the server registered.

use super::transport::{Transport, TransportRequest, TransportResponse};
use crate::config::{ApiDefinition, HttpVerb, MethodDescriptor, ServiceDescriptor};
use crate::dto::{PagedAndSortedRequest, PagedResult};
use crate::error::{ErrorBody, ErrorKind, ProxyError};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

/// Path of the endpoint serving the [`ApiDefinition`].
pub const API_DEFINITION_PATH: &str = "/api-definition";

/// Arguments for a proxy call, shaped by the method's input.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProxyArgs {
    pub id: Option<String>,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
}

impl ProxyArgs {
    pub fn id(id: impl Display) -> Self {
        ProxyArgs {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn body(body: Value) -> Self {
        ProxyArgs {
            body: Some(body),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Callable stub for one method.
#[derive(Clone)]
pub struct ProxyMethod {
    service: String,
    route_prefix: String,
    descriptor: MethodDescriptor,
    transport: Arc<dyn Transport>,
}

impl ProxyMethod {
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    /// Verb and prefix-relative path this method calls, `{id}` substituted when given.
    /// For id-bearing methods without an id, the template is returned.
    pub fn route(&self, id: Option<&str>) -> (HttpVerb, String) {
        let path = self
            .descriptor
            .expand_path(id)
            .unwrap_or_else(|| self.descriptor.path.clone());
        (self.descriptor.http_verb, path)
    }

    /// Issue the call. Ok(None) for empty success bodies (e.g. 204 from delete).
    pub async fn call(&self, args: ProxyArgs) -> Result<Option<Value>, ProxyError> {
        let path = self
            .descriptor
            .expand_path(args.id.as_deref())
            .ok_or_else(|| ProxyError::MissingId(format!("{}.{}", self.service, self.descriptor.logical_name)))?;
        let request = TransportRequest {
            verb: self.descriptor.http_verb,
            path: format!("{}{}", self.route_prefix, path),
            query: args.query,
            body: args.body,
        };
        let response = self.transport.send(request).await?;
        decode_response(response)
    }
}

/// Map a response to the body value or a typed failure that keeps the server's error kind.
fn decode_response(response: TransportResponse) -> Result<Option<Value>, ProxyError> {
    if response.is_success() {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        return serde_json::from_slice(&response.body)
            .map(Some)
            .map_err(|e| ProxyError::Decode(format!("response body: {}", e)));
    }
    match serde_json::from_slice::<ErrorBody>(&response.body) {
        Ok(envelope) => Err(ProxyError::Remote {
            kind: ErrorKind::from_code(&envelope.error.code).unwrap_or_else(|| ErrorKind::from_status(response.status)),
            status: response.status,
            message: envelope.error.message,
            details: envelope.error.details,
        }),
        Err(_) => Err(ProxyError::Remote {
            kind: ErrorKind::from_status(response.status),
            status: response.status,
            message: String::from_utf8_lossy(&response.body).into_owned(),
            details: None,
        }),
    }
}

fn decode<T: DeserializeOwned>(value: Option<Value>) -> Result<T, ProxyError> {
    serde_json::from_value(value.unwrap_or(Value::Null)).map_err(|e| ProxyError::Decode(e.to_string()))
}

fn encode<T: Serialize>(input: &T) -> Result<Value, ProxyError> {
    serde_json::to_value(input).map_err(|e| ProxyError::Decode(format!("request body: {}", e)))
}

/// Proxies for one service, keyed by logical method name.
#[derive(Clone)]
pub struct ServiceProxy {
    name: String,
    methods: BTreeMap<String, ProxyMethod>,
}

impl ServiceProxy {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self, logical_name: &str) -> Result<&ProxyMethod, ProxyError> {
        self.methods.get(logical_name).ok_or_else(|| ProxyError::UnknownMethod {
            service: self.name.clone(),
            method: logical_name.to_string(),
        })
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn methods(&self) -> impl Iterator<Item = &ProxyMethod> {
        self.methods.values()
    }

    /// Call any method by logical name, custom ones included.
    pub async fn invoke(&self, logical_name: &str, args: ProxyArgs) -> Result<Option<Value>, ProxyError> {
        self.method(logical_name)?.call(args).await
    }

    pub async fn get<D: DeserializeOwned>(&self, id: impl Display) -> Result<D, ProxyError> {
        decode(self.invoke("get", ProxyArgs::id(id)).await?)
    }

    pub async fn get_list<D: DeserializeOwned>(
        &self,
        request: &PagedAndSortedRequest,
    ) -> Result<PagedResult<D>, ProxyError> {
        let args = ProxyArgs {
            query: request.to_query(),
            ..Default::default()
        };
        decode(self.invoke("getList", args).await?)
    }

    pub async fn create<D: Serialize + DeserializeOwned>(&self, input: &D) -> Result<D, ProxyError> {
        decode(self.invoke("create", ProxyArgs::body(encode(input)?)).await?)
    }

    /// Full replace on the server: fields missing from `input` are reset, not kept.
    pub async fn update<D: Serialize + DeserializeOwned>(&self, id: impl Display, input: &D) -> Result<D, ProxyError> {
        decode(self.invoke("update", ProxyArgs::id(id).with_body(encode(input)?)).await?)
    }

    pub async fn delete(&self, id: impl Display) -> Result<(), ProxyError> {
        self.invoke("delete", ProxyArgs::id(id)).await.map(|_| ())
    }
}

/// Client object returned by the generator. Scoped to its owner; nothing is registered globally.
#[derive(Clone)]
pub struct ProxyClient {
    route_prefix: String,
    services: BTreeMap<String, ServiceProxy>,
}

impl ProxyClient {
    /// One proxy method per descriptor. Deterministic: the same definition always yields the
    /// same methods, so adding a capability on the server adds its proxy on regeneration.
    pub fn generate(definition: &ApiDefinition, transport: Arc<dyn Transport>) -> Self {
        let services = definition
            .services
            .iter()
            .map(|s| (s.service_name.clone(), service_proxy(s, &definition.route_prefix, &transport)))
            .collect();
        ProxyClient {
            route_prefix: definition.route_prefix.clone(),
            services,
        }
    }

    /// Fetch the server's API definition and generate proxies from it.
    pub async fn discover(transport: Arc<dyn Transport>) -> Result<Self, ProxyError> {
        let response = transport
            .send(TransportRequest {
                verb: HttpVerb::Get,
                path: API_DEFINITION_PATH.to_string(),
                query: Vec::new(),
                body: None,
            })
            .await?;
        let definition: ApiDefinition = decode(decode_response(response)?)?;
        tracing::info!(services = definition.services.len(), "discovered api definition");
        Ok(Self::generate(&definition, transport))
    }

    pub fn route_prefix(&self) -> &str {
        &self.route_prefix
    }

    /// Proxy by resolved service name (e.g. "book").
    pub fn service(&self, name: &str) -> Result<&ServiceProxy, ProxyError> {
        self.services
            .get(name)
            .ok_or_else(|| ProxyError::UnknownService(name.to_string()))
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceProxy> {
        self.services.values()
    }
}

fn service_proxy(descriptor: &ServiceDescriptor, route_prefix: &str, transport: &Arc<dyn Transport>) -> ServiceProxy {
    let methods = descriptor
        .methods
        .iter()
        .map(|m| {
            let method = ProxyMethod {
                service: descriptor.service_name.clone(),
                route_prefix: route_prefix.to_string(),
                descriptor: m.clone(),
                transport: transport.clone(),
            };
            (m.logical_name.clone(), method)
        })
        .collect();
    ServiceProxy {
        name: descriptor.service_name.clone(),
        methods,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(status: u16, body: &str) -> TransportResponse {
        TransportResponse {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn empty_success_body_is_none() {
        assert_eq!(decode_response(response(204, "")).unwrap(), None);
    }

    #[test]
    fn success_body_is_parsed() {
        assert_eq!(decode_response(response(200, r#"{"id":1}"#)).unwrap(), Some(json!({ "id": 1 })));
    }

    #[test]
    fn server_error_kind_survives() {
        let body = r#"{"error":{"code":"not_found","message":"Book not found: 9","details":{"entity":"Book","id":"9"}}}"#;
        let err = decode_response(response(404, body)).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    }

    #[test]
    fn validation_details_become_violations() {
        let body = r#"{"error":{"code":"validation_error","message":"x","details":[{"field":"name","message":"name is required"}]}}"#;
        let err = decode_response(response(422, body)).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].field, "name");
    }

    #[test]
    fn non_envelope_errors_fall_back_to_status() {
        let err = decode_response(response(413, "length limit exceeded")).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Internal));
        let err = decode_response(response(403, "")).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Forbidden));
    }
}
