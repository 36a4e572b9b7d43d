//! Service definitions: a declared name plus one function handle per exposed method.

use crate::auth::{permission_name, AllowAll, AuthDecision, Authorizer};
use crate::config::Capability;
use crate::convention::{base_name, strip_async_suffix, CustomMethodDecl, ServiceDeclaration};
use crate::dto::PagedAndSortedRequest;
use crate::error::AppError;
use crate::extractors::CallContext;
use crate::mapping::{Entity, EntityDto, EntityKey};
use crate::repository::Repository;
use crate::response::Reply;
use crate::service::CrudAppService;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// One inbound call, already matched to a route.
#[derive(Clone, Debug, Default)]
pub struct Invocation {
    pub context: CallContext,
    /// Raw `{id}` path segment for id-bearing routes.
    pub id: Option<String>,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

impl Invocation {
    pub fn require_id(&self) -> Result<&str, AppError> {
        self.id
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("missing id path segment".into()))
    }

    pub fn require_body(&self) -> Result<&Value, AppError> {
        self.body
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("request body required".into()))
    }
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Reply, AppError>> + Send>>;

/// Type-erased method implementation stored in the route table.
pub type MethodHandle = Arc<dyn Fn(Invocation) -> HandlerFuture + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodKind {
    Crud(Capability),
    Custom(CustomMethodDecl),
}

pub(crate) struct DeclaredMethod {
    pub kind: MethodKind,
    pub handle: MethodHandle,
}

/// Explicit registration unit: replaces discovering services by introspection.
pub struct ServiceDefinition {
    declared_name: String,
    methods: Vec<DeclaredMethod>,
    authorizer: Arc<dyn Authorizer>,
}

impl ServiceDefinition {
    /// A definition with no methods. Legal; it resolves to no routes.
    pub fn new(declared_name: impl Into<String>) -> Self {
        ServiceDefinition {
            declared_name: declared_name.into(),
            methods: Vec::new(),
            authorizer: Arc::new(AllowAll),
        }
    }

    /// Expose `capabilities` of a CRUD service. Custom methods added later share its authorizer.
    pub fn crud<E, D, R>(service: Arc<CrudAppService<E, D, R>>, capabilities: &[Capability]) -> Self
    where
        E: Entity,
        D: EntityDto<E>,
        R: Repository<E>,
    {
        let mut definition = ServiceDefinition::new(service.declared_name());
        definition.authorizer = service.authorizer();
        for capability in Capability::ALL {
            if capabilities.contains(&capability) {
                definition.methods.push(DeclaredMethod {
                    kind: MethodKind::Crud(capability),
                    handle: crud_handle(service.clone(), capability),
                });
            }
        }
        definition
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Add a custom method. Its verb and path follow from `name`; non-GET methods pass
    /// the authorization hook as "{Service}.{Name}" before `handler` runs.
    pub fn custom_method<F, Fut>(mut self, name: impl Into<String>, takes_id: bool, handler: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, AppError>> + Send + 'static,
    {
        let decl = CustomMethodDecl {
            name: name.into(),
            takes_id,
        };
        let handle: MethodHandle = Arc::new(move |call: Invocation| -> HandlerFuture { Box::pin(handler(call)) });
        self.methods.push(DeclaredMethod {
            kind: MethodKind::Custom(decl),
            handle,
        });
        self
    }

    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    /// Pure declaration handed to the convention resolver.
    pub fn declaration(&self) -> ServiceDeclaration {
        let mut decl = ServiceDeclaration {
            declared_name: self.declared_name.clone(),
            ..Default::default()
        };
        for m in &self.methods {
            match &m.kind {
                MethodKind::Crud(c) => decl.capabilities.push(*c),
                MethodKind::Custom(c) => decl.custom_methods.push(c.clone()),
            }
        }
        decl
    }

    /// Handles in the order the resolver emits descriptors: CRUD in canonical order, then custom.
    pub(crate) fn into_handles(self) -> (ServiceDeclaration, Vec<(MethodKind, MethodHandle)>) {
        let declaration = self.declaration();
        let entity = base_name(&self.declared_name).to_string();
        let authorizer = self.authorizer;
        let mut crud: Vec<(MethodKind, MethodHandle)> = Vec::new();
        let mut custom: Vec<(MethodKind, MethodHandle)> = Vec::new();
        for DeclaredMethod { kind, handle } in self.methods {
            match kind {
                MethodKind::Crud(c) => crud.push((MethodKind::Crud(c), handle)),
                MethodKind::Custom(decl) => {
                    let permission = permission_name(&entity, strip_async_suffix(&decl.name));
                    let handle = guard_custom(&decl, permission, authorizer.clone(), handle);
                    custom.push((MethodKind::Custom(decl), handle));
                }
            }
        }
        crud.sort_by_key(|(kind, _)| match kind {
            MethodKind::Crud(c) => Capability::ALL.iter().position(|x| x == c).unwrap_or(usize::MAX),
            MethodKind::Custom(_) => usize::MAX,
        });
        crud.dedup_by(|a, b| a.0 == b.0);
        crud.extend(custom);
        (declaration, crud)
    }
}

/// Wrap mutating custom methods with the authorization hook.
fn guard_custom(
    decl: &CustomMethodDecl,
    permission: String,
    authorizer: Arc<dyn Authorizer>,
    inner: MethodHandle,
) -> MethodHandle {
    let (verb, _) = crate::convention::infer_verb(&decl.name);
    if verb == crate::config::HttpVerb::Get {
        return inner;
    }
    Arc::new(move |call: Invocation| -> HandlerFuture {
        let authorizer = authorizer.clone();
        let inner = inner.clone();
        let permission = permission.clone();
        Box::pin(async move {
            match authorizer.check(&permission, &call.context).await {
                AuthDecision::Allow => inner(call).await,
                AuthDecision::Deny => {
                    tracing::warn!(permission = %permission, user = ?call.context.user_id, "authorization denied");
                    Err(AppError::Forbidden { capability: permission })
                }
            }
        })
    })
}

fn parse_key<K: EntityKey>(call: &Invocation) -> Result<K, AppError> {
    let raw = call.require_id()?;
    K::parse_key(raw).ok_or_else(|| AppError::BadRequest(format!("invalid id: {}", raw)))
}

fn parse_body<T: serde::de::DeserializeOwned>(call: &Invocation) -> Result<T, AppError> {
    let body = call.require_body()?;
    serde_json::from_value(body.clone()).map_err(|e| AppError::BadRequest(format!("invalid body: {}", e)))
}

/// Function handle for one CRUD capability of `service`.
fn crud_handle<E, D, R>(service: Arc<CrudAppService<E, D, R>>, capability: Capability) -> MethodHandle
where
    E: Entity,
    D: EntityDto<E>,
    R: Repository<E>,
{
    Arc::new(move |call: Invocation| -> HandlerFuture {
        let service = service.clone();
        Box::pin(async move {
            match capability {
                Capability::Get => {
                    let id: E::Key = parse_key(&call)?;
                    Reply::ok(&service.get(&id).await?)
                }
                Capability::GetList => {
                    let (request, filter) = PagedAndSortedRequest::from_query(&call.query)?;
                    let filter = Some(&filter).filter(|f| !f.is_empty());
                    Reply::ok(&service.get_list(&request, filter).await?)
                }
                Capability::Create => {
                    let input: D = parse_body(&call)?;
                    Reply::created(&service.create(&call.context, input).await?)
                }
                Capability::Update => {
                    let id: E::Key = parse_key(&call)?;
                    let input: D = parse_body(&call)?;
                    Reply::ok(&service.update(&call.context, &id, input).await?)
                }
                Capability::Delete => {
                    let id: E::Key = parse_key(&call)?;
                    service.delete(&call.context, &id).await?;
                    Ok(Reply::NoContent)
                }
            }
        })
    })
}
