//! Generic CRUD engine over (entity, DTO, key), backed by a repository collaborator.

use crate::auth::{permission_name, AllowAll, AuthDecision, Authorizer};
use crate::config::{Capability, PagingSettings};
use crate::convention::base_name;
use crate::dto::{compare_values, sort_value, PagedAndSortedRequest, PagedResult, SortDirection, SortField};
use crate::error::AppError;
use crate::extractors::CallContext;
use crate::mapping::{Entity, EntityDto};
use crate::repository::{ListFilter, Repository};
use crate::service::RequestValidator;
use serde_json::Value;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

/// Create/Get/GetList/Update/Delete for one entity type.
///
/// Holds no per-call state: every operation is a pure function of its arguments and the
/// repository. Dropping a returned future cancels the pending repository call with it.
pub struct CrudAppService<E, D, R>
where
    E: Entity,
    D: EntityDto<E>,
    R: Repository<E>,
{
    declared_name: String,
    /// Entity name for errors and permissions, e.g. "Book".
    entity_name: String,
    repository: Arc<R>,
    authorizer: Arc<dyn Authorizer>,
    paging: PagingSettings,
    _types: PhantomData<fn() -> (E, D)>,
}

impl<E, D, R> CrudAppService<E, D, R>
where
    E: Entity,
    D: EntityDto<E>,
    R: Repository<E>,
{
    /// `declared_name` is the service name the convention resolver works from, e.g. "IBookAppService".
    pub fn new(declared_name: impl Into<String>, repository: Arc<R>) -> Self {
        let declared_name = declared_name.into();
        let entity_name = base_name(&declared_name).to_string();
        CrudAppService {
            declared_name,
            entity_name,
            repository,
            authorizer: Arc::new(AllowAll),
            paging: PagingSettings::default(),
            _types: PhantomData,
        }
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_paging(mut self, paging: PagingSettings) -> Self {
        self.paging = paging;
        self
    }

    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn authorizer(&self) -> Arc<dyn Authorizer> {
        self.authorizer.clone()
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// NotFound when no entity has this id.
    pub async fn get(&self, id: &E::Key) -> Result<D, AppError> {
        tracing::debug!(entity = %self.entity_name, id = %id, "get");
        let entity = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(&self.entity_name, id))?;
        Ok(D::from_entity(&entity))
    }

    /// Sort (when requested) then page over every match. Without sorting the repository's
    /// natural order is kept; with sorting, equal sort keys fall back to the primary key.
    pub async fn get_list(
        &self,
        request: &PagedAndSortedRequest,
        filter: Option<&ListFilter>,
    ) -> Result<PagedResult<D>, AppError> {
        let window = request.normalize(&self.paging)?;
        let entities = self.repository.list(filter).await?;
        let total_count = entities.len() as u64;
        tracing::debug!(entity = %self.entity_name, total = total_count, skip = window.skip, take = window.take, "get_list");

        let mut rows: Vec<(D, Option<E::Key>)> = entities
            .iter()
            .map(|e| (D::from_entity(e), e.id().cloned()))
            .collect();
        if !window.sort.is_empty() {
            rows = sort_rows(rows, &window.sort)?;
        }
        let items = rows
            .into_iter()
            .skip(window.skip)
            .take(window.take)
            .map(|(dto, _)| dto)
            .collect();
        Ok(PagedResult { total_count, items })
    }

    /// Validate, insert, and return the DTO rebuilt from the stored entity (with its assigned id).
    pub async fn create(&self, context: &CallContext, input: D) -> Result<D, AppError> {
        self.authorize(Capability::Create, context).await?;
        self.validate(&input)?;
        let stored = self.repository.insert(input.into_entity(None)).await?;
        tracing::info!(entity = %self.entity_name, id = ?stored.id(), "created");
        Ok(D::from_entity(&stored))
    }

    /// Full replace: every field comes from `input`. Fields the caller leaves out are reset
    /// to their zero value, not preserved. NotFound when `id` is absent.
    pub async fn update(&self, context: &CallContext, id: &E::Key, input: D) -> Result<D, AppError> {
        self.authorize(Capability::Update, context).await?;
        self.validate(&input)?;
        let stored = self
            .repository
            .replace(id, input.into_entity(Some(id.clone())))
            .await?
            .ok_or_else(|| AppError::not_found(&self.entity_name, id))?;
        tracing::info!(entity = %self.entity_name, id = %id, "updated");
        Ok(D::from_entity(&stored))
    }

    /// Not idempotent: deleting a missing id fails with NotFound.
    pub async fn delete(&self, context: &CallContext, id: &E::Key) -> Result<(), AppError> {
        self.authorize(Capability::Delete, context).await?;
        if !self.repository.remove(id).await? {
            return Err(AppError::not_found(&self.entity_name, id));
        }
        tracing::info!(entity = %self.entity_name, id = %id, "deleted");
        Ok(())
    }

    async fn authorize(&self, capability: Capability, context: &CallContext) -> Result<(), AppError> {
        if !capability.is_mutating() {
            return Ok(());
        }
        let permission = permission_name(&self.entity_name, capability.name());
        match self.authorizer.check(&permission, context).await {
            AuthDecision::Allow => Ok(()),
            AuthDecision::Deny => {
                tracing::warn!(permission = %permission, user = ?context.user_id, "authorization denied");
                Err(AppError::Forbidden { capability: permission })
            }
        }
    }

    fn validate(&self, input: &D) -> Result<(), AppError> {
        let rules = D::validation_rules();
        if rules.is_empty() {
            return Ok(());
        }
        let doc = serde_json::to_value(input).map_err(|e| AppError::BadRequest(e.to_string()))?;
        RequestValidator::validate(&doc, &rules)
    }
}

fn sort_rows<D, K>(rows: Vec<(D, Option<K>)>, sort: &[SortField]) -> Result<Vec<(D, Option<K>)>, AppError>
where
    D: serde::Serialize,
    K: Ord,
{
    let mut keyed: Vec<(Value, D, Option<K>)> = Vec::with_capacity(rows.len());
    for (dto, id) in rows {
        let doc = serde_json::to_value(&dto).map_err(|e| AppError::BadRequest(e.to_string()))?;
        keyed.push((doc, dto, id));
    }
    keyed.sort_by(|(a, _, id_a), (b, _, id_b)| {
        for field in sort {
            let ord = compare_values(sort_value(a, &field.field), sort_value(b, &field.field));
            let ord = match field.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        match (id_a, id_b) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    Ok(keyed.into_iter().map(|(_, dto, id)| (dto, id)).collect())
}
