#![allow(dead_code)]

use chrono::NaiveDate;
use crud_sdk::{
    Capability, CrudAppService, Entity, EntityDto, InMemoryRepository, ProxyClient, RouterTransport,
    ServiceDefinition, ServiceRegistry, Settings, ValidationRule,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Once};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: Option<i64>,
    pub name: String,
    pub book_type: String,
    pub publish_date: Option<NaiveDate>,
    pub price: f64,
}

impl Entity for Book {
    type Key = i64;

    fn id(&self) -> Option<&i64> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(rename = "type")]
    pub book_type: String,
    pub publish_date: Option<NaiveDate>,
    pub price: f64,
}

impl BookDto {
    pub fn new(name: &str, book_type: &str, price: f64) -> Self {
        BookDto {
            name: name.to_string(),
            book_type: book_type.to_string(),
            price,
            ..Default::default()
        }
    }
}

impl EntityDto<Book> for BookDto {
    fn from_entity(book: &Book) -> Self {
        BookDto {
            id: book.id,
            name: book.name.clone(),
            book_type: book.book_type.clone(),
            publish_date: book.publish_date,
            price: book.price,
        }
    }

    fn into_entity(self, id: Option<i64>) -> Book {
        Book {
            id,
            name: self.name,
            book_type: self.book_type,
            publish_date: self.publish_date,
            price: self.price,
        }
    }

    fn validation_rules() -> Vec<(&'static str, ValidationRule)> {
        vec![
            ("name", ValidationRule::required().max_length(64)),
            ("price", ValidationRule::default().range(0.0, 1000.0)),
        ]
    }
}

pub type BookRepository = InMemoryRepository<Book>;
pub type BookService = CrudAppService<Book, BookDto, BookRepository>;

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("crud_sdk=debug"))
            .with_test_writer()
            .try_init();
    });
}

pub fn book_service() -> (Arc<BookService>, Arc<BookRepository>) {
    init_tracing();
    let repository = Arc::new(BookRepository::new());
    let service = Arc::new(BookService::new("IBookAppService", repository.clone()));
    (service, repository)
}

pub fn book_definition(service: Arc<BookService>) -> ServiceDefinition {
    ServiceDefinition::crud(service, &Capability::ALL)
}

/// In-process client over the router built from `definitions`, generated from `/api-definition`.
pub async fn client_for(definitions: Vec<ServiceDefinition>) -> ProxyClient {
    let router = router_for(definitions);
    ProxyClient::discover(Arc::new(RouterTransport::new(router)))
        .await
        .expect("discover")
}

pub fn router_for(definitions: Vec<ServiceDefinition>) -> axum::Router {
    let registry = definitions
        .into_iter()
        .fold(ServiceRegistry::new(), |registry, d| registry.register(d));
    registry.build().expect("build").router(&Settings::default())
}
