//! Book store: one `IBookAppService` exposing full CRUD plus `GET /book/byName?name=...`.
//!
//! Run from repo root: `cargo run -p example-consumer`
//! Set DATABASE_URL to store books in PostgreSQL; otherwise they live in memory.

mod book;

use book::{Book, BookDto};
use crud_sdk::{
    ensure_database_exists, AppError, Capability, CrudAppService, EntityDto, InMemoryRepository, Invocation,
    PgDocumentRepository, Reply, Repository, ServiceDefinition, ServiceRegistry, Settings,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const SERVICE: &str = "IBookAppService";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crud_sdk=info,example_consumer=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let definition = match settings.database_url.as_deref() {
        Some(database_url) => {
            ensure_database_exists(database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let repository = PgDocumentRepository::<Book>::new(pool, "public", "books");
            repository.ensure_table().await?;
            tracing::info!("storing books in postgres");
            book_service(Arc::new(repository), &settings)
        }
        None => {
            tracing::info!("DATABASE_URL not set, storing books in memory");
            book_service(Arc::new(InMemoryRepository::<Book>::new()), &settings)
        }
    };

    let app = ServiceRegistry::new().register(definition).build()?.router(&settings);
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("listening on http://{}{}", listener.local_addr()?, settings.route_prefix);
    axum::serve(listener, app).await?;
    Ok(())
}

fn book_service<R: Repository<Book>>(repository: Arc<R>, settings: &Settings) -> ServiceDefinition {
    let service = Arc::new(CrudAppService::<Book, BookDto, R>::new(SERVICE, repository).with_paging(settings.paging));
    let lookup = service.clone();
    ServiceDefinition::crud(service, &Capability::ALL).custom_method("GetByNameAsync", false, move |call: Invocation| {
        let service = lookup.clone();
        async move {
            let name = call
                .query
                .get("name")
                .cloned()
                .ok_or_else(|| AppError::BadRequest("name query parameter required".into()))?;
            let books = service.repository().list(None).await?;
            let found = books
                .iter()
                .find(|b| b.name == name)
                .ok_or_else(|| AppError::not_found("Book", &name))?;
            Reply::ok(&BookDto::from_entity(found))
        }
    })
}
