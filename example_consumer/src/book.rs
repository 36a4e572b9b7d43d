//! Book entity and its wire DTO.

use chrono::NaiveDate;
use crud_sdk::{Entity, EntityDto, ValidationRule};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookType {
    #[default]
    Undefined,
    Adventure,
    Biography,
    Dystopia,
    Fantastic,
    Horror,
    Science,
    ScienceFiction,
    Poetry,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Book {
    pub id: Option<Uuid>,
    pub name: String,
    pub book_type: BookType,
    pub publish_date: Option<NaiveDate>,
    pub price: f32,
}

impl Entity for Book {
    type Key = Uuid;

    fn id(&self) -> Option<&Uuid> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(rename = "type")]
    pub book_type: BookType,
    pub publish_date: Option<NaiveDate>,
    pub price: f32,
}

impl EntityDto<Book> for BookDto {
    fn from_entity(book: &Book) -> Self {
        BookDto {
            id: book.id,
            name: book.name.clone(),
            book_type: book.book_type,
            publish_date: book.publish_date,
            price: book.price,
        }
    }

    fn into_entity(self, id: Option<Uuid>) -> Book {
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
            ("name", ValidationRule::required().max_length(128)),
            ("price", ValidationRule::default().range(0.0, 10_000.0)),
            ("publishDate", ValidationRule::default().format("date")),
            (
                "type",
                ValidationRule::default().allowed(vec![
                    json!("Undefined"),
                    json!("Adventure"),
                    json!("Biography"),
                    json!("Dystopia"),
                    json!("Fantastic"),
                    json!("Horror"),
                    json!("Science"),
                    json!("ScienceFiction"),
                    json!("Poetry"),
                ]),
            ),
        ]
    }
}
