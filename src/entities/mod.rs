pub mod blog_post;
pub mod category;
pub mod order;
pub mod product;
pub mod slide;
pub mod trusted_company;
pub mod user;

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Product specification sheet (`"RAM" -> "16 GB"`), stored as a JSON object.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema,
)]
pub struct ProductSpecs(pub BTreeMap<String, String>);

impl ProductSpecs {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, String>> for ProductSpecs {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Ordered list of strings (product features, blog tags), stored as a JSON array.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult, ToSchema,
)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn contains(&self, needle: &str) -> bool {
        self.0.iter().any(|item| item == needle)
    }
}

impl From<Vec<String>> for StringList {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}
