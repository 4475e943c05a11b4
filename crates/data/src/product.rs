use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default, sqlx::FromRow)]
pub struct Product {
    pub id: uuid::Uuid,
    pub name: String,
    /// Minimum crashed-app version accepted at ingestion, natural order.
    pub min_version: Option<String>,
    /// Platforms configured for this product. Reports for other platforms
    /// are rejected; the per-platform chart fans out over this list.
    pub allowed_platforms: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub min_version: Option<String>,
    pub allowed_platforms: Vec<String>,
}

impl From<Product> for NewProduct {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            min_version: product.min_version,
            allowed_platforms: product.allowed_platforms,
        }
    }
}
