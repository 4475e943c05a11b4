use sqlx::{Postgres, QueryBuilder};
use tracing::error;
use uuid::Uuid;

use crate::{Repo, error::RepoError};
use common::QueryParams;
use data::product::{NewProduct, Product};

pub struct ProductRepo {}

impl ProductRepo {
    pub async fn get_by_id(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: Uuid,
    ) -> Result<Option<Product>, RepoError> {
        sqlx::query_as::<_, Product>(
            r#"
                SELECT *
                FROM faultline.products
                WHERE faultline.products.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|err| {
            error!("Failed to retrieve product {id}: {err}");
            RepoError::DatabaseError("Failed to retrieve product".to_string())
        })
    }

    pub async fn get_by_name(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        name: &str,
    ) -> Result<Option<Product>, RepoError> {
        sqlx::query_as::<_, Product>(
            r#"
                SELECT *
                FROM faultline.products
                WHERE faultline.products.name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(|err| {
            error!("Failed to retrieve product by name {name}: {err}");
            RepoError::DatabaseError("Failed to retrieve product by name".to_string())
        })
    }

    pub async fn get_all(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        params: QueryParams,
    ) -> Result<Vec<Product>, RepoError> {
        let mut builder = QueryBuilder::new("SELECT * from faultline.products");
        Repo::build_query(
            &mut builder,
            &params,
            &["id", "name", "min_version", "created_at", "updated_at"],
            &["name"],
        )?;

        let query = builder.build_query_as();

        query.fetch_all(executor).await.map_err(|err| {
            error!("Failed to retrieve all products: {err}");
            RepoError::DatabaseError("Failed to retrieve products".to_string())
        })
    }

    pub async fn create(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        product: NewProduct,
    ) -> Result<Uuid, RepoError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
                INSERT INTO faultline.products
                  (
                    name,
                    min_version,
                    allowed_platforms
                  )
                VALUES ($1, $2, $3)
                RETURNING
                  id
            "#,
        )
        .bind(&product.name)
        .bind(&product.min_version)
        .bind(&product.allowed_platforms)
        .fetch_one(executor)
        .await
        .map_err(|err| {
            error!("Failed to create product: {err}");
            RepoError::DatabaseError("Failed to create product".to_string())
        })
    }

    pub async fn update(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        product: Product,
    ) -> Result<Option<Uuid>, RepoError> {
        sqlx::query_scalar::<_, Uuid>(
            r#"
                UPDATE faultline.products
                SET name = $1, min_version = $2, allowed_platforms = $3
                WHERE id = $4
                RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(&product.min_version)
        .bind(&product.allowed_platforms)
        .bind(product.id)
        .fetch_optional(executor)
        .await
        .map_err(|err| {
            error!("Failed to update product {}: {err}", product.id);
            RepoError::DatabaseError("Failed to update product".to_string())
        })
    }

    pub async fn remove(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
        id: Uuid,
    ) -> Result<(), RepoError> {
        sqlx::query(
            r#"
                DELETE FROM faultline.products
                WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(executor)
        .await
        .map_err(|err| {
            error!("Failed to remove product {id}: {err}");
            RepoError::DatabaseError("Failed to remove product".to_string())
        })?;

        Ok(())
    }

    pub async fn count(
        executor: impl sqlx::Executor<'_, Database = Postgres>,
    ) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            r#"
                SELECT COUNT(*)
                FROM faultline.products
            "#,
        )
        .fetch_one(executor)
        .await
        .map_err(|err| {
            error!("Failed to count products: {err}");
            RepoError::DatabaseError("Failed to count products".to_string())
        })
    }
}
