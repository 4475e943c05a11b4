pub mod error;
pub mod issue;
pub mod product;
pub mod report;

use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::error;

use crate::error::RepoError;
use common::QueryParams;
use common::settings::Database;

#[derive(Debug, Clone)]
pub struct Repo {
    pub pool: PgPool,
}

impl Repo {
    pub fn new(pool: PgPool) -> Repo {
        Repo { pool }
    }

    /// Connect from settings and bring the schema up to date.
    pub async fn connect(settings: &Database) -> Result<Repo, RepoError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.uri)
            .await
            .map_err(|err| {
                error!("Failed to connect to database: {err}");
                RepoError::DatabaseError("Failed to connect to database".to_string())
            })?;

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .map_err(|err| {
                error!("Failed to run migrations: {err}");
                RepoError::DatabaseError("Failed to run migrations".to_string())
            })?;

        Ok(Repo::new(pool))
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, RepoError> {
        self.pool.begin().await.map_err(|err| {
            error!("Failed to begin transaction: {err}");
            RepoError::TransactionError()
        })
    }

    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>, RepoError> {
        self.pool.acquire().await.map_err(|err| {
            error!("Failed to acquire connection: {err}");
            RepoError::TransactionError()
        })
    }

    pub async fn end(&self, transaction: Transaction<'static, Postgres>) -> Result<(), RepoError> {
        transaction.commit().await.map_err(|err| {
            error!("Failed to commit transaction: {err}");
            RepoError::TransactionError()
        })
    }

    pub fn build_query(
        builder: &mut QueryBuilder<Postgres>,
        params: &QueryParams,
        allowed_columns: &[&str],
        filter_columns: &[&str],
    ) -> Result<(), RepoError> {
        if let Some(filter) = &params.filter {
            if filter_columns.is_empty() {
                error!("No filter columns specified but filter was provided");
                return Err(RepoError::InvalidColumn("No filter columns specified".to_string()));
            }

            builder.push(" WHERE ");
            let mut separated = builder.separated(" OR ");
            for &col in filter_columns {
                if !allowed_columns.contains(&col) {
                    error!("Invalid column specified for filtering: {col}");
                    return Err(RepoError::InvalidColumn(col.to_string()));
                }
                separated.push(col);
                separated.push_unseparated(" ILIKE ");
                separated.push_bind_unseparated(format!("%{filter}%"));
            }
        }

        if !params.sorting.is_empty() {
            builder.push(" ORDER BY ");
            let mut separated = builder.separated(", ");

            for (col, col_sort) in &params.sorting {
                if !allowed_columns.contains(&col.as_str()) {
                    error!("Invalid column specified for sorting: {col}");
                    return Err(RepoError::InvalidColumn(col.clone()));
                }

                separated.push_unseparated(col);
                separated.push_unseparated(" ");
                separated.push_unseparated(col_sort.to_sql());
            }
        }

        if let Some(range) = &params.range {
            builder.push(" LIMIT ");
            builder.push_bind(range.len() as i64);
            builder.push(" OFFSET ");
            builder.push_bind(range.start as i64);
        }

        Ok(())
    }
}
