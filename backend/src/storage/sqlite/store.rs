use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;
use std::marker::PhantomData;

use super::connection::DbConnection;
use super::records::{SqlRecord, SqlValue};
use crate::storage::traits::{EntityStore, StoreError, StoreResult};

/// Structured store: one table per entity type in the SQL database
pub struct SqliteStore<E> {
    db: DbConnection,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for SqliteStore<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

fn bind_values<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: Vec<SqlValue>,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            SqlValue::Text(text) => query.bind(text),
            SqlValue::Integer(number) => query.bind(number),
        };
    }
    query
}

fn db_error(collection: &str, err: impl std::fmt::Display) -> StoreError {
    warn!("Database error on {}: {}", collection, err);
    StoreError::Unavailable(format!("database error on {}: {}", collection, err))
}

impl<E: SqlRecord> SqliteStore<E> {
    pub fn new(db: DbConnection) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    fn select_sql(filter_column: &str) -> String {
        format!(
            "SELECT {} FROM {} WHERE {} = ? ORDER BY {}",
            E::COLUMNS.join(", "),
            E::COLLECTION,
            filter_column,
            E::ORDER_BY
        )
    }

    fn insert_sql() -> String {
        let placeholders = vec!["?"; E::COLUMNS.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::COLLECTION,
            E::COLUMNS.join(", "),
            placeholders
        )
    }

    fn update_sql() -> String {
        let assignments: Vec<String> = E::COLUMNS[1..]
            .iter()
            .map(|column| format!("{} = ?", column))
            .collect();
        format!(
            "UPDATE {} SET {} WHERE id = ?",
            E::COLLECTION,
            assignments.join(", ")
        )
    }
}

#[async_trait]
impl<E: SqlRecord> EntityStore<E> for SqliteStore<E> {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self, user_id: &str) -> StoreResult<Vec<E>> {
        let sql = Self::select_sql("user_id");
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| db_error(E::COLLECTION, e))?;

        rows.iter()
            .map(|row| E::from_row(row).map_err(|e| db_error(E::COLLECTION, e)))
            .collect()
    }

    async fn get(&self, id: &str) -> StoreResult<Option<E>> {
        let sql = Self::select_sql("id");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| db_error(E::COLLECTION, e))?;

        row.map(|r| E::from_row(&r).map_err(|e| db_error(E::COLLECTION, e)))
            .transpose()
    }

    async fn insert(&self, record: &E) -> StoreResult<()> {
        let sql = Self::insert_sql();
        bind_values(sqlx::query(&sql), record.to_values())
            .execute(self.db.pool())
            .await
            .map_err(|e| db_error(E::COLLECTION, e))?;

        debug!("Inserted {} into {}", record.id(), E::COLLECTION);
        Ok(())
    }

    async fn modify(&self, id: &str, patch: E::Patch, at: DateTime<Utc>) -> StoreResult<E> {
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| db_error(E::COLLECTION, e))?;

        let select = Self::select_sql("id");
        let row = sqlx::query(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error(E::COLLECTION, e))?
            .ok_or_else(|| StoreError::not_found(E::COLLECTION, id))?;

        let mut record = E::from_row(&row).map_err(|e| db_error(E::COLLECTION, e))?;
        record.apply_patch(patch);
        record.touch(at);

        let mut values = record.to_values();
        values.remove(0);
        values.push(SqlValue::Text(Some(id.to_string())));

        let update = Self::update_sql();
        bind_values(sqlx::query(&update), values)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error(E::COLLECTION, e))?;

        tx.commit().await.map_err(|e| db_error(E::COLLECTION, e))?;
        Ok(record)
    }

    async fn remove(&self, id: &str) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", E::COLLECTION);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(self.db.pool())
            .await
            .map_err(|e| db_error(E::COLLECTION, e))?;

        Ok(result.rows_affected() > 0)
    }
}
