//! Postgres adapters. Schema lives in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lovebucket_model::{BucketKind, CopyID, DestinationID, MediaID, UserID};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{LikeError, Result};
use crate::ports::{
    CollectionLocator, CopyLink, CopyLinkRepository, LinkInsert,
};

const LINK_COLUMNS: &str = "copy_id, source_id, destination_id, owner_id, bucket_kind, file_name, created_at";

fn storage(context: &str) -> impl FnOnce(sqlx::Error) -> LikeError + '_ {
    move |e| LikeError::Storage(format!("{context}: {e}"))
}

fn read_kind(row: &PgRow) -> Result<BucketKind> {
    let kind: String = row
        .try_get("bucket_kind")
        .map_err(|e| LikeError::Internal(format!("Failed to read bucket_kind: {e}")))?;
    kind.parse::<BucketKind>()
        .map_err(|e| LikeError::Internal(format!("Unknown bucket_kind {kind:?}: {e}")))
}

#[derive(Debug, Clone)]
pub struct PostgresCopyLinkRepository {
    pool: PgPool,
}

impl PostgresCopyLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_row(row: &PgRow) -> Result<CopyLink> {
        let copy_id: Uuid = row
            .try_get("copy_id")
            .map_err(|e| LikeError::Internal(format!("Failed to read copy_id: {e}")))?;
        let source_id: Uuid = row
            .try_get("source_id")
            .map_err(|e| LikeError::Internal(format!("Failed to read source_id: {e}")))?;
        let destination_id: Uuid = row
            .try_get("destination_id")
            .map_err(|e| LikeError::Internal(format!("Failed to read destination_id: {e}")))?;
        let owner_id: Uuid = row
            .try_get("owner_id")
            .map_err(|e| LikeError::Internal(format!("Failed to read owner_id: {e}")))?;
        let file_name: String = row
            .try_get("file_name")
            .map_err(|e| LikeError::Internal(format!("Failed to read file_name: {e}")))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| LikeError::Internal(format!("Failed to read created_at: {e}")))?;

        Ok(CopyLink {
            source_id: MediaID(source_id),
            copy_id: CopyID(copy_id),
            destination_id: DestinationID(destination_id),
            owner_id: UserID(owner_id),
            kind: read_kind(row)?,
            file_name,
            created_at,
        })
    }

    async fn fetch_conflicting(&self, link: &CopyLink) -> Result<Option<CopyLink>> {
        let query = format!(
            "SELECT {LINK_COLUMNS} FROM copy_links
             WHERE copy_id = $1 OR (source_id = $2 AND destination_id = $3)
             LIMIT 1"
        );
        let row = sqlx::query(&query)
            .bind(link.copy_id.to_uuid())
            .bind(link.source_id.to_uuid())
            .bind(link.destination_id.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(storage("Failed to load conflicting copy link"))?;

        row.as_ref().map(Self::map_row).transpose()
    }
}

#[async_trait]
impl CopyLinkRepository for PostgresCopyLinkRepository {
    async fn insert(&self, link: CopyLink) -> Result<LinkInsert> {
        let result = sqlx::query(
            r#"
            INSERT INTO copy_links (
                copy_id, source_id, destination_id, owner_id,
                bucket_kind, file_name, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(link.copy_id.to_uuid())
        .bind(link.source_id.to_uuid())
        .bind(link.destination_id.to_uuid())
        .bind(link.owner_id.to_uuid())
        .bind(link.kind.as_str())
        .bind(&link.file_name)
        .bind(link.created_at)
        .execute(self.pool())
        .await
        .map_err(storage("Failed to insert copy link"))?;

        if result.rows_affected() == 1 {
            return Ok(LinkInsert::Inserted);
        }

        match self.fetch_conflicting(&link).await? {
            Some(existing) => Ok(LinkInsert::Duplicate(existing)),
            None => Err(LikeError::Storage(format!(
                "copy link {} conflicted but no existing row was found",
                link.copy_id
            ))),
        }
    }

    async fn find_copy(
        &self,
        source_id: MediaID,
        destination_id: DestinationID,
    ) -> Result<Option<CopyLink>> {
        let query = format!(
            "SELECT {LINK_COLUMNS} FROM copy_links
             WHERE source_id = $1 AND destination_id = $2"
        );
        let row = sqlx::query(&query)
            .bind(source_id.to_uuid())
            .bind(destination_id.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(storage("Failed to find copy link"))?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn find_by_copy(&self, copy_id: CopyID) -> Result<Option<CopyLink>> {
        let query =
            format!("SELECT {LINK_COLUMNS} FROM copy_links WHERE copy_id = $1");
        let row = sqlx::query(&query)
            .bind(copy_id.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(storage("Failed to find copy link by copy"))?;

        row.as_ref().map(Self::map_row).transpose()
    }

    async fn list_by_source(&self, source_id: MediaID) -> Result<Vec<CopyLink>> {
        let query = format!(
            "SELECT {LINK_COLUMNS} FROM copy_links
             WHERE source_id = $1 ORDER BY created_at"
        );
        let rows = sqlx::query(&query)
            .bind(source_id.to_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(storage("Failed to list copies of source"))?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn list_by_destination(
        &self,
        destination_id: DestinationID,
    ) -> Result<Vec<CopyLink>> {
        let query = format!(
            "SELECT {LINK_COLUMNS} FROM copy_links
             WHERE destination_id = $1 ORDER BY created_at"
        );
        let rows = sqlx::query(&query)
            .bind(destination_id.to_uuid())
            .fetch_all(self.pool())
            .await
            .map_err(storage("Failed to list copies in destination"))?;

        rows.iter().map(Self::map_row).collect()
    }

    async fn delete_by_copy(&self, copy_id: CopyID) -> Result<bool> {
        let result = sqlx::query("DELETE FROM copy_links WHERE copy_id = $1")
            .bind(copy_id.to_uuid())
            .execute(self.pool())
            .await
            .map_err(storage("Failed to delete copy link"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_destination(
        &self,
        destination_id: DestinationID,
    ) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM copy_links WHERE destination_id = $1")
                .bind(destination_id.to_uuid())
                .execute(self.pool())
                .await
                .map_err(storage("Failed to delete destination links"))?;

        Ok(result.rows_affected())
    }

    async fn count_in_destination(
        &self,
        destination_id: DestinationID,
    ) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM copy_links WHERE destination_id = $1",
        )
        .bind(destination_id.to_uuid())
        .fetch_one(self.pool())
        .await
        .map_err(storage("Failed to count copy links"))?;

        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[derive(Debug, Clone)]
pub struct PostgresCollectionLocator {
    pool: PgPool,
}

impl PostgresCollectionLocator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CollectionLocator for PostgresCollectionLocator {
    async fn destination_for(
        &self,
        user_id: UserID,
        kind: BucketKind,
    ) -> Result<Option<DestinationID>> {
        let destination: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT destination_id FROM user_buckets
            WHERE user_id = $1 AND bucket_kind = $2
            "#,
        )
        .bind(user_id.to_uuid())
        .bind(kind.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(storage("Failed to look up collection"))?;

        Ok(destination.map(DestinationID))
    }

    async fn owner_of(
        &self,
        destination_id: DestinationID,
    ) -> Result<Option<(UserID, BucketKind)>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, bucket_kind FROM user_buckets
            WHERE destination_id = $1
            "#,
        )
        .bind(destination_id.to_uuid())
        .fetch_optional(self.pool())
        .await
        .map_err(storage("Failed to look up collection owner"))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let user_id: Uuid = row
            .try_get("user_id")
            .map_err(|e| LikeError::Internal(format!("Failed to read user_id: {e}")))?;
        Ok(Some((UserID(user_id), read_kind(&row)?)))
    }

    async fn assign(
        &self,
        user_id: UserID,
        kind: BucketKind,
        destination_id: DestinationID,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_buckets (user_id, bucket_kind, destination_id)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id.to_uuid())
        .bind(kind.as_str())
        .bind(destination_id.to_uuid())
        .execute(self.pool())
        .await
        .map_err(storage("Failed to assign collection"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn destinations_of(
        &self,
        user_id: UserID,
    ) -> Result<Vec<(BucketKind, DestinationID)>> {
        let rows = sqlx::query(
            r#"
            SELECT bucket_kind, destination_id FROM user_buckets
            WHERE user_id = $1
            ORDER BY bucket_kind
            "#,
        )
        .bind(user_id.to_uuid())
        .fetch_all(self.pool())
        .await
        .map_err(storage("Failed to list user collections"))?;

        rows.iter()
            .map(|row| {
                let destination_id: Uuid =
                    row.try_get("destination_id").map_err(|e| {
                        LikeError::Internal(format!(
                            "Failed to read destination_id: {e}"
                        ))
                    })?;
                Ok((read_kind(row)?, DestinationID(destination_id)))
            })
            .collect()
    }

    async fn release(&self, destination_id: DestinationID) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM user_buckets WHERE destination_id = $1")
                .bind(destination_id.to_uuid())
                .execute(self.pool())
                .await
                .map_err(storage("Failed to release collection"))?;

        Ok(result.rows_affected() > 0)
    }
}
