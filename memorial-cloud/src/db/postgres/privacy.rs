use async_trait::async_trait;
use shared::models::{
    AccessRequest, AccessRequestStatus, BlacklistEntry, PermissionType, PrivacyLevel,
    VisitorPermission,
};
use sqlx::PgConnection;

use super::PgStore;
use crate::db::{Page, PrivacyRepo, StoreResult};

#[async_trait]
impl PrivacyRepo for PgStore {
    async fn replace_privacy(
        &self,
        memorial_id: &str,
        level: PrivacyLevel,
        grants: &[VisitorPermission],
        blacklist: &[BlacklistEntry],
        now: i64,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE memorials SET privacy_level = $1, updated_at = $2 WHERE id = $3")
            .bind(level)
            .bind(now)
            .bind(memorial_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM visitor_permissions WHERE memorial_id = $1")
            .bind(memorial_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM visitor_blacklist WHERE memorial_id = $1")
            .bind(memorial_id)
            .execute(&mut *tx)
            .await?;

        for grant in grants {
            insert_grant(&mut *tx, grant).await?;
        }
        for entry in blacklist {
            insert_blacklist_row(&mut *tx, entry).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_grants(&self, memorial_id: &str) -> StoreResult<Vec<VisitorPermission>> {
        Ok(sqlx::query_as(
            "SELECT * FROM visitor_permissions WHERE memorial_id = $1 ORDER BY created_at",
        )
        .bind(memorial_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn has_user_grant(
        &self,
        memorial_id: &str,
        user_id: &str,
        permission: PermissionType,
    ) -> StoreResult<bool> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM visitor_permissions
                 WHERE memorial_id = $1 AND user_id = $2
                   AND permission_type = $3 AND is_allowed
             )",
        )
        .bind(memorial_id)
        .bind(user_id)
        .bind(permission)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn has_family_grant(
        &self,
        memorial_id: &str,
        user_id: &str,
        permission: PermissionType,
    ) -> StoreResult<bool> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM visitor_permissions vp
                 JOIN family_members fm ON fm.family_id = vp.family_id
                 WHERE vp.memorial_id = $1 AND fm.user_id = $2
                   AND vp.permission_type = $3 AND vp.is_allowed
             )",
        )
        .bind(memorial_id)
        .bind(user_id)
        .bind(permission)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn is_blacklisted(&self, memorial_id: &str, user_id: &str) -> StoreResult<bool> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM visitor_blacklist WHERE memorial_id = $1 AND user_id = $2)",
        )
        .bind(memorial_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_blacklist(&self, memorial_id: &str) -> StoreResult<Vec<BlacklistEntry>> {
        Ok(sqlx::query_as(
            "SELECT * FROM visitor_blacklist WHERE memorial_id = $1 ORDER BY created_at DESC",
        )
        .bind(memorial_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn add_to_blacklist(&self, entry: &BlacklistEntry) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        insert_blacklist_row(&mut *tx, entry).await?;
        sqlx::query("DELETE FROM visitor_permissions WHERE memorial_id = $1 AND user_id = $2")
            .bind(&entry.memorial_id)
            .bind(&entry.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn remove_from_blacklist(&self, memorial_id: &str, user_id: &str) -> StoreResult<bool> {
        let rows =
            sqlx::query("DELETE FROM visitor_blacklist WHERE memorial_id = $1 AND user_id = $2")
                .bind(memorial_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(rows > 0)
    }

    async fn insert_access_request(&self, request: &AccessRequest) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO access_requests (id, memorial_id, user_id, message, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&request.id)
        .bind(&request.memorial_id)
        .bind(&request.user_id)
        .bind(&request.message)
        .bind(request.status)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_access_request(&self, id: &str) -> StoreResult<Option<AccessRequest>> {
        Ok(sqlx::query_as("SELECT * FROM access_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_access_requests(
        &self,
        memorial_id: &str,
        status: Option<AccessRequestStatus>,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<AccessRequest>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM access_requests
             WHERE memorial_id = $1 AND ($2::text IS NULL OR status = $2)",
        )
        .bind(memorial_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as(
            "SELECT * FROM access_requests
             WHERE memorial_id = $1 AND ($2::text IS NULL OR status = $2)
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(memorial_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn resolve_access_request(
        &self,
        id: &str,
        status: AccessRequestStatus,
        grants: &[VisitorPermission],
        now: i64,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            "UPDATE access_requests SET status = $1, updated_at = $2
             WHERE id = $3 AND status = 'pending'",
        )
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows == 0 {
            return Ok(false);
        }

        for grant in grants {
            insert_grant(&mut *tx, grant).await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

async fn insert_grant(conn: &mut PgConnection, grant: &VisitorPermission) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO visitor_permissions
             (id, memorial_id, family_id, user_id, permission_type, is_allowed, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(&grant.id)
    .bind(&grant.memorial_id)
    .bind(&grant.family_id)
    .bind(&grant.user_id)
    .bind(grant.permission_type)
    .bind(grant.is_allowed)
    .bind(grant.created_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn insert_blacklist_row(conn: &mut PgConnection, entry: &BlacklistEntry) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO visitor_blacklist (id, memorial_id, user_id, reason, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&entry.id)
    .bind(&entry.memorial_id)
    .bind(&entry.user_id)
    .bind(&entry.reason)
    .bind(entry.created_at)
    .execute(conn)
    .await?;
    Ok(())
}
