use async_trait::async_trait;
use shared::models::{
    Family, FamilyInvitation, FamilyMember, FamilyRole, InvitationStatus, Memorial, MemorialFamily,
};

use super::PgStore;
use crate::db::{FamilyRepo, InvitationOutcome, Page, StoreResult};

#[async_trait]
impl FamilyRepo for PgStore {
    async fn create_family(&self, family: &Family, creator: &FamilyMember) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO families (id, name, description, creator_id, invite_code, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&family.id)
        .bind(&family.name)
        .bind(&family.description)
        .bind(&family.creator_id)
        .bind(&family.invite_code)
        .bind(family.created_at)
        .bind(family.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_member_row(&mut *tx, creator).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_family(&self, id: &str) -> StoreResult<Option<Family>> {
        Ok(sqlx::query_as("SELECT * FROM families WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_family_by_code(&self, invite_code: &str) -> StoreResult<Option<Family>> {
        Ok(sqlx::query_as("SELECT * FROM families WHERE invite_code = $1")
            .bind(invite_code)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_user_families(
        &self,
        user_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<Family>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM family_members WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as(
            "SELECT f.* FROM families f
             JOIN family_members fm ON fm.family_id = f.id
             WHERE fm.user_id = $1
             ORDER BY fm.joined_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn update_family(&self, family: &Family) -> StoreResult<()> {
        sqlx::query("UPDATE families SET name = $1, description = $2, updated_at = $3 WHERE id = $4")
            .bind(&family.name)
            .bind(&family.description)
            .bind(family.updated_at)
            .bind(&family.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_family(&self, id: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        // Children before parents; genealogy parent links are cleared first
        let statements = [
            "DELETE FROM collective_worship_participants WHERE activity_id IN
                 (SELECT id FROM family_activities WHERE family_id = $1)",
            "DELETE FROM family_activities WHERE family_id = $1",
            "DELETE FROM memorial_reminders WHERE family_id = $1",
            "DELETE FROM family_traditions WHERE family_id = $1",
            "DELETE FROM family_stories WHERE family_id = $1",
            "UPDATE family_genealogy SET parent_id = NULL WHERE family_id = $1",
            "DELETE FROM family_genealogy WHERE family_id = $1",
            "DELETE FROM visitor_permissions WHERE family_id = $1",
            "DELETE FROM family_invitations WHERE family_id = $1",
            "DELETE FROM memorial_families WHERE family_id = $1",
            "DELETE FROM family_members WHERE family_id = $1",
            "DELETE FROM families WHERE id = $1",
        ];
        for sql in statements {
            sqlx::query(sql).bind(id).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_member(
        &self,
        family_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<FamilyMember>> {
        Ok(
            sqlx::query_as("SELECT * FROM family_members WHERE family_id = $1 AND user_id = $2")
                .bind(family_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn insert_member(&self, member: &FamilyMember) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_member_row(&mut *conn, member).await
    }

    async fn delete_member(&self, family_id: &str, user_id: &str) -> StoreResult<bool> {
        let rows = sqlx::query(
            "DELETE FROM family_members
             WHERE family_id = $1 AND user_id = $2
               AND user_id <> (SELECT creator_id FROM families WHERE id = $1)",
        )
        .bind(family_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(rows > 0)
    }

    async fn update_member_role(
        &self,
        family_id: &str,
        user_id: &str,
        role: FamilyRole,
    ) -> StoreResult<bool> {
        let rows =
            sqlx::query("UPDATE family_members SET role = $1 WHERE family_id = $2 AND user_id = $3")
                .bind(role)
                .bind(family_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(rows > 0)
    }

    async fn list_members(
        &self,
        family_id: &str,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Page<FamilyMember>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM family_members WHERE family_id = $1")
                .bind(family_id)
                .fetch_one(&self.pool)
                .await?;

        let rows = sqlx::query_as(
            "SELECT * FROM family_members WHERE family_id = $1
             ORDER BY (role = 'admin') DESC, joined_at ASC LIMIT $2 OFFSET $3",
        )
        .bind(family_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    async fn link_memorial(&self, link: &MemorialFamily) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO memorial_families (id, memorial_id, family_id, created_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&link.id)
        .bind(&link.memorial_id)
        .bind(&link.family_id)
        .bind(link.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn unlink_memorial(&self, family_id: &str, memorial_id: &str) -> StoreResult<bool> {
        let rows =
            sqlx::query("DELETE FROM memorial_families WHERE family_id = $1 AND memorial_id = $2")
                .bind(family_id)
                .bind(memorial_id)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(rows > 0)
    }

    async fn is_memorial_linked(&self, family_id: &str, memorial_id: &str) -> StoreResult<bool> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM memorial_families WHERE family_id = $1 AND memorial_id = $2)",
        )
        .bind(family_id)
        .bind(memorial_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_family_memorials(&self, family_id: &str) -> StoreResult<Vec<Memorial>> {
        Ok(sqlx::query_as(
            "SELECT m.* FROM memorials m
             JOIN memorial_families mf ON mf.memorial_id = m.id
             WHERE mf.family_id = $1 AND m.status = 'active'
             ORDER BY mf.created_at DESC",
        )
        .bind(family_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn member_family_ids_for_memorial(
        &self,
        memorial_id: &str,
        user_id: &str,
    ) -> StoreResult<Vec<String>> {
        Ok(sqlx::query_scalar(
            "SELECT mf.family_id FROM memorial_families mf
             JOIN family_members fm ON fm.family_id = mf.family_id
             WHERE mf.memorial_id = $1 AND fm.user_id = $2",
        )
        .bind(memorial_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn has_open_invitation(&self, family_id: &str, invitee_id: &str) -> StoreResult<bool> {
        Ok(sqlx::query_scalar(
            "SELECT EXISTS (
                 SELECT 1 FROM family_invitations
                 WHERE family_id = $1 AND invitee_id = $2 AND status IN ('pending', 'accepted')
             )",
        )
        .bind(family_id)
        .bind(invitee_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn insert_invitations(&self, invitations: &[FamilyInvitation]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for inv in invitations {
            sqlx::query(
                "INSERT INTO family_invitations
                     (id, family_id, inviter_id, invitee_id, message, status, expires_at, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(&inv.id)
            .bind(&inv.family_id)
            .bind(&inv.inviter_id)
            .bind(&inv.invitee_id)
            .bind(&inv.message)
            .bind(inv.status)
            .bind(inv.expires_at)
            .bind(inv.created_at)
            .bind(inv.updated_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_invitation(&self, id: &str) -> StoreResult<Option<FamilyInvitation>> {
        Ok(sqlx::query_as("SELECT * FROM family_invitations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_pending_invitations(
        &self,
        invitee_id: &str,
        now: i64,
    ) -> StoreResult<Vec<FamilyInvitation>> {
        Ok(sqlx::query_as(
            "SELECT * FROM family_invitations
             WHERE invitee_id = $1 AND status = 'pending' AND expires_at > $2
             ORDER BY created_at DESC",
        )
        .bind(invitee_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn respond_invitation(
        &self,
        id: &str,
        status: InvitationStatus,
        member: Option<&FamilyMember>,
        now: i64,
    ) -> StoreResult<InvitationOutcome> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            "UPDATE family_invitations SET status = $1, updated_at = $2
             WHERE id = $3 AND status = 'pending'",
        )
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if rows == 0 {
            return Ok(InvitationOutcome::NotPending);
        }

        let mut joined = false;
        if let Some(member) = member {
            let inserted = sqlx::query(
                "INSERT INTO family_members (id, family_id, user_id, role, joined_at)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (family_id, user_id) DO NOTHING",
            )
            .bind(&member.id)
            .bind(&member.family_id)
            .bind(&member.user_id)
            .bind(member.role)
            .bind(member.joined_at)
            .execute(&mut *tx)
            .await?
            .rows_affected();
            joined = inserted > 0;
        }

        tx.commit().await?;
        Ok(InvitationOutcome::Responded { joined })
    }
}

async fn insert_member_row(
    conn: &mut sqlx::PgConnection,
    member: &FamilyMember,
) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO family_members (id, family_id, user_id, role, joined_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&member.id)
    .bind(&member.family_id)
    .bind(&member.user_id)
    .bind(member.role)
    .bind(member.joined_at)
    .execute(conn)
    .await?;
    Ok(())
}
