//! Registration repository for database operations.
//!
//! The partial unique index on (project_id, identity) for `registered` rows
//! is the storage-level backstop for the one-active-registration invariant;
//! the engine's pre-check is only a fast path. Cancellation and guest-count
//! edits are guarded updates so concurrent mutators cannot double-apply.

use async_trait::async_trait;
use domain::error::StoreError;
use domain::models::{Identity, NewRegistration, Registration};
use domain::store::RegistrationStore;
use sqlx::PgPool;

use crate::entities::RegistrationEntity;
use crate::metrics::QueryTimer;
use crate::repositories::map_sqlx_error;

/// PostgreSQL-backed [`RegistrationStore`].
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_domain(entity: RegistrationEntity) -> Result<Registration, StoreError> {
    entity.try_into()
}

fn into_domain_opt(
    entity: Option<RegistrationEntity>,
) -> Result<Option<Registration>, StoreError> {
    entity.map(TryInto::try_into).transpose()
}

fn into_domain_vec(entities: Vec<RegistrationEntity>) -> Result<Vec<Registration>, StoreError> {
    entities.into_iter().map(TryInto::try_into).collect()
}

#[async_trait]
impl RegistrationStore for RegistrationRepository {
    async fn create(&self, new: NewRegistration) -> Result<Registration, StoreError> {
        let timer = QueryTimer::new("create_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            INSERT INTO registrations (project_id, identity, guest_count, lead_interest, first_name, last_name, contact_email, phone, text_permission)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, project_id, identity, status, guest_count, lead_interest, first_name, last_name, contact_email, phone, text_permission, created_at, updated_at
            "#,
        )
        .bind(new.project_id)
        .bind(new.identity.key())
        .bind(new.guest_count)
        .bind(new.lead_interest)
        .bind(&new.contact.first_name)
        .bind(&new.contact.last_name)
        .bind(&new.contact.email)
        .bind(&new.contact.phone)
        .bind(new.contact.text_permission)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error).and_then(into_domain)
    }

    async fn find(&self, id: i64) -> Result<Option<Registration>, StoreError> {
        let timer = QueryTimer::new("find_registration_by_id");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT id, project_id, identity, status, guest_count, lead_interest, first_name, last_name, contact_email, phone, text_permission, created_at, updated_at
            FROM registrations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error).and_then(into_domain_opt)
    }

    async fn find_active(
        &self,
        project_id: i64,
        identity: &Identity,
    ) -> Result<Option<Registration>, StoreError> {
        let timer = QueryTimer::new("find_active_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT id, project_id, identity, status, guest_count, lead_interest, first_name, last_name, contact_email, phone, text_permission, created_at, updated_at
            FROM registrations
            WHERE project_id = $1 AND identity = $2 AND status = 'registered'
            "#,
        )
        .bind(project_id)
        .bind(identity.key())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error).and_then(into_domain_opt)
    }

    async fn find_active_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<Registration>, StoreError> {
        let timer = QueryTimer::new("find_active_by_identity");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT id, project_id, identity, status, guest_count, lead_interest, first_name, last_name, contact_email, phone, text_permission, created_at, updated_at
            FROM registrations
            WHERE identity = $1 AND status = 'registered'
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(identity.key())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error).and_then(into_domain_opt)
    }

    async fn find_latest(
        &self,
        project_id: i64,
        identity: &Identity,
    ) -> Result<Option<Registration>, StoreError> {
        let timer = QueryTimer::new("find_latest_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT id, project_id, identity, status, guest_count, lead_interest, first_name, last_name, contact_email, phone, text_permission, created_at, updated_at
            FROM registrations
            WHERE project_id = $1 AND identity = $2
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(project_id)
        .bind(identity.key())
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error).and_then(into_domain_opt)
    }

    async fn cancel(&self, id: i64) -> Result<Option<Registration>, StoreError> {
        let timer = QueryTimer::new("cancel_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            UPDATE registrations
            SET status = 'cancelled', updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND status = 'registered'
            RETURNING id, project_id, identity, status, guest_count, lead_interest, first_name, last_name, contact_email, phone, text_permission, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error).and_then(into_domain_opt)
    }

    async fn update_guest_count(
        &self,
        id: i64,
        expected: i32,
        new_count: i32,
    ) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("update_registration_guest_count");
        let result = sqlx::query(
            r#"
            UPDATE registrations
            SET guest_count = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = 'registered' AND guest_count = $3
            "#,
        )
        .bind(new_count)
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await;
        timer.record();
        result
            .map(|r| r.rows_affected() > 0)
            .map_err(map_sqlx_error)
    }

    async fn delete(&self, id: i64) -> Result<Option<Registration>, StoreError> {
        let timer = QueryTimer::new("delete_registration");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            DELETE FROM registrations
            WHERE id = $1
            RETURNING id, project_id, identity, status, guest_count, lead_interest, first_name, last_name, contact_email, phone, text_permission, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error).and_then(into_domain_opt)
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<Registration>, StoreError> {
        let timer = QueryTimer::new("list_registrations_by_project");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT id, project_id, identity, status, guest_count, lead_interest, first_name, last_name, contact_email, phone, text_permission, created_at, updated_at
            FROM registrations
            WHERE project_id = $1
            ORDER BY status, created_at
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error).and_then(into_domain_vec)
    }

    async fn list_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Registration>, StoreError> {
        let timer = QueryTimer::new("list_registrations_by_identity");
        let result = sqlx::query_as::<_, RegistrationEntity>(
            r#"
            SELECT id, project_id, identity, status, guest_count, lead_interest, first_name, last_name, contact_email, phone, text_permission, created_at, updated_at
            FROM registrations
            WHERE identity = $1
            ORDER BY id
            "#,
        )
        .bind(identity.key())
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error).and_then(into_domain_vec)
    }

    async fn occupied_seats(&self, project_id: i64) -> Result<i64, StoreError> {
        let timer = QueryTimer::new("recount_occupied_seats");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(1 + guest_count), 0)::BIGINT
            FROM registrations
            WHERE project_id = $1 AND status = 'registered'
            "#,
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error)
    }

    async fn has_active_for_project(&self, project_id: i64) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("has_active_registrations");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM registrations
                WHERE project_id = $1 AND status = 'registered'
            )
            "#,
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx_error)
    }
}

#[cfg(test)]
mod tests {
    // Note: RegistrationRepository tests require a database connection and
    // are covered by DB-backed integration environments. The shared
    // semantics are exercised against the in-memory store in the domain
    // crate.
}
