//! Project repository for database operations.

use async_trait::async_trait;
use domain::error::StoreError;
use domain::models::{NewProject, Project, ProjectStatus, ProjectUpdate};
use domain::store::ProjectStore;
use sqlx::PgPool;

use crate::entities::{ProjectEntity, ProjectStatusDb};
use crate::metrics::QueryTimer;
use crate::repositories::map_sqlx_error;

/// PostgreSQL-backed [`ProjectStore`].
#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    /// Creates a new ProjectRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for ProjectRepository {
    async fn create(&self, new: NewProject) -> Result<Project, StoreError> {
        let timer = QueryTimer::new("create_project");
        let result = sqlx::query_as::<_, ProjectEntity>(
            r#"
            INSERT INTO projects (title, description, project_date, location_address, max_capacity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, project_date, location_address, max_capacity, status, active, created_at, updated_at
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.project_date)
        .bind(&new.location_address)
        .bind(new.max_capacity)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into).map_err(map_sqlx_error)
    }

    async fn find(&self, id: i64) -> Result<Option<Project>, StoreError> {
        let timer = QueryTimer::new("find_project_by_id");
        let result = sqlx::query_as::<_, ProjectEntity>(
            r#"
            SELECT id, title, description, project_date, location_address, max_capacity, status, active, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
            .map(|entity| entity.map(Into::into))
            .map_err(map_sqlx_error)
    }

    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let timer = QueryTimer::new("list_projects");
        let result = sqlx::query_as::<_, ProjectEntity>(
            r#"
            SELECT id, title, description, project_date, location_address, max_capacity, status, active, created_at, updated_at
            FROM projects
            ORDER BY project_date, id
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
            .map(|entities| entities.into_iter().map(Into::into).collect())
            .map_err(map_sqlx_error)
    }

    async fn update(&self, id: i64, update: ProjectUpdate) -> Result<Project, StoreError> {
        let timer = QueryTimer::new("update_project");
        let result = sqlx::query_as::<_, ProjectEntity>(
            r#"
            UPDATE projects
            SET title = $1, description = $2, project_date = $3, location_address = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $5
            RETURNING id, title, description, project_date, location_address, max_capacity, status, active, created_at, updated_at
            "#,
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.project_date)
        .bind(&update.location_address)
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into).map_err(map_sqlx_error)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("delete_project");
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        result
            .map(|r| r.rows_affected() > 0)
            .map_err(map_sqlx_error)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("set_project_active");
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET active = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            "#,
        )
        .bind(active)
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result
            .map(|r| r.rows_affected() > 0)
            .map_err(map_sqlx_error)
    }

    async fn set_status(&self, id: i64, status: ProjectStatus) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("set_project_status");
        let status_db: ProjectStatusDb = status.into();
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            "#,
        )
        .bind(status_db)
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result
            .map(|r| r.rows_affected() > 0)
            .map_err(map_sqlx_error)
    }

    async fn set_max_capacity(&self, id: i64, max_capacity: i32) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("set_project_capacity");
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET max_capacity = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2
            "#,
        )
        .bind(max_capacity)
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        result
            .map(|r| r.rows_affected() > 0)
            .map_err(map_sqlx_error)
    }
}
