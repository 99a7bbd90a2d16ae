// Profile store collaborator: the only per-request lookup besides session
// validation. Role lookups that fail here are recovered fail-open upstream.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use thiserror::Error;
use uuid::Uuid;

use crate::policy::Role;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Role storage for principals. `role_for` returning `Ok(None)` means no
/// profile row exists; callers decide what the absence means.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn role_for(&self, principal_id: Uuid) -> Result<Option<Role>, StoreError>;
    async fn set_role(&self, principal_id: Uuid, role: Role) -> Result<(), StoreError>;
}

/// Postgres-backed profile store.
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn role_for(&self, principal_id: Uuid) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query("SELECT role FROM profiles WHERE id = $1")
            .bind(principal_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let stored: String = row.get("role");
        let role = Role::parse(&stored);
        if role.is_none() {
            // Unknown role strings behave like a missing row
            tracing::warn!("profile {} carries unknown role '{}'", principal_id, stored);
        }
        Ok(role)
    }

    async fn set_role(&self, principal_id: Uuid, role: Role) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, role)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(principal_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// In-memory profile store for development mode and tests.
#[derive(Default)]
pub struct MemoryProfileStore {
    roles: RwLock<HashMap<Uuid, Role>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(self, principal_id: Uuid, role: Role) -> Self {
        self.roles
            .write()
            .expect("profile store lock poisoned")
            .insert(principal_id, role);
        self
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn role_for(&self, principal_id: Uuid) -> Result<Option<Role>, StoreError> {
        let roles = self.roles.read().expect("profile store lock poisoned");
        Ok(roles.get(&principal_id).copied())
    }

    async fn set_role(&self, principal_id: Uuid, role: Role) -> Result<(), StoreError> {
        self.roles
            .write()
            .expect("profile store lock poisoned")
            .insert(principal_id, role);
        Ok(())
    }
}
