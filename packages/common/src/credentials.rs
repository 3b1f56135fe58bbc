use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};

use crate::entity::credential;

/// Generic key-value store for linked external account credentials.
///
/// Values are opaque to the core; they are looked up by (owner, provider,
/// name) when a job targets a destination that needs them.
#[derive(Clone)]
pub struct CredentialStore {
    db: DatabaseConnection,
}

impl CredentialStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert or replace one credential value.
    pub async fn set(
        &self,
        owner_id: &str,
        provider: &str,
        name: &str,
        value: &str,
    ) -> Result<(), DbErr> {
        let existing = credential::Entity::find_by_id((
            owner_id.to_string(),
            provider.to_string(),
            name.to_string(),
        ))
        .one(&self.db)
        .await?;

        match existing {
            Some(row) => {
                let mut active: credential::ActiveModel = row.into();
                active.value = Set(value.to_string());
                active.updated_at = Set(Utc::now());
                active.update(&self.db).await?;
            }
            None => {
                credential::ActiveModel {
                    owner_id: Set(owner_id.to_string()),
                    provider: Set(provider.to_string()),
                    name: Set(name.to_string()),
                    value: Set(value.to_string()),
                    updated_at: Set(Utc::now()),
                }
                .insert(&self.db)
                .await?;
            }
        }
        Ok(())
    }

    pub async fn get(
        &self,
        owner_id: &str,
        provider: &str,
        name: &str,
    ) -> Result<Option<String>, DbErr> {
        Ok(credential::Entity::find_by_id((
            owner_id.to_string(),
            provider.to_string(),
            name.to_string(),
        ))
        .one(&self.db)
        .await?
        .map(|row| row.value))
    }

    /// Credential names linked for one (owner, provider) pair. Values are
    /// deliberately not returned here.
    pub async fn list_names(&self, owner_id: &str, provider: &str) -> Result<Vec<String>, DbErr> {
        Ok(credential::Entity::find()
            .filter(credential::Column::OwnerId.eq(owner_id))
            .filter(credential::Column::Provider.eq(provider))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|row| row.name)
            .collect())
    }
}
