// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-local project store.

use std::collections::HashMap;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{GasTankRecord, ProjectRecord, ProjectStore, ProjectUpdate, StoreError, StoreResult};

/// Plain project maps shared by the in-memory and file-backed stores.
#[derive(Debug, Default, Clone)]
pub(crate) struct ProjectBook {
    projects: HashMap<String, ProjectRecord>,
    api_keys: HashMap<String, String>,
}

/// Serialized form of a [`ProjectBook`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ProjectDocument {
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
}

impl ProjectBook {
    pub fn from_document(document: ProjectDocument) -> StoreResult<Self> {
        let mut book = Self::default();
        for record in document.projects {
            book.insert_project(record)?;
        }
        Ok(book)
    }

    pub fn to_document(&self) -> ProjectDocument {
        let mut projects: Vec<ProjectRecord> = self.projects.values().cloned().collect();
        projects.sort_by(|a, b| a.id.cmp(&b.id));
        ProjectDocument { projects }
    }

    pub fn project(&self, id: &str) -> Option<ProjectRecord> {
        self.projects.get(id).cloned()
    }

    pub fn project_id(&self, api_key: &str) -> Option<String> {
        self.api_keys.get(api_key).cloned()
    }

    pub fn projects_owned_by(&self, owner: Address) -> Vec<ProjectRecord> {
        let mut owned: Vec<ProjectRecord> = self
            .projects
            .values()
            .filter(|project| project.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        owned
    }

    pub fn insert_project(&mut self, record: ProjectRecord) -> StoreResult<()> {
        if self.projects.contains_key(&record.id) {
            return Err(StoreError::AlreadyExists(format!("project {}", record.id)));
        }
        if self.api_keys.contains_key(&record.api_key) {
            return Err(StoreError::AlreadyExists("api key".to_string()));
        }
        self.api_keys.insert(record.api_key.clone(), record.id.clone());
        self.projects.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn update_project(&mut self, id: &str, update: ProjectUpdate) -> StoreResult<ProjectRecord> {
        let project = self.project_mut(id)?;
        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(origins) = update.allowed_origins {
            project.allowed_origins = origins;
        }
        Ok(project.clone())
    }

    pub fn gas_tank(&self, project_id: &str, chain_id: u64) -> StoreResult<Option<GasTankRecord>> {
        let project = self
            .projects
            .get(project_id)
            .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))?;
        Ok(project.gas_tank(chain_id).cloned())
    }

    pub fn insert_gas_tank(&mut self, project_id: &str, record: GasTankRecord) -> StoreResult<()> {
        let project = self.project_mut(project_id)?;
        if project.gas_tank(record.chain_id).is_some() {
            return Err(StoreError::AlreadyExists(format!("gas tank {}", record.chain_id)));
        }
        project.gas_tanks.push(record);
        Ok(())
    }

    pub fn set_provider(&mut self, project_id: &str, chain_id: u64, url: &str) -> StoreResult<()> {
        self.gas_tank_mut(project_id, chain_id)?.provider_url = url.to_string();
        Ok(())
    }

    pub fn set_whitelist(
        &mut self,
        project_id: &str,
        chain_id: u64,
        whitelist: Vec<Address>,
    ) -> StoreResult<()> {
        self.gas_tank_mut(project_id, chain_id)?.whitelist = whitelist;
        Ok(())
    }

    fn project_mut(&mut self, id: &str) -> StoreResult<&mut ProjectRecord> {
        self.projects
            .get_mut(id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.to_string()))
    }

    fn gas_tank_mut(&mut self, project_id: &str, chain_id: u64) -> StoreResult<&mut GasTankRecord> {
        self.project_mut(project_id)?
            .gas_tanks
            .iter_mut()
            .find(|tank| tank.chain_id == chain_id)
            .ok_or_else(|| StoreError::GasTankNotFound {
                project_id: project_id.to_string(),
                chain_id,
            })
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    book: RwLock<ProjectBook>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `projects`.
    pub fn with_projects(projects: Vec<ProjectRecord>) -> StoreResult<Self> {
        let book = ProjectBook::from_document(ProjectDocument { projects })?;
        Ok(Self {
            book: RwLock::new(book),
        })
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn load_project(&self, id: &str) -> StoreResult<Option<ProjectRecord>> {
        Ok(self.book.read().await.project(id))
    }

    async fn find_project_id(&self, api_key: &str) -> StoreResult<Option<String>> {
        Ok(self.book.read().await.project_id(api_key))
    }

    async fn list_projects_by_owner(&self, owner: Address) -> StoreResult<Vec<ProjectRecord>> {
        Ok(self.book.read().await.projects_owned_by(owner))
    }

    async fn insert_project(&self, record: ProjectRecord) -> StoreResult<()> {
        self.book.write().await.insert_project(record)
    }

    async fn update_project(&self, id: &str, update: ProjectUpdate) -> StoreResult<ProjectRecord> {
        self.book.write().await.update_project(id, update)
    }

    async fn load_gas_tank(
        &self,
        project_id: &str,
        chain_id: u64,
    ) -> StoreResult<Option<GasTankRecord>> {
        self.book.read().await.gas_tank(project_id, chain_id)
    }

    async fn insert_gas_tank(&self, project_id: &str, record: GasTankRecord) -> StoreResult<()> {
        self.book.write().await.insert_gas_tank(project_id, record)
    }

    async fn update_gas_tank_provider(
        &self,
        project_id: &str,
        chain_id: u64,
        provider_url: &str,
    ) -> StoreResult<()> {
        self.book
            .write()
            .await
            .set_provider(project_id, chain_id, provider_url)
    }

    async fn save_whitelist(
        &self,
        project_id: &str,
        chain_id: u64,
        whitelist: Vec<Address>,
    ) -> StoreResult<()> {
        self.book
            .write()
            .await
            .set_whitelist(project_id, chain_id, whitelist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str, api_key: &str, owner: Address) -> ProjectRecord {
        ProjectRecord {
            id: id.into(),
            api_key: api_key.into(),
            name: format!("project {id}"),
            owner,
            allowed_origins: vec![],
            gas_tanks: vec![GasTankRecord {
                chain_id: 5,
                provider_url: "https://rpc.example".into(),
                whitelist: vec![],
            }],
        }
    }

    #[tokio::test]
    async fn api_key_resolves_to_project_id() {
        let store =
            InMemoryStore::with_projects(vec![project("p1", "key-1", Address::ZERO)]).unwrap();

        assert_eq!(
            store.find_project_id("key-1").await.unwrap(),
            Some("p1".to_string())
        );
        assert_eq!(store.find_project_id("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_ids_and_keys_are_rejected() {
        let store = InMemoryStore::new();
        store
            .insert_project(project("p1", "key-1", Address::ZERO))
            .await
            .unwrap();

        assert!(matches!(
            store.insert_project(project("p1", "key-2", Address::ZERO)).await,
            Err(StoreError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.insert_project(project("p2", "key-1", Address::ZERO)).await,
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn list_by_owner_filters() {
        let alice = Address::repeat_byte(0xaa);
        let store = InMemoryStore::with_projects(vec![
            project("p1", "k1", alice),
            project("p2", "k2", Address::repeat_byte(0xbb)),
            project("p3", "k3", alice),
        ])
        .unwrap();

        let ids: Vec<String> = store
            .list_projects_by_owner(alice)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn update_project_changes_only_given_fields() {
        let store = InMemoryStore::with_projects(vec![project("p1", "k1", Address::ZERO)]).unwrap();

        let updated = store
            .update_project(
                "p1",
                ProjectUpdate {
                    name: None,
                    allowed_origins: Some(vec!["https://a.com".into()]),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "project p1");
        assert_eq!(updated.allowed_origins, vec!["https://a.com"]);
    }

    #[tokio::test]
    async fn gas_tank_mutations() {
        let store = InMemoryStore::with_projects(vec![project("p1", "k1", Address::ZERO)]).unwrap();

        store
            .update_gas_tank_provider("p1", 5, "https://other.example")
            .await
            .unwrap();
        store
            .save_whitelist("p1", 5, vec![Address::repeat_byte(0xbb)])
            .await
            .unwrap();

        let tank = store.load_gas_tank("p1", 5).await.unwrap().unwrap();
        assert_eq!(tank.provider_url, "https://other.example");
        assert_eq!(tank.whitelist, vec![Address::repeat_byte(0xbb)]);

        assert!(matches!(
            store.save_whitelist("p1", 137, vec![]).await,
            Err(StoreError::GasTankNotFound { chain_id: 137, .. })
        ));
        assert!(matches!(
            store
                .insert_gas_tank(
                    "p1",
                    GasTankRecord {
                        chain_id: 5,
                        provider_url: "x".into(),
                        whitelist: vec![]
                    }
                )
                .await,
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn missing_project_is_an_error_for_gas_tank_lookup() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.load_gas_tank("nope", 5).await,
            Err(StoreError::ProjectNotFound(_))
        ));
    }
}
