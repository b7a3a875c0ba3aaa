// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File-backed project store.
//!
//! The whole document is rewritten on every mutation (temp file + rename),
//! and the in-memory copy only changes once the write has succeeded.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::memory::{ProjectBook, ProjectDocument};
use super::{GasTankRecord, ProjectRecord, ProjectStore, ProjectUpdate, StoreResult};

pub struct JsonFileStore {
    path: PathBuf,
    book: RwLock<ProjectBook>,
}

impl JsonFileStore {
    /// Open the document at `path`. A missing file starts an empty store.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let document = if path.exists() {
            read_document(&path)?
        } else {
            ProjectDocument::default()
        };
        let book = ProjectBook::from_document(document)?;

        tracing::info!(path = %path.display(), "Project store loaded");
        Ok(Self {
            path,
            book: RwLock::new(book),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut ProjectBook) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut book = self.book.write().await;
        let mut draft = book.clone();
        let out = apply(&mut draft)?;
        write_document(&self.path, &draft.to_document())?;
        *book = draft;
        Ok(out)
    }
}

fn read_document(path: &Path) -> StoreResult<ProjectDocument> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

fn write_document(path: &Path, document: &ProjectDocument) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    {
        let mut writer = BufWriter::new(File::create(&temp_path)?);
        serde_json::to_writer_pretty(&mut writer, document)?;
        writer.flush()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[async_trait]
impl ProjectStore for JsonFileStore {
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
        self.mutate(|book| book.insert_project(record)).await
    }

    async fn update_project(&self, id: &str, update: ProjectUpdate) -> StoreResult<ProjectRecord> {
        self.mutate(|book| book.update_project(id, update)).await
    }

    async fn load_gas_tank(
        &self,
        project_id: &str,
        chain_id: u64,
    ) -> StoreResult<Option<GasTankRecord>> {
        self.book.read().await.gas_tank(project_id, chain_id)
    }

    async fn insert_gas_tank(&self, project_id: &str, record: GasTankRecord) -> StoreResult<()> {
        self.mutate(|book| book.insert_gas_tank(project_id, record))
            .await
    }

    async fn update_gas_tank_provider(
        &self,
        project_id: &str,
        chain_id: u64,
        provider_url: &str,
    ) -> StoreResult<()> {
        self.mutate(|book| book.set_provider(project_id, chain_id, provider_url))
            .await
    }

    async fn save_whitelist(
        &self,
        project_id: &str,
        chain_id: u64,
        whitelist: Vec<Address>,
    ) -> StoreResult<()> {
        self.mutate(|book| book.set_whitelist(project_id, chain_id, whitelist))
            .await
    }
}
