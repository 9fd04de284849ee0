// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Checkpoint, FromSnapshotWithParams, Repository, Snapshot};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

pub trait PersistableData: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}
impl<T> PersistableData for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// AutoPersist enables a repository to generate a persistable container
#[async_trait]
pub trait AutoPersist<T>
where
    T: PersistableData,
{
    /// Load the data from the repository into an auto persist container
    async fn load(&self) -> Result<Persistable<T>>;
    /// Create a new container holding `data` and write it back to the repository
    fn send(&self, data: Option<T>) -> Persistable<T>;
    /// Load the data from the repository. When nothing has been persisted yet the default is
    /// written and used instead.
    async fn load_or_default(&self, default: T) -> Result<Persistable<T>>;
}

#[async_trait]
impl<T> AutoPersist<T> for Repository<T>
where
    T: PersistableData,
{
    async fn load(&self) -> Result<Persistable<T>> {
        Persistable::load(self).await
    }

    fn send(&self, data: Option<T>) -> Persistable<T> {
        Persistable::new(data, self).save()
    }

    async fn load_or_default(&self, default: T) -> Result<Persistable<T>> {
        Persistable::load_or_default(self, default).await
    }
}

/// A container that writes its content to the repository every time it changes.
///
/// Mutations go through [`Persistable::try_mutate`] which works on a copy of the data so a
/// failing mutator leaves both the container and the store untouched.
#[derive(Debug)]
pub struct Persistable<T> {
    data: Option<T>,
    repo: Repository<T>,
}

impl<T> Persistable<T>
where
    T: PersistableData,
{
    pub fn new(data: Option<T>, repo: &Repository<T>) -> Self {
        Self {
            data,
            repo: repo.clone(),
        }
    }

    pub async fn load(repo: &Repository<T>) -> Result<Self> {
        let data = repo.read().await?;
        Ok(Self::new(data, repo))
    }

    pub async fn load_or_default(repo: &Repository<T>, default: T) -> Result<Self> {
        let data = repo.read().await?.unwrap_or(default);
        Ok(Self::new(Some(data), repo).save())
    }

    /// Save the data in the container to the database
    pub fn save(self) -> Self {
        self.checkpoint();
        self
    }

    /// Apply `mutator` to a copy of the content. The copy replaces the content and is persisted
    /// only when the mutator succeeds.
    pub fn try_mutate<F>(&mut self, mutator: F) -> Result<()>
    where
        F: FnOnce(T) -> Result<T>,
    {
        let content = self
            .data
            .clone()
            .ok_or_else(|| anyhow!("Data has not been set"))?;
        self.data = Some(mutator(content)?);
        self.checkpoint();
        Ok(())
    }

    pub fn set(&mut self, data: T) {
        self.data = Some(data);
        self.checkpoint();
    }

    pub fn clear(&mut self) {
        self.data = None;
        self.clear_checkpoint();
    }

    pub fn get(&self) -> Option<T> {
        self.data.clone()
    }

    pub fn try_get(&self) -> Result<T> {
        self.data
            .clone()
            .ok_or_else(|| anyhow!("Data was not set on container."))
    }

    pub fn has(&self) -> bool {
        self.data.is_some()
    }

    /// Borrow the content without cloning it
    pub fn try_with<F, U>(&self, f: F) -> Result<U>
    where
        F: FnOnce(&T) -> Result<U>,
    {
        match &self.data {
            Some(data) => f(data),
            None => Err(anyhow!("Data was not set on container.")),
        }
    }
}

impl<T> Snapshot for Persistable<T>
where
    T: PersistableData,
{
    type Snapshot = T;
    fn snapshot(&self) -> Result<Self::Snapshot> {
        self.data
            .clone()
            .ok_or_else(|| anyhow!("No data stored on container"))
    }
}

impl<T> Checkpoint for Persistable<T>
where
    T: PersistableData,
{
    fn repository(&self) -> &Repository<Self::Snapshot> {
        &self.repo
    }
}

#[async_trait]
impl<T> FromSnapshotWithParams for Persistable<T>
where
    T: PersistableData,
{
    type Params = Repository<T>;
    async fn from_snapshot(params: Repository<T>, snapshot: T) -> Result<Self> {
        Ok(Persistable::new(Some(snapshot), &params))
    }
}
