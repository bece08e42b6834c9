//! Catalog engine: invariant-preserving operations over the repository

pub mod catalog;
pub mod loans;
pub mod recommendations;

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::{config::CatalogConfig, repository::Repository};

/// Single-writer lock shared by every mutating operation.
///
/// Held across the whole read-check-write sequence of a compound
/// operation; the guard is released on every exit path when dropped.
#[derive(Clone, Default)]
pub struct WriteLock(Arc<Mutex<()>>);

impl WriteLock {
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub recommendations: recommendations::RecommendationService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        let lock = WriteLock::default();
        Self {
            catalog: catalog::CatalogService::new(
                repository.clone(),
                lock.clone(),
                config.delete_policy,
            ),
            loans: loans::LoansService::new(repository.clone(), lock),
            recommendations: recommendations::RecommendationService::new(
                repository.clone(),
                config.recommendation_limit,
            ),
            repository,
        }
    }

    /// Underlying store, for health probes and maintenance
    pub fn repository(&self) -> &Repository {
        &self.repository
    }
}
