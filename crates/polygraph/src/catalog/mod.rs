pub mod monomer_database;

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::{MonomerDescriptor, MonomerDatabase, PolymerType, Result};

/// A read-only source of monomer metadata, keyed by polymer type and monomer id
pub trait Catalog {
    fn lookup(&self, polymer_type: PolymerType, monomer_id: &str) -> Result<&MonomerDescriptor>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn lookup(&self, polymer_type: PolymerType, monomer_id: &str) -> Result<&MonomerDescriptor> {
        (**self).lookup(polymer_type, monomer_id)
    }
}

impl<C: Catalog + ?Sized> Catalog for Arc<C> {
    fn lookup(&self, polymer_type: PolymerType, monomer_id: &str) -> Result<&MonomerDescriptor> {
        (**self).lookup(polymer_type, monomer_id)
    }
}

// Shared Catalog Handle ===============================================================================================

/// Shares one [`MonomerDatabase`] between readers, allowing it to be swapped out wholesale
///
/// Readers take a [`CatalogSnapshot`], so they always see either the old or the new database and never a mix of the
/// two. Every replacement bumps a version counter, which caches can compare against the version they were built with.
#[derive(Debug)]
pub struct CatalogHandle {
    current: RwLock<CatalogSnapshot>,
}

#[derive(Clone, Debug)]
pub struct CatalogSnapshot {
    version: u64,
    database: Arc<MonomerDatabase>,
}

impl CatalogHandle {
    #[must_use]
    pub fn new(database: MonomerDatabase) -> Self {
        let current = RwLock::new(CatalogSnapshot {
            version: 0,
            database: Arc::new(database),
        });
        Self { current }
    }

    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    /// Swaps in `database`, returning the version number of the new snapshot
    pub fn replace(&self, database: MonomerDatabase) -> u64 {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let version = current.version + 1;
        *current = CatalogSnapshot {
            version,
            database: Arc::new(database),
        };
        debug!(version, "replaced monomer catalog");
        version
    }
}

impl Default for CatalogHandle {
    fn default() -> Self {
        Self::new(MonomerDatabase::default())
    }
}

impl CatalogSnapshot {
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn database(&self) -> &MonomerDatabase {
        &self.database
    }
}

impl Catalog for CatalogSnapshot {
    fn lookup(&self, polymer_type: PolymerType, monomer_id: &str) -> Result<&MonomerDescriptor> {
        self.database.lookup(polymer_type, monomer_id)
    }
}
