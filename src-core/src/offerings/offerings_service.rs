use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use super::offerings_model::{NewOffering, Offering, OfferingUpdate};
use super::offerings_repository::OfferingRepository;
use super::offerings_traits::OfferingServiceTrait;
use crate::cache::{keys, Cache};
use crate::offerings::{OfferingError, Result};

/// Service for managing offerings, with a read-through cache on listings.
pub struct OfferingService {
    repository: OfferingRepository,
    cache: Arc<dyn Cache>,
    cache_ttl: Duration,
}

impl OfferingService {
    /// Creates a new OfferingService instance
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        cache: Arc<dyn Cache>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            repository: OfferingRepository::new(pool),
            cache,
            cache_ttl,
        }
    }

    fn invalidate(&self, offering_id: &str) {
        self.cache
            .remove(&[keys::OFFERINGS_ALL, &keys::offering_detail(offering_id)]);
    }
}

impl OfferingServiceTrait for OfferingService {
    fn create_offering(&self, new_offering: NewOffering) -> Result<Offering> {
        debug!("Creating offering for {}", new_offering.company_name);
        let offering = self.repository.create(new_offering)?;
        self.cache.remove(&[keys::OFFERINGS_ALL]);
        Ok(offering)
    }

    fn update_offering(&self, update: OfferingUpdate) -> Result<Offering> {
        let offering = self.repository.update(update)?;
        self.invalidate(&offering.id);
        Ok(offering)
    }

    fn get_offering(&self, offering_id: &str) -> Result<Offering> {
        let key = keys::offering_detail(offering_id);
        if let Some(cached) = self.cache.get(&key) {
            match serde_json::from_str::<Offering>(&cached) {
                Ok(offering) => return Ok(offering),
                Err(e) => warn!("Discarding unreadable cache entry {}: {}", key, e),
            }
        }

        let offering = self.repository.get_by_id(offering_id)?;
        if let Ok(serialized) = serde_json::to_string(&offering) {
            self.cache.set(&key, serialized, self.cache_ttl);
        }
        Ok(offering)
    }

    fn list_offerings(&self) -> Result<Vec<Offering>> {
        if let Some(cached) = self.cache.get(keys::OFFERINGS_ALL) {
            match serde_json::from_str::<Vec<Offering>>(&cached) {
                Ok(offerings) => return Ok(offerings),
                Err(e) => warn!("Discarding unreadable offerings listing cache: {}", e),
            }
        }

        let offerings = self.repository.list()?;
        if let Ok(serialized) = serde_json::to_string(&offerings) {
            self.cache
                .set(keys::OFFERINGS_ALL, serialized, self.cache_ttl);
        }
        Ok(offerings)
    }

    /// Deletes an offering. Blocked while transactions or holdings reference it.
    fn delete_offering(&self, offering_id: &str) -> Result<()> {
        if self.repository.is_referenced(offering_id)? {
            return Err(OfferingError::InUse(offering_id.to_string()));
        }
        self.repository.delete(offering_id)?;
        self.invalidate(offering_id);
        Ok(())
    }
}
