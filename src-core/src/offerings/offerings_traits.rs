use super::offerings_model::{NewOffering, Offering, OfferingUpdate};
use crate::offerings::Result;

/// Trait defining the contract for offering service operations.
pub trait OfferingServiceTrait: Send + Sync {
    fn create_offering(&self, new_offering: NewOffering) -> Result<Offering>;
    fn update_offering(&self, update: OfferingUpdate) -> Result<Offering>;
    fn get_offering(&self, offering_id: &str) -> Result<Offering>;
    fn list_offerings(&self) -> Result<Vec<Offering>>;
    fn delete_offering(&self, offering_id: &str) -> Result<()>;
}
