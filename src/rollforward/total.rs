//! Total liability movements, rolled up from BEL, RA and CSM

use super::Movement;
use crate::error::Result;
use crate::projection::Model;
use crate::series::{Month, Series};

impl Model {
    pub(super) fn total_movement(&self, movement: Movement, t: Month) -> Result<Series> {
        let mut total = self.zeros();
        for (component, part) in self.registry.rolled_into(movement) {
            total = &total + &self.movement(component, part, t)?;
        }
        Ok(total)
    }
}
