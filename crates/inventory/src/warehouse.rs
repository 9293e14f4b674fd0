use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, WarehouseId};

/// A storage site. Owns zero or more stock items (cascade-delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub location: String,
    pub capacity: i32,
}

/// Warehouse fields before the store assigns an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWarehouse {
    pub name: String,
    pub location: String,
    pub capacity: i32,
}

impl NewWarehouse {
    pub fn with_id(self, id: WarehouseId) -> Warehouse {
        Warehouse {
            id,
            name: self.name,
            location: self.location,
            capacity: self.capacity,
        }
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> WarehouseId {
        self.id
    }
}

impl core::fmt::Display for Warehouse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}
