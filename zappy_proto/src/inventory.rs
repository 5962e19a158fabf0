use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// The seven resource kinds, in wire order.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Food,
    Linemate,
    Deraumere,
    Sibur,
    Mendiane,
    Phiras,
    Thystame,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Food,
        ResourceKind::Linemate,
        ResourceKind::Deraumere,
        ResourceKind::Sibur,
        ResourceKind::Mendiane,
        ResourceKind::Phiras,
        ResourceKind::Thystame,
    ];

    /// Resolve the numeric code carried by `pdr`/`pgt`.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Food => "food",
            ResourceKind::Linemate => "linemate",
            ResourceKind::Deraumere => "deraumere",
            ResourceKind::Sibur => "sibur",
            ResourceKind::Mendiane => "mendiane",
            ResourceKind::Phiras => "phiras",
            ResourceKind::Thystame => "thystame",
        }
    }
}

/// A 7-slot resource inventory, used both for map tiles and for players.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Inventory {
    pub food: u32,
    pub linemate: u32,
    pub deraumere: u32,
    pub sibur: u32,
    pub mendiane: u32,
    pub phiras: u32,
    pub thystame: u32,
}

impl Inventory {
    pub fn from_counts(counts: [u32; 7]) -> Self {
        let [food, linemate, deraumere, sibur, mendiane, phiras, thystame] = counts;
        Self {
            food,
            linemate,
            deraumere,
            sibur,
            mendiane,
            phiras,
            thystame,
        }
    }

    pub fn counts(&self) -> [u32; 7] {
        [
            self.food,
            self.linemate,
            self.deraumere,
            self.sibur,
            self.mendiane,
            self.phiras,
            self.thystame,
        ]
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        self.counts()[kind as usize]
    }

    /// Sum of every slot, widened so large maps cannot overflow.
    pub fn total(&self) -> u64 {
        self.counts().iter().map(|&count| u64::from(count)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts().iter().all(|&count| count == 0)
    }
}

impl Add for Inventory {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            food: self.food.saturating_add(other.food),
            linemate: self.linemate.saturating_add(other.linemate),
            deraumere: self.deraumere.saturating_add(other.deraumere),
            sibur: self.sibur.saturating_add(other.sibur),
            mendiane: self.mendiane.saturating_add(other.mendiane),
            phiras: self.phiras.saturating_add(other.phiras),
            thystame: self.thystame.saturating_add(other.thystame),
        }
    }
}

impl Sum for Inventory {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Inventory::default(), Add::add)
    }
}

impl<'a> Sum<&'a Inventory> for Inventory {
    fn sum<I: Iterator<Item = &'a Inventory>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_codes_follow_wire_order() {
        assert_eq!(ResourceKind::from_code(0), Some(ResourceKind::Food));
        assert_eq!(ResourceKind::from_code(6), Some(ResourceKind::Thystame));
        assert_eq!(ResourceKind::from_code(7), None);
        assert_eq!(ResourceKind::Sibur.code(), 3);
        assert_eq!(ResourceKind::Mendiane.as_str(), "mendiane");
    }

    #[test]
    fn inventories_sum_field_by_field() {
        let a = Inventory::from_counts([1, 2, 3, 4, 5, 6, 7]);
        let b = Inventory::from_counts([10, 0, 0, 0, 0, 0, 1]);
        let total: Inventory = [a, b].iter().sum();
        assert_eq!(total.counts(), [11, 2, 3, 4, 5, 6, 8]);
        assert_eq!(total.get(ResourceKind::Thystame), 8);
        assert_eq!(total.total(), 39);
        assert!(Inventory::default().is_empty());
    }
}
