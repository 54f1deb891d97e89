use serde::{Deserialize, Serialize};

use crate::types::Coord2;

/// Items available in the shop.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopItem {
    ClairvoyanceSpell,
    LifePotion,
}

impl ShopItem {
    /// Price in gems.
    pub const fn cost(self) -> u32 {
        match self {
            Self::ClairvoyanceSpell => 5,
            Self::LifePotion => 3,
        }
    }
}

/// State-change notifications for the presentation layer, emitted in the
/// order the mutations happened.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    CellRevealed { coords: Coord2, adjacent_fires: u8 },
    CellFrozen { coords: Coord2 },
    FireTriggered { coords: Coord2 },
    FlagChanged { coords: Coord2, flagged: bool },
    GemsCleared,
    GemSpawned { coords: Coord2 },
    GemCollected { coords: Coord2, gems: u32 },
    PotionConsumed { potions_left: u32 },
    ClairvoyanceChanged { active: bool },
    PurchaseCompleted { item: ShopItem, gems_left: u32 },
    RoundEnded { won: bool },
}
