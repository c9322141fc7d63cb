//! Enumeration types for the Townsfolk simulation.
//!
//! Everything here serializes in `snake_case` so the same names appear in
//! `townsfolk-config.yaml`, in event payloads returned by a narrative
//! generator, and in log fields.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Needs and activities
// ---------------------------------------------------------------------------

/// One entry of an agent's needs vector.
///
/// Every need is a satisfaction level in `[0, 100]`: 100 means fully
/// satisfied, 0 means completely deprived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Need {
    /// Satiety. Falls fastest together with thirst.
    Hunger,
    /// Hydration.
    Thirst,
    /// Restedness (low value = exhausted).
    Fatigue,
    /// Social contact.
    Social,
    /// Entertainment and distraction.
    Diversion,
    /// Physical energy.
    Energy,
}

impl Need {
    /// All needs in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Hunger,
        Self::Thirst,
        Self::Fatigue,
        Self::Social,
        Self::Diversion,
        Self::Energy,
    ];

    /// Parse a need name, accepting a few common synonyms produced by
    /// text generators (`food`, `sleep`, `fun`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "hunger" | "food" => Some(Self::Hunger),
            "thirst" | "drink" => Some(Self::Thirst),
            "fatigue" | "sleep" | "rest" => Some(Self::Fatigue),
            "social" => Some(Self::Social),
            "diversion" | "fun" | "leisure" | "entertainment" => Some(Self::Diversion),
            "energy" => Some(Self::Energy),
            _ => None,
        }
    }
}

impl core::fmt::Display for Need {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Hunger => "hunger",
            Self::Thirst => "thirst",
            Self::Fatigue => "fatigue",
            Self::Social => "social",
            Self::Diversion => "diversion",
            Self::Energy => "energy",
        };
        f.write_str(name)
    }
}

/// What an agent is currently doing.
///
/// Activities drive per-tick replenishment of matching needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// Resting or sleeping.
    #[default]
    Rest,
    /// Working at a trade.
    Work,
    /// Eating or drinking.
    Meal,
    /// Socializing with others.
    Social,
    /// Leisure and entertainment.
    Leisure,
}

impl core::fmt::Display for Activity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Rest => "rest",
            Self::Work => "work",
            Self::Meal => "meal",
            Self::Social => "social",
            Self::Leisure => "leisure",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

/// The kind of building, which decides type-specific entry effects and
/// which passive activity an agent performs inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    /// A home.
    Residence,
    /// Inn serving food and drink.
    Tavern,
    /// Smithy.
    Forge,
    /// Library or archive.
    Library,
    /// Open market.
    Market,
    /// Place of worship.
    Temple,
    /// Guard barracks.
    Barracks,
    /// Small shop.
    Shop,
    /// Restaurant.
    Restaurant,
    /// Park or garden.
    Park,
    /// Office.
    Office,
    /// Factory or workshop.
    Factory,
    /// Bar.
    Bar,
}

impl core::fmt::Display for BuildingType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Residence => "residence",
            Self::Tavern => "tavern",
            Self::Forge => "forge",
            Self::Library => "library",
            Self::Market => "market",
            Self::Temple => "temple",
            Self::Barracks => "barracks",
            Self::Shop => "shop",
            Self::Restaurant => "restaurant",
            Self::Park => "park",
            Self::Office => "office",
            Self::Factory => "factory",
            Self::Bar => "bar",
        };
        f.write_str(name)
    }
}

/// A capability a building offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    /// Food.
    Meal,
    /// Drinks.
    Drink,
    /// Beds and rest.
    Rest,
    /// Trade and shopping.
    Commerce,
    /// Study and training.
    Training,
    /// Medical care.
    Healing,
    /// Religious services.
    Worship,
    /// Crafting.
    Craft,
    /// Guarding and protection.
    Protection,
    /// Entertainment.
    Diversion,
}

impl core::fmt::Display for Service {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Meal => "meal",
            Self::Drink => "drink",
            Self::Rest => "rest",
            Self::Commerce => "commerce",
            Self::Training => "training",
            Self::Healing => "healing",
            Self::Worship => "worship",
            Self::Craft => "craft",
            Self::Protection => "protection",
            Self::Diversion => "diversion",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Weather conditions. Re-rolled once per in-world day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    /// Clear skies.
    #[default]
    Sunny,
    /// Overcast.
    Cloudy,
    /// Rain.
    Rain,
    /// Thunderstorm. Hurts agents caught outside.
    Storm,
    /// Snowfall. Hurts agents caught outside.
    Snow,
}

impl Weather {
    /// Every weather kind, in roll order.
    pub const ALL: [Self; 5] = [Self::Sunny, Self::Cloudy, Self::Rain, Self::Storm, Self::Snow];
}

impl core::fmt::Display for Weather {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rain => "rain",
            Self::Storm => "storm",
            Self::Snow => "snow",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Agent identity
// ---------------------------------------------------------------------------

/// Personality tag of an agent.
///
/// Affects which building type satisfies diversion: wise and mysterious
/// agents prefer a library, everyone else a tavern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// Warm and approachable.
    Friendly,
    /// Irritable.
    Grumpy,
    /// Eager to help.
    Helpful,
    /// Strict and rule-bound.
    Strict,
    /// Cheerful.
    Jovial,
    /// Secretive.
    Mysterious,
    /// Thoughtful and learned.
    Wise,
    /// Restless.
    Energetic,
}

impl Personality {
    /// Every personality, used by random spawning.
    pub const ALL: [Self; 8] = [
        Self::Friendly,
        Self::Grumpy,
        Self::Helpful,
        Self::Strict,
        Self::Jovial,
        Self::Mysterious,
        Self::Wise,
        Self::Energetic,
    ];

    /// Whether this personality seeks quiet diversion (library) rather
    /// than a lively one (tavern).
    pub const fn prefers_quiet_diversion(self) -> bool {
        matches!(self, Self::Wise | Self::Mysterious)
    }
}

impl core::fmt::Display for Personality {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Friendly => "friendly",
            Self::Grumpy => "grumpy",
            Self::Helpful => "helpful",
            Self::Strict => "strict",
            Self::Jovial => "jovial",
            Self::Mysterious => "mysterious",
            Self::Wise => "wise",
            Self::Energetic => "energetic",
        };
        f.write_str(name)
    }
}

/// Trade of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profession {
    /// Town mayor.
    Mayor,
    /// Runs the tavern.
    Innkeeper,
    /// Works the forge.
    Blacksmith,
    /// Keeps the library.
    Librarian,
    /// Trades at the market.
    Merchant,
    /// Serves at the temple.
    Priest,
    /// Guards the town.
    Guard,
    /// Works the fields.
    Farmer,
    /// Makes goods by hand.
    Artisan,
}

impl Profession {
    /// Every profession, used by random spawning.
    pub const ALL: [Self; 9] = [
        Self::Mayor,
        Self::Innkeeper,
        Self::Blacksmith,
        Self::Librarian,
        Self::Merchant,
        Self::Priest,
        Self::Guard,
        Self::Farmer,
        Self::Artisan,
    ];
}

impl core::fmt::Display for Profession {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Mayor => "mayor",
            Self::Innkeeper => "innkeeper",
            Self::Blacksmith => "blacksmith",
            Self::Librarian => "librarian",
            Self::Merchant => "merchant",
            Self::Priest => "priest",
            Self::Guard => "guard",
            Self::Farmer => "farmer",
            Self::Artisan => "artisan",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Narrative events
// ---------------------------------------------------------------------------

/// Kind of narrative event produced by a narrative generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Two inhabitants marry.
    Wedding,
    /// Someone dies.
    Death,
    /// An accident.
    Accident,
    /// A meeting or gathering.
    Meeting,
    /// A quarrel.
    Dispute,
    /// A disaster affecting the town.
    Catastrophe,
    /// A festival.
    Festival,
    /// Someone is promoted.
    Promotion,
    /// Something is found.
    Discovery,
    /// A birthday celebration.
    Birthday,
}

impl EventType {
    /// Parse an event type name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "wedding" | "marriage" => Some(Self::Wedding),
            "death" => Some(Self::Death),
            "accident" => Some(Self::Accident),
            "meeting" => Some(Self::Meeting),
            "dispute" | "argument" => Some(Self::Dispute),
            "catastrophe" | "disaster" => Some(Self::Catastrophe),
            "festival" | "celebration" => Some(Self::Festival),
            "promotion" => Some(Self::Promotion),
            "discovery" => Some(Self::Discovery),
            "birthday" => Some(Self::Birthday),
            _ => None,
        }
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Wedding => "wedding",
            Self::Death => "death",
            Self::Accident => "accident",
            Self::Meeting => "meeting",
            Self::Dispute => "dispute",
            Self::Catastrophe => "catastrophe",
            Self::Festival => "festival",
            Self::Promotion => "promotion",
            Self::Discovery => "discovery",
            Self::Birthday => "birthday",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn need_names_accept_synonyms() {
        assert_eq!(Need::from_name("Food"), Some(Need::Hunger));
        assert_eq!(Need::from_name(" sleep "), Some(Need::Fatigue));
        assert_eq!(Need::from_name("fun"), Some(Need::Diversion));
        assert_eq!(Need::from_name("wealth"), None);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&BuildingType::Residence).unwrap();
        assert_eq!(json, "\"residence\"");
        let service: Service = serde_json::from_str("\"healing\"").unwrap();
        assert_eq!(service, Service::Healing);
    }

    #[test]
    fn quiet_diversion_personalities() {
        assert!(Personality::Wise.prefers_quiet_diversion());
        assert!(Personality::Mysterious.prefers_quiet_diversion());
        assert!(!Personality::Jovial.prefers_quiet_diversion());
    }

    #[test]
    fn event_type_from_name() {
        assert_eq!(EventType::from_name("Festival"), Some(EventType::Festival));
        assert_eq!(EventType::from_name("disaster"), Some(EventType::Catastrophe));
        assert_eq!(EventType::from_name("picnic"), None);
    }
}
