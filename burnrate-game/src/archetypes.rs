//! Founder archetypes and their starting-stat overrides.
use serde::{Deserialize, Serialize};

use crate::stats::StatType;

/// Optional starting-stat overrides for an archetype. Unset fields keep the
/// fresh-session defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ArchetypeStart {
    #[serde(default)]
    pub energy: Option<i32>,
    #[serde(default)]
    pub health: Option<i32>,
    #[serde(default)]
    pub happiness: Option<i32>,
    #[serde(default)]
    pub social: Option<i32>,
    #[serde(default)]
    pub burnout: Option<i32>,
    #[serde(default)]
    pub funding: Option<i32>,
    #[serde(default)]
    pub product: Option<i32>,
    #[serde(default)]
    pub runway: Option<i32>,
}

impl ArchetypeStart {
    /// Set overrides in canonical stat order.
    #[must_use]
    pub fn overrides(&self) -> Vec<(StatType, i32)> {
        [
            (StatType::Energy, self.energy),
            (StatType::Health, self.health),
            (StatType::Happiness, self.happiness),
            (StatType::Social, self.social),
            (StatType::Burnout, self.burnout),
            (StatType::Funding, self.funding),
            (StatType::Product, self.product),
            (StatType::Runway, self.runway),
        ]
        .into_iter()
        .filter_map(|(stat, value)| value.map(|v| (stat, v)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    pub id: String,
    pub name: String,
    pub desc: String,
    #[serde(default)]
    pub start: ArchetypeStart,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct ArchetypeNoId {
    pub name: String,
    pub desc: String,
    #[serde(default)]
    pub start: ArchetypeStart,
}

impl Archetype {
    #[must_use]
    fn with_id(id: String, a: ArchetypeNoId) -> Self {
        Self {
            id,
            name: a.name,
            desc: a.desc,
            start: a.start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ArchetypeList(pub Vec<Archetype>);

impl ArchetypeList {
    /// Display order for archetypes shipped with the game.
    pub const ORDER: [&'static str; 5] = ["hacker", "hustler", "designer", "researcher", "dropout"];

    #[must_use]
    pub const fn empty() -> Self {
        Self(vec![])
    }

    /// Load archetypes from an id-keyed JSON object.
    ///
    /// Known ids come first in [`Self::ORDER`]; any others follow sorted by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid archetype data.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut map: std::collections::BTreeMap<String, ArchetypeNoId> =
            serde_json::from_str(json)?;
        let mut v = Vec::with_capacity(map.len());
        for id in Self::ORDER {
            if let Some(a) = map.remove(id) {
                v.push(Archetype::with_id(id.to_string(), a));
            }
        }
        v.extend(map.into_iter().map(|(id, a)| Archetype::with_id(id, a)));
        Ok(Self(v))
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&Archetype> {
        self.0.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Archetype> {
        self.0.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a ArchetypeList {
    type Item = &'a Archetype;
    type IntoIter = std::slice::Iter<'a, Archetype>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
