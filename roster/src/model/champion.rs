use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warroom_core::{Record, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChampionClass {
    #[serde(alias = "Tech")]
    Tech,
    #[serde(alias = "Mutant")]
    Mutant,
    #[serde(alias = "Skill")]
    Skill,
    #[serde(alias = "Science")]
    Science,
    #[serde(alias = "Mystic")]
    Mystic,
    #[serde(alias = "Cosmic")]
    Cosmic,
}

impl ChampionClass {
    pub const ALL: [ChampionClass; 6] =
        [ChampionClass::Tech, ChampionClass::Mutant, ChampionClass::Skill, ChampionClass::Science, ChampionClass::Mystic, ChampionClass::Cosmic];
}

impl std::fmt::Display for ChampionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ChampionClass::Tech => "Tech",
            ChampionClass::Mutant => "Mutant",
            ChampionClass::Skill => "Skill",
            ChampionClass::Science => "Science",
            ChampionClass::Mystic => "Mystic",
            ChampionClass::Cosmic => "Cosmic",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    #[serde(rename = "6-Star")]
    SixStar,
    #[serde(rename = "7-Star")]
    SevenStar,
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Rarity::SixStar => "6-Star",
            Rarity::SevenStar => "7-Star",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "Rank 1")]
    R1,
    #[serde(rename = "Rank 2")]
    R2,
    #[serde(rename = "Rank 3")]
    R3,
    #[serde(rename = "Rank 4")]
    R4,
    #[serde(rename = "Rank 5")]
    R5,
    #[serde(rename = "Rank 6 (Ascended)")]
    R6Ascended,
}

impl Rank {
    pub fn number(&self) -> u8 {
        match self {
            Rank::R1 => 1,
            Rank::R2 => 2,
            Rank::R3 => 3,
            Rank::R4 => 4,
            Rank::R5 => 5,
            Rank::R6Ascended => 6,
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rank::R6Ascended => f.write_str("Rank 6 (Ascended)"),
            rank => write!(f, "Rank {}", rank.number()),
        }
    }
}

/// Catalog entry. Read only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Champion {
    pub id: RecordId,
    pub name: String,
    pub class: ChampionClass,
}

impl Record for Champion {
    fn id(&self) -> &RecordId { &self.id }
    fn with_id(self, id: RecordId) -> Self { Self { id, ..self } }
}

/// A champion in one member's roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedChampion {
    pub id: RecordId,
    pub user_id: RecordId,
    pub champion_id: RecordId,
    pub rarity: Rarity,
    pub rank: Rank,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

stamped_record!(OwnedChampion);
