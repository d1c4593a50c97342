use serde::{Deserialize, Serialize};

mod coerce;
mod legacy;

pub use coerce::{coerce_count, coerce_index};
pub use legacy::{LegacyZoneStat, LegacyZones};

/// One attempts/made tally for a single zone within a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    #[serde(default, deserialize_with = "coerce::index")]
    pub idx: u32,
    #[serde(default)]
    pub zone: String,
    #[serde(default, deserialize_with = "coerce::count")]
    pub attempts: i64,
    #[serde(default, deserialize_with = "coerce::count")]
    pub made: i64,
    /// Per-round override of the session training type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Round {
    pub fn new(idx: u32, zone: impl Into<String>, attempts: i64, made: i64) -> Self {
        Self {
            idx,
            zone: zone.into(),
            attempts,
            made,
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub training_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_group: Option<String>,
    #[serde(default)]
    pub rounds: Vec<Round>,
    /// Flat per-zone map written by older clients. Read-only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<LegacyZones>,
}

/// Where a session's rounds come from, decided once at read time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundSource<'a> {
    Rounds(&'a [Round]),
    LegacyZones(&'a LegacyZones),
    Empty,
}

impl Session {
    /// A non-empty `rounds` list always wins over the legacy map.
    pub fn source(&self) -> RoundSource<'_> {
        if !self.rounds.is_empty() {
            RoundSource::Rounds(&self.rounds)
        } else if let Some(zones) = &self.zones {
            RoundSource::LegacyZones(zones)
        } else {
            RoundSource::Empty
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZoneGroup {
    #[default]
    #[serde(rename = "3PT")]
    ThreePoint,
    #[serde(rename = "MID")]
    Midrange,
    #[serde(rename = "PAINT")]
    Paint,
}

impl ZoneGroup {
    pub const ALL: [ZoneGroup; 3] = [ZoneGroup::ThreePoint, ZoneGroup::Midrange, ZoneGroup::Paint];

    pub fn id(self) -> &'static str {
        match self {
            ZoneGroup::ThreePoint => "3PT",
            ZoneGroup::Midrange => "MID",
            ZoneGroup::Paint => "PAINT",
        }
    }

    /// Accepts the current ids and the lowercase ids older drafts used.
    pub fn lookup(id: &str) -> Option<Self> {
        match id.trim() {
            "3PT" | "3pt" => Some(Self::ThreePoint),
            "MID" | "mid" | "midrange" => Some(Self::Midrange),
            "PAINT" | "paint" => Some(Self::Paint),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    /// Anything other than `"rtl"` reads as left-to-right.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("rtl") {
            Self::Rtl
        } else {
            Self::Ltr
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Direction::Ltr => Direction::Rtl,
            Direction::Rtl => Direction::Ltr,
        }
    }
}

/// Session-level totals. Derived, never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub attempts: i64,
    pub made: i64,
    pub rounds_count: usize,
    pub pct: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneAggregate {
    pub attempts: i64,
    pub made: i64,
    /// 0..=100
    pub pct: f64,
    pub rounds_count: usize,
}

/// Payload handed to the persistence layer on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDraft {
    pub date: String,
    pub training_type: String,
    pub zone_group: ZoneGroup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub rounds: Vec<Round>,
}
