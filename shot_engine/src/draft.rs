use chrono::NaiveDate;
use shot_schema::{Direction, Round, SessionDraft, ZoneGroup};
use tracing::debug;

use crate::{
    error::ValidationError,
    grid::GridCells,
    normalize::renumber,
    presets::ordered_zones,
};

pub const MAX_NOTES_CHARS: usize = 500;

/// Grid cells in display order: bucket by bucket, each bucket in its own
/// direction. `idx` is reassigned 0..n-1. Missing cells are skipped.
pub fn flatten<F>(cells: &GridCells, rounds_count: u32, zone_group: ZoneGroup, direction_for: F) -> Vec<Round>
where
    F: Fn(u32) -> Direction,
{
    let mut rounds = Vec::with_capacity(cells.len());
    for bucket in 0..rounds_count {
        for zone in ordered_zones(zone_group, direction_for(bucket)) {
            let Some(cell) = cells.get(bucket, zone) else {
                continue;
            };
            rounds.push(Round {
                idx: u32::try_from(rounds.len()).unwrap_or(u32::MAX),
                ..cell.clone()
            });
        }
    }
    rounds
}

/// First violation wins: empty list, then per round in order a blank zone,
/// a negative count, made above attempts.
pub fn validate_rounds(rounds: &[Round]) -> Result<(), ValidationError> {
    if rounds.is_empty() {
        return Err(ValidationError::new("V1001", "add at least one round").with_field("rounds"));
    }

    for (i, round) in rounds.iter().enumerate() {
        let label = i + 1;
        if round.zone.trim().is_empty() {
            return Err(ValidationError::new("V1002", format!("round {label} needs a zone name"))
                .with_round_index(i)
                .with_field("zone"));
        }
        if round.attempts < 0 || round.made < 0 {
            return Err(ValidationError::new(
                "V1003",
                format!("round {label} ({}) has a negative count", round.zone),
            )
            .with_round_index(i)
            .with_zone(round.zone.clone())
            .with_field(if round.attempts < 0 { "attempts" } else { "made" }));
        }
        if round.made > round.attempts {
            return Err(ValidationError::new(
                "V1004",
                format!(
                    "round {label} ({}): made {} exceeds attempts {}",
                    round.zone, round.made, round.attempts
                ),
            )
            .with_round_index(i)
            .with_zone(round.zone.clone())
            .with_field("made"));
        }
    }
    Ok(())
}

/// Session-level fields of a draft.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftHeader {
    pub date: String,
    pub training_type: String,
    pub zone_group: ZoneGroup,
    pub notes: String,
}

pub fn validate_header(header: &DraftHeader) -> Result<(), ValidationError> {
    if NaiveDate::parse_from_str(&header.date, "%Y-%m-%d").is_err() || header.date.len() != 10 {
        return Err(ValidationError::new(
            "V2001",
            format!("date {:?} is not a YYYY-MM-DD calendar date", header.date),
        )
        .with_field("date"));
    }
    let notes_len = header.notes.chars().count();
    if notes_len > MAX_NOTES_CHARS {
        return Err(ValidationError::new(
            "V2002",
            format!("notes are {notes_len} characters, limit is {MAX_NOTES_CHARS}"),
        )
        .with_field("notes"));
    }
    Ok(())
}

/// Orders rounds by idx, renumbers them and validates the whole draft.
pub fn assemble(header: DraftHeader, mut rounds: Vec<Round>) -> Result<SessionDraft, ValidationError> {
    rounds.sort_by_key(|r| r.idx);
    renumber(&mut rounds);

    validate_rounds(&rounds)?;
    validate_header(&header)?;

    let notes = header.notes.trim();
    debug!(rounds = rounds.len(), date = %header.date, "draft assembled");
    Ok(SessionDraft {
        date: header.date,
        training_type: header.training_type,
        zone_group: header.zone_group,
        notes: (!notes.is_empty()).then(|| notes.to_string()),
        rounds,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundPatch {
    pub zone: Option<String>,
    pub attempts: Option<i64>,
    pub made: Option<i64>,
    pub kind: Option<String>,
}

/// Free-form entry: an ordered list of rounds with any zone label.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundList {
    rounds: Vec<Round>,
    training_type: String,
}

impl RoundList {
    /// Starts with one blank round.
    pub fn new(training_type: impl Into<String>) -> Self {
        let mut list = Self {
            rounds: Vec::new(),
            training_type: training_type.into(),
        };
        list.add();
        list
    }

    pub fn from_rounds(rounds: Vec<Round>, training_type: impl Into<String>) -> Self {
        if rounds.is_empty() {
            return Self::new(training_type);
        }
        let mut rounds = rounds;
        renumber(&mut rounds);
        Self {
            rounds,
            training_type: training_type.into(),
        }
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn set_training_type(&mut self, training_type: impl Into<String>) {
        self.training_type = training_type.into();
    }

    /// Appends a blank round and returns its idx.
    pub fn add(&mut self) -> u32 {
        let idx = self.rounds.iter().map(|r| r.idx + 1).max().unwrap_or(0);
        self.rounds.push(Round {
            idx,
            kind: Some(self.training_type.clone()),
            ..Round::default()
        });
        idx
    }

    pub fn delete(&mut self, idx: u32) -> bool {
        let before = self.rounds.len();
        self.rounds.retain(|r| r.idx != idx);
        self.rounds.len() != before
    }

    /// Keeps `0 <= made <= attempts` after the patch.
    pub fn update(&mut self, idx: u32, patch: RoundPatch) -> bool {
        let Some(round) = self.rounds.iter_mut().find(|r| r.idx == idx) else {
            return false;
        };
        if let Some(zone) = patch.zone {
            round.zone = zone;
        }
        if let Some(attempts) = patch.attempts {
            round.attempts = attempts.max(0);
        }
        if let Some(made) = patch.made {
            round.made = made;
        }
        if let Some(kind) = patch.kind {
            round.kind = Some(kind);
        }
        round.made = round.made.clamp(0, round.attempts.max(0));
        true
    }

    pub fn move_up(&mut self, idx: u32) -> bool {
        match self.position(idx) {
            Some(i) if i > 0 => {
                self.rounds.swap(i - 1, i);
                renumber(&mut self.rounds);
                true
            }
            _ => false,
        }
    }

    pub fn move_down(&mut self, idx: u32) -> bool {
        match self.position(idx) {
            Some(i) if i + 1 < self.rounds.len() => {
                self.rounds.swap(i, i + 1);
                renumber(&mut self.rounds);
                true
            }
            _ => false,
        }
    }

    fn position(&self, idx: u32) -> Option<usize> {
        self.rounds.iter().position(|r| r.idx == idx)
    }
}
