use std::collections::BTreeMap;

use shot_schema::{Direction, Round, RoundSource, Totals, ZoneGroup};
use tracing::{debug, warn};

use crate::{
    aggregate::{aggregate_by_zone, aggregate_totals, ZoneBreakdown},
    draft::flatten,
    error::GridError,
    normalize::resolve_rounds,
    presets::{ordered_zones, preset, ZoneLabels, ZONES_PER_GROUP},
};

/// Upper bound on rounds in one grid.
pub const MAX_ROUNDS: u32 = 50;

/// Identity of a grid cell. Values follow this key, never a list position,
/// so reordering zones cannot move a tally to another cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub bucket: u32,
    pub zone: String,
}

impl CellKey {
    pub fn new(bucket: u32, zone: impl Into<String>) -> Self {
        Self {
            bucket,
            zone: zone.into(),
        }
    }
}

/// Sparse `(bucket, zone) -> round` collection. A cell's `idx` is a
/// placeholder until the grid is flattened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridCells(BTreeMap<CellKey, Round>);

impl GridCells {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys the cell by `(bucket, round.zone)`, replacing any previous value.
    pub fn insert(&mut self, bucket: u32, round: Round) -> Option<Round> {
        self.0.insert(CellKey::new(bucket, round.zone.clone()), round)
    }

    pub fn get(&self, bucket: u32, zone: &str) -> Option<&Round> {
        self.0.get(&CellKey::new(bucket, zone))
    }

    pub(crate) fn get_mut(&mut self, bucket: u32, zone: &str) -> Option<&mut Round> {
        self.0.get_mut(&CellKey::new(bucket, zone))
    }

    pub fn contains(&self, bucket: u32, zone: &str) -> bool {
        self.0.contains_key(&CellKey::new(bucket, zone))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Round)> {
        self.0.iter().map(|(key, round)| (key.bucket, round))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Reconciles `prev` with the layout `[0, rounds_count) x zone_labels`.
///
/// Cells outside the layout are dropped (their values are gone for good);
/// missing cells are created empty with `training_type`. Cells that survive
/// keep their attempts/made untouched.
pub fn ensure_grid(
    mut prev: GridCells,
    rounds_count: u32,
    zone_labels: &[&str],
    training_type: &str,
) -> GridCells {
    let before = prev.len();
    prev.0
        .retain(|key, _| key.bucket < rounds_count && zone_labels.contains(&key.zone.as_str()));
    let pruned = before - prev.len();
    if pruned > 0 {
        debug!(pruned, rounds_count, "dropped grid cells outside the layout");
    }

    for bucket in 0..rounds_count {
        for &zone in zone_labels {
            prev.0
                .entry(CellKey::new(bucket, zone))
                .or_insert_with(|| Round {
                    idx: 0,
                    zone: zone.to_string(),
                    attempts: 0,
                    made: 0,
                    kind: Some(training_type.to_string()),
                    ..Round::default()
                });
        }
    }

    prev
}

/// One direction for the whole session, or one per round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectionMode {
    Shared(Direction),
    PerBucket(Vec<Direction>),
}

impl Default for DirectionMode {
    fn default() -> Self {
        DirectionMode::Shared(Direction::Ltr)
    }
}

impl DirectionMode {
    pub fn direction_for(&self, bucket: u32) -> Direction {
        match self {
            DirectionMode::Shared(direction) => *direction,
            DirectionMode::PerBucket(directions) => directions
                .get(bucket as usize)
                .copied()
                .unwrap_or_default(),
        }
    }

    /// Per-bucket lists track the round count: truncated, or padded with `ltr`.
    fn sync_len(&mut self, rounds_count: u32) {
        if let DirectionMode::PerBucket(directions) = self {
            directions.resize(rounds_count as usize, Direction::Ltr);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellPatch {
    pub attempts: Option<i64>,
    pub made: Option<i64>,
    pub kind: Option<String>,
}

impl CellPatch {
    pub fn attempts(attempts: i64) -> Self {
        Self {
            attempts: Some(attempts),
            ..Self::default()
        }
    }

    pub fn made(made: i64) -> Self {
        Self {
            made: Some(made),
            ..Self::default()
        }
    }

    pub fn tally(attempts: i64, made: i64) -> Self {
        Self {
            attempts: Some(attempts),
            made: Some(made),
            kind: None,
        }
    }
}

/// Multi-round entry grid: every round shows all five zones of one group.
///
/// After any transition the cells are exactly `[0, rounds_count) x preset`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridState {
    cells: GridCells,
    rounds_count: u32,
    zone_group: ZoneGroup,
    directions: DirectionMode,
    training_type: String,
    auto_fill: bool,
}

impl GridState {
    pub fn new(zone_group: ZoneGroup, directions: DirectionMode, training_type: impl Into<String>) -> Self {
        let mut state = Self {
            cells: GridCells::new(),
            rounds_count: 1,
            zone_group,
            directions,
            training_type: training_type.into(),
            auto_fill: false,
        };
        state.directions.sync_len(state.rounds_count);
        state.resync();
        state
    }

    /// Lays canonical rounds out five per bucket, in idx order.
    ///
    /// Rounds naming a zone outside `zone_group` are dropped. With per-bucket
    /// directions, a bucket stored in reverse preset order reopens as `rtl`.
    pub fn hydrate(
        rounds: &[Round],
        zone_group: ZoneGroup,
        directions: DirectionMode,
        training_type: impl Into<String>,
    ) -> Self {
        let rounds_count = u32::try_from(rounds.len().div_ceil(ZONES_PER_GROUP))
            .unwrap_or(u32::MAX)
            .max(1);
        let mut cells = GridCells::new();
        let mut bucket_zones: Vec<Vec<&str>> = vec![Vec::new(); rounds_count as usize];

        for (i, round) in rounds.iter().enumerate() {
            let bucket = (i / ZONES_PER_GROUP) as u32;
            if cells.contains(bucket, &round.zone) {
                warn!(bucket, zone = %round.zone, "duplicate zone in round, keeping the first");
                continue;
            }
            bucket_zones[bucket as usize].push(round.zone.as_str());
            cells.insert(bucket, round.clone());
        }

        let directions = match directions {
            DirectionMode::PerBucket(_) => {
                let mut reversed = *preset(zone_group);
                reversed.reverse();
                DirectionMode::PerBucket(
                    bucket_zones
                        .iter()
                        .map(|zones| {
                            if zones.as_slice() == reversed.as_slice() {
                                Direction::Rtl
                            } else {
                                Direction::Ltr
                            }
                        })
                        .collect(),
                )
            }
            shared => shared,
        };

        let mut state = Self {
            cells,
            rounds_count,
            zone_group,
            directions,
            training_type: training_type.into(),
            auto_fill: false,
        };
        state.resync();

        let labels = preset(zone_group);
        let foreign = rounds
            .iter()
            .filter(|r| !labels.contains(&r.zone.as_str()))
            .count();
        if foreign > 0 {
            warn!(foreign, group = zone_group.id(), "rounds outside the zone group were dropped");
        }
        state
    }

    /// Whether [`GridState::hydrate`] keeps every round: each zone is in
    /// the group, no zone repeats within a bucket, and the rounds fit in
    /// [`MAX_ROUNDS`] buckets.
    pub fn fits(rounds: &[Round], zone_group: ZoneGroup) -> bool {
        let labels = preset(zone_group);
        rounds.len() <= MAX_ROUNDS as usize * ZONES_PER_GROUP
            && rounds.chunks(ZONES_PER_GROUP).all(|bucket| {
                bucket.iter().enumerate().all(|(i, round)| {
                    labels.contains(&round.zone.as_str()) && bucket[..i].iter().all(|r| r.zone != round.zone)
                })
            })
    }

    pub fn with_auto_fill(mut self, auto_fill: bool) -> Self {
        self.auto_fill = auto_fill;
        self
    }

    pub fn cells(&self) -> &GridCells {
        &self.cells
    }

    pub fn rounds_count(&self) -> u32 {
        self.rounds_count
    }

    pub fn zone_group(&self) -> ZoneGroup {
        self.zone_group
    }

    pub fn directions(&self) -> &DirectionMode {
        &self.directions
    }

    pub fn direction_for(&self, bucket: u32) -> Direction {
        self.directions.direction_for(bucket)
    }

    /// Display order of the zones in one round.
    pub fn zone_order(&self, bucket: u32) -> ZoneLabels {
        ordered_zones(self.zone_group, self.direction_for(bucket))
    }

    pub fn training_type(&self) -> &str {
        &self.training_type
    }

    pub fn auto_fill(&self) -> bool {
        self.auto_fill
    }

    pub fn cell(&self, bucket: u32, zone: &str) -> Option<&Round> {
        self.cells.get(bucket, zone)
    }

    /// Clamped to `1..=MAX_ROUNDS`. Shrinking discards the removed rounds.
    pub fn set_rounds_count(&mut self, rounds_count: u32) {
        let rounds_count = rounds_count.clamp(1, MAX_ROUNDS);
        if rounds_count == self.rounds_count {
            return;
        }
        debug!(from = self.rounds_count, to = rounds_count, "rounds count changed");
        self.rounds_count = rounds_count;
        self.directions.sync_len(rounds_count);
        self.resync();
    }

    /// Switching groups discards every cell; no label is shared between presets.
    pub fn set_zone_group(&mut self, zone_group: ZoneGroup) {
        if zone_group == self.zone_group {
            return;
        }
        debug!(from = self.zone_group.id(), to = zone_group.id(), "zone group changed");
        self.zone_group = zone_group;
        self.resync();
    }

    pub fn set_direction_mode(&mut self, directions: DirectionMode) {
        self.directions = directions;
        self.directions.sync_len(self.rounds_count);
        self.resync();
    }

    /// In shared mode `bucket` only has to be in range; the whole grid turns.
    pub fn set_direction(&mut self, bucket: u32, direction: Direction) -> Result<(), GridError> {
        if bucket >= self.rounds_count {
            return Err(GridError::BucketOutOfRange {
                bucket,
                rounds_count: self.rounds_count,
            });
        }
        match &mut self.directions {
            DirectionMode::Shared(shared) => *shared = direction,
            DirectionMode::PerBucket(directions) => directions[bucket as usize] = direction,
        }
        self.resync();
        Ok(())
    }

    pub fn toggle_direction(&mut self, bucket: u32) -> Result<Direction, GridError> {
        let next = self.direction_for(bucket).toggled();
        self.set_direction(bucket, next)?;
        Ok(next)
    }

    /// Applies to cells created from now on.
    pub fn set_training_type(&mut self, training_type: impl Into<String>) {
        self.training_type = training_type.into();
    }

    pub fn set_auto_fill(&mut self, auto_fill: bool) {
        self.auto_fill = auto_fill;
    }

    /// Edits one cell, then clamps it to `0 <= made <= attempts`.
    ///
    /// With auto-fill on, a new attempts value on the round's first zone (in
    /// that round's direction) is copied into sibling cells still at 0 attempts.
    pub fn apply_patch(&mut self, bucket: u32, zone: &str, patch: CellPatch) -> Result<(), GridError> {
        let first_zone = self.zone_order(bucket)[0];
        let cell = self
            .cells
            .get_mut(bucket, zone)
            .ok_or_else(|| GridError::CellNotFound {
                bucket,
                zone: zone.to_string(),
            })?;

        let before = cell.attempts;
        if let Some(attempts) = patch.attempts {
            cell.attempts = attempts;
        }
        if let Some(made) = patch.made {
            cell.made = made;
        }
        if let Some(kind) = patch.kind {
            cell.kind = Some(kind);
        }
        cell.attempts = cell.attempts.max(0);
        cell.made = cell.made.clamp(0, cell.attempts);
        let after = cell.attempts;

        if self.auto_fill && patch.attempts.is_some() && after != before && zone == first_zone {
            self.fill_empty_siblings(bucket, zone, after);
        }
        Ok(())
    }

    fn fill_empty_siblings(&mut self, bucket: u32, source_zone: &str, attempts: i64) {
        let mut filled = 0;
        for (key, round) in self.cells.0.iter_mut() {
            if key.bucket == bucket && key.zone != source_zone && round.attempts == 0 {
                round.attempts = attempts;
                filled += 1;
            }
        }
        if filled > 0 {
            debug!(bucket, attempts, filled, "auto-filled attempts");
        }
    }

    /// Canonical rounds in display order, idx 0..n-1. Not validated.
    pub fn flatten(&self) -> Vec<Round> {
        flatten(&self.cells, self.rounds_count, self.zone_group, |bucket| {
            self.direction_for(bucket)
        })
    }

    pub fn preview_rounds(&self) -> Vec<Round> {
        let flat = self.flatten();
        resolve_rounds(RoundSource::Rounds(&flat), &self.training_type)
    }

    pub fn preview_totals(&self) -> Totals {
        aggregate_totals(&self.preview_rounds())
    }

    pub fn preview_by_zone(&self) -> ZoneBreakdown {
        aggregate_by_zone(&self.preview_rounds())
    }

    fn resync(&mut self) {
        let labels = preset(self.zone_group);
        let cells = std::mem::take(&mut self.cells);
        self.cells = ensure_grid(cells, self.rounds_count, labels, &self.training_type);
    }
}
