use std::collections::HashMap;

use serde::{ser::SerializeMap, Serialize, Serializer};
use shot_schema::{Round, Totals, ZoneAggregate};

/// Accuracy in percent, always within `[0, 100]`.
///
/// Zero, negative or non-finite attempts give 0; a non-finite `made` counts as 0.
pub fn accuracy_pct(attempts: f64, made: f64) -> f64 {
    if !attempts.is_finite() || attempts <= 0.0 {
        return 0.0;
    }
    let made = if made.is_finite() { made } else { 0.0 };
    (made / attempts * 100.0).clamp(0.0, 100.0)
}

/// `(attempts, made)` with attempts >= 0 and made in `[0, attempts]`.
pub fn clamped_tally(round: &Round) -> (i64, i64) {
    let attempts = round.attempts.max(0);
    (attempts, round.made.clamp(0, attempts))
}

pub fn round_pct(round: &Round) -> f64 {
    let (attempts, made) = clamped_tally(round);
    accuracy_pct(attempts as f64, made as f64)
}

/// Order-independent session totals. `rounds_count` counts every input round.
pub fn aggregate_totals(rounds: &[Round]) -> Totals {
    let (attempts, made) = rounds.iter().map(clamped_tally).fold((0i64, 0i64), |(a, m), (ra, rm)| {
        (a.saturating_add(ra), m.saturating_add(rm))
    });

    Totals {
        attempts,
        made,
        rounds_count: rounds.len(),
        pct: accuracy_pct(attempts as f64, made as f64),
    }
}

/// Per-zone totals, grouped by exact (case-sensitive) zone label.
pub fn aggregate_by_zone(rounds: &[Round]) -> ZoneBreakdown {
    let mut breakdown = ZoneBreakdown::default();

    for round in rounds {
        let (attempts, made) = clamped_tally(round);
        let entry = breakdown.entry(&round.zone);
        entry.attempts = entry.attempts.saturating_add(attempts);
        entry.made = entry.made.saturating_add(made);
        entry.rounds_count += 1;
    }

    // pct once per group, after the sums are final
    for (_, agg) in &mut breakdown.entries {
        agg.pct = accuracy_pct(agg.attempts as f64, agg.made as f64);
    }

    breakdown
}

/// Zone aggregates in order of each zone's first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneBreakdown {
    entries: Vec<(String, ZoneAggregate)>,
    positions: HashMap<String, usize>,
}

impl ZoneBreakdown {
    fn entry(&mut self, zone: &str) -> &mut ZoneAggregate {
        let pos = match self.positions.get(zone) {
            Some(&pos) => pos,
            None => {
                self.entries.push((zone.to_string(), ZoneAggregate::default()));
                self.positions.insert(zone.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    pub fn get(&self, zone: &str) -> Option<&ZoneAggregate> {
        self.positions.get(zone).map(|&pos| &self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ZoneAggregate)> {
        self.entries.iter().map(|(z, a)| (z.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ZoneBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (zone, agg) in &self.entries {
            map.serialize_entry(zone, agg)?;
        }
        map.end()
    }
}
