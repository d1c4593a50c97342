use shot_schema::{Direction, ZoneGroup};
use tracing::warn;

pub const ZONES_PER_GROUP: usize = 5;

pub type ZoneLabels = [&'static str; ZONES_PER_GROUP];

// Labels are display text only; rounds store whatever label was current.
pub const THREE_POINT_ZONES: ZoneLabels = [
    "Left Corner",
    "Left Wing 3pt",
    "Top of Key 3pt",
    "Right Wing 3pt",
    "Right Corner",
];

pub const MIDRANGE_ZONES: ZoneLabels = [
    "Left Short Corner",
    "Left Elbow",
    "Free Throw",
    "Right Elbow",
    "Right Short Corner",
];

pub const PAINT_ZONES: ZoneLabels = [
    "Left Block",
    "Left Low Paint",
    "Restricted Area",
    "Right Low Paint",
    "Right Block",
];

/// Canonical left-to-right labels of a group.
pub fn preset(group: ZoneGroup) -> &'static ZoneLabels {
    match group {
        ZoneGroup::ThreePoint => &THREE_POINT_ZONES,
        ZoneGroup::Midrange => &MIDRANGE_ZONES,
        ZoneGroup::Paint => &PAINT_ZONES,
    }
}

pub fn ordered_zones(group: ZoneGroup, direction: Direction) -> ZoneLabels {
    let mut zones = *preset(group);
    if direction == Direction::Rtl {
        zones.reverse();
    }
    zones
}

/// String-keyed form. Unknown groups fall back to the default group.
pub fn ordered_zones_for(group_id: &str, direction_id: &str) -> ZoneLabels {
    ordered_zones(resolve_group(group_id), Direction::parse(direction_id))
}

pub fn resolve_group(group_id: &str) -> ZoneGroup {
    ZoneGroup::lookup(group_id).unwrap_or_else(|| {
        warn!(group_id, "unknown zone group, using {}", ZoneGroup::default().id());
        ZoneGroup::default()
    })
}
