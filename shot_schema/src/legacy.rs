use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use serde_json::Value;

use crate::coerce;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyZoneStat {
    #[serde(default, deserialize_with = "coerce::count")]
    pub attempts: i64,
    #[serde(default, deserialize_with = "coerce::count")]
    pub made: i64,
}

/// The pre-rounds `zones{}` map, kept in document order.
///
/// Synthesized rounds take their `idx` from this order, so it must survive a
/// read. A repeated key keeps its first position and its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyZones(Vec<(String, LegacyZoneStat)>);

impl LegacyZones {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, zone: impl Into<String>, stat: LegacyZoneStat) {
        let zone = zone.into();
        match self.0.iter_mut().find(|(z, _)| *z == zone) {
            Some((_, existing)) => *existing = stat,
            None => self.0.push((zone, stat)),
        }
    }

    pub fn get(&self, zone: &str) -> Option<&LegacyZoneStat> {
        self.0.iter().find(|(z, _)| z == zone).map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LegacyZoneStat)> {
        self.0.iter().map(|(z, s)| (z.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<Z: Into<String>> FromIterator<(Z, LegacyZoneStat)> for LegacyZones {
    fn from_iter<I: IntoIterator<Item = (Z, LegacyZoneStat)>>(iter: I) -> Self {
        let mut zones = Self::new();
        for (zone, stat) in iter {
            zones.insert(zone, stat);
        }
        zones
    }
}

impl Serialize for LegacyZones {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (zone, stat) in &self.0 {
            map.serialize_entry(zone, stat)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LegacyZones {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ZonesVisitor;

        impl<'de> Visitor<'de> for ZonesVisitor {
            type Value = LegacyZones;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of zone label to {attempts, made}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut zones = LegacyZones::new();
                while let Some((zone, value)) = access.next_entry::<String, Option<Value>>()? {
                    zones.insert(zone, stat_from_value(value));
                }
                Ok(zones)
            }
        }

        deserializer.deserialize_map(ZonesVisitor)
    }
}

/// Anything other than an `{attempts, made}` object reads as an empty stat.
fn stat_from_value(value: Option<Value>) -> LegacyZoneStat {
    match value {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
        _ => LegacyZoneStat::default(),
    }
}
