use shot_schema::{Round, RoundSource, Session};

/// Canonical, idx-ordered rounds of a stored session.
///
/// Never mutates the session. List views, editor hydration and live previews
/// all go through [`resolve_rounds`] so their totals agree.
pub fn get_rounds(session: &Session) -> Vec<Round> {
    resolve_rounds(session.source(), &session.training_type)
}

pub fn resolve_rounds(source: RoundSource<'_>, training_type: &str) -> Vec<Round> {
    match source {
        RoundSource::Rounds(rounds) => {
            let mut sorted = rounds.to_vec();
            // stable: equal idx keep their stored order
            sorted.sort_by_key(|r| r.idx);
            sorted
        }
        RoundSource::LegacyZones(zones) => zones
            .iter()
            .enumerate()
            .map(|(i, (zone, stat))| {
                let attempts = stat.attempts.max(0);
                Round {
                    idx: u32::try_from(i).unwrap_or(u32::MAX),
                    zone: zone.to_string(),
                    attempts,
                    made: stat.made.clamp(0, attempts),
                    kind: Some(training_type.to_string()),
                    ..Round::default()
                }
            })
            .collect(),
        RoundSource::Empty => Vec::new(),
    }
}

/// Rewrites `idx` to 0..n-1 in slice order.
pub fn renumber(rounds: &mut [Round]) {
    for (i, round) in rounds.iter_mut().enumerate() {
        round.idx = u32::try_from(i).unwrap_or(u32::MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shot_schema::{LegacyZoneStat, LegacyZones};

    fn session(rounds: Vec<Round>, zones: Option<LegacyZones>) -> Session {
        Session {
            id: "1".to_string(),
            user_id: "u".to_string(),
            date: "2025-08-24".to_string(),
            training_type: "spot".to_string(),
            rounds,
            zones,
            ..Session::default()
        }
    }

    #[test]
    fn sorts_rounds_by_idx() {
        let s = session(
            vec![
                Round::new(2, "right_wing", 10, 7),
                Round::new(0, "top_key", 5, 3),
            ],
            None,
        );
        let rounds = get_rounds(&s);
        let idx: Vec<u32> = rounds.iter().map(|r| r.idx).collect();
        assert_eq!(idx, [0, 2]);
        // input untouched
        assert_eq!(s.rounds[0].idx, 2);
    }

    #[test]
    fn equal_idx_keep_stored_order() {
        let s = session(
            vec![
                Round::new(1, "b", 1, 1),
                Round::new(0, "first", 1, 1),
                Round::new(1, "c", 1, 1),
            ],
            None,
        );
        let zones: Vec<String> = get_rounds(&s).into_iter().map(|r| r.zone).collect();
        assert_eq!(zones, ["first", "b", "c"]);
    }

    #[test]
    fn legacy_zones_become_rounds() {
        let zones: LegacyZones = [
            ("top_key", LegacyZoneStat { attempts: 10, made: 6 }),
            ("right_wing", LegacyZoneStat { attempts: 8, made: 5 }),
        ]
        .into_iter()
        .collect();
        let rounds = get_rounds(&session(vec![], Some(zones)));

        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0].zone, "top_key");
        assert_eq!(rounds[1].idx, 1);
        assert_eq!(rounds[1].kind.as_deref(), Some("spot"));
        assert_eq!(rounds.iter().map(|r| r.attempts).sum::<i64>(), 18);
        assert_eq!(rounds.iter().map(|r| r.made).sum::<i64>(), 11);
    }

    #[test]
    fn legacy_stats_are_clamped() {
        let zones: LegacyZones = [
            ("a", LegacyZoneStat { attempts: -4, made: 2 }),
            ("b", LegacyZoneStat { attempts: 3, made: 9 }),
            ("c", LegacyZoneStat { attempts: 3, made: -1 }),
        ]
        .into_iter()
        .collect();
        let rounds = get_rounds(&session(vec![], Some(zones)));
        let tallies: Vec<(i64, i64)> = rounds.iter().map(|r| (r.attempts, r.made)).collect();
        assert_eq!(tallies, [(0, 0), (3, 3), (3, 0)]);
    }

    #[test]
    fn nothing_to_read_is_empty() {
        assert!(get_rounds(&session(vec![], None)).is_empty());
    }

    #[test]
    fn renumber_is_positional() {
        let mut rounds = vec![Round::new(7, "a", 0, 0), Round::new(3, "b", 0, 0)];
        renumber(&mut rounds);
        assert_eq!((rounds[0].idx, rounds[1].idx), (0, 1));
    }
}
