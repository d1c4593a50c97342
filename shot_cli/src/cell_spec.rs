use anyhow::{bail, ensure, Context};
use shot_engine::{CellPatch, GridState};

/// One `--cell ROUND:ZONE=ATTEMPTS[/MADE]` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellSpec {
    pub bucket: u32,
    pub zone: String,
    pub attempts: i64,
    pub made: Option<i64>,
}

pub fn parse_cell(spec: &str) -> anyhow::Result<CellSpec> {
    let Some((round, rest)) = spec.split_once(':') else {
        bail!("expected ROUND:ZONE=ATTEMPTS[/MADE], got {spec:?}");
    };
    let Some((zone, tally)) = rest.rsplit_once('=') else {
        bail!("missing '=' in {spec:?}");
    };

    let round: u32 = round
        .trim()
        .parse()
        .with_context(|| format!("bad round number {round:?}"))?;
    ensure!(round >= 1, "rounds are numbered from 1");

    let zone = zone.trim();
    ensure!(!zone.is_empty(), "missing zone in {spec:?}");

    let (attempts, made) = match tally.split_once('/') {
        Some((a, m)) => (a, Some(m)),
        None => (tally, None),
    };
    let attempts: i64 = attempts
        .trim()
        .parse()
        .with_context(|| format!("bad attempts {attempts:?}"))?;
    let made = made
        .map(|m| m.trim().parse::<i64>().with_context(|| format!("bad made {m:?}")))
        .transpose()?;

    Ok(CellSpec {
        bucket: round - 1,
        zone: zone.to_string(),
        attempts,
        made,
    })
}

/// Zone names match the grid's labels ignoring case.
pub fn apply_cell(grid: &mut GridState, cell: &CellSpec) -> anyhow::Result<()> {
    let zone = grid
        .zone_order(cell.bucket)
        .into_iter()
        .find(|label| label.eq_ignore_ascii_case(&cell.zone))
        .unwrap_or(cell.zone.as_str())
        .to_string();

    let patch = match cell.made {
        Some(made) => CellPatch::tally(cell.attempts, made),
        None => CellPatch::attempts(cell.attempts),
    };
    grid.apply_patch(cell.bucket, &zone, patch)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shot_engine::DirectionMode;
    use shot_schema::ZoneGroup;

    #[test]
    fn parses_full_and_short_forms() {
        assert_eq!(
            parse_cell("2:Left Corner=10/7").unwrap(),
            CellSpec {
                bucket: 1,
                zone: "Left Corner".to_string(),
                attempts: 10,
                made: Some(7),
            }
        );
        let short = parse_cell("1: Free Throw = 5").unwrap();
        assert_eq!((short.zone.as_str(), short.attempts, short.made), ("Free Throw", 5, None));
    }

    #[test]
    fn rejects_malformed_specs() {
        assert!(parse_cell("Left Corner=10/7").is_err());
        assert!(parse_cell("0:Left Corner=10").is_err());
        assert!(parse_cell("1:Left Corner").is_err());
        assert!(parse_cell("1:=3").is_err());
        assert!(parse_cell("1:Left Corner=x/2").is_err());
    }

    #[test]
    fn applies_with_case_insensitive_zone() {
        let mut grid = GridState::new(ZoneGroup::ThreePoint, DirectionMode::default(), "spot");
        apply_cell(&mut grid, &parse_cell("1:left corner=8/3").unwrap()).unwrap();
        assert_eq!(grid.cell(0, "Left Corner").unwrap().made, 3);

        assert!(apply_cell(&mut grid, &parse_cell("2:Left Corner=1").unwrap()).is_err());
    }
}
