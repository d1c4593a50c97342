use chrono::Local;
use shot_schema::{Direction, Round, RoundSource, Session, SessionDraft, Totals, ZoneGroup};
use tracing::{debug, info};

use crate::{
    aggregate::{aggregate_by_zone, aggregate_totals, ZoneBreakdown},
    draft::{assemble, DraftHeader, RoundList},
    error::SaveError,
    grid::{DirectionMode, GridState},
    normalize::{get_rounds, resolve_rounds},
    presets::resolve_group,
};

pub const DEFAULT_TRAINING_TYPE: &str = "catch_and_shoot";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryMode {
    #[default]
    Grid,
    List,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DirectionPolicy {
    #[default]
    Shared,
    PerBucket,
}

#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub training_type: String,
    pub zone_group: ZoneGroup,
    pub direction_policy: DirectionPolicy,
    pub auto_fill: bool,
    pub entry_mode: EntryMode,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            training_type: DEFAULT_TRAINING_TYPE.to_string(),
            zone_group: ZoneGroup::default(),
            direction_policy: DirectionPolicy::default(),
            auto_fill: false,
            entry_mode: EntryMode::default(),
        }
    }
}

impl EditorOptions {
    fn direction_mode(&self) -> DirectionMode {
        match self.direction_policy {
            DirectionPolicy::Shared => DirectionMode::Shared(Direction::Ltr),
            DirectionPolicy::PerBucket => DirectionMode::PerBucket(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Grid(GridState),
    List(RoundList),
}

/// One edit of one session: header fields, the round entry and the save gate.
///
/// Dropping the editor discards everything; nothing is written until a save
/// started with [`SessionEditor::begin_save`] is confirmed.
#[derive(Debug, Clone)]
pub struct SessionEditor {
    session_id: Option<String>,
    date: String,
    training_type: String,
    zone_group: ZoneGroup,
    notes: String,
    entry: Entry,
    saving: bool,
}

impl SessionEditor {
    pub fn new(options: &EditorOptions) -> Self {
        let entry = match options.entry_mode {
            EntryMode::Grid => Entry::Grid(
                GridState::new(options.zone_group, options.direction_mode(), &options.training_type)
                    .with_auto_fill(options.auto_fill),
            ),
            EntryMode::List => Entry::List(RoundList::new(&options.training_type)),
        };
        Self {
            session_id: None,
            date: today(),
            training_type: options.training_type.clone(),
            zone_group: options.zone_group,
            notes: String::new(),
            entry,
            saving: false,
        }
    }

    /// Opens a stored session; legacy `zones{}` sessions arrive as synthesized rounds.
    pub fn edit(session: &Session, options: &EditorOptions) -> Self {
        let rounds = get_rounds(session);
        let training_type = non_empty(&session.training_type).unwrap_or(options.training_type.as_str());
        let zone_group = session
            .zone_group
            .as_deref()
            .map(resolve_group)
            .unwrap_or(options.zone_group);

        // The grid only opens sessions it can hold without dropping a round.
        let entry = match options.entry_mode {
            EntryMode::Grid if GridState::fits(&rounds, zone_group) => Entry::Grid(
                GridState::hydrate(&rounds, zone_group, options.direction_mode(), training_type)
                    .with_auto_fill(options.auto_fill),
            ),
            EntryMode::Grid => {
                info!(id = %session.id, rounds = rounds.len(), "session does not fit the grid, editing as a list");
                Entry::List(RoundList::from_rounds(rounds, training_type))
            }
            EntryMode::List => Entry::List(RoundList::from_rounds(rounds, training_type)),
        };
        debug!(id = %session.id, "editing session");

        Self {
            session_id: non_empty(&session.id).map(str::to_string),
            date: non_empty(&session.date).map_or_else(today, str::to_string),
            training_type: training_type.to_string(),
            zone_group,
            notes: session.notes.clone().unwrap_or_default(),
            entry,
            saving: false,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn training_type(&self) -> &str {
        &self.training_type
    }

    pub fn zone_group(&self) -> ZoneGroup {
        self.zone_group
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn grid(&self) -> Option<&GridState> {
        match &self.entry {
            Entry::Grid(grid) => Some(grid),
            Entry::List(_) => None,
        }
    }

    pub fn grid_mut(&mut self) -> Option<&mut GridState> {
        match &mut self.entry {
            Entry::Grid(grid) => Some(grid),
            Entry::List(_) => None,
        }
    }

    pub fn list_mut(&mut self) -> Option<&mut RoundList> {
        match &mut self.entry {
            Entry::List(list) => Some(list),
            Entry::Grid(_) => None,
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn set_date(&mut self, date: impl Into<String>) {
        self.date = date.into();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn set_training_type(&mut self, training_type: impl Into<String>) {
        self.training_type = training_type.into();
        match &mut self.entry {
            Entry::Grid(grid) => grid.set_training_type(&self.training_type),
            Entry::List(list) => list.set_training_type(&self.training_type),
        }
    }

    pub fn set_zone_group(&mut self, zone_group: ZoneGroup) {
        self.zone_group = zone_group;
        if let Entry::Grid(grid) = &mut self.entry {
            grid.set_zone_group(zone_group);
        }
    }

    /// Current rounds, idx-ordered, exactly as the list and summary views read them.
    pub fn preview_rounds(&self) -> Vec<Round> {
        match &self.entry {
            Entry::Grid(grid) => grid.preview_rounds(),
            Entry::List(list) => resolve_rounds(RoundSource::Rounds(list.rounds()), &self.training_type),
        }
    }

    pub fn totals(&self) -> Totals {
        aggregate_totals(&self.preview_rounds())
    }

    pub fn totals_by_zone(&self) -> ZoneBreakdown {
        aggregate_by_zone(&self.preview_rounds())
    }

    fn header(&self) -> DraftHeader {
        DraftHeader {
            date: self.date.clone(),
            training_type: self.training_type.clone(),
            zone_group: self.zone_group,
            notes: self.notes.clone(),
        }
    }

    /// Validates and hands out the draft to persist. At most one save may be
    /// pending; the caller reports back with [`SessionEditor::finish_save`].
    pub fn begin_save(&mut self) -> Result<SessionDraft, SaveError> {
        if self.saving {
            return Err(SaveError::InFlight);
        }
        let rounds = match &self.entry {
            Entry::Grid(grid) => grid.flatten(),
            Entry::List(list) => list.rounds().to_vec(),
        };
        let draft = assemble(self.header(), rounds)?;
        self.saving = true;
        Ok(draft)
    }

    /// `Some(id)` confirms the write; `None` reports a failed one. Either way
    /// the entered data stays so the user can retry.
    pub fn finish_save(&mut self, saved_id: Option<&str>) {
        self.saving = false;
        if let Some(id) = saved_id {
            info!(id, "session saved");
            self.session_id = Some(id.to_string());
        }
    }
}

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.trim().is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{draft::RoundPatch, grid::CellPatch};
    use shot_schema::{LegacyZoneStat, LegacyZones};

    fn stored() -> Session {
        Session {
            id: "s7".to_string(),
            user_id: "u".to_string(),
            date: "2025-08-24".to_string(),
            training_type: "spot".to_string(),
            zone_group: Some("MID".to_string()),
            rounds: vec![
                Round::new(1, "Left Elbow", 10, 6),
                Round::new(0, "Left Short Corner", 10, 4),
            ],
            ..Session::default()
        }
    }

    #[test]
    fn new_editor_defaults() {
        let editor = SessionEditor::new(&EditorOptions::default());
        assert_eq!(editor.training_type(), DEFAULT_TRAINING_TYPE);
        assert_eq!(editor.zone_group(), ZoneGroup::ThreePoint);
        assert_eq!(editor.date().len(), 10);
        assert_eq!(editor.grid().unwrap().cells().len(), 5);
        assert_eq!(editor.totals(), Totals { rounds_count: 5, ..Totals::default() });
    }

    #[test]
    fn edit_hydrates_grid_from_stored_rounds() {
        let editor = SessionEditor::edit(&stored(), &EditorOptions::default());
        assert_eq!(editor.session_id(), Some("s7"));
        assert_eq!(editor.zone_group(), ZoneGroup::Midrange);
        let grid = editor.grid().unwrap();
        assert_eq!(grid.cell(0, "Left Short Corner").unwrap().made, 4);
        assert_eq!(grid.cell(0, "Left Elbow").unwrap().made, 6);

        let totals = editor.totals();
        assert_eq!((totals.attempts, totals.made), (20, 10));
    }

    #[test]
    fn edit_legacy_session_in_list_mode() {
        let session = Session {
            rounds: vec![],
            zone_group: None,
            zones: Some(
                [
                    ("top_key", LegacyZoneStat { attempts: 10, made: 6 }),
                    ("right_wing", LegacyZoneStat { attempts: 8, made: 5 }),
                ]
                .into_iter()
                .collect::<LegacyZones>(),
            ),
            ..stored()
        };
        let options = EditorOptions {
            entry_mode: EntryMode::List,
            ..EditorOptions::default()
        };
        let editor = SessionEditor::edit(&session, &options);
        let totals = editor.totals();
        assert_eq!((totals.attempts, totals.made, totals.rounds_count), (18, 11, 2));
        assert_eq!(
            totals,
            aggregate_totals(&get_rounds(&session)),
            "editor preview and list view must agree"
        );
    }

    #[test]
    fn legacy_session_keeps_its_rounds_in_default_mode() {
        let session = Session {
            rounds: vec![],
            zone_group: None,
            zones: Some(
                [
                    ("top_key", LegacyZoneStat { attempts: 10, made: 6 }),
                    ("right_wing", LegacyZoneStat { attempts: 8, made: 5 }),
                ]
                .into_iter()
                .collect::<LegacyZones>(),
            ),
            ..stored()
        };
        let mut editor = SessionEditor::edit(&session, &EditorOptions::default());
        assert!(editor.grid().is_none());

        let draft = editor.begin_save().unwrap();
        let zones: Vec<&str> = draft.rounds.iter().map(|r| r.zone.as_str()).collect();
        assert_eq!(zones, ["top_key", "right_wing"]);
        let totals = aggregate_totals(&draft.rounds);
        assert_eq!((totals.attempts, totals.made), (18, 11));
    }

    #[test]
    fn repeated_grid_zone_keeps_both_rounds() {
        let session = Session {
            zone_group: Some("3PT".to_string()),
            rounds: vec![
                Round::new(0, "Left Corner", 10, 7),
                Round::new(1, "Left Corner", 10, 8),
            ],
            ..stored()
        };
        let mut editor = SessionEditor::edit(&session, &EditorOptions::default());
        assert!(matches!(editor.entry(), Entry::List(_)));

        let draft = editor.begin_save().unwrap();
        assert_eq!(draft.rounds.len(), 2);
        assert_eq!(aggregate_totals(&draft.rounds).made, 15);
    }

    #[test]
    fn save_gate_allows_one_in_flight() {
        let mut editor = SessionEditor::edit(&stored(), &EditorOptions::default());
        let draft = editor.begin_save().unwrap();
        assert_eq!(draft.zone_group, ZoneGroup::Midrange);
        assert_eq!(draft.rounds.len(), 5);
        assert!(editor.is_saving());
        assert_eq!(editor.begin_save(), Err(SaveError::InFlight));

        editor.finish_save(None);
        assert!(!editor.is_saving());
        assert!(editor.begin_save().is_ok());
    }

    #[test]
    fn invalid_draft_leaves_state_alone() {
        let options = EditorOptions {
            entry_mode: EntryMode::List,
            ..EditorOptions::default()
        };
        let mut editor = SessionEditor::new(&options);
        let before = editor.entry().clone();

        let err = editor.begin_save().unwrap_err();
        assert!(matches!(err, SaveError::Invalid(ref e) if e.code == "V1002"));
        assert!(!editor.is_saving());
        assert_eq!(editor.entry(), &before);

        editor.list_mut().unwrap().update(
            0,
            RoundPatch {
                zone: Some("Corner".to_string()),
                attempts: Some(4),
                made: Some(2),
                kind: None,
            },
        );
        let draft = editor.begin_save().unwrap();
        assert_eq!(draft.rounds[0].zone, "Corner");
    }

    #[test]
    fn training_type_flows_to_new_cells() {
        let mut editor = SessionEditor::new(&EditorOptions::default());
        editor.set_training_type("off_dribble");
        editor.grid_mut().unwrap().set_rounds_count(2);
        let grid = editor.grid().unwrap();
        assert_eq!(grid.cell(1, "Left Corner").unwrap().kind.as_deref(), Some("off_dribble"));
        assert_eq!(grid.cell(0, "Left Corner").unwrap().kind.as_deref(), Some(DEFAULT_TRAINING_TYPE));
    }

    #[test]
    fn finish_save_records_new_id() {
        let mut editor = SessionEditor::new(&EditorOptions::default());
        editor
            .grid_mut()
            .unwrap()
            .apply_patch(0, "Left Corner", CellPatch::tally(5, 2))
            .unwrap();
        editor.set_notes("  ");
        let draft = editor.begin_save().unwrap();
        assert_eq!(draft.notes, None);
        editor.finish_save(Some("s1"));
        assert_eq!(editor.session_id(), Some("s1"));
    }
}
