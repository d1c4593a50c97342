//! Shot session engine: zone presets, round normalization, aggregation and
//! the grid / list editing state behind the session editor.

pub mod aggregate;
pub mod draft;
pub mod editor;
pub mod error;
pub mod grid;
pub mod normalize;
pub mod presets;

pub use aggregate::{accuracy_pct, aggregate_by_zone, aggregate_totals, clamped_tally, round_pct, ZoneBreakdown};
pub use draft::{assemble, flatten, validate_header, validate_rounds, DraftHeader, RoundList, RoundPatch};
pub use editor::{DirectionPolicy, EditorOptions, Entry, EntryMode, SessionEditor};
pub use error::{GridError, SaveError, ValidationError, ValidationErrorKind};
pub use grid::{ensure_grid, CellKey, CellPatch, DirectionMode, GridCells, GridState, MAX_ROUNDS};
pub use normalize::{get_rounds, renumber, resolve_rounds};
pub use presets::{ordered_zones, ordered_zones_for, preset, resolve_group, ZoneLabels};
