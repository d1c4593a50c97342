use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    Rounds,
    Header,
}

impl ValidationErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // Rounds
            "V1001" | "V1002" | "V1003" | "V1004" => Self::Rounds,

            // Header
            "V2001" | "V2002" => Self::Header,

            _ => Self::Rounds,
        }
    }
}

/// Blocks a save. The editor state that produced it is left untouched.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: &'static str,
    pub kind: ValidationErrorKind,
    pub message: String,

    pub round_index: Option<usize>,
    pub zone: Option<String>,
    pub field: Option<&'static str>,
}

impl ValidationError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            kind: ValidationErrorKind::from_code(code),
            message: message.into(),

            round_index: None,
            zone: None,
            field: None,
        }
    }

    pub fn with_round_index(mut self, round_index: usize) -> Self {
        self.round_index = Some(round_index);
        self
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn with_field(mut self, field: &'static str) -> Self {
        self.field = Some(field);
        self
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("no grid cell for round {bucket}, zone {zone:?}")]
    CellNotFound { bucket: u32, zone: String },

    #[error("round {bucket} is outside the grid ({rounds_count} rounds)")]
    BucketOutOfRange { bucket: u32, rounds_count: u32 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SaveError {
    #[error("a save is already in progress")]
    InFlight,

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_code_then_message() {
        let err = ValidationError::new("V1004", "made cannot exceed attempts (round 2)")
            .with_round_index(1)
            .with_field("made");
        assert_eq!(err.to_string(), "V1004: made cannot exceed attempts (round 2)");
        assert_eq!(err.kind, ValidationErrorKind::Rounds);
        assert_eq!(err.round_index, Some(1));
    }

    #[test]
    fn header_codes_map_to_header_kind() {
        assert_eq!(ValidationErrorKind::from_code("V2001"), ValidationErrorKind::Header);
        assert_eq!(ValidationErrorKind::from_code("V9999"), ValidationErrorKind::Rounds);
    }

    #[test]
    fn save_error_wraps_validation_transparently() {
        let err: SaveError = ValidationError::new("V1001", "add at least one round").into();
        assert_eq!(err.to_string(), "V1001: add at least one round");
    }
}
