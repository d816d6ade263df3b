//! Error taxonomy for the timetable engine.
//!
//! Every fallible operation returns [`Result`]. Inputs that can be normalized
//! (out-of-range view bounds, missing templates) are normalized instead of
//! rejected, so the variants here are all caller errors.

use crate::entities::AxisMode;
use crate::entities::TrackId;
use crate::entities::ItemId;

pub type Result<T> = std::result::Result<T, TimetableError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimetableError {
    /// A date was supplied to a numeric timetable or a number to a temporal one.
    #[error("type mismatch: timetable is {expected}, got {found}")]
    TypeMismatch { expected: AxisMode, found: AxisMode },

    /// Invalid configuration detected before anything is rendered.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A segment rule that does not advance, or produces too many points.
    #[error("segment generation made no progress after {iterations} iterations")]
    GenerationNonProgress { iterations: usize },

    /// A pixel-dependent operation was called before `attach()`.
    #[error("timetable is not attached to a layout yet")]
    NotAttached,

    #[error("unknown track {0:?}")]
    UnknownTrack(TrackId),

    #[error("unknown item {0:?}")]
    UnknownItem(ItemId),
}

impl TimetableError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        TimetableError::Configuration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = TimetableError::TypeMismatch {
            expected: AxisMode::Numerical,
            found: AxisMode::Temporal,
        };
        assert_eq!(err.to_string(), "type mismatch: timetable is numerical, got temporal");
        assert_eq!(
            TimetableError::config("id with both sides").to_string(),
            "configuration error: id with both sides"
        );
    }
}
