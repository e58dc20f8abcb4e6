use serde::{Deserialize, Serialize};

use crate::CardValue;

/// Canonical per-cell state stored by the gameplay engine. A matched cell is
/// face-up by definition, so the matched-implies-revealed invariant cannot be
/// broken by construction.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EngineCell {
    Hidden,
    Revealed,
    Matched,
}

impl EngineCell {
    pub const fn is_hidden(self) -> bool {
        matches!(self, Self::Hidden)
    }

    pub const fn is_face_up(self) -> bool {
        matches!(self, Self::Revealed | Self::Matched)
    }

    pub const fn is_matched(self) -> bool {
        matches!(self, Self::Matched)
    }
}

impl Default for EngineCell {
    fn default() -> Self {
        Self::Hidden
    }
}

/// Render projection of one cell. `value` is populated only for face-up
/// cells; a face-down cell never leaks what it hides.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellView {
    pub value: Option<CardValue>,
    pub revealed: bool,
    pub matched: bool,
}

impl CellView {
    pub(crate) const fn new(cell: EngineCell, value: CardValue) -> Self {
        match cell {
            EngineCell::Hidden => Self {
                value: None,
                revealed: false,
                matched: false,
            },
            EngineCell::Revealed => Self {
                value: Some(value),
                revealed: true,
                matched: false,
            },
            EngineCell::Matched => Self {
                value: Some(value),
                revealed: true,
                matched: true,
            },
        }
    }
}
