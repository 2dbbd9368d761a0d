use std::str::FromStr;

use tower_defence_core::{CellCoord, TowerKind};

const KIND_DELIMITER: char = '@';
const COORD_DELIMITER: char = ',';

/// Tower requested on the command line as `KIND@COLUMN,ROW`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TowerPlacement {
    /// Archetype to place.
    pub(crate) kind: TowerKind,
    /// Cell the tower occupies.
    pub(crate) cell: CellCoord,
}

/// Errors raised while parsing a tower placement argument.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum PlacementParseError {
    /// The argument lacks the `@` separating the kind from the cell.
    #[error("expected KIND@COLUMN,ROW but found `{0}`")]
    MissingKind(String),
    /// The cell lacks the `,` separating column from row.
    #[error("expected COLUMN,ROW but found `{0}`")]
    MissingRow(String),
    /// A coordinate is not a non-negative integer.
    #[error("invalid coordinate `{0}`")]
    InvalidCoordinate(String),
}

impl FromStr for TowerPlacement {
    type Err = PlacementParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let (kind, cell) = trimmed
            .split_once(KIND_DELIMITER)
            .filter(|(kind, _)| !kind.is_empty())
            .ok_or_else(|| PlacementParseError::MissingKind(trimmed.to_owned()))?;
        let (column, row) = cell
            .split_once(COORD_DELIMITER)
            .ok_or_else(|| PlacementParseError::MissingRow(cell.to_owned()))?;

        Ok(Self {
            kind: TowerKind::new(kind.to_ascii_uppercase()),
            cell: CellCoord::new(parse_coordinate(column)?, parse_coordinate(row)?),
        })
    }
}

fn parse_coordinate(value: &str) -> Result<u32, PlacementParseError> {
    let trimmed = value.trim();
    trimmed
        .parse()
        .map_err(|_| PlacementParseError::InvalidCoordinate(trimmed.to_owned()))
}
