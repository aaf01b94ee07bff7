//! Level persistence: single-line level strings and the directory they live in.
//!
//! A level is stored as `flow:v1:<W>x<H>:<payload>` where the payload is the
//! unpadded base64 encoding of a JSON object holding the start cell, the end
//! cell and every cell code in row-major order. Hand-drawn character maps are
//! accepted on load: `x` marks a wall, `=` a hidden wall, `s` the start, `e`
//! the end, and the top line of the map is the grid's highest row.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use flow_defence_core::{CellCoord, CellType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Grid;

const LEVEL_DOMAIN: &str = "flow";
const LEVEL_VERSION: &str = "v1";
const FIELD_DELIMITER: char = ':';
const LEVEL_EXTENSION: &str = "level";
const CHARACTER_MAP_EXTENSION: &str = "txt";

/// Identifier prefix emitted before the grid dimensions and payload.
pub const LEVEL_HEADER: &str = "flow:v1";

/// Errors raised while reading or writing levels.
#[derive(Debug, Error)]
pub enum LevelError {
    /// No file exists for the requested level.
    #[error("level '{name}' was not found")]
    NotFound {
        /// Requested level name.
        name: String,
    },
    /// Level names must be non-empty and free of path separators.
    #[error("'{0}' is not a valid level name")]
    InvalidName(String),
    /// Reading or writing a level file failed.
    #[error("could not access level file {path}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The level string was empty or contained only whitespace.
    #[error("level string was empty")]
    EmptyPayload,
    /// The level string did not contain a version segment.
    #[error("level string is missing the version")]
    MissingVersion,
    /// The level string did not include grid dimensions.
    #[error("level string is missing the grid dimensions")]
    MissingDimensions,
    /// The level string did not include the payload segment.
    #[error("level string is missing the payload")]
    MissingPayload,
    /// The level string used an unsupported version identifier.
    #[error("level version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode level payload")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse level payload")]
    InvalidPayload(#[source] serde_json::Error),
    /// The grid could not be serialised.
    #[error("could not serialise level")]
    Serialization(#[source] serde_json::Error),
    /// The cell codes or markers do not fit the declared dimensions.
    #[error("level contents do not fit a {width}x{height} grid")]
    ShapeMismatch {
        /// Declared column count.
        width: u32,
        /// Declared row count.
        height: u32,
    },
    /// A character map line was longer or shorter than the first line.
    #[error("character map line {line} has {found} cells, expected {expected}")]
    RaggedRow {
        /// One-based line number.
        line: usize,
        /// Cells on the first line.
        expected: usize,
        /// Cells on the offending line.
        found: usize,
    },
}

#[derive(Serialize, Deserialize)]
struct LevelPayload {
    start: CellCoord,
    end: CellCoord,
    cells: Vec<CellType>,
}

/// Encodes `grid` into a single-line level string.
pub fn encode_level(grid: &Grid) -> Result<String, LevelError> {
    let payload = LevelPayload {
        start: grid.start(),
        end: grid.end(),
        cells: grid.cells().to_vec(),
    };
    let json = serde_json::to_vec(&payload).map_err(LevelError::Serialization)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{LEVEL_HEADER}:{}x{}:{encoded}",
        grid.width(),
        grid.height()
    ))
}

/// Decodes a level string or a character map into a grid.
pub fn decode_level(value: &str) -> Result<Grid, LevelError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LevelError::EmptyPayload);
    }

    let prefix = format!("{LEVEL_DOMAIN}{FIELD_DELIMITER}");
    if !trimmed.starts_with(&prefix) {
        return decode_character_map(value);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER).skip(1);
    let version = parts.next().ok_or(LevelError::MissingVersion)?;
    let dimensions = parts.next().ok_or(LevelError::MissingDimensions)?;
    let payload = parts.next().ok_or(LevelError::MissingPayload)?;

    if version != LEVEL_VERSION {
        return Err(LevelError::UnsupportedVersion(version.to_owned()));
    }

    let (width, height) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
    let decoded: LevelPayload =
        serde_json::from_slice(&bytes).map_err(LevelError::InvalidPayload)?;

    Grid::from_cells(width, height, decoded.cells, decoded.start, decoded.end)
        .ok_or(LevelError::ShapeMismatch { width, height })
}

fn decode_character_map(value: &str) -> Result<Grid, LevelError> {
    let lines: Vec<&str> = value
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .collect();
    let expected = lines.first().map_or(0, |line| line.chars().count());
    let width = u32::try_from(expected).map_err(|_| LevelError::ShapeMismatch {
        width: u32::MAX,
        height: 0,
    })?;
    let height = u32::try_from(lines.len()).map_err(|_| LevelError::ShapeMismatch {
        width,
        height: u32::MAX,
    })?;

    let mut grid = Grid::new(width, height);
    for (line_index, line) in lines.iter().enumerate() {
        let found = line.chars().count();
        if found != expected {
            return Err(LevelError::RaggedRow {
                line: line_index + 1,
                expected,
                found,
            });
        }

        let row = height - 1 - line_index as u32;
        for (column, symbol) in line.chars().enumerate() {
            let cell = CellCoord::new(column as u32, row);
            match symbol {
                'x' => grid.set(cell, CellType::WALL),
                '=' => grid.set(cell, CellType::HIDDEN),
                's' => grid.set_start(cell),
                'e' => grid.set_end(cell),
                _ => {}
            }
        }
    }

    Ok(grid)
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LevelError> {
    let invalid = || LevelError::InvalidDimensions(dimensions.to_owned());
    let (width, height) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let width = width.trim().parse::<u32>().map_err(|_| invalid())?;
    let height = height.trim().parse::<u32>().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }

    Ok((width, height))
}

/// Directory of named level files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelStore {
    directory: PathBuf,
}

impl LevelStore {
    /// Creates a store rooted at `directory`.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Directory the store reads from and writes to.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File a level named `name` is saved to.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, LevelError> {
        validate_name(name)?;
        Ok(self.directory.join(format!("{name}.{LEVEL_EXTENSION}")))
    }

    /// Loads the level named `name`.
    ///
    /// Falls back to a character map stored as `<name>.txt` when no level
    /// file exists.
    pub fn load(&self, name: &str) -> Result<Grid, LevelError> {
        let primary = self.path_for(name)?;
        let legacy = self
            .directory
            .join(format!("{name}.{CHARACTER_MAP_EXTENSION}"));

        for path in [primary, legacy] {
            match fs::read_to_string(&path) {
                Ok(contents) => {
                    let grid = decode_level(&contents)?;
                    tracing::info!(
                        level = name,
                        path = %path.display(),
                        width = grid.width(),
                        height = grid.height(),
                        "loaded level"
                    );
                    return Ok(grid);
                }
                Err(error) if error.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(LevelError::Io { path, source }),
            }
        }

        Err(LevelError::NotFound {
            name: name.to_owned(),
        })
    }

    /// Saves `grid` as the level named `name`, creating the directory if needed.
    pub fn save(&self, name: &str, grid: &Grid) -> Result<(), LevelError> {
        let path = self.path_for(name)?;
        let encoded = encode_level(grid)?;

        fs::create_dir_all(&self.directory).map_err(|source| LevelError::Io {
            path: self.directory.clone(),
            source,
        })?;
        fs::write(&path, format!("{encoded}\n")).map_err(|source| LevelError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::info!(level = name, path = %path.display(), "saved level");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), LevelError> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', FIELD_DELIMITER]);
    if valid {
        Ok(())
    } else {
        Err(LevelError::InvalidName(name.to_owned()))
    }
}
