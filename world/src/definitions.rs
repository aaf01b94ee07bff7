//! Comma-separated walker and tower definition files.
//!
//! Columns are positional. Walker rows hold
//! `tex_x,tex_y,tex_w,tex_h,energy,red,green,blue,alpha,speed` and tower rows
//! hold `tex_x,tex_y,tex_w,tex_h,radius,energy,fire_interval_ms`. Blank lines
//! and lines starting with `#` are skipped.

use std::{fs, io, path::Path, path::PathBuf, str::FromStr, time::Duration};

use flow_defence_core::{SpriteRect, TowerDefinition, WalkerColor, WalkerDefinition};
use thiserror::Error;

const WALKER_COLUMNS: usize = 10;
const TOWER_COLUMNS: usize = 7;

/// Errors raised while reading definition files.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// The file does not exist.
    #[error("definition file {0} was not found")]
    NotFound(PathBuf),
    /// Reading the file failed.
    #[error("could not read definition file {path}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// A row did not have the expected number of columns.
    #[error("line {line} has {found} columns, expected {expected}")]
    ColumnCount {
        /// One-based line number.
        line: usize,
        /// Required column count.
        expected: usize,
        /// Columns present on the line.
        found: usize,
    },
    /// A column could not be parsed as a number.
    #[error("line {line}, column {column}: '{value}' is not a valid number")]
    InvalidNumber {
        /// One-based line number.
        line: usize,
        /// One-based column number.
        column: usize,
        /// Offending text.
        value: String,
    },
}

/// Parses walker definitions from CSV text.
pub fn parse_walker_definitions(text: &str) -> Result<Vec<WalkerDefinition>, DefinitionError> {
    rows(text, WALKER_COLUMNS)
        .map(|row| -> Result<WalkerDefinition, DefinitionError> {
            let row = row?;
            Ok(WalkerDefinition {
                sprite: SpriteRect::new(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?),
                energy: row.get(4)?,
                color: WalkerColor::from_rgba(row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?),
                speed: row.get(9)?,
            })
        })
        .collect()
}

/// Parses tower definitions from CSV text.
pub fn parse_tower_definitions(text: &str) -> Result<Vec<TowerDefinition>, DefinitionError> {
    rows(text, TOWER_COLUMNS)
        .map(|row| -> Result<TowerDefinition, DefinitionError> {
            let row = row?;
            Ok(TowerDefinition {
                sprite: SpriteRect::new(row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?),
                radius: row.get(4)?,
                energy: row.get(5)?,
                fire_interval: Duration::from_millis(row.get(6)?),
            })
        })
        .collect()
}

/// Reads and parses the walker definition file at `path`.
pub fn load_walker_definitions(path: &Path) -> Result<Vec<WalkerDefinition>, DefinitionError> {
    parse_walker_definitions(&read(path)?)
}

/// Reads and parses the tower definition file at `path`.
pub fn load_tower_definitions(path: &Path) -> Result<Vec<TowerDefinition>, DefinitionError> {
    parse_tower_definitions(&read(path)?)
}

fn read(path: &Path) -> Result<String, DefinitionError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            DefinitionError::NotFound(path.to_path_buf())
        } else {
            DefinitionError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

struct Row<'a> {
    line: usize,
    columns: Vec<&'a str>,
}

impl Row<'_> {
    fn get<T: FromStr>(&self, index: usize) -> Result<T, DefinitionError> {
        let value = self.columns[index];
        value.parse().map_err(|_| DefinitionError::InvalidNumber {
            line: self.line,
            column: index + 1,
            value: value.to_owned(),
        })
    }
}

fn rows(text: &str, expected: usize) -> impl Iterator<Item = Result<Row<'_>, DefinitionError>> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(move |(line, text)| {
            let columns: Vec<&str> = text.split(',').map(str::trim).collect();
            if columns.len() != expected {
                return Err(DefinitionError::ColumnCount {
                    line,
                    expected,
                    found: columns.len(),
                });
            }
            Ok(Row { line, columns })
        })
}
