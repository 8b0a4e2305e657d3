//! Tabular state-value storage keyed by exact board configuration.
//!
//! Unseen states read as `0.0`. The table persists as a small JSON document
//! holding only visited states, with floats written at round-trip precision.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::game::{Board, Cell, CELLS};

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Lookup key for one board configuration.
///
/// Cells are kept in board order; rotations and reflections of a position are
/// distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey([Cell; CELLS]);

impl StateKey {
    pub fn board(&self) -> Board {
        Board::from_cells(self.0)
    }
}

impl From<&Board> for StateKey {
    fn from(board: &Board) -> Self {
        StateKey(*board.cells())
    }
}

impl From<Board> for StateKey {
    fn from(board: Board) -> Self {
        StateKey::from(&board)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board())
    }
}

impl FromStr for StateKey {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<Board>()
            .map(StateKey::from)
            .map_err(|_| StoreError::InvalidKey(s.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    entries: Vec<StoreEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreEntry {
    board: String,
    value: f64,
}

/// Mapping from board configuration to value estimate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueStore {
    values: HashMap<StateKey, f64>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value, or `0.0` for a state never written.
    pub fn get(&self, key: &StateKey) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, key: StateKey, value: f64) {
        self.values.insert(key, value);
    }

    pub fn contains(&self, key: &StateKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, f64)> {
        self.values.iter().map(|(k, &v)| (k, v))
    }

    /// Fold in a table trained independently. Values for states both tables
    /// know are averaged.
    pub fn merge(&mut self, other: &ValueStore) {
        for (key, value) in other.iter() {
            self.values
                .entry(*key)
                .and_modify(|current| *current = (*current + value) / 2.0)
                .or_insert(value);
        }
    }

    /// Encode the table. Entries are sorted by board so output is stable.
    pub fn serialize(&self) -> Vec<u8> {
        let mut keys: Vec<&StateKey> = self.values.keys().collect();
        keys.sort();

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let value = self.values[key];
            if !value.is_finite() {
                // JSON has no representation for these.
                warn!(board = %key, value, "dropping non-finite value from table");
                continue;
            }
            entries.push(StoreEntry {
                board: key.to_string(),
                value,
            });
        }

        let file = StoreFile {
            version: FORMAT_VERSION,
            entries,
        };
        serde_json::to_vec_pretty(&file).expect("value table serializes")
    }

    /// Decode a table, reporting why it could not be read.
    pub fn try_deserialize(bytes: &[u8]) -> Result<Self, StoreError> {
        let file: StoreFile = serde_json::from_slice(bytes)?;
        if file.version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion(file.version));
        }

        let mut values = HashMap::with_capacity(file.entries.len());
        for entry in file.entries {
            let key: StateKey = entry.board.parse()?;
            values.insert(key, entry.value);
        }
        Ok(ValueStore { values })
    }

    /// Decode a table; anything unreadable yields an empty table.
    pub fn deserialize(bytes: &[u8]) -> Self {
        match Self::try_deserialize(bytes) {
            Ok(store) => store,
            Err(e) => {
                warn!(error = %e, "discarding unreadable value table");
                Self::new()
            }
        }
    }

    /// Read a table from disk, reporting why it could not be read.
    pub fn try_load(path: &Path) -> Result<Self, StoreError> {
        let bytes = fs::read(path).map_err(|e| StoreError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::try_deserialize(&bytes)
    }

    /// Read a table from disk. A missing or corrupt file starts an empty table.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => {
                info!(path = %path.display(), states = store.len(), "loaded value table");
                store
            }
            Err(StoreError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "no value table found, starting from scratch");
                Self::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load value table, starting from scratch");
                Self::new()
            }
        }
    }

    /// Write the table through a temporary sibling file renamed into place.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp = tmp_path(path);
        fs::write(&tmp, self.serialize()).map_err(write_err)?;
        fs::rename(&tmp, path).map_err(write_err)?;

        debug!(path = %path.display(), states = self.len(), "saved value table");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
