use std::{
    cell::RefCell,
    collections::{BTreeMap, HashSet},
    fs::{self, File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use super::Tracker;
use crate::error::{Error, Result};
use crate::git::ObjectId;

/// Slot values, hex encoded so arbitrary bytes survive YAML
#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(deny_unknown_fields)]
struct Slots {
    #[serde(default)]
    slots: BTreeMap<String, String>,
}

/// Tracker persisted in a directory next to the repository.
///
/// Layout:
/// - `objects`: append-only log of transferred object ids, one hex id per line
/// - `slots.yaml`: named slots, rewritten atomically on every update
pub struct FileTracker {
    base_path: PathBuf,
    entries: RefCell<HashSet<ObjectId>>,
    log: RefCell<File>,
}

impl FileTracker {
    /// Open (creating if needed) the tracker stored in `base_path`
    pub fn open<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| {
            Error::tracker(format!("failed to create tracker dir {:?}: {}", base_path, e))
        })?;

        let log_path = base_path.join("objects");
        let entries = Self::load_entries(&log_path)?;
        tracing::debug!("Loaded {} tracked objects from {:?}", entries.len(), log_path);

        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| Error::tracker(format!("failed to open {:?}: {}", log_path, e)))?;

        Ok(Self {
            base_path,
            entries: RefCell::new(entries),
            log: RefCell::new(log),
        })
    }

    fn load_entries(path: &Path) -> Result<HashSet<ObjectId>> {
        if !path.exists() {
            return Ok(HashSet::new());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::tracker(format!("failed to read {:?}: {}", path, e)))?;

        content
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| {
                ObjectId::from_hex(line).map_err(|_| {
                    Error::tracker(format!("corrupt entry {:?} in {:?}", line, path))
                })
            })
            .collect()
    }

    fn slots_path(&self) -> PathBuf {
        self.base_path.join("slots.yaml")
    }

    fn read_slots(&self) -> Result<Slots> {
        let path = self.slots_path();
        if !path.exists() {
            return Ok(Slots::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| Error::tracker(format!("failed to read {:?}: {}", path, e)))?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::tracker(format!("failed to parse {:?}: {}", path, e)))
    }

    fn write_slots(&self, slots: &Slots) -> Result<()> {
        let path = self.slots_path();
        let temp_path = self.base_path.join(".slots.yaml.tmp");

        let yaml = serde_yaml::to_string(slots)
            .map_err(|e| Error::tracker(format!("failed to serialize slots: {}", e)))?;

        // Temp file + rename keeps the previous slots intact on a crash
        fs::write(&temp_path, yaml)
            .and_then(|_| fs::rename(&temp_path, &path))
            .map_err(|e| Error::tracker(format!("failed to write {:?}: {}", path, e)))
    }
}

impl Tracker for FileTracker {
    fn has_entry(&self, id: &ObjectId) -> Result<bool> {
        Ok(self.entries.borrow().contains(id))
    }

    fn add_entry(&self, id: &ObjectId) -> Result<()> {
        if !self.entries.borrow_mut().insert(*id) {
            return Ok(());
        }

        let mut log = self.log.borrow_mut();
        writeln!(log, "{}", id)
            .and_then(|_| log.flush())
            .map_err(|e| Error::tracker(format!("failed to record {}: {}", id, e)))
    }

    fn slot(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let slots = self.read_slots()?;
        slots
            .slots
            .get(name)
            .map(|value| {
                hex::decode(value)
                    .map_err(|e| Error::tracker(format!("corrupt slot {}: {}", name, e)))
            })
            .transpose()
    }

    fn set_slot(&self, name: &str, value: &[u8]) -> Result<()> {
        let mut slots = self.read_slots()?;
        slots.slots.insert(name.to_string(), hex::encode(value));
        self.write_slots(&slots)
    }
}
