//! Persisted local state: connection settings and the room metadata map.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::config::settings::Settings;
use crate::talk::types::RoomMeta;

/// Backing storage for settings and room metadata.
///
/// Implementations are read on every operation; nothing secret is cached above them.
pub trait SettingsStore: Send + Sync {
    fn load_settings(&self) -> Result<Settings>;
    fn save_settings(&self, settings: &Settings) -> Result<()>;
    fn load_room_meta(&self) -> Result<HashMap<String, RoomMeta>>;
    fn save_room_meta(&self, meta: &HashMap<String, RoomMeta>) -> Result<()>;
}

/// Volatile store, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<Settings>,
    room_meta: Mutex<HashMap<String, RoomMeta>>,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            room_meta: Mutex::new(HashMap::new()),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load_settings(&self) -> Result<Settings> {
        self.settings
            .lock()
            .map(|s| s.clone())
            .map_err(|_| anyhow!("settings lock poisoned"))
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        let mut guard = self
            .settings
            .lock()
            .map_err(|_| anyhow!("settings lock poisoned"))?;
        *guard = settings.clone();
        Ok(())
    }

    fn load_room_meta(&self) -> Result<HashMap<String, RoomMeta>> {
        self.room_meta
            .lock()
            .map(|m| m.clone())
            .map_err(|_| anyhow!("room meta lock poisoned"))
    }

    fn save_room_meta(&self, meta: &HashMap<String, RoomMeta>) -> Result<()> {
        let mut guard = self
            .room_meta
            .lock()
            .map_err(|_| anyhow!("room meta lock poisoned"))?;
        *guard = meta.clone();
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoreDocument {
    settings: Settings,
    room_meta: HashMap<String, RoomMeta>,
}

/// Single JSON document on disk. A missing file reads as defaults.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreDocument> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(StoreDocument::default()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing {}", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoreDocument::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut StoreDocument)) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow!("store lock poisoned"))?;
        let mut doc = self.read()?;
        apply(&mut doc);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&doc)?)
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn load_settings(&self) -> Result<Settings> {
        Ok(self.read()?.settings)
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.update(|doc| doc.settings = settings.clone())
    }

    fn load_room_meta(&self) -> Result<HashMap<String, RoomMeta>> {
        Ok(self.read()?.room_meta)
    }

    fn save_room_meta(&self, meta: &HashMap<String, RoomMeta>) -> Result<()> {
        self.update(|doc| doc.room_meta = meta.clone())
    }
}
