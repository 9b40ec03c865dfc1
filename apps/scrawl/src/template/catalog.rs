//! Named template records with a primary selection.
//!
//! On disk a catalog is a directory holding `templates.txt` (space-separated
//! record names) and one `<name>.template` JSON file per record. Loading never
//! fails outright: the built-in `lined` and `blank` records are always present,
//! and unreadable entries are logged and skipped.
//!
//! Names double as file stems, so they are restricted to ASCII letters, digits,
//! `-` and `_`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::template::{ConfigError, PaperStyle, TemplateRecord};

const INDEX_FILE: &str = "templates.txt";
const RECORD_EXTENSION: &str = "template";

#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    primary: String,
    templates: BTreeMap<String, TemplateRecord>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateCatalog {
    /// Catalog holding only the built-in records, with `lined` as primary.
    pub fn new() -> Self {
        let mut lined = TemplateRecord::new("lined", [40.0, 20.0, 100.0, 160.0], 28.0);
        lined.paper = PaperStyle::Lined;
        let blank = TemplateRecord::new("blank", [50.0, 50.0, 50.0, 50.0], 28.0);

        let mut templates = BTreeMap::new();
        templates.insert(lined.name.clone(), lined);
        templates.insert(blank.name.clone(), blank);

        Self {
            primary: "lined".to_string(),
            templates,
        }
    }

    pub fn get(&self, name: &str) -> Option<&TemplateRecord> {
        self.templates.get(name)
    }

    pub fn primary(&self) -> &TemplateRecord {
        // The primary name is only ever set to a key present in the map.
        &self.templates[&self.primary]
    }

    pub fn set_primary(&mut self, name: &str) -> Result<(), ConfigError> {
        if !self.templates.contains_key(name) {
            return Err(ConfigError::UnknownTemplate(name.to_string()));
        }
        self.primary = name.to_string();
        Ok(())
    }

    /// Resolves `name`, falling back to the primary record when `None`.
    pub fn resolve(&self, name: Option<&str>) -> Result<&TemplateRecord, ConfigError> {
        match name {
            Some(n) => self
                .get(n)
                .ok_or_else(|| ConfigError::UnknownTemplate(n.to_string())),
            None => Ok(self.primary()),
        }
    }

    /// Adds or replaces a record by name.
    pub fn insert(&mut self, record: TemplateRecord) -> Result<(), ConfigError> {
        check_name(&record.name)?;
        self.templates.insert(record.name.clone(), record);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    /// Merges the records stored in `dir` into this catalog. Returns how many were loaded.
    pub fn load_dir(&mut self, dir: &Path) -> usize {
        let index_path = dir.join(INDEX_FILE);
        let index = match fs::read_to_string(&index_path) {
            Ok(index) => index,
            Err(e) => {
                warn!(path = %index_path.display(), "Error loading templates: {e}");
                return 0;
            }
        };

        let mut loaded = 0;
        for name in index.split_whitespace() {
            let record = check_name(name)
                .map_err(anyhow::Error::from)
                .and_then(|()| read_record(dir, name))
                .and_then(|record| self.insert(record).map_err(anyhow::Error::from));
            match record {
                Ok(()) => loaded += 1,
                Err(e) => warn!(template = name, "Skipping template: {e:#}"),
            }
        }
        info!(dir = %dir.display(), loaded, "Template catalog loaded");
        loaded
    }

    /// Writes the index and every record into `dir`. A record that fails to save is
    /// logged and the rest continue; only an unwritable index is an error.
    pub fn save_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create template dir {}", dir.display()))?;

        let index = self.names().collect::<Vec<_>>().join(" ");
        let index_path = dir.join(INDEX_FILE);
        fs::write(&index_path, index)
            .with_context(|| format!("failed to save {}", index_path.display()))?;

        for record in self.templates.values() {
            if let Err(e) = write_record(dir, record) {
                warn!(template = %record.name, "Template failed to save, continuing: {e:#}");
            }
        }
        Ok(())
    }
}

fn check_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidTemplateName(name.to_string()))
    }
}

fn record_path(dir: &Path, name: &str) -> std::path::PathBuf {
    dir.join(format!("{name}.{RECORD_EXTENSION}"))
}

fn read_record(dir: &Path, name: &str) -> Result<TemplateRecord> {
    let path = record_path(dir, name);
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record: TemplateRecord = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(record)
}

fn write_record(dir: &Path, record: &TemplateRecord) -> Result<()> {
    let path = record_path(dir, &record.name);
    let data = serde_json::to_vec_pretty(record)?;
    fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
