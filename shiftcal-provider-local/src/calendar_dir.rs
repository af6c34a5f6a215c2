//! Calendars stored as one JSON file of events each.

use anyhow::{Context, Result};
use shiftcal_core::event::{CalendarInfo, EventDraft, EventMatch, ExternalEvent, TaggedEvent};
use std::path::{Path, PathBuf};

const ACCOUNT_NAME: &str = "local";

fn default_dir() -> Result<PathBuf> {
    Ok(dirs::data_dir()
        .context("Could not determine data directory")?
        .join("shiftcal")
        .join("calendars"))
}

pub struct CalendarDir {
    root: PathBuf,
}

impl CalendarDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CalendarDir { root: root.into() }
    }

    /// Resolve the directory from the `local_dir` provider parameter.
    pub fn from_params(provider_config: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        match provider_config.get("local_dir").and_then(|v| v.as_str()) {
            Some(dir) => Ok(Self::new(shellexpand::tilde(dir).into_owned())),
            None => Ok(Self::new(default_dir()?)),
        }
    }

    fn path(&self, calendar_id: &str) -> Result<PathBuf> {
        if calendar_id.is_empty() || calendar_id.starts_with('.') || calendar_id.contains(['/', '\\']) {
            anyhow::bail!("Invalid calendar id '{}'", calendar_id);
        }
        Ok(self.root.join(format!("{}.json", calendar_id)))
    }

    fn load(&self, calendar_id: &str) -> Result<Vec<ExternalEvent>> {
        let path = self.path(calendar_id)?;
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn save(&self, calendar_id: &str, events: &[ExternalEvent]) -> Result<()> {
        let path = self.path(calendar_id)?;
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create {}", self.root.display()))?;

        let contents = serde_json::to_string_pretty(events)?;
        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, contents)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }

    fn calendar_ids(&self) -> Result<Vec<String>> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Ok(Vec::new());
        };

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "json"))
            .filter_map(|path| file_stem(&path))
            .collect();

        ids.sort();
        Ok(ids)
    }

    pub fn calendars(&self) -> Result<Vec<CalendarInfo>> {
        Ok(self
            .calendar_ids()?
            .into_iter()
            .map(|id| CalendarInfo {
                display_name: id.clone(),
                account_name: ACCOUNT_NAME.to_string(),
                id,
            })
            .collect())
    }

    pub fn insert(&self, calendar_id: &str, draft: &EventDraft) -> Result<String> {
        let mut events = self.load(calendar_id)?;
        let id = uuid::Uuid::new_v4().to_string();
        events.push(ExternalEvent::from_draft(id.clone(), calendar_id, draft));
        self.save(calendar_id, &events)?;
        Ok(id)
    }

    /// Event ids are unique across calendars, so lookups scan every file.
    fn find(&self, event_id: &str) -> Result<Option<String>> {
        for calendar_id in self.calendar_ids()? {
            if self.load(&calendar_id)?.iter().any(|e| e.id == event_id) {
                return Ok(Some(calendar_id));
            }
        }
        Ok(None)
    }

    pub fn exists(&self, event_id: &str) -> Result<bool> {
        Ok(self.find(event_id)?.is_some())
    }

    pub fn delete(&self, event_id: &str) -> Result<bool> {
        let Some(calendar_id) = self.find(event_id)? else {
            return Ok(false);
        };

        let mut events = self.load(&calendar_id)?;
        events.retain(|e| e.id != event_id);
        self.save(&calendar_id, &events)?;
        Ok(true)
    }

    pub fn query_by_title(&self, calendar_id: &str, title: &str) -> Result<Vec<EventMatch>> {
        Ok(self
            .load(calendar_id)?
            .into_iter()
            .filter(|e| e.title == title)
            .map(|e| EventMatch {
                id: e.id,
                start: e.start,
            })
            .collect())
    }

    pub fn list_tagged(&self, calendar_id: &str, title_prefix: &str) -> Result<Vec<TaggedEvent>> {
        Ok(self
            .load(calendar_id)?
            .into_iter()
            .filter(|e| e.title.starts_with(title_prefix))
            .map(|e| TaggedEvent {
                id: e.id,
                title: e.title,
            })
            .collect())
    }
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
