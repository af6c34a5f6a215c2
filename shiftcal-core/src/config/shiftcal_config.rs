//! Global shiftcal configuration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{ShiftcalError, ShiftcalResult};
use crate::event_factory::{DEFAULT_TITLE_PREFIX, EventFactory};
use crate::gateway::{Provider, ProviderGateway};
use crate::store::LocalStore;

static DEFAULT_DATA_PATH: &str = "~/shiftcal";
static DEFAULT_PROVIDER: &str = "local";
static DEFAULT_TIMEZONE: &str = "Europe/Brussels";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn is_default_data_dir(p: &PathBuf) -> bool {
    *p == default_data_dir()
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_title_prefix() -> String {
    DEFAULT_TITLE_PREFIX.to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// Configuration at ~/.config/shiftcal/config.toml, overridable with
/// `SHIFTCAL_*` environment variables.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ShiftcalConfig {
    /// Where service records are kept
    #[serde(default = "default_data_dir", skip_serializing_if = "is_default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Target calendar of the mirror
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,

    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,

    /// IANA name of the timezone service times are expressed in
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Passed through to every provider request
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub provider_config: HashMap<String, toml::Value>,
}

impl Default for ShiftcalConfig {
    fn default() -> Self {
        ShiftcalConfig {
            data_dir: default_data_dir(),
            user_id: None,
            calendar_id: None,
            provider: default_provider(),
            title_prefix: default_title_prefix(),
            timezone: default_timezone(),
            provider_config: HashMap::new(),
        }
    }
}

impl ShiftcalConfig {
    pub fn config_path() -> ShiftcalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ShiftcalError::Config("Could not determine config directory".into()))?
            .join("shiftcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path`, writing a commented default file first if missing.
    pub fn load_from(path: &Path) -> ShiftcalResult<Self> {
        if !path.exists() {
            Self::create_default_config(path)?;
        }

        let config: ShiftcalConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("SHIFTCAL"))
            .build()
            .map_err(|e| ShiftcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ShiftcalError::Config(e.to_string()))?;

        config.timezone()?;
        Ok(config)
    }

    /// Point the config file at another calendar. Other keys stay as written
    /// and `SHIFTCAL_*` overrides never reach the file.
    pub fn write_calendar_id(path: &Path, calendar_id: &str) -> ShiftcalResult<()> {
        let mut table: toml::Table = match std::fs::read_to_string(path) {
            Ok(contents) => {
                toml::from_str(&contents).map_err(|e| ShiftcalError::Config(e.to_string()))?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
            Err(e) => return Err(e.into()),
        };

        table.insert(
            "calendar_id".to_string(),
            toml::Value::String(calendar_id.to_string()),
        );

        let content =
            toml::to_string_pretty(&table).map_err(|e| ShiftcalError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)
            .map_err(|e| ShiftcalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> ShiftcalResult<()> {
        let contents = format!(
            "\
# shiftcal configuration

# Where service records are stored:
# data_dir = \"{}\"

# Whose records to mirror:
# user_id = \"agent\"

# Calendar the services are mirrored into (see `shiftcal calendars`):
# calendar_id = \"work\"

# Calendar provider binary (shiftcal-provider-<name>):
# provider = \"{}\"

# Prefix of every generated event title:
# title_prefix = \"{}\"

# Timezone service times are expressed in:
# timezone = \"{}\"

# Extra parameters passed to the provider:
# [provider_config]
# local_dir = \"~/.local/share/shiftcal/calendars\"
",
            DEFAULT_DATA_PATH, DEFAULT_PROVIDER, DEFAULT_TITLE_PREFIX, DEFAULT_TIMEZONE
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ShiftcalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ShiftcalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn timezone(&self) -> ShiftcalResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ShiftcalError::Config(format!("Unknown timezone '{}'", self.timezone)))
    }

    pub fn user_id(&self) -> ShiftcalResult<&str> {
        self.user_id
            .as_deref()
            .ok_or_else(|| ShiftcalError::Config("No user_id configured".into()))
    }

    pub fn calendar_id(&self) -> ShiftcalResult<&str> {
        self.calendar_id
            .as_deref()
            .ok_or_else(|| ShiftcalError::Config("No calendar_id configured".into()))
    }

    pub fn event_factory(&self) -> ShiftcalResult<EventFactory> {
        Ok(EventFactory::new(self.title_prefix.clone(), self.timezone()?))
    }

    pub fn gateway(&self) -> ProviderGateway {
        ProviderGateway::new(
            Provider::from_name(&self.provider),
            self.provider_config.clone(),
        )
    }

    pub fn store(&self) -> LocalStore {
        LocalStore::new(self.data_path())
    }
}
