//! Configuration for shiftcal hosts.

mod settings_cache;
mod shiftcal_config;

pub use settings_cache::SettingsCache;
pub use shiftcal_config::ShiftcalConfig;
