use anyhow::Result;
use owo_colors::OwoColorize;
use shiftcal_core::config::SettingsCache;

pub fn run(settings: &mut SettingsCache) -> Result<()> {
    let config_path = settings.path().to_path_buf();
    let config = settings.get()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Records:    {}", config.store().root().display());

    println!("\n{}", "Sync".bold());
    println!("  User:       {}", config.user_id.as_deref().unwrap_or("(not set)"));
    println!("  Calendar:   {}", config.calendar_id.as_deref().unwrap_or("(not set)"));
    println!("  Provider:   shiftcal-provider-{}", config.provider);
    println!("  Prefix:     {}", config.title_prefix);
    println!("  Timezone:   {}", config.timezone);

    if !config.provider_config.is_empty() {
        println!("\n{}", "Provider config".bold());
        let mut keys: Vec<_> = config.provider_config.keys().collect();
        keys.sort();
        for key in keys {
            println!("  {} = {}", key, config.provider_config[key]);
        }
    }

    Ok(())
}
