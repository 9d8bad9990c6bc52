use crate::core::settings::Settings;
use anyhow::{Context, Result};

/// Field overrides given on the command line. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub uid: Option<String>,
    pub email: Option<String>,
    pub device_id: Option<String>,
    pub interval: Option<u64>,
    pub base_url: Option<String>,
    pub settle_delay_ms: Option<u64>,
    pub allow_overlap: Option<bool>,
}

impl SettingsUpdate {
    /// Applies the overrides and reports whether anything changed.
    pub fn apply(&self, settings: &mut Settings) -> bool {
        let before = settings.clone();

        if let Some(uid) = &self.uid {
            settings.account.uid = uid.clone();
        }
        if let Some(email) = &self.email {
            settings.account.email = email.clone();
        }
        if let Some(device_id) = &self.device_id {
            settings.account.device_id = device_id.clone();
        }
        if let Some(interval) = self.interval {
            settings.account.interval = interval;
        }
        if let Some(base_url) = &self.base_url {
            settings.engine.base_url = base_url.clone();
        }
        if let Some(delay) = self.settle_delay_ms {
            settings.engine.settle_delay_ms = delay;
        }
        if let Some(allow_overlap) = self.allow_overlap {
            settings.engine.allow_overlap = allow_overlap;
        }

        *settings != before
    }
}

pub fn show() -> Result<()> {
    let settings = Settings::load();
    let content = toml::to_string_pretty(&settings).context("Failed to serialize settings")?;
    print!("{content}");
    Ok(())
}

pub fn path() -> Result<()> {
    let path = Settings::config_path().context("Could not determine config directory")?;
    println!("{}", path.display());
    Ok(())
}

pub fn set(update: SettingsUpdate) -> Result<()> {
    let mut settings = Settings::load();
    if !update.apply(&mut settings) {
        println!("Nothing to change");
        return Ok(());
    }

    let path = settings.save()?;
    println!("Saved {}", path.display());
    Ok(())
}
