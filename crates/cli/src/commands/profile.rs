//! `arka configure | set-api | see-api | delete-config` — profile management.

use std::path::Path;

use anyhow::Context;
use arka_config::{AppConfig, Profile, redact};
use arka_core::ProviderKind;
use colored::Colorize;

fn load(path: &Path) -> anyhow::Result<AppConfig> {
    AppConfig::load_from(path).context("Failed to load config")
}

fn save(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    config.save_to(path).context("Failed to save config")
}

pub fn configure(
    path: &Path,
    name: &str,
    provider: &str,
    model: &str,
    api_key: &str,
    search_api_key: Option<String>,
) -> anyhow::Result<()> {
    let kind: ProviderKind = provider.parse().map_err(anyhow::Error::msg)?;
    if api_key.trim().is_empty() {
        anyhow::bail!("--api-key must not be empty");
    }

    let mut config = load(path)?;
    let mut profile = Profile::new(kind.as_str(), model, api_key);
    // Keep an existing search key unless a new one was given.
    profile.search_api_key = search_api_key.or_else(|| {
        config
            .profiles
            .get(name)
            .and_then(|existing| existing.search_api_key.clone())
    });
    config.upsert_profile(name, profile);
    save(&config, path)?;

    println!(
        "{} Profile '{}' saved and active ({} / {})",
        "✓".green(),
        name.bold(),
        kind.display_name(),
        model
    );
    Ok(())
}

pub fn set_active(path: &Path, name: &str) -> anyhow::Result<()> {
    let mut config = load(path)?;
    config.set_active(name)?;
    save(&config, path)?;
    println!("{} Active profile is now '{}'", "✓".green(), name.bold());
    Ok(())
}

pub fn list(path: &Path) -> anyhow::Result<()> {
    let config = load(path)?;
    if config.profiles.is_empty() {
        println!("No profiles configured. Run `arka configure` to add one.");
        return Ok(());
    }
    print!("{}", render_profiles(&config));
    Ok(())
}

pub fn delete(path: &Path, name: &str) -> anyhow::Result<()> {
    let mut config = load(path)?;
    config.remove_profile(name)?;
    save(&config, path)?;
    println!("{} Deleted profile '{}'", "✓".green(), name.bold());
    if config.active_profile.is_none() && !config.profiles.is_empty() {
        println!("No profile is active. Pick one with `arka set-api <name>`.");
    }
    Ok(())
}

/// One block per profile; the active one is starred. Keys are redacted.
fn render_profiles(config: &AppConfig) -> String {
    let mut out = String::new();
    for (name, profile) in &config.profiles {
        let marker = if config.active_profile.as_deref() == Some(name.as_str()) {
            "*"
        } else {
            " "
        };
        out.push_str(&format!("{marker} {name}\n"));
        out.push_str(&format!("    provider:   {}\n", profile.provider));
        out.push_str(&format!("    model:      {}\n", profile.model));
        out.push_str(&format!("    api key:    {}\n", redact(&profile.api_key)));
        if let Some(key) = &profile.search_api_key {
            out.push_str(&format!("    search key: {}\n", redact(key)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configure_then_switch_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        configure(&path, "work", "anthropic", "claude-sonnet-4-20250514", "sk-ant-1", None).unwrap();
        configure(&path, "home", "openai", "gpt-4o", "sk-2", Some("tvly-1".into())).unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.active_profile.as_deref(), Some("home"));
        assert_eq!(config.profiles["work"].provider, "claude");

        set_active(&path, "work").unwrap();
        assert_eq!(
            AppConfig::load_from(&path).unwrap().active_profile.as_deref(),
            Some("work")
        );

        delete(&path, "work").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert!(config.active_profile.is_none());
        assert_eq!(config.profiles.len(), 1);
        assert!(delete(&path, "work").is_err());
    }

    #[test]
    fn reconfigure_keeps_search_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        configure(&path, "p", "gemini", "gemini-2.0-flash", "g-1", Some("tvly-1".into())).unwrap();
        configure(&path, "p", "gemini", "gemini-2.5-pro", "g-2", None).unwrap();

        let profile = &AppConfig::load_from(&path).unwrap().profiles["p"];
        assert_eq!(profile.model, "gemini-2.5-pro");
        assert_eq!(profile.search_api_key.as_deref(), Some("tvly-1"));
    }

    #[test]
    fn configure_rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(configure(&path, "p", "mistral", "m", "k", None).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn listing_redacts_keys() {
        let mut config = AppConfig::default();
        config.upsert_profile("a", Profile::new("openai", "gpt-4o", "sk-very-secret-key-9876"));
        let out = render_profiles(&config);
        assert!(out.starts_with("* a\n"));
        assert!(out.contains("[REDACTED]...9876"));
        assert!(!out.contains("very-secret"));
    }
}
