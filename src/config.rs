use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;

use crate::viewport::Containment;

// ---------------------------------------------------------------------------
// ConfigFile — deserialized from TOML (all fields optional)
// ---------------------------------------------------------------------------

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub marker_attribute: Option<String>,
    pub active_class: Option<String>,
    pub container: Option<String>,
    pub back_to_top: Option<String>,
    pub debounce_ms: Option<u64>,
    pub containment: Option<Containment>,
    pub step_divisor: Option<u32>,
    pub step_interval_ms: Option<u64>,
    #[serde(default)]
    pub viewer: ViewerConfigFile,
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfigFile {
    pub scroll_step: Option<u32>,
    pub sidebar_cols: Option<u16>,
    pub frame_budget_ms: Option<u64>,
    pub watch_interval_ms: Option<u64>,
    pub smooth_scroll_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Config — resolved (all fields concrete)
// ---------------------------------------------------------------------------

pub struct Config {
    pub navigation: NavigationConfig,
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone)]
pub struct NavigationConfig {
    pub marker_attribute: String,
    pub active_class: String,
    pub container: String,
    /// Selector of the browser's back-to-top button.
    pub back_to_top: String,
    pub debounce: Duration,
    pub containment: Containment,
    pub step_divisor: u32,
    pub step_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub scroll_step: u32,
    pub sidebar_cols: u16,
    pub frame_budget: Duration,
    pub watch_interval: Duration,
    pub smooth_scroll: Duration,
}

/// CLI values that take precedence over the config file.
#[derive(Default, Clone)]
pub struct CliOverrides {
    pub marker_attribute: Option<String>,
    pub containment: Option<Containment>,
}

impl ConfigFile {
    /// Merge CLI values (overwrites non-None fields).
    pub fn merge_cli(&mut self, cli: &CliOverrides) {
        if let Some(v) = &cli.marker_attribute {
            debug!("config: CLI override marker_attribute={v}");
            self.marker_attribute = Some(v.clone());
        }
        if let Some(v) = cli.containment {
            debug!("config: CLI override containment={v}");
            self.containment = Some(v);
        }
    }

    /// Resolve to a Config by applying defaults to missing fields.
    pub fn resolve(self) -> Config {
        let config = Config {
            navigation: NavigationConfig {
                marker_attribute: self.marker_attribute.unwrap_or_else(|| "data-nav".into()),
                active_class: self.active_class.unwrap_or_else(|| "active".into()),
                container: self.container.unwrap_or_else(|| "#navbar__list".into()),
                back_to_top: self.back_to_top.unwrap_or_else(|| "#back-to-top".into()),
                debounce: Duration::from_millis(self.debounce_ms.unwrap_or(0)),
                containment: self.containment.unwrap_or_default(),
                step_divisor: self.step_divisor.unwrap_or(10).max(1),
                step_interval: Duration::from_millis(self.step_interval_ms.unwrap_or(15)),
            },
            viewer: ViewerConfig {
                scroll_step: self.viewer.scroll_step.unwrap_or(3),
                sidebar_cols: self.viewer.sidebar_cols.unwrap_or(24),
                frame_budget: Duration::from_millis(self.viewer.frame_budget_ms.unwrap_or(32)),
                watch_interval: Duration::from_millis(
                    self.viewer.watch_interval_ms.unwrap_or(200),
                ),
                smooth_scroll: Duration::from_millis(self.viewer.smooth_scroll_ms.unwrap_or(240)),
            },
        };
        let nav = &config.navigation;
        info!(
            "config: resolved marker={}, active_class={}, container={}, back_to_top={}, debounce={}ms, \
             containment={}, step_divisor={}, step_interval={}ms, scroll_step={}, \
             sidebar_cols={}, frame_budget={}ms, watch_interval={}ms, smooth_scroll={}ms",
            nav.marker_attribute,
            nav.active_class,
            nav.container,
            nav.back_to_top,
            nav.debounce.as_millis(),
            nav.containment,
            nav.step_divisor,
            nav.step_interval.as_millis(),
            config.viewer.scroll_step,
            config.viewer.sidebar_cols,
            config.viewer.frame_budget.as_millis(),
            config.viewer.watch_interval.as_millis(),
            config.viewer.smooth_scroll.as_millis(),
        );
        config
    }
}

/// Resolve the XDG config path for navspy.
fn config_path() -> Option<PathBuf> {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
    Some(config_dir.join("navspy").join("config.toml"))
}

/// Load config file. Returns `ConfigFile::default()` if no file exists.
/// Returns an error if the file exists but cannot be parsed.
pub fn load_config() -> anyhow::Result<ConfigFile> {
    let Some(path) = config_path() else {
        info!("config: no HOME or XDG_CONFIG_HOME set, using defaults");
        return Ok(ConfigFile::default());
    };
    debug!("config: looking for {}", path.display());
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            info!("config: loaded from {}", path.display());
            toml::from_str(&text)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config: {} not found, using defaults", path.display());
            Ok(ConfigFile::default())
        }
        Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml() {
        let cfg: ConfigFile = toml::from_str("").unwrap();
        let resolved = cfg.resolve();
        let nav = &resolved.navigation;
        assert_eq!(nav.marker_attribute, "data-nav");
        assert_eq!(nav.active_class, "active");
        assert_eq!(nav.container, "#navbar__list");
        assert_eq!(nav.back_to_top, "#back-to-top");
        assert_eq!(nav.debounce, Duration::ZERO);
        assert_eq!(nav.containment, Containment::Full);
        assert_eq!(nav.step_divisor, 10);
        assert_eq!(resolved.viewer.scroll_step, 3);
        assert_eq!(resolved.viewer.sidebar_cols, 24);
    }

    #[test]
    fn partial_toml() {
        let text = r#"
            containment = "partial"
            debounce_ms = 40
            back_to_top = "button.top"
            [viewer]
            scroll_step = 10
        "#;
        let cfg: ConfigFile = toml::from_str(text).unwrap();
        let resolved = cfg.resolve();
        assert_eq!(resolved.navigation.containment, Containment::Partial);
        assert_eq!(resolved.navigation.debounce, Duration::from_millis(40));
        assert_eq!(resolved.navigation.back_to_top, "button.top");
        assert_eq!(resolved.viewer.scroll_step, 10);
        // Defaults for unspecified fields
        assert_eq!(resolved.navigation.marker_attribute, "data-nav");
        assert_eq!(resolved.viewer.sidebar_cols, 24);
    }

    #[test]
    fn invalid_toml() {
        assert!(toml::from_str::<ConfigFile>("this is not valid toml [[[").is_err());
        assert!(toml::from_str::<ConfigFile>("containment = \"half\"").is_err());
    }

    #[test]
    fn zero_divisor_is_clamped() {
        let cfg: ConfigFile = toml::from_str("step_divisor = 0").unwrap();
        assert_eq!(cfg.resolve().navigation.step_divisor, 1);
    }

    #[test]
    fn cli_overrides() {
        let mut cfg: ConfigFile =
            toml::from_str("marker_attribute = \"data-menu\"\nactive_class = \"on\"").unwrap();
        cfg.merge_cli(&CliOverrides {
            marker_attribute: Some("data-toc".into()),
            containment: Some(Containment::Partial),
        });
        let resolved = cfg.resolve();
        assert_eq!(resolved.navigation.marker_attribute, "data-toc"); // CLI wins
        assert_eq!(resolved.navigation.containment, Containment::Partial);
        assert_eq!(resolved.navigation.active_class, "on"); // file value kept
    }
}
