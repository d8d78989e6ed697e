use indicatif::{ProgressBar, ProgressStyle};
use std::env;

/// Progress bar configuration from environment variables. Bars are on by
/// default and turned off with `PROGRESS_ENABLED=false` (batch/cron runs).
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    pub enabled: bool,
}

impl ProgressConfig {
    pub fn from_env() -> Self {
        let enabled = env::var("PROGRESS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .unwrap_or(true);
        Self { enabled }
    }

    pub fn create_bar(&self, len: u64, template: &str) -> Option<ProgressBar> {
        if !self.enabled {
            return None;
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(template)
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        Some(pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_config_creates_no_bar() {
        let config = ProgressConfig { enabled: false };
        assert!(config
            .create_bar(10, "{pos}/{len}")
            .is_none());
    }

    #[test]
    fn test_enabled_config_creates_bar() {
        let config = ProgressConfig { enabled: true };
        let bar = config.create_bar(10, "{pos}/{len}").unwrap();
        assert_eq!(bar.length(), Some(10));
    }
}
