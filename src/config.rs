use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::time::Duration;
use crate::error::ConfigError;
use crate::filter::FilterConfig;

pub const DEFAULT_RESULTS_PER_PAGE: usize = 20;
pub const DEFAULT_PAGES_PER_QUERY: usize = 2;
pub const DEFAULT_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Settings for a single run. The API key lives here and nowhere else.
pub struct RunConfig {
    pub niche: String,
    pub api_key: SecretString,
    pub results_per_page: usize,
    pub pages_per_query: usize,
    pub delay: Duration,
    pub filter: FilterConfig,
    /// Worker count for the page-visit phase. 1 keeps every request sequential.
    pub concurrency: usize,
}

impl RunConfig {
    /// Defaults for everything except the two required inputs. Call `validate` before use.
    pub fn new(niche: impl Into<String>, api_key: impl Into<String>) -> Self {
        RunConfig {
            niche: niche.into(),
            api_key: SecretString::from(api_key.into()),
            results_per_page: DEFAULT_RESULTS_PER_PAGE,
            pages_per_query: DEFAULT_PAGES_PER_QUERY,
            delay: Duration::from_secs_f64(DEFAULT_DELAY_SECS),
            filter: FilterConfig::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.niche.trim().is_empty() {
            return Err(ConfigError::MissingNiche);
        }
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        check_range("results_per_page", self.results_per_page as f64, 10.0, 100.0)?;
        check_range("pages_per_query", self.pages_per_query as f64, 1.0, 5.0)?;
        check_range("delay_secs", self.delay.as_secs_f64(), 0.0, 5.0)?;
        check_range("max_per_domain", self.filter.max_per_domain as f64, 1.0, 10.0)?;
        check_range("concurrency", self.concurrency as f64, 1.0, 16.0)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange { field, value, min, max });
    }
    Ok(())
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("niche", &self.niche)
            .field("api_key", &"[REDACTED]")
            .field("results_per_page", &self.results_per_page)
            .field("pages_per_query", &self.pages_per_query)
            .field("delay", &self.delay)
            .field("filter", &self.filter)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}
