//! Service configuration from the environment.
//!
//! Sources are declared as indexed families of environment variables:
//!
//! ```text
//! CALENDAR_1_TYPE=caldav
//! CALENDAR_1_URL=https://dav.example.com/remote.php/dav/
//! CALENDAR_1_USERNAME=alice
//! CALENDAR_1_PASSWORD=secret
//! CALENDAR_2_TYPE=ical
//! CALENDAR_2_URL=https://example.com/holidays.ics
//! ```
//!
//! Indices are discovered dynamically and processed in ascending numeric
//! order. An index with an unknown type or missing fields is skipped with a
//! warning; only an empty final source list is fatal. Everything is parsed
//! once at startup into immutable descriptors.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use url::Url;

use calhub_sources::{
    CalDavConfig, CalDavSource, CalendarSource, DocumentCache, IcsUrlSource, SourceError,
    SourceResult,
};

/// One configured calendar source, before construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// CalDAV server with Basic credentials.
    CalDav {
        /// Endpoint URL.
        url: String,
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// Plain `.ics` document URL.
    IcsUrl {
        /// Document URL.
        url: String,
    },
}

impl SourceDescriptor {
    /// The backend kind this descriptor constructs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CalDav { .. } => "caldav",
            Self::IcsUrl { .. } => "ics",
        }
    }
}

/// Errors from configuration parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No usable calendar source survived parsing.
    #[error("no valid calendars configured")]
    NoCalendarsConfigured,

    /// A scalar setting failed to parse.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// The environment key.
        key: String,
        /// The raw value.
        value: String,
    },
}

/// Runtime configuration for the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Ordered source descriptors.
    pub sources: Vec<SourceDescriptor>,
    /// Document cache time-to-live.
    pub cache_ttl: Duration,
    /// Document cache capacity (distinct sources).
    pub cache_capacity: usize,
    /// HTTP listen port.
    pub port: u16,
}

impl ServiceConfig {
    /// Default cache TTL in seconds (`CACHE_TTL_SECONDS`).
    pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

    /// Default cache capacity (`CACHE_CAPACITY`).
    pub const DEFAULT_CACHE_CAPACITY: usize = 100;

    /// Default HTTP port (`CALHUB_PORT`).
    pub const DEFAULT_PORT: u16 = 8080;

    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_pairs(std::env::vars())
    }

    /// Parses configuration from explicit key/value pairs.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ConfigError> {
        let vars: BTreeMap<String, String> = pairs.into_iter().collect();

        let mut indices: Vec<u32> = vars
            .keys()
            .filter_map(|key| {
                let index = key.strip_prefix("CALENDAR_")?.strip_suffix("_TYPE")?;
                match index.parse() {
                    Ok(index) => Some(index),
                    Err(_) => {
                        warn!(key = %key, "Skipping calendar with non-numeric index");
                        None
                    }
                }
            })
            .collect();
        indices.sort_unstable();
        indices.dedup();

        let mut sources = Vec::new();
        for index in indices {
            let prefix = format!("CALENDAR_{index}_");
            let get = |suffix: &str| vars.get(&format!("{prefix}{suffix}")).cloned();

            let kind = get("TYPE").unwrap_or_default().to_lowercase();
            match kind.as_str() {
                "caldav" => {
                    let (Some(url), Some(username), Some(password)) =
                        (get("URL"), get("USERNAME"), get("PASSWORD"))
                    else {
                        warn!(prefix = %prefix, "Skipping CalDAV calendar with missing fields");
                        continue;
                    };
                    if Url::parse(&url).is_err() {
                        warn!(prefix = %prefix, url = %url, "Skipping CalDAV calendar with invalid URL");
                        continue;
                    }
                    sources.push(SourceDescriptor::CalDav {
                        url,
                        username,
                        password,
                    });
                }
                "ical" => {
                    let Some(url) = get("URL") else {
                        warn!(prefix = %prefix, "Skipping iCal calendar with missing URL");
                        continue;
                    };
                    if Url::parse(&url).is_err() {
                        warn!(prefix = %prefix, url = %url, "Skipping iCal calendar with invalid URL");
                        continue;
                    }
                    sources.push(SourceDescriptor::IcsUrl { url });
                }
                other => {
                    warn!(prefix = %prefix, kind = %other, "Skipping calendar with unknown type");
                }
            }
        }

        if sources.is_empty() {
            return Err(ConfigError::NoCalendarsConfigured);
        }

        let cache_ttl = Duration::from_secs(parse_or(
            &vars,
            "CACHE_TTL_SECONDS",
            Self::DEFAULT_CACHE_TTL_SECS,
        )?);
        let cache_capacity = parse_or(&vars, "CACHE_CAPACITY", Self::DEFAULT_CACHE_CAPACITY)?;
        let port = parse_or(&vars, "CALHUB_PORT", Self::DEFAULT_PORT)?;

        Ok(Self {
            sources,
            cache_ttl,
            cache_capacity,
            port,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    vars: &BTreeMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        }),
    }
}

/// Constructs the immutable source set described by `config`.
///
/// CalDAV sources connect during construction; an unreachable endpoint or
/// rejected credentials propagates and is startup-fatal. Source identities
/// are `<kind>-<position>` over the surviving, ordered descriptors.
pub async fn build_sources(
    config: &ServiceConfig,
    cache: Arc<DocumentCache>,
) -> SourceResult<Vec<Arc<dyn CalendarSource>>> {
    let mut sources: Vec<Arc<dyn CalendarSource>> = Vec::new();

    for (position, descriptor) in config.sources.iter().enumerate() {
        let id = format!("{}-{}", descriptor.kind(), position + 1);
        match descriptor {
            SourceDescriptor::CalDav {
                url,
                username,
                password,
            } => {
                let dav_config = CalDavConfig::new(url, username.clone(), password.clone())
                    .map_err(|e| {
                        SourceError::connection(format!("invalid CalDAV URL {url:?}: {e}"))
                            .with_source_name(id.as_str())
                    })?;
                let source =
                    CalDavSource::connect(id.as_str(), dav_config, Arc::clone(&cache)).await?;
                sources.push(Arc::new(source));
            }
            SourceDescriptor::IcsUrl { url } => {
                let parsed = Url::parse(url).map_err(|e| {
                    SourceError::connection(format!("invalid document URL {url:?}: {e}"))
                        .with_source_name(id.as_str())
                })?;
                let source = IcsUrlSource::new(id.as_str(), parsed, Arc::clone(&cache))?;
                sources.push(Arc::new(source));
            }
        }
    }

    Ok(sources)
}
