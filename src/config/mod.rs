use anyhow::Result;
use std::env;

use crate::normalize::TimestampPolicy;
use crate::pipeline::{PartyCacheKey, PipelineOptions, DEFAULT_SERVICE_NAME};
use crate::storage::DEFAULT_PACKAGE;

/// Application-wide defaults. These can be overridden by env vars (or a `.env`
/// file) and by CLI flags, but never require a config file.
#[derive(Debug, Clone)]
pub struct AppDefaults {
    pub service_name: String,
    pub package: String,
    pub strict_timestamps: bool,
    pub party_cache_key: PartyCacheKey,
}

impl AppDefaults {
    pub fn load() -> Result<Self> {
        let service_name =
            env::var("MAILROOM_SERVICE_NAME").unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string());
        let package = env::var("MAILROOM_PACKAGE").unwrap_or_else(|_| DEFAULT_PACKAGE.to_string());
        let strict_timestamps = env::var("MAILROOM_STRICT_TIMESTAMPS")
            .ok()
            .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let party_cache_key = match env::var("MAILROOM_PARTY_CACHE_KEY") {
            Ok(raw) => raw.parse::<PartyCacheKey>()?,
            Err(_) => PartyCacheKey::default(),
        };

        Ok(Self {
            service_name,
            package,
            strict_timestamps,
            party_cache_key,
        })
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            service_name: self.service_name.clone(),
            timestamps: if self.strict_timestamps {
                TimestampPolicy::Strict
            } else {
                TimestampPolicy::Lenient
            },
            party_cache_key: self.party_cache_key,
        }
    }
}
