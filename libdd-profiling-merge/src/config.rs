// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::codec::PprofCodec;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(64) {
    Some(n) => n,
    None => unreachable!(),
};
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 256 * 1024 * 1024;
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

pub const BATCH_SIZE_ENV: &str = "DD_PROFILING_MERGE_BATCH_SIZE";
pub const MAX_PAYLOAD_BYTES_ENV: &str = "DD_PROFILING_MERGE_MAX_PAYLOAD_BYTES";
pub const COMPRESSION_LEVEL_ENV: &str = "DD_PROFILING_MERGE_COMPRESSION_LEVEL";

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// How many stored samples are decoded and combined at a time. Bounds
    /// the memory held by decoded-but-not-yet-merged profiles.
    pub batch_size: NonZeroUsize,
    /// Largest accepted payload after decompression, in bytes.
    pub max_payload_bytes: usize,
    /// Gzip level of the serialized merge result, 0 through 9.
    pub compression_level: u32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl MergeConfig {
    /// The defaults, overridden by whichever `DD_PROFILING_MERGE_*`
    /// environment variables are set. Empty variables count as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(parse_env::str_not_empty)
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(batch_size) = parse_env::parse(BATCH_SIZE_ENV, var(BATCH_SIZE_ENV))? {
            config.batch_size = batch_size;
        }
        if let Some(max) = parse_env::parse(MAX_PAYLOAD_BYTES_ENV, var(MAX_PAYLOAD_BYTES_ENV))? {
            config.max_payload_bytes = max;
        }
        if let Some(level) = parse_env::parse(COMPRESSION_LEVEL_ENV, var(COMPRESSION_LEVEL_ENV))? {
            config.compression_level = level;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(ConfigError::CompressionLevel(self.compression_level));
        }
        Ok(())
    }

    pub fn codec(&self) -> PprofCodec {
        PprofCodec::new(self.max_payload_bytes)
    }
}

pub mod parse_env {
    use crate::error::ConfigError;
    use std::{env, str::FromStr};

    pub fn str_not_empty(name: &str) -> Option<String> {
        env::var(name).ok().filter(|s| !s.is_empty())
    }

    /// Unlike a missing variable, one that is set but does not parse is an
    /// error.
    pub fn parse<T: FromStr>(
        name: &'static str,
        value: Option<String>,
    ) -> Result<Option<T>, ConfigError> {
        match value {
            None => Ok(None),
            Some(value) => match value.trim().parse::<T>() {
                Ok(parsed) => Ok(Some(parsed)),
                Err(_) => Err(ConfigError::InvalidValue { name, value }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(vars: &[(&str, &str)]) -> Result<MergeConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MergeConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = from(&[]).unwrap();
        assert_eq!(MergeConfig::default(), config);
        assert_eq!(64, config.batch_size.get());
        assert_eq!(256 << 20, config.max_payload_bytes);
        assert_eq!(6, config.compression_level);
    }

    #[test]
    fn overrides() {
        let config = from(&[
            (BATCH_SIZE_ENV, "8"),
            (MAX_PAYLOAD_BYTES_ENV, " 1024 "),
            (COMPRESSION_LEVEL_ENV, "9"),
        ])
        .unwrap();
        assert_eq!(8, config.batch_size.get());
        assert_eq!(1024, config.max_payload_bytes);
        assert_eq!(9, config.compression_level);
        assert_eq!(1024, config.codec().max_payload_bytes());
    }

    #[test]
    fn invalid_values() {
        assert_eq!(
            Err(ConfigError::InvalidValue {
                name: BATCH_SIZE_ENV,
                value: "0".to_owned()
            }),
            from(&[(BATCH_SIZE_ENV, "0")])
        );
        assert_eq!(
            Err(ConfigError::InvalidValue {
                name: MAX_PAYLOAD_BYTES_ENV,
                value: "lots".to_owned()
            }),
            from(&[(MAX_PAYLOAD_BYTES_ENV, "lots")])
        );
        assert_eq!(
            Err(ConfigError::CompressionLevel(10)),
            from(&[(COMPRESSION_LEVEL_ENV, "10")])
        );
    }

    #[test]
    fn deserialize_fills_in_defaults() {
        let config: MergeConfig = serde_json::from_str(r#"{"batch_size": 3}"#).unwrap();
        assert_eq!(3, config.batch_size.get());
        assert_eq!(DEFAULT_MAX_PAYLOAD_BYTES, config.max_payload_bytes);

        let err = serde_json::from_str::<MergeConfig>(r#"{"batch_size": 0}"#);
        assert!(err.is_err());
    }
}
