/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Relay configuration loaded from JSON5.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use crate::control_plane::event_subscription::DEFAULT_APP_NAME;

pub const DEFAULT_MESSAGE_QUEUE_SIZE: u16 = 64;
pub const DEFAULT_MAX_IN_FLIGHT_DELIVERIES: u16 = 8;
pub const DEFAULT_NOTIFICATION_PATH: &str = "/notification/notify";
pub const DEFAULT_DELIVERY_TIMEOUT_MS: u64 = 1000;

/// Top-level relay configuration, read from JSON5.
///
/// Every section is optional; an empty document yields [`RelayConfig::default`].
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    #[serde(default)]
    pub relay: RelaySettings,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Subscribers present from the start.
    #[serde(default)]
    pub subscribers: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct RelaySettings {
    /// Module identity the event subscription is registered under.
    pub app_name: String,
    /// Queue depth above which a dispatch backlog warning is logged. Queued
    /// notifications are never dropped.
    pub message_queue_size: u16,
    pub max_in_flight_deliveries: u16,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            message_queue_size: DEFAULT_MESSAGE_QUEUE_SIZE,
            max_in_flight_deliveries: DEFAULT_MAX_IN_FLIGHT_DELIVERIES,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryScheme {
    #[default]
    Http,
    Https,
}

impl DeliveryScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryScheme::Http => "http",
            DeliveryScheme::Https => "https",
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct DeliveryConfig {
    pub scheme: DeliveryScheme,
    pub path: String,
    /// Bound on one POST, connect included.
    pub timeout_ms: u64,
    /// Skips certificate and host-name verification for `https` subscribers.
    pub accept_invalid_certs: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            scheme: DeliveryScheme::Http,
            path: DEFAULT_NOTIFICATION_PATH.to_string(),
            timeout_ms: DEFAULT_DELIVERY_TIMEOUT_MS,
            accept_invalid_certs: false,
        }
    }
}

impl RelayConfig {
    pub fn from_json5_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RelayConfig = json5::from_str(contents).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json5_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.app_name.is_empty() {
            return Err(ConfigError::Invalid("relay.app_name must not be empty"));
        }
        if self.relay.message_queue_size == 0 {
            return Err(ConfigError::Invalid(
                "relay.message_queue_size must be greater than zero",
            ));
        }
        if self.relay.max_in_flight_deliveries == 0 {
            return Err(ConfigError::Invalid(
                "relay.max_in_flight_deliveries must be greater than zero",
            ));
        }
        if self.delivery.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "delivery.timeout_ms must be greater than zero",
            ));
        }
        if !self.delivery.path.starts_with('/') {
            return Err(ConfigError::Invalid("delivery.path must start with `/`"));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(json5::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "unable to read config file {}: {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "unable to parse config: {err}"),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = RelayConfig::from_json5_str("{}").expect("empty config should parse");

        assert_eq!(config, RelayConfig::default());
        assert_eq!(config.relay.app_name, "nbapi");
        assert_eq!(config.delivery.path, "/notification/notify");
        assert_eq!(config.delivery.timeout_ms, 1000);
        assert_eq!(config.delivery.scheme, DeliveryScheme::Http);
        assert!(!config.delivery.accept_invalid_certs);
        assert!(config.subscribers.is_empty());
    }

    #[test]
    fn json5_document_overrides_sections() {
        let config = RelayConfig::from_json5_str(
            r#"{
                // partial sections fall back to defaults
                relay: { message_queue_size: 16 },
                delivery: { scheme: "https", accept_invalid_certs: true, timeout_ms: 250 },
                subscribers: ["10.0.0.5:8181", "gui.local"],
            }"#,
        )
        .expect("config should parse");

        assert_eq!(config.relay.message_queue_size, 16);
        assert_eq!(
            config.relay.max_in_flight_deliveries,
            DEFAULT_MAX_IN_FLIGHT_DELIVERIES
        );
        assert_eq!(config.delivery.scheme, DeliveryScheme::Https);
        assert!(config.delivery.accept_invalid_certs);
        assert_eq!(config.delivery.timeout_ms, 250);
        assert_eq!(config.subscribers, vec!["10.0.0.5:8181", "gui.local"]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = RelayConfig::from_json5_str("{ relay: { queue: 1 } }")
            .expect_err("unknown field should fail");

        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn validation_rejects_zero_limits_and_relative_path() {
        for document in [
            "{ relay: { message_queue_size: 0 } }",
            "{ relay: { max_in_flight_deliveries: 0 } }",
            "{ relay: { app_name: \"\" } }",
            "{ delivery: { timeout_ms: 0 } }",
            "{ delivery: { path: \"notify\" } }",
        ] {
            assert!(
                matches!(
                    RelayConfig::from_json5_str(document),
                    Err(ConfigError::Invalid(_))
                ),
                "{document} should fail validation"
            );
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let err = RelayConfig::from_file("/nonexistent/relay.json5")
            .expect_err("missing file should fail");

        assert!(err.to_string().contains("/nonexistent/relay.json5"));
    }
}
