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

//! Delivery of one notification to one subscriber.

use crate::config::{DeliveryConfig, DeliveryScheme};
use crate::data_plane::subscriber_registry::SubscriberAddress;
use crate::notification::NotificationMessage;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

const NOTIFICATION_CONTENT_TYPE: &str = "text/plain";

/// Sends one message to one subscriber. Implementations never retry.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn deliver(
        &self,
        subscriber: &SubscriberAddress,
        message: &NotificationMessage,
    ) -> Result<(), DeliveryError>;
}

#[derive(Debug)]
pub enum DeliveryError {
    ClientBuild(reqwest::Error),
    Transport { url: String, source: reqwest::Error },
    Status { url: String, status: u16 },
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::ClientBuild(err) => write!(f, "failed to build HTTP client: {err}"),
            DeliveryError::Transport { url, source } => {
                write!(f, "POST {url} failed: {source}")
            }
            DeliveryError::Status { url, status } => {
                write!(f, "POST {url} answered with status {status}")
            }
        }
    }
}

impl Error for DeliveryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DeliveryError::ClientBuild(err) => Some(err),
            DeliveryError::Transport { source, .. } => Some(source),
            DeliveryError::Status { .. } => None,
        }
    }
}

/// HTTP POST delivery with a per-request timeout.
#[derive(Clone, Debug)]
pub struct HttpDeliveryClient {
    client: Client,
    scheme: DeliveryScheme,
    path: String,
}

impl HttpDeliveryClient {
    pub fn new(config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(DeliveryError::ClientBuild)?;

        Ok(Self {
            client,
            scheme: config.scheme,
            path: config.path.clone(),
        })
    }

    /// `<scheme>://<subscriber><path>`
    pub fn notification_url(&self, subscriber: &SubscriberAddress) -> String {
        format!("{}://{}{}", self.scheme.as_str(), subscriber, self.path)
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn deliver(
        &self,
        subscriber: &SubscriberAddress,
        message: &NotificationMessage,
    ) -> Result<(), DeliveryError> {
        let url = self.notification_url(subscriber);

        let response = match self
            .client
            .post(&url)
            .header(CONTENT_TYPE, NOTIFICATION_CONTENT_TYPE)
            .body(message.as_str().to_owned())
            .send()
            .await
        {
            Ok(response) => response,
            Err(source) => return Err(DeliveryError::Transport { url, source }),
        };

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status {
                url,
                status: status.as_u16(),
            })
        }
    }
}
