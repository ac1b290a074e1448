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

use notification_relay::{
    HostFramework, NotificationRelay, RelayConfig, DEFAULT_NOTIFICATION_PATH,
};
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Starts a subscriber endpoint that answers every notification with `status`.
pub(crate) async fn start_subscriber(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(DEFAULT_NOTIFICATION_PATH))
        .and(header("content-type", "text/plain"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

/// `host:port` form the relay expects for a subscriber.
pub(crate) fn subscriber_address(server: &MockServer) -> String {
    server.address().to_string()
}

/// Notification bodies the subscriber has received, in arrival order.
pub(crate) async fn received_bodies(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|request| String::from_utf8_lossy(&request.body).into_owned())
        .collect()
}

pub(crate) fn start_relay(
    host: Arc<dyn HostFramework>,
    subscribers: &[String],
) -> NotificationRelay {
    let config = RelayConfig {
        subscribers: subscribers.to_vec(),
        ..Default::default()
    };
    NotificationRelay::init(host, config).expect("relay should start")
}
