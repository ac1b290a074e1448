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

mod support;

use notification_relay::{
    ConnectionState, ServiceKind, SwitchId, SwitchScope, DEFAULT_APP_NAME, RELAY_EVENT_MASK,
};
use simulated_host::SimulatedHost;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread")]
async fn startup_registers_one_all_switch_subscription() {
    simulated_host::init_logging();

    let host = Arc::new(SimulatedHost::new());
    let relay = support::start_relay(host.clone(), &[]);

    let subscription = host
        .subscription(DEFAULT_APP_NAME)
        .expect("subscription should be registered");
    assert_eq!(subscription.scope, SwitchScope::AllSwitches);
    assert_eq!(subscription.mask, RELAY_EVENT_MASK);
    assert_eq!(host.active_subscription_count(), 1);
    assert_eq!(host.connected_services().len(), ServiceKind::ALL.len());
    relay.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_reconnects_leave_a_single_subscription() {
    simulated_host::init_logging();

    let subscriber = support::start_subscriber(200).await;
    let host = Arc::new(SimulatedHost::new());
    let relay = support::start_relay(host.clone(), &[support::subscriber_address(&subscriber)]);

    for _ in 0..2 {
        host.drop_core_link();
        host.restore_core_link();
    }
    host.fire_switch_added(SwitchId(0x5));
    relay.shutdown().await;

    assert_eq!(host.active_subscription_count(), 1);
    assert_eq!(host.registration_attempts(), 3);
    // One notification per closed link, none for the reconnections, and the
    // switch event is delivered exactly once.
    assert_eq!(
        support::received_bodies(&subscriber).await,
        vec!["{}", "{}", "{dpid:'0x5',notification:'NOTIFICATION'}"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn service_watchers_follow_link_state() {
    simulated_host::init_logging();

    let host = Arc::new(SimulatedHost::new());
    let relay = support::start_relay(host.clone(), &[]);

    host.drop_core_link();
    assert!(relay
        .service_status()
        .iter()
        .all(|status| status.state == Some(ConnectionState::Disconnected)));
    assert!(host.probe_keepalive());

    host.restore_core_link();
    for status in relay.service_status() {
        assert_eq!(status.state, Some(ConnectionState::Connected));
        assert_eq!(status.transitions, 2);
    }
    relay.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn refused_services_degrade_without_blocking_notifications() {
    simulated_host::init_logging();

    let subscriber = support::start_subscriber(200).await;
    let host = Arc::new(SimulatedHost::refusing_services(&["mul-route", "mul-makdi"]));
    let relay = support::start_relay(host.clone(), &[support::subscriber_address(&subscriber)]);

    let missing: Vec<ServiceKind> = relay
        .service_status()
        .into_iter()
        .filter(|status| status.link.is_none())
        .map(|status| status.kind)
        .collect();
    assert_eq!(
        missing,
        vec![ServiceKind::Route, ServiceKind::TopologyDiscovery]
    );
    assert_eq!(host.active_subscription_count(), 1);

    host.fire_switch_added(SwitchId(0x7));

    // A reconnection picks up services the host can now provide.
    host.restore_service("mul-route");
    host.restore_core_link();
    let missing: Vec<ServiceKind> = relay
        .service_status()
        .into_iter()
        .filter(|status| status.link.is_none())
        .map(|status| status.kind)
        .collect();
    assert_eq!(missing, vec![ServiceKind::TopologyDiscovery]);
    relay.shutdown().await;

    assert_eq!(
        support::received_bodies(&subscriber).await,
        vec!["{dpid:'0x7',notification:'NOTIFICATION'}"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn refused_subscription_is_retried_on_reconnect() {
    simulated_host::init_logging();

    let host = Arc::new(SimulatedHost::new());
    host.refuse_subscriptions(true);
    let relay = support::start_relay(host.clone(), &[]);

    assert_eq!(host.active_subscription_count(), 0);
    let state = relay.subscription_state();
    assert!(state.active.is_none());
    assert_eq!(state.failures, 1);

    // The host has no handler to call back, so the reconnection arrives via the
    // relay's own handler.
    host.refuse_subscriptions(false);
    relay.event_handler().core_connection_reconnected();

    assert_eq!(host.active_subscription_count(), 1);
    assert_eq!(relay.subscription_state().registrations, 1);
    relay.shutdown().await;
}
