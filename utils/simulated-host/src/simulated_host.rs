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
    ConnectionState, EventHandler, EventSubscription, HostError, HostFramework, HostLinkId,
    PortNo, ServiceWatcher, SwitchId,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// One `set_port_stats` call observed by the host.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PortStatsRequest {
    pub switch: SwitchId,
    pub enabled: bool,
}

#[derive(Default)]
struct HostState {
    refused_services: BTreeSet<String>,
    watchers: BTreeMap<String, Arc<dyn ServiceWatcher>>,
    subscriptions: BTreeMap<String, (EventSubscription, Arc<dyn EventHandler>)>,
    port_stats: Vec<PortStatsRequest>,
}

/// Host framework double that records what the relay asks of it and lets a test
/// raise events on the registered handlers.
///
/// Subscriptions are keyed by identity, so re-registering under the same identity
/// replaces the earlier entry the way a real controller does.
#[derive(Default)]
pub struct SimulatedHost {
    state: Mutex<HostState>,
    next_link: AtomicU64,
    refuse_subscriptions: AtomicBool,
    registration_attempts: AtomicU64,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that refuses to hand out the named services.
    pub fn refusing_services(names: &[&str]) -> Self {
        let host = Self::default();
        host.lock_state()
            .refused_services
            .extend(names.iter().map(|name| name.to_string()));
        host
    }

    pub fn restore_service(&self, name: &str) {
        self.lock_state().refused_services.remove(name);
    }

    pub fn refuse_subscriptions(&self, refuse: bool) {
        self.refuse_subscriptions.store(refuse, Ordering::SeqCst);
    }

    pub fn fire_switch_added(&self, switch: SwitchId) {
        for handler in self.handlers() {
            handler.switch_added(switch);
        }
    }

    pub fn fire_switch_removed(&self, switch: SwitchId) {
        for handler in self.handlers() {
            handler.switch_removed(switch);
        }
    }

    pub fn fire_port_added(&self, switch: SwitchId, port: PortNo) {
        for handler in self.handlers() {
            handler.port_added(switch, port);
        }
    }

    pub fn fire_port_removed(&self, switch: SwitchId, port: PortNo) {
        for handler in self.handlers() {
            handler.port_removed(switch, port);
        }
    }

    /// Drops the link to the core: every watcher sees a disconnect, then the
    /// subscribed handlers are told the core connection closed.
    pub fn drop_core_link(&self) {
        for watcher in self.watchers() {
            watcher.on_connection_state(ConnectionState::Disconnected);
        }
        for handler in self.handlers() {
            handler.core_connection_closed();
        }
    }

    pub fn restore_core_link(&self) {
        for watcher in self.watchers() {
            watcher.on_connection_state(ConnectionState::Connected);
        }
        for handler in self.handlers() {
            handler.core_connection_reconnected();
        }
    }

    /// Runs a keepalive probe on every service watcher and reports whether all of
    /// them asked to keep their link.
    pub fn probe_keepalive(&self) -> bool {
        self.watchers().iter().all(|watcher| watcher.keepalive())
    }

    pub fn active_subscription_count(&self) -> usize {
        self.lock_state().subscriptions.len()
    }

    pub fn subscription(&self, identity: &str) -> Option<EventSubscription> {
        self.lock_state()
            .subscriptions
            .get(identity)
            .map(|(subscription, _)| subscription.clone())
    }

    pub fn registration_attempts(&self) -> u64 {
        self.registration_attempts.load(Ordering::SeqCst)
    }

    pub fn connected_services(&self) -> Vec<String> {
        self.lock_state().watchers.keys().cloned().collect()
    }

    pub fn port_stats_requests(&self) -> Vec<PortStatsRequest> {
        self.lock_state().port_stats.clone()
    }

    // Callbacks run without the state lock so handlers may call back into the host.
    fn handlers(&self) -> Vec<Arc<dyn EventHandler>> {
        self.lock_state()
            .subscriptions
            .values()
            .map(|(_, handler)| handler.clone())
            .collect()
    }

    fn watchers(&self) -> Vec<Arc<dyn ServiceWatcher>> {
        self.lock_state().watchers.values().cloned().collect()
    }

    fn lock_state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HostFramework for SimulatedHost {
    fn get_service(&self, name: &str, watcher: Arc<dyn ServiceWatcher>) -> Option<HostLinkId> {
        let mut state = self.lock_state();
        if state.refused_services.contains(name) {
            debug!(service = name, "simulated host refusing service");
            return None;
        }
        state.watchers.insert(name.to_string(), watcher);
        let link = HostLinkId(self.next_link.fetch_add(1, Ordering::SeqCst) + 1);
        debug!(service = name, link = link.0, "simulated host granted service");
        Some(link)
    }

    fn register_event_subscription(
        &self,
        subscription: &EventSubscription,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), HostError> {
        self.registration_attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse_subscriptions.load(Ordering::SeqCst) {
            return Err(HostError::new("core link is down"));
        }
        self.lock_state().subscriptions.insert(
            subscription.identity.clone(),
            (subscription.clone(), handler),
        );
        debug!(
            identity = subscription.identity.as_str(),
            "simulated host registered subscription"
        );
        Ok(())
    }

    fn set_port_stats(&self, switch: SwitchId, enabled: bool) {
        self.lock_state()
            .port_stats
            .push(PortStatsRequest { switch, enabled });
    }
}
