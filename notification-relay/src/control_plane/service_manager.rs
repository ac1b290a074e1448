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

//! Upstream service links: one handle per named service, acquired once and kept for
//! the module lifetime.

use crate::host::{ConnectionState, HostFramework, HostLinkId, ServiceWatcher};
use crate::observability::events;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, trace};

const COMPONENT: &str = "service_manager";

/// The upstream subsystems the relay observes.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ServiceKind {
    Core,
    Route,
    Fabric,
    TrafficRouting,
    TopologyDiscovery,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::Core,
        ServiceKind::Route,
        ServiceKind::Fabric,
        ServiceKind::TrafficRouting,
        ServiceKind::TopologyDiscovery,
    ];

    /// Name the host framework knows the service by.
    pub fn service_name(&self) -> &'static str {
        match self {
            ServiceKind::Core => "mul-core",
            ServiceKind::Route => "mul-route",
            ServiceKind::Fabric => "mul-fab-cli",
            ServiceKind::TrafficRouting => "mul-tr",
            ServiceKind::TopologyDiscovery => "mul-makdi",
        }
    }
}

impl Display for ServiceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}

/// Point-in-time view of one service link.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceStatus {
    pub kind: ServiceKind,
    /// `None` when the host refused the link.
    pub link: Option<HostLinkId>,
    pub state: Option<ConnectionState>,
    pub transitions: u64,
}

#[derive(Debug)]
struct ServiceLinkState {
    connected: AtomicBool,
    transitions: AtomicU64,
}

impl ServiceLinkState {
    fn new() -> Self {
        // A link the host hands back is live until it says otherwise.
        Self {
            connected: AtomicBool::new(true),
            transitions: AtomicU64::new(0),
        }
    }

    fn state(&self) -> ConnectionState {
        if self.connected.load(Ordering::Acquire) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }
}

/// Handle for one acquired upstream service link.
struct UpstreamServiceHandle {
    link: HostLinkId,
    link_state: Arc<ServiceLinkState>,
}

/// Watcher installed with the host for one service.
struct ServiceLinkWatcher {
    kind: ServiceKind,
    link_state: Arc<ServiceLinkState>,
}

impl ServiceWatcher for ServiceLinkWatcher {
    fn on_connection_state(&self, state: ConnectionState) {
        self.link_state
            .connected
            .store(state == ConnectionState::Connected, Ordering::Release);
        let transitions = self.link_state.transitions.fetch_add(1, Ordering::AcqRel) + 1;

        info!(
            event = events::SERVICE_STATE_CHANGE,
            component = COMPONENT,
            service = self.kind.service_name(),
            state = %state,
            transitions,
            "upstream service link changed state"
        );
    }

    fn keepalive(&self) -> bool {
        trace!(
            event = events::SERVICE_KEEPALIVE,
            component = COMPONENT,
            service = self.kind.service_name(),
            "keepalive probe"
        );
        true
    }
}

/// Owner of all upstream service handles.
pub(crate) struct ServiceManager {
    handles: Mutex<BTreeMap<ServiceKind, UpstreamServiceHandle>>,
}

impl ServiceManager {
    pub(crate) fn new() -> Self {
        Self {
            handles: Mutex::new(BTreeMap::new()),
        }
    }

    /// Acquires every service that has no handle yet. Returns how many were newly acquired.
    ///
    /// Services that already hold a handle are left alone, so this is safe to call again
    /// after a reconnection.
    pub(crate) fn acquire_missing(&self, host: &dyn HostFramework) -> usize {
        let mut acquired = 0;
        for kind in self.missing() {
            if self.acquire(host, kind).is_some() {
                acquired += 1;
            }
        }
        acquired
    }

    /// Acquires one service unless a handle already exists.
    ///
    /// Returns the link id only when a new handle was created.
    pub(crate) fn acquire(
        &self,
        host: &dyn HostFramework,
        kind: ServiceKind,
    ) -> Option<HostLinkId> {
        if self.has_handle(kind) {
            debug!(
                event = events::SERVICE_ACQUIRE_SKIPPED,
                component = COMPONENT,
                service = kind.service_name(),
                "service handle already held"
            );
            return None;
        }

        let link_state = Arc::new(ServiceLinkState::new());
        let watcher: Arc<dyn ServiceWatcher> = Arc::new(ServiceLinkWatcher {
            kind,
            link_state: link_state.clone(),
        });

        // The host may call back into the watcher synchronously, so no lock is held here.
        let Some(link) = host.get_service(kind.service_name(), watcher) else {
            error!(
                event = events::SERVICE_ACQUIRE_FAILED,
                component = COMPONENT,
                service = kind.service_name(),
                "upstream service instantiation failed; continuing without it"
            );
            return None;
        };

        info!(
            event = events::SERVICE_ACQUIRE_OK,
            component = COMPONENT,
            service = kind.service_name(),
            link = link.0,
            "upstream service acquired"
        );

        self.lock_handles()
            .insert(kind, UpstreamServiceHandle { link, link_state });
        Some(link)
    }

    pub(crate) fn has_handle(&self, kind: ServiceKind) -> bool {
        self.lock_handles().contains_key(&kind)
    }

    pub(crate) fn missing(&self) -> Vec<ServiceKind> {
        let handles = self.lock_handles();
        ServiceKind::ALL
            .iter()
            .copied()
            .filter(|kind| !handles.contains_key(kind))
            .collect()
    }

    pub(crate) fn status(&self) -> Vec<ServiceStatus> {
        let handles = self.lock_handles();
        ServiceKind::ALL
            .iter()
            .map(|kind| match handles.get(kind) {
                Some(handle) => ServiceStatus {
                    kind: *kind,
                    link: Some(handle.link),
                    state: Some(handle.link_state.state()),
                    transitions: handle.link_state.transitions.load(Ordering::Acquire),
                },
                None => ServiceStatus {
                    kind: *kind,
                    link: None,
                    state: None,
                    transitions: 0,
                },
            })
            .collect()
    }

    fn lock_handles(
        &self,
    ) -> std::sync::MutexGuard<'_, BTreeMap<ServiceKind, UpstreamServiceHandle>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{ServiceKind, ServiceManager};
    use crate::host::{
        ConnectionState, EventHandler, EventSubscription, HostError, HostFramework, HostLinkId,
        ServiceWatcher,
    };
    use crate::notification::SwitchId;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct FlakyHost {
        unavailable: Mutex<HashSet<String>>,
        watchers: Mutex<HashMap<String, Arc<dyn ServiceWatcher>>>,
        get_service_calls: Mutex<Vec<String>>,
    }

    impl FlakyHost {
        fn refusing(names: &[&str]) -> Self {
            let host = Self::default();
            host.unavailable
                .lock()
                .unwrap()
                .extend(names.iter().map(|name| name.to_string()));
            host
        }

        fn restore(&self, name: &str) {
            self.unavailable.lock().unwrap().remove(name);
        }

        fn watcher(&self, name: &str) -> Arc<dyn ServiceWatcher> {
            self.watchers.lock().unwrap()[name].clone()
        }
    }

    impl HostFramework for FlakyHost {
        fn get_service(
            &self,
            name: &str,
            watcher: Arc<dyn ServiceWatcher>,
        ) -> Option<HostLinkId> {
            let mut calls = self.get_service_calls.lock().unwrap();
            calls.push(name.to_string());
            if self.unavailable.lock().unwrap().contains(name) {
                return None;
            }
            self.watchers
                .lock()
                .unwrap()
                .insert(name.to_string(), watcher);
            Some(HostLinkId(calls.len() as u64))
        }

        fn register_event_subscription(
            &self,
            _subscription: &EventSubscription,
            _handler: Arc<dyn EventHandler>,
        ) -> Result<(), HostError> {
            Ok(())
        }

        fn set_port_stats(&self, _switch: SwitchId, _enabled: bool) {}
    }

    #[test]
    fn acquire_missing_acquires_all_five_services_once() {
        let host = FlakyHost::default();
        let manager = ServiceManager::new();

        assert_eq!(manager.acquire_missing(&host), 5);
        assert_eq!(manager.acquire_missing(&host), 0);
        assert_eq!(host.get_service_calls.lock().unwrap().len(), 5);
        assert!(manager.missing().is_empty());
    }

    #[test]
    fn failed_service_degrades_without_affecting_others() {
        let host = FlakyHost::refusing(&["mul-route", "mul-makdi"]);
        let manager = ServiceManager::new();

        assert_eq!(manager.acquire_missing(&host), 3);
        assert_eq!(
            manager.missing(),
            vec![ServiceKind::Route, ServiceKind::TopologyDiscovery]
        );

        let status = manager.status();
        assert_eq!(status.len(), 5);
        let route = status
            .iter()
            .find(|status| status.kind == ServiceKind::Route)
            .expect("route status present");
        assert_eq!(route.link, None);
        assert_eq!(route.state, None);
    }

    #[test]
    fn missing_service_is_acquired_on_later_attempt() {
        let host = FlakyHost::refusing(&["mul-fab-cli"]);
        let manager = ServiceManager::new();
        manager.acquire_missing(&host);

        host.restore("mul-fab-cli");

        assert_eq!(manager.acquire_missing(&host), 1);
        assert!(manager.has_handle(ServiceKind::Fabric));
        // Only the refused service was asked for again.
        assert_eq!(host.get_service_calls.lock().unwrap().len(), 6);
    }

    #[test]
    fn watcher_tracks_state_transitions_and_always_keeps_alive() {
        let host = FlakyHost::default();
        let manager = ServiceManager::new();
        manager.acquire_missing(&host);

        let watcher = host.watcher("mul-core");
        assert!(watcher.keepalive());

        watcher.on_connection_state(ConnectionState::Disconnected);
        let core = manager.status().remove(0);
        assert_eq!(core.kind, ServiceKind::Core);
        assert_eq!(core.state, Some(ConnectionState::Disconnected));
        assert_eq!(core.transitions, 1);

        watcher.on_connection_state(ConnectionState::Connected);
        let core = manager.status().remove(0);
        assert_eq!(core.state, Some(ConnectionState::Connected));
        assert_eq!(core.transitions, 2);
        assert!(watcher.keepalive());
    }

    #[test]
    fn service_names_are_stable() {
        let names: Vec<&str> = ServiceKind::ALL
            .iter()
            .map(|kind| kind.service_name())
            .collect();

        assert_eq!(
            names,
            vec!["mul-core", "mul-route", "mul-fab-cli", "mul-tr", "mul-makdi"]
        );
    }
}
