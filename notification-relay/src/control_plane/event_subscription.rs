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

//! The module's single event subscription and its (re-)registration with the host.

use crate::host::{
    EventHandler, EventMask, EventSubscription, HostError, HostFramework, SwitchScope,
};
use crate::observability::events;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info};

const COMPONENT: &str = "event_subscription";

/// Module identity used when none is configured.
pub const DEFAULT_APP_NAME: &str = "nbapi";

/// Event kinds the relay subscribes to.
pub const RELAY_EVENT_MASK: EventMask = EventMask::DEVICE_REGISTERED
    .union(EventMask::DEVICE_UNREGISTERED)
    .union(EventMask::PACKET_IN)
    .union(EventMask::PORT_CHANGED);

/// Observable registration bookkeeping.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubscriptionState {
    /// The subscription the host currently holds for this module, if any.
    pub active: Option<EventSubscription>,
    pub registrations: u64,
    pub failures: u64,
}

/// Issues the subscription against the host and records the outcome.
pub(crate) struct SubscriptionRegistrar {
    subscription: EventSubscription,
    state: Mutex<SubscriptionState>,
}

impl SubscriptionRegistrar {
    pub(crate) fn new(identity: &str) -> Self {
        Self {
            subscription: EventSubscription {
                identity: identity.to_string(),
                scope: SwitchScope::AllSwitches,
                mask: RELAY_EVENT_MASK,
            },
            state: Mutex::new(SubscriptionState::default()),
        }
    }

    pub(crate) fn subscription(&self) -> &EventSubscription {
        &self.subscription
    }

    /// Registers the subscription, replacing whatever the host held for this identity.
    ///
    /// A failure leaves the record inactive; the next reconnection retries.
    pub(crate) fn register(
        &self,
        host: &dyn HostFramework,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), HostError> {
        info!(
            event = events::SUBSCRIPTION_REGISTER_START,
            component = COMPONENT,
            identity = self.subscription.identity.as_str(),
            mask = self.subscription.mask.bits(),
            "registering event subscription"
        );

        let result = host.register_event_subscription(&self.subscription, handler);

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &result {
            Ok(()) => {
                state.active = Some(self.subscription.clone());
                state.registrations += 1;
                info!(
                    event = events::SUBSCRIPTION_REGISTER_OK,
                    component = COMPONENT,
                    identity = self.subscription.identity.as_str(),
                    registrations = state.registrations,
                    "event subscription registered"
                );
            }
            Err(err) => {
                state.active = None;
                state.failures += 1;
                error!(
                    event = events::SUBSCRIPTION_REGISTER_FAILED,
                    component = COMPONENT,
                    identity = self.subscription.identity.as_str(),
                    failures = state.failures,
                    err = %err,
                    "event subscription registration failed; retrying on next reconnection"
                );
            }
        }

        result
    }

    pub(crate) fn state(&self) -> SubscriptionState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{SubscriptionRegistrar, RELAY_EVENT_MASK};
    use crate::host::{
        EventHandler, EventMask, EventSubscription, HostError, HostFramework, HostLinkId,
        ServiceWatcher, SwitchScope,
    };
    use crate::notification::{PortNo, SwitchId};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    struct NoopHandler;

    impl EventHandler for NoopHandler {
        fn switch_added(&self, _switch: SwitchId) {}
        fn switch_removed(&self, _switch: SwitchId) {}
        fn port_added(&self, _switch: SwitchId, _port: PortNo) {}
        fn port_removed(&self, _switch: SwitchId, _port: PortNo) {}
        fn core_connection_closed(&self) {}
        fn core_connection_reconnected(&self) {}
    }

    #[derive(Default)]
    struct RecordingHost {
        refuse: AtomicBool,
        table: Mutex<HashMap<String, EventSubscription>>,
    }

    impl HostFramework for RecordingHost {
        fn get_service(
            &self,
            _name: &str,
            _watcher: Arc<dyn ServiceWatcher>,
        ) -> Option<HostLinkId> {
            None
        }

        fn register_event_subscription(
            &self,
            subscription: &EventSubscription,
            _handler: Arc<dyn EventHandler>,
        ) -> Result<(), HostError> {
            if self.refuse.load(Ordering::Relaxed) {
                return Err(HostError::new("core link down"));
            }
            self.table
                .lock()
                .unwrap()
                .insert(subscription.identity.clone(), subscription.clone());
            Ok(())
        }

        fn set_port_stats(&self, _switch: SwitchId, _enabled: bool) {}
    }

    #[test]
    fn subscription_covers_all_switches_and_relay_events() {
        let registrar = SubscriptionRegistrar::new("nbapi");
        let subscription = registrar.subscription();

        assert_eq!(subscription.identity, "nbapi");
        assert_eq!(subscription.scope, SwitchScope::AllSwitches);
        assert!(subscription.mask.contains(EventMask::DEVICE_REGISTERED));
        assert!(subscription.mask.contains(EventMask::DEVICE_UNREGISTERED));
        assert!(subscription.mask.contains(EventMask::PACKET_IN));
        assert!(subscription.mask.contains(EventMask::PORT_CHANGED));
        assert_eq!(subscription.mask, RELAY_EVENT_MASK);
    }

    #[test]
    fn repeated_registration_keeps_a_single_active_subscription() {
        let host = RecordingHost::default();
        let registrar = SubscriptionRegistrar::new("nbapi");

        for _ in 0..3 {
            registrar
                .register(&host, Arc::new(NoopHandler))
                .expect("registration should succeed");
        }

        assert_eq!(host.table.lock().unwrap().len(), 1);
        let state = registrar.state();
        assert_eq!(state.registrations, 3);
        assert_eq!(state.active.as_ref(), Some(registrar.subscription()));
    }

    #[test]
    fn failed_registration_marks_inactive_until_next_success() {
        let host = RecordingHost::default();
        let registrar = SubscriptionRegistrar::new("nbapi");
        registrar
            .register(&host, Arc::new(NoopHandler))
            .expect("first registration should succeed");

        host.refuse.store(true, Ordering::Relaxed);
        assert!(registrar.register(&host, Arc::new(NoopHandler)).is_err());
        let state = registrar.state();
        assert!(state.active.is_none());
        assert_eq!(state.failures, 1);

        host.refuse.store(false, Ordering::Relaxed);
        registrar
            .register(&host, Arc::new(NoopHandler))
            .expect("retry should succeed");
        let state = registrar.state();
        assert!(state.active.is_some());
        assert_eq!(state.registrations, 2);
    }
}
