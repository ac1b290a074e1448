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

//! Event callback registry: the handler the host invokes for every subscribed event.

use crate::host::{EventHandler, HostError};
use crate::notification::{NotificationEvent, PortNo, SwitchId};
use crate::observability::{events, fields};
use crate::relay::RelayContext;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

const COMPONENT: &str = "event_callbacks";

/// Handler registered with the host on behalf of one relay.
///
/// Holds the relay context weakly: the host keeps the handler alive, and the handler
/// must not keep a shut-down relay alive in turn.
#[derive(Clone)]
pub(crate) struct EventCallbacks {
    context: Weak<RelayContext>,
}

impl EventCallbacks {
    pub(crate) fn new(context: &Arc<RelayContext>) -> Self {
        Self {
            context: Arc::downgrade(context),
        }
    }

    fn context(&self) -> Option<Arc<RelayContext>> {
        let context = self.context.upgrade();
        if context.is_none() {
            debug!(
                event = events::EVENT_RECEIVED,
                component = COMPONENT,
                reason = "relay_dropped",
                "ignoring event for a relay that no longer exists"
            );
        }
        context
    }

    /// (Re-)issues the event subscription with this handler attached.
    pub(crate) fn register(&self) -> Result<(), HostError> {
        let Some(context) = self.context() else {
            return Ok(());
        };
        context
            .subscription
            .register(context.host.as_ref(), Arc::new(self.clone()))
    }

    fn emit(&self, context: &RelayContext, event: NotificationEvent) {
        let dpid = event.switch().map(fields::format_dpid);
        let port = fields::format_port(event.port());
        debug!(
            event = events::EVENT_RECEIVED,
            component = COMPONENT,
            kind = event.kind(),
            dpid = dpid.as_deref().unwrap_or(fields::NONE),
            port = port.as_str(),
            "host event received"
        );

        let message = match event.to_message() {
            Ok(Some(message)) => message,
            Ok(None) => return,
            Err(err) => {
                error!(
                    event = events::NOTIFICATION_FORMAT_FAILED,
                    component = COMPONENT,
                    kind = event.kind(),
                    err = %err,
                    "unable to format notification"
                );
                return;
            }
        };

        match context.dispatcher.submit(message) {
            Ok(()) => debug!(
                event = events::NOTIFICATION_ENQUEUED,
                component = COMPONENT,
                kind = event.kind(),
                "notification queued for fan-out"
            ),
            Err(err) => warn!(
                event = events::NOTIFICATION_ENQUEUE_FAILED,
                component = COMPONENT,
                kind = event.kind(),
                reason = fields::REASON_NO_RECEIVER,
                err = %err,
                "notification dropped"
            ),
        }
    }
}

impl EventHandler for EventCallbacks {
    fn switch_added(&self, switch: SwitchId) {
        let Some(context) = self.context() else {
            return;
        };
        context.host.set_port_stats(switch, true);
        debug!(
            event = events::PORT_STATS_ENABLED,
            component = COMPONENT,
            dpid = %switch,
            "per-port statistics enabled"
        );
        self.emit(&context, NotificationEvent::SwitchAdded { switch });
    }

    fn switch_removed(&self, switch: SwitchId) {
        if let Some(context) = self.context() {
            self.emit(&context, NotificationEvent::SwitchRemoved { switch });
        }
    }

    fn port_added(&self, switch: SwitchId, port: PortNo) {
        if let Some(context) = self.context() {
            self.emit(&context, NotificationEvent::PortAdded { switch, port });
        }
    }

    fn port_removed(&self, switch: SwitchId, port: PortNo) {
        if let Some(context) = self.context() {
            self.emit(&context, NotificationEvent::PortRemoved { switch, port });
        }
    }

    fn core_connection_closed(&self) {
        if let Some(context) = self.context() {
            self.emit(&context, NotificationEvent::UpstreamClosed);
        }
    }

    fn core_connection_reconnected(&self) {
        let Some(context) = self.context() else {
            return;
        };
        self.emit(&context, NotificationEvent::UpstreamReconnected);
        info!(
            event = events::CORE_RECONNECTED,
            component = COMPONENT,
            "core connection restored; re-subscribing"
        );

        context.services.acquire_missing(context.host.as_ref());
        // Failures are logged by the registrar and retried on the next reconnection.
        let _ = self.register();
    }
}
