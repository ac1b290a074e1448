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

//! Host-framework contract consumed by the relay.
//!
//! The host owns a single cooperative event loop. Every callback it makes into the
//! relay (connection-state changes, keepalive probes, topology events) runs on that
//! loop, one at a time. Implementations of these traits are injected into
//! [`NotificationRelay`](crate::NotificationRelay); the relay never reaches for
//! process-global state.

use crate::notification::{PortNo, SwitchId};
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::ops::BitOr;
use std::sync::Arc;

/// Opaque identifier of an upstream service link handed out by the host.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct HostLinkId(pub u64);

/// Link state reported by the host for one upstream service.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Bitmask of datapath event kinds a subscription covers.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct EventMask(u32);

impl EventMask {
    pub const DEVICE_REGISTERED: EventMask = EventMask(1 << 0);
    pub const DEVICE_UNREGISTERED: EventMask = EventMask(1 << 1);
    pub const PACKET_IN: EventMask = EventMask(1 << 2);
    pub const PORT_CHANGED: EventMask = EventMask(1 << 3);

    pub const fn empty() -> Self {
        EventMask(0)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: EventMask) -> EventMask {
        EventMask(self.0 | other.0)
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Which switches a subscription applies to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SwitchScope {
    AllSwitches,
    Switch(SwitchId),
}

/// The single registration binding module identity, scope and event kinds.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct EventSubscription {
    pub identity: String,
    pub scope: SwitchScope,
    pub mask: EventMask,
}

/// Callbacks the host makes for one upstream service link.
pub trait ServiceWatcher: Send + Sync {
    /// Invoked whenever the link transitions between connected and disconnected.
    fn on_connection_state(&self, state: ConnectionState);

    /// Periodic liveness probe. Returning `false` asks the host to tear the link down.
    fn keepalive(&self) -> bool;
}

/// Capability interface the host invokes when a subscribed event fires.
///
/// One method per event kind replaces the host's function-pointer callback table.
pub trait EventHandler: Send + Sync {
    fn switch_added(&self, switch: SwitchId);
    fn switch_removed(&self, switch: SwitchId);
    fn port_added(&self, switch: SwitchId, port: PortNo);
    fn port_removed(&self, switch: SwitchId, port: PortNo);
    fn core_connection_closed(&self);
    fn core_connection_reconnected(&self);
}

/// Operations the relay needs from the host control platform.
pub trait HostFramework: Send + Sync {
    /// Opens a link to the named upstream service. `None` means the service is unavailable.
    fn get_service(&self, name: &str, watcher: Arc<dyn ServiceWatcher>) -> Option<HostLinkId>;

    /// Registers (or replaces, for the same identity) the module's event subscription.
    fn register_event_subscription(
        &self,
        subscription: &EventSubscription,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), HostError>;

    /// Turns per-port statistics collection on or off for one switch.
    fn set_port_stats(&self, switch: SwitchId, enabled: bool);
}

/// Failure reported by the host framework.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostError {
    message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "host framework error: {}", self.message)
    }
}

impl Error for HostError {}
