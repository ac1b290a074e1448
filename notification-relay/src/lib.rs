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

//! # notification-relay
//!
//! `notification-relay` is a northbound topology notification module for an SDN
//! control platform. It subscribes to switch and port lifecycle events on the host
//! framework and pushes a short text notification for each one, over HTTP, to every
//! registered subscriber.
//!
//! The host is reached only through the [`HostFramework`] trait; the relay hands the
//! host an [`EventHandler`] and a [`ServiceWatcher`] per upstream service link.
//!
//! ## Quick start
//!
//! ```
//! use notification_relay::{NotificationEvent, PortNo, SwitchId};
//!
//! let event = NotificationEvent::PortAdded { switch: SwitchId(0x2), port: PortNo(3) };
//! let message = event.to_message().unwrap().unwrap();
//! assert_eq!(message.as_str(), "{dpid:'0x2',port:'3',notification:'NOTIFICATION'}");
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: [`NotificationRelay`] lifecycle and inspection surface
//! - Control plane: upstream service links and the topology event subscription
//! - Event callbacks: host-facing handler that formats and queues notifications
//! - Data plane: subscriber registry, HTTP delivery and the fan-out worker
//! - Runtime: dedicated dispatch thread boundary
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod config;
pub use config::{
    ConfigError, DeliveryConfig, DeliveryScheme, RelayConfig, RelaySettings,
    DEFAULT_DELIVERY_TIMEOUT_MS, DEFAULT_MAX_IN_FLIGHT_DELIVERIES, DEFAULT_MESSAGE_QUEUE_SIZE,
    DEFAULT_NOTIFICATION_PATH,
};

mod control_plane;
pub use control_plane::event_subscription::{
    SubscriptionState, DEFAULT_APP_NAME, RELAY_EVENT_MASK,
};
pub use control_plane::service_manager::{ServiceKind, ServiceStatus};

mod data_plane;
pub use data_plane::delivery_client::{DeliveryClient, DeliveryError, HttpDeliveryClient};
pub use data_plane::fanout_dispatcher::{fan_out, DispatchError, FanoutReport};
pub use data_plane::subscriber_registry::{
    RegistryError, SubscriberAddress, SubscriberRegistry, SubscriberSnapshot,
};

mod event_callbacks;

mod host;
pub use host::{
    ConnectionState, EventHandler, EventMask, EventSubscription, HostError, HostFramework,
    HostLinkId, ServiceWatcher, SwitchScope,
};

mod notification;
pub use notification::{
    FormatError, NotificationEvent, NotificationMessage, PortNo, SwitchId,
    NOTIFICATION_MESSAGE_MAX_LEN,
};

#[doc(hidden)]
pub mod observability;
pub use observability::fields::WorkerContext;

mod relay;
pub use relay::{NotificationRelay, RelayInitError};

mod runtime;
