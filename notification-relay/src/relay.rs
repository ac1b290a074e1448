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

//! Relay context object and module entry point.

use crate::config::{ConfigError, RelayConfig, RelaySettings};
use crate::control_plane::event_subscription::{SubscriptionRegistrar, SubscriptionState};
use crate::control_plane::service_manager::{ServiceManager, ServiceStatus};
use crate::data_plane::delivery_client::{DeliveryClient, DeliveryError, HttpDeliveryClient};
use crate::data_plane::fanout_dispatcher::FanoutDispatcher;
use crate::data_plane::subscriber_registry::{RegistryError, SubscriberRegistry};
use crate::event_callbacks::EventCallbacks;
use crate::host::{EventHandler, HostFramework};
use crate::observability::events;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::sync::Arc;
use tracing::{debug, error, info};

const COMPONENT: &str = "relay";

/// Everything one relay instance owns, handed to every callback.
pub(crate) struct RelayContext {
    pub(crate) host: Arc<dyn HostFramework>,
    pub(crate) services: ServiceManager,
    pub(crate) subscription: SubscriptionRegistrar,
    pub(crate) subscribers: SubscriberRegistry,
    pub(crate) dispatcher: FanoutDispatcher,
}

/// Failures that prevent the relay from starting at all.
#[derive(Debug)]
pub enum RelayInitError {
    Config(ConfigError),
    Subscriber(RegistryError),
    Delivery(DeliveryError),
    Dispatcher(io::Error),
}

impl Display for RelayInitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RelayInitError::Config(err) => write!(f, "invalid relay configuration: {err}"),
            RelayInitError::Subscriber(err) => write!(f, "invalid initial subscriber: {err}"),
            RelayInitError::Delivery(err) => write!(f, "unable to set up delivery: {err}"),
            RelayInitError::Dispatcher(err) => {
                write!(f, "unable to start dispatch worker: {err}")
            }
        }
    }
}

impl Error for RelayInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RelayInitError::Config(err) => Some(err),
            RelayInitError::Subscriber(err) => Some(err),
            RelayInitError::Delivery(err) => Some(err),
            RelayInitError::Dispatcher(err) => Some(err),
        }
    }
}

impl From<ConfigError> for RelayInitError {
    fn from(err: ConfigError) -> Self {
        RelayInitError::Config(err)
    }
}

impl From<RegistryError> for RelayInitError {
    fn from(err: RegistryError) -> Self {
        RelayInitError::Subscriber(err)
    }
}

impl From<DeliveryError> for RelayInitError {
    fn from(err: DeliveryError) -> Self {
        RelayInitError::Delivery(err)
    }
}

/// [`NotificationRelay`] subscribes to topology events on a host control platform and
/// fans each one out, best-effort, to every registered HTTP subscriber.
///
/// Startup acquires the five upstream service links (a refused link is logged and
/// skipped) and registers the event subscription. Event callbacks only format and
/// queue; delivery happens on a dedicated worker so the host event loop never waits
/// on a subscriber.
///
/// # Examples
///
/// ```
/// use notification_relay::{
///     EventHandler, EventSubscription, HostError, HostFramework, HostLinkId,
///     NotificationRelay, RelayConfig, ServiceWatcher, SwitchId,
/// };
/// use std::sync::Arc;
///
/// struct NullHost;
///
/// impl HostFramework for NullHost {
///     fn get_service(
///         &self,
///         _name: &str,
///         _watcher: Arc<dyn ServiceWatcher>,
///     ) -> Option<HostLinkId> {
///         Some(HostLinkId(1))
///     }
///
///     fn register_event_subscription(
///         &self,
///         _subscription: &EventSubscription,
///         _handler: Arc<dyn EventHandler>,
///     ) -> Result<(), HostError> {
///         Ok(())
///     }
///
///     fn set_port_stats(&self, _switch: SwitchId, _enabled: bool) {}
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let relay = NotificationRelay::init(Arc::new(NullHost), RelayConfig::default()).unwrap();
/// relay.subscribers().add("127.0.0.1:8181").unwrap();
/// assert!(relay.subscription_state().active.is_some());
/// relay.shutdown().await;
/// # });
/// ```
pub struct NotificationRelay {
    context: Arc<RelayContext>,
    handler: EventCallbacks,
}

impl NotificationRelay {
    /// Module entry point: starts the relay with default settings.
    pub fn module_init(host: Arc<dyn HostFramework>) -> Result<Self, RelayInitError> {
        Self::init(host, RelayConfig::default())
    }

    pub fn init(host: Arc<dyn HostFramework>, config: RelayConfig) -> Result<Self, RelayInitError> {
        config.validate()?;
        let subscribers = SubscriberRegistry::with_subscribers(&config.subscribers)?;
        let client: Arc<dyn DeliveryClient> = Arc::new(HttpDeliveryClient::new(&config.delivery)?);

        Self::init_with_client(host, &config.relay, subscribers, client)
    }

    /// Starts the relay with a caller-supplied delivery client and subscriber set.
    pub fn init_with_client(
        host: Arc<dyn HostFramework>,
        settings: &RelaySettings,
        subscribers: SubscriberRegistry,
        client: Arc<dyn DeliveryClient>,
    ) -> Result<Self, RelayInitError> {
        info!(
            event = events::MODULE_INIT_START,
            component = COMPONENT,
            identity = settings.app_name.as_str(),
            "starting notification relay"
        );

        let dispatcher = FanoutDispatcher::new(
            subscribers.clone(),
            client,
            usize::from(settings.message_queue_size),
            usize::from(settings.max_in_flight_deliveries),
        )
        .map_err(RelayInitError::Dispatcher)?;

        let context = Arc::new(RelayContext {
            host,
            services: ServiceManager::new(),
            subscription: SubscriptionRegistrar::new(&settings.app_name),
            subscribers,
            dispatcher,
        });

        let acquired = context.services.acquire_missing(context.host.as_ref());

        let handler = EventCallbacks::new(&context);
        // A refused subscription is retried on the next core reconnection.
        let _ = handler.register();

        info!(
            event = events::MODULE_INIT_OK,
            component = COMPONENT,
            identity = context.subscription.subscription().identity.as_str(),
            services_acquired = acquired,
            worker_id = context.dispatcher.worker_id(),
            "notification relay started"
        );

        Ok(Self { context, handler })
    }

    /// Shared handle for the administrative path that adds and removes subscribers.
    pub fn subscribers(&self) -> SubscriberRegistry {
        self.context.subscribers.clone()
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.context.subscription.state()
    }

    pub fn service_status(&self) -> Vec<ServiceStatus> {
        self.context.services.status()
    }

    /// The handler registered with the host, for hosts that dispatch through the relay.
    pub fn event_handler(&self) -> Arc<dyn EventHandler> {
        Arc::new(self.handler.clone())
    }

    /// Stops accepting notifications and waits until queued ones have been fanned out.
    pub async fn shutdown(self) {
        let Some(handle) = self.context.dispatcher.close() else {
            return;
        };

        match tokio::task::spawn_blocking(move || handle.join()).await {
            Ok(Ok(())) => debug!(
                event = events::MODULE_SHUTDOWN,
                component = COMPONENT,
                "notification relay stopped"
            ),
            Ok(Err(_)) | Err(_) => error!(
                event = events::DISPATCH_WORKER_JOIN_FAILED,
                component = COMPONENT,
                "dispatch worker did not exit cleanly"
            ),
        }
    }
}
