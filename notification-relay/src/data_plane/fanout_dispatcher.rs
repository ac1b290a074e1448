/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
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

//! Fan-out of one notification to every subscriber, off the host event loop.

use crate::data_plane::delivery_client::DeliveryClient;
use crate::data_plane::subscriber_registry::{SubscriberAddress, SubscriberRegistry};
use crate::notification::NotificationMessage;
use crate::observability::{
    events,
    fields::{self, WorkerContext},
};
use crate::runtime::worker_runtime::{spawn_dispatch_loop, DISPATCH_RUNTIME_THREAD_NAME};
use futures::stream::{self, StreamExt};
use std::error::Error;
use std::fmt::{self as std_fmt, Display, Formatter};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use uuid::Uuid;

const DISPATCH_RUNTIME_THREAD_NAME_PREFIX: &str = "relay-";
const DISPATCH_RUNTIME_THREAD_NAME_MAX_LEN: usize = 15;
const COMPONENT: &str = "fanout_dispatcher";

/// Outcome of one fan-out, kept for logs and tests. Never reported to the event source.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FanoutReport {
    pub snapshot_version: u64,
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Eq, PartialEq)]
pub enum DispatchError {
    /// The dispatcher was shut down.
    Closed,
    /// The dispatch worker is gone and nothing drains the queue.
    WorkerUnavailable,
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std_fmt::Result {
        match self {
            DispatchError::Closed => write!(f, "dispatcher is shut down"),
            DispatchError::WorkerUnavailable => write!(f, "dispatch worker is not running"),
        }
    }
}

impl Error for DispatchError {}

/// Delivers `message` to every subscriber in one registry snapshot.
///
/// Each delivery is independent: a failure is logged and the remaining subscribers
/// are still attempted. At most `max_in_flight` deliveries run at once.
pub async fn fan_out(
    registry: &SubscriberRegistry,
    client: &dyn DeliveryClient,
    message: &NotificationMessage,
    max_in_flight: usize,
    worker_context: &WorkerContext,
) -> FanoutReport {
    let snapshot = registry.snapshot();

    if snapshot.subscribers.is_empty() {
        debug!(
            event = events::FANOUT_NO_SUBSCRIBERS,
            component = COMPONENT,
            worker_id = worker_context.worker_id.as_str(),
            snapshot_version = snapshot.version,
            "no subscribers registered"
        );
        return FanoutReport {
            snapshot_version: snapshot.version,
            ..Default::default()
        };
    }

    debug!(
        event = events::FANOUT_START,
        component = COMPONENT,
        worker_id = worker_context.worker_id.as_str(),
        snapshot_version = snapshot.version,
        subscriber_count = snapshot.subscribers.len(),
        "fanning out notification"
    );

    let outcomes: Vec<bool> = stream::iter(snapshot.subscribers.iter())
        .map(|subscriber| deliver_one(client, subscriber, message, worker_context))
        .buffer_unordered(max_in_flight.max(1))
        .collect()
        .await;

    let delivered = outcomes.iter().filter(|delivered| **delivered).count();
    let report = FanoutReport {
        snapshot_version: snapshot.version,
        attempted: outcomes.len(),
        delivered,
        failed: outcomes.len() - delivered,
    };

    debug!(
        event = events::FANOUT_COMPLETE,
        component = COMPONENT,
        worker_id = worker_context.worker_id.as_str(),
        snapshot_version = report.snapshot_version,
        attempted = report.attempted,
        delivered = report.delivered,
        failed = report.failed,
        "fan-out finished"
    );
    report
}

async fn deliver_one(
    client: &dyn DeliveryClient,
    subscriber: &SubscriberAddress,
    message: &NotificationMessage,
    worker_context: &WorkerContext,
) -> bool {
    debug!(
        event = events::DELIVERY_ATTEMPT,
        component = COMPONENT,
        worker_id = worker_context.worker_id.as_str(),
        subscriber = subscriber.as_str(),
        "delivering notification"
    );

    match client.deliver(subscriber, message).await {
        Ok(()) => {
            debug!(
                event = events::DELIVERY_OK,
                component = COMPONENT,
                worker_id = worker_context.worker_id.as_str(),
                subscriber = subscriber.as_str(),
                "notification delivered"
            );
            true
        }
        Err(err) => {
            warn!(
                event = events::DELIVERY_FAILED,
                component = COMPONENT,
                worker_id = worker_context.worker_id.as_str(),
                worker_thread = worker_context.worker_thread.as_str(),
                subscriber = subscriber.as_str(),
                err = %err,
                "notification delivery failed"
            );
            false
        }
    }
}

/// Queue plus dedicated worker thread that drains it in order.
///
/// The queue never drops a notification. `backlog_warn_depth` only sets the depth at
/// which a growing backlog is reported.
pub(crate) struct FanoutDispatcher {
    worker_id: String,
    sender: Mutex<Option<UnboundedSender<Arc<NotificationMessage>>>>,
    backlog: Arc<AtomicUsize>,
    backlog_warn_depth: usize,
    dispatch_handle: Mutex<Option<JoinHandle<()>>>,
}

impl FanoutDispatcher {
    pub(crate) fn new(
        registry: SubscriberRegistry,
        client: Arc<dyn DeliveryClient>,
        backlog_warn_depth: usize,
        max_in_flight: usize,
    ) -> io::Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let backlog = Arc::new(AtomicUsize::new(0));
        let worker_id = Uuid::new_v4().to_string();
        let thread_name = Self::build_runtime_thread_name(&worker_id);
        let worker_id_for_loop = worker_id.clone();
        let backlog_for_loop = backlog.clone();

        let dispatch_handle = spawn_dispatch_loop(thread_name, receiver, move |receiver| {
            Self::dispatch_loop(
                worker_id_for_loop,
                registry,
                client,
                max_in_flight,
                backlog_for_loop,
                receiver,
            )
        })?;

        info!(
            event = events::DISPATCH_WORKER_CREATE,
            component = COMPONENT,
            worker_id = worker_id.as_str(),
            backlog_warn_depth,
            max_in_flight,
            "dispatch worker created"
        );

        Ok(Self {
            worker_id,
            sender: Mutex::new(Some(sender)),
            backlog,
            backlog_warn_depth: backlog_warn_depth.max(1),
            dispatch_handle: Mutex::new(Some(dispatch_handle)),
        })
    }

    pub(crate) fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Notifications queued but not yet taken by the worker.
    pub(crate) fn backlog(&self) -> usize {
        self.backlog.load(Ordering::Acquire)
    }

    /// Queues a message without blocking the caller.
    pub(crate) fn submit(&self, message: NotificationMessage) -> Result<(), DispatchError> {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = sender.as_ref() else {
            return Err(DispatchError::Closed);
        };

        // Counted before sending so the worker's decrement can never run first.
        let depth = self.backlog.fetch_add(1, Ordering::AcqRel) + 1;
        if sender.send(Arc::new(message)).is_err() {
            self.backlog.fetch_sub(1, Ordering::AcqRel);
            return Err(DispatchError::WorkerUnavailable);
        }

        if depth == self.backlog_warn_depth + 1 {
            warn!(
                event = events::DISPATCH_BACKLOG_HIGH,
                component = COMPONENT,
                worker_id = self.worker_id.as_str(),
                backlog = depth,
                "dispatch backlog exceeds configured depth; subscribers are slow"
            );
        }
        Ok(())
    }

    /// Closes the queue. The worker drains what is already queued, then exits;
    /// the returned handle joins it.
    pub(crate) fn close(&self) -> Option<JoinHandle<()>> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.dispatch_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn build_runtime_thread_name(worker_id: &str) -> String {
        let suffix_len =
            DISPATCH_RUNTIME_THREAD_NAME_MAX_LEN - DISPATCH_RUNTIME_THREAD_NAME_PREFIX.len();
        let suffix: String = worker_id
            .chars()
            .filter(|ch| ch.is_ascii_hexdigit())
            .take(suffix_len)
            .collect();

        if suffix.len() == suffix_len {
            format!("{DISPATCH_RUNTIME_THREAD_NAME_PREFIX}{suffix}")
        } else {
            DISPATCH_RUNTIME_THREAD_NAME.to_string()
        }
    }

    /// Receives queued messages in order and fans each one out before taking the next.
    pub(crate) async fn dispatch_loop(
        worker_id: String,
        registry: SubscriberRegistry,
        client: Arc<dyn DeliveryClient>,
        max_in_flight: usize,
        backlog: Arc<AtomicUsize>,
        mut message_receiver: UnboundedReceiver<Arc<NotificationMessage>>,
    ) {
        let worker_context = WorkerContext::with_current_thread(worker_id);

        while let Some(message) = message_receiver.recv().await {
            backlog.fetch_sub(1, Ordering::AcqRel);
            fan_out(
                &registry,
                client.as_ref(),
                &message,
                max_in_flight,
                &worker_context,
            )
            .await;
        }

        info!(
            event = events::DISPATCH_RECV_CLOSED,
            component = COMPONENT,
            worker_id = worker_context.worker_id.as_str(),
            worker_thread = worker_context.worker_thread.as_str(),
            reason = fields::REASON_QUEUE_CLOSED,
            "queue closed and drained; stopping dispatch loop"
        );
    }
}
