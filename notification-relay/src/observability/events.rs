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

//! Canonical structured event names used across `notification-relay`.

// Upstream service connection events.
pub const SERVICE_ACQUIRE_OK: &str = "service_acquire_ok";
pub const SERVICE_ACQUIRE_FAILED: &str = "service_acquire_failed";
pub const SERVICE_ACQUIRE_SKIPPED: &str = "service_acquire_skipped";
pub const SERVICE_STATE_CHANGE: &str = "service_state_change";
pub const SERVICE_KEEPALIVE: &str = "service_keepalive";

// Event subscription lifecycle events.
pub const SUBSCRIPTION_REGISTER_START: &str = "subscription_register_start";
pub const SUBSCRIPTION_REGISTER_OK: &str = "subscription_register_ok";
pub const SUBSCRIPTION_REGISTER_FAILED: &str = "subscription_register_failed";

// Host callback events.
pub const EVENT_RECEIVED: &str = "event_received";
pub const CORE_RECONNECTED: &str = "core_reconnected";
pub const PORT_STATS_ENABLED: &str = "port_stats_enabled";
pub const NOTIFICATION_FORMAT_FAILED: &str = "notification_format_failed";
pub const NOTIFICATION_ENQUEUED: &str = "notification_enqueued";
pub const NOTIFICATION_ENQUEUE_FAILED: &str = "notification_enqueue_failed";

// Fan-out and delivery events.
pub const FANOUT_START: &str = "fanout_start";
pub const FANOUT_COMPLETE: &str = "fanout_complete";
pub const FANOUT_NO_SUBSCRIBERS: &str = "fanout_no_subscribers";
pub const DELIVERY_ATTEMPT: &str = "delivery_attempt";
pub const DELIVERY_OK: &str = "delivery_ok";
pub const DELIVERY_FAILED: &str = "delivery_failed";
pub const DISPATCH_BACKLOG_HIGH: &str = "dispatch_backlog_high";
pub const DISPATCH_RECV_CLOSED: &str = "dispatch_recv_closed";
pub const DISPATCH_WORKER_CREATE: &str = "dispatch_worker_create";
pub const DISPATCH_WORKER_JOIN_FAILED: &str = "dispatch_worker_join_failed";

// Subscriber registry events.
pub const SUBSCRIBER_ADDED: &str = "subscriber_added";
pub const SUBSCRIBER_REMOVED: &str = "subscriber_removed";
pub const SUBSCRIBER_REJECTED: &str = "subscriber_rejected";

// Runtime and module lifecycle events.
pub const RUNTIME_SPAWN_START: &str = "runtime_spawn_start";
pub const RUNTIME_SPAWN_OK: &str = "runtime_spawn_ok";
pub const RUNTIME_SPAWN_FAILED: &str = "runtime_spawn_failed";
pub const MODULE_INIT_START: &str = "module_init_start";
pub const MODULE_INIT_OK: &str = "module_init_ok";
pub const MODULE_SHUTDOWN: &str = "module_shutdown";
