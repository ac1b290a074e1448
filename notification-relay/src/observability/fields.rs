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

//! Canonical structured field keys and value-format helpers.

use crate::notification::{PortNo, SwitchId};

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const WORKER_ID: &str = "worker_id";
pub const WORKER_THREAD: &str = "worker_thread";

pub const SERVICE: &str = "service";
pub const STATE: &str = "state";
pub const DPID: &str = "dpid";
pub const PORT: &str = "port";
pub const KIND: &str = "kind";
pub const SUBSCRIBER: &str = "subscriber";
pub const URL: &str = "url";
pub const SNAPSHOT_VERSION: &str = "snapshot_version";

pub const SKIPPED: &str = "skipped";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_QUEUE_CLOSED: &str = "queue_closed";
pub const REASON_NO_RECEIVER: &str = "no_receiver";
pub const DEFAULT_WORKER_THREAD: &str = "unknown-thread";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkerContext {
    pub worker_id: String,
    pub worker_thread: String,
}

impl WorkerContext {
    pub fn new(worker_id: impl Into<String>, worker_thread: Option<&str>) -> Self {
        Self {
            worker_id: worker_id.into(),
            worker_thread: thread_name_or_default(worker_thread),
        }
    }

    pub fn with_current_thread(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            worker_thread: current_thread_name_or_default(),
        }
    }
}

pub fn thread_name_or_default(thread_name: Option<&str>) -> String {
    thread_name.unwrap_or(DEFAULT_WORKER_THREAD).to_string()
}

pub fn current_thread_name_or_default() -> String {
    thread_name_or_default(std::thread::current().name())
}

/// Renders a switch identifier the way it appears on the wire.
pub fn format_dpid(switch: SwitchId) -> String {
    switch.to_string()
}

pub fn format_port(port: Option<PortNo>) -> String {
    port.map(|port| port.0.to_string())
        .unwrap_or_else(|| NONE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_context_falls_back_to_default_thread_name() {
        let context = WorkerContext::new("worker-1", None);

        assert_eq!(context.worker_id, "worker-1");
        assert_eq!(context.worker_thread, DEFAULT_WORKER_THREAD);
    }

    #[test]
    fn format_dpid_uses_prefixed_lowercase_hex() {
        assert_eq!(format_dpid(SwitchId(0xABCD)), "0xabcd");
        assert_eq!(format_dpid(SwitchId(0)), "0x0");
    }

    #[test]
    fn format_port_renders_none_for_switch_level_events() {
        assert_eq!(format_port(Some(PortNo(7))), "7");
        assert_eq!(format_port(None), NONE);
    }
}
