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

//! Notification events and the wire formatter for subscriber payloads.
//!
//! The payload is a flat, single-line, brace-delimited `key:'value'` text. Subscribers
//! parse against this exact layout, so field order and quoting are part of the contract:
//!
//! ```
//! use notification_relay::{NotificationEvent, PortNo, SwitchId};
//!
//! let added = NotificationEvent::SwitchAdded { switch: SwitchId(0x1) };
//! assert_eq!(
//!     added.to_message().unwrap().unwrap().as_str(),
//!     "{dpid:'0x1',notification:'NOTIFICATION'}"
//! );
//!
//! let removed = NotificationEvent::PortRemoved { switch: SwitchId(0x2), port: PortNo(3) };
//! assert_eq!(
//!     removed.to_message().unwrap().unwrap().as_str(),
//!     "{dpid:'0x2',port:'3',notification:'NOTIFICATION'}"
//! );
//!
//! // A reconnect only re-subscribes; nothing is broadcast.
//! assert!(NotificationEvent::UpstreamReconnected.to_message().unwrap().is_none());
//! ```

use std::error::Error;
use std::fmt::{self, Display, Formatter, Write};

/// Upper bound for one serialized notification, in bytes.
pub const NOTIFICATION_MESSAGE_MAX_LEN: usize = 512;

const NOTIFICATION_TAG: &str = "NOTIFICATION";
const EMPTY_MESSAGE: &str = "{}";

/// 64-bit datapath identifier of a switch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SwitchId(pub u64);

/// 32-bit port number on a switch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PortNo(pub u32);

impl Display for SwitchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Display for PortNo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One topology or connectivity change raised by the host.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NotificationEvent {
    SwitchAdded { switch: SwitchId },
    SwitchRemoved { switch: SwitchId },
    PortAdded { switch: SwitchId, port: PortNo },
    PortRemoved { switch: SwitchId, port: PortNo },
    UpstreamClosed,
    UpstreamReconnected,
}

impl NotificationEvent {
    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::SwitchAdded { .. } => "switch_added",
            NotificationEvent::SwitchRemoved { .. } => "switch_removed",
            NotificationEvent::PortAdded { .. } => "port_added",
            NotificationEvent::PortRemoved { .. } => "port_removed",
            NotificationEvent::UpstreamClosed => "upstream_closed",
            NotificationEvent::UpstreamReconnected => "upstream_reconnected",
        }
    }

    pub fn switch(&self) -> Option<SwitchId> {
        match self {
            NotificationEvent::SwitchAdded { switch }
            | NotificationEvent::SwitchRemoved { switch }
            | NotificationEvent::PortAdded { switch, .. }
            | NotificationEvent::PortRemoved { switch, .. } => Some(*switch),
            NotificationEvent::UpstreamClosed | NotificationEvent::UpstreamReconnected => None,
        }
    }

    pub fn port(&self) -> Option<PortNo> {
        match self {
            NotificationEvent::PortAdded { port, .. }
            | NotificationEvent::PortRemoved { port, .. } => Some(*port),
            _ => None,
        }
    }

    /// Formats the event into its wire message.
    ///
    /// Returns `Ok(None)` for events that produce no broadcast.
    pub fn to_message(&self) -> Result<Option<NotificationMessage>, FormatError> {
        let mut text = String::new();
        match self {
            NotificationEvent::SwitchAdded { switch }
            | NotificationEvent::SwitchRemoved { switch } => {
                write!(
                    text,
                    "{{dpid:'{switch}',notification:'{NOTIFICATION_TAG}'}}"
                )?;
            }
            NotificationEvent::PortAdded { switch, port }
            | NotificationEvent::PortRemoved { switch, port } => {
                write!(
                    text,
                    "{{dpid:'{switch}',port:'{port}',notification:'{NOTIFICATION_TAG}'}}"
                )?;
            }
            NotificationEvent::UpstreamClosed => text.push_str(EMPTY_MESSAGE),
            NotificationEvent::UpstreamReconnected => return Ok(None),
        }

        NotificationMessage::new(text).map(Some)
    }
}

/// Immutable payload broadcast identically to every subscriber.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NotificationMessage {
    text: String,
}

impl NotificationMessage {
    /// Wraps a pre-rendered payload, enforcing [`NOTIFICATION_MESSAGE_MAX_LEN`].
    pub fn new(text: impl Into<String>) -> Result<Self, FormatError> {
        let text = text.into();
        if text.len() > NOTIFICATION_MESSAGE_MAX_LEN {
            return Err(FormatError::TooLong { len: text.len() });
        }
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Display for NotificationMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Failures while rendering a notification.
#[derive(Debug, Eq, PartialEq)]
pub enum FormatError {
    TooLong { len: usize },
    Write,
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::TooLong { len } => write!(
                f,
                "notification of {len} bytes exceeds the {NOTIFICATION_MESSAGE_MAX_LEN} byte bound"
            ),
            FormatError::Write => write!(f, "failed to render notification"),
        }
    }
}

impl Error for FormatError {}

impl From<fmt::Error> for FormatError {
    fn from(_: fmt::Error) -> Self {
        FormatError::Write
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(event: NotificationEvent) -> String {
        event
            .to_message()
            .expect("formatting should succeed")
            .expect("event should produce a message")
            .as_str()
            .to_string()
    }

    #[test]
    fn switch_events_render_dpid_and_tag() {
        assert_eq!(
            render(NotificationEvent::SwitchAdded {
                switch: SwitchId(0x1)
            }),
            "{dpid:'0x1',notification:'NOTIFICATION'}"
        );
        assert_eq!(
            render(NotificationEvent::SwitchRemoved {
                switch: SwitchId(0xdead_beef)
            }),
            "{dpid:'0xdeadbeef',notification:'NOTIFICATION'}"
        );
    }

    #[test]
    fn port_events_render_decimal_port() {
        assert_eq!(
            render(NotificationEvent::PortRemoved {
                switch: SwitchId(0x2),
                port: PortNo(3)
            }),
            "{dpid:'0x2',port:'3',notification:'NOTIFICATION'}"
        );
        assert_eq!(
            render(NotificationEvent::PortAdded {
                switch: SwitchId(0x10),
                port: PortNo(65534)
            }),
            "{dpid:'0x10',port:'65534',notification:'NOTIFICATION'}"
        );
    }

    #[test]
    fn upstream_closed_renders_empty_structure() {
        assert_eq!(render(NotificationEvent::UpstreamClosed), "{}");
    }

    #[test]
    fn upstream_reconnected_produces_no_message() {
        assert_eq!(NotificationEvent::UpstreamReconnected.to_message(), Ok(None));
    }

    #[test]
    fn widest_identifiers_stay_within_bound() {
        let message = NotificationEvent::PortAdded {
            switch: SwitchId(u64::MAX),
            port: PortNo(u32::MAX),
        }
        .to_message()
        .expect("formatting should succeed")
        .expect("event should produce a message");

        assert_eq!(
            message.as_str(),
            "{dpid:'0xffffffffffffffff',port:'4294967295',notification:'NOTIFICATION'}"
        );
        assert!(message.len() <= NOTIFICATION_MESSAGE_MAX_LEN);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let oversized = "x".repeat(NOTIFICATION_MESSAGE_MAX_LEN + 1);

        assert_eq!(
            NotificationMessage::new(oversized),
            Err(FormatError::TooLong {
                len: NOTIFICATION_MESSAGE_MAX_LEN + 1
            })
        );
    }

    #[test]
    fn event_accessors_expose_identifiers() {
        let event = NotificationEvent::PortAdded {
            switch: SwitchId(9),
            port: PortNo(1),
        };

        assert_eq!(event.kind(), "port_added");
        assert_eq!(event.switch(), Some(SwitchId(9)));
        assert_eq!(event.port(), Some(PortNo(1)));
        assert_eq!(NotificationEvent::UpstreamClosed.switch(), None);
    }
}
