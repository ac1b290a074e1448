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

//! Subscriber registry: the set of HTTP endpoints notifications are fanned out to.
//!
//! Writers (the administrative path) and readers (the dispatcher) share one
//! reader/writer lock. Readers only ever take a point-in-time copy, so no lock is
//! held while a delivery is in flight.

use crate::observability::events;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

const COMPONENT: &str = "subscriber_registry";

/// `host[:port]` of one subscriber endpoint.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SubscriberAddress(String);

impl SubscriberAddress {
    pub fn parse(address: &str) -> Result<Self, RegistryError> {
        let reject = |reason| {
            Err(RegistryError::InvalidAddress {
                address: address.to_string(),
                reason,
            })
        };

        if address.is_empty() {
            return reject("empty address");
        }
        if address.chars().any(char::is_whitespace) {
            return reject("address contains whitespace");
        }
        if address.contains("://") {
            return reject("address must not carry a scheme");
        }
        if address.contains('/') {
            return reject("address must not carry a path");
        }

        Ok(Self(address.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SubscriberAddress {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for SubscriberAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RegistryError {
    InvalidAddress {
        address: String,
        reason: &'static str,
    },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidAddress { address, reason } => {
                write!(f, "invalid subscriber address `{address}`: {reason}")
            }
        }
    }
}

impl Error for RegistryError {}

/// Copy of the subscriber set taken at one registry version.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubscriberSnapshot {
    pub version: u64,
    pub subscribers: Vec<SubscriberAddress>,
}

#[derive(Default)]
struct RegistryInner {
    version: u64,
    subscribers: Vec<SubscriberAddress>,
}

/// Shared handle to the subscriber set. Clones refer to the same set.
///
/// Entries are kept in insertion order and are not deduplicated.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry pre-populated with `addresses`, rejecting the first invalid one.
    pub fn with_subscribers<I, S>(addresses: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let registry = Self::new();
        for address in addresses {
            registry.add(address.as_ref())?;
        }
        Ok(registry)
    }

    pub fn add(&self, address: &str) -> Result<SubscriberAddress, RegistryError> {
        let subscriber = match SubscriberAddress::parse(address) {
            Ok(subscriber) => subscriber,
            Err(err) => {
                warn!(
                    event = events::SUBSCRIBER_REJECTED,
                    component = COMPONENT,
                    subscriber = address,
                    err = %err,
                    "rejected subscriber address"
                );
                return Err(err);
            }
        };

        let mut inner = self.write();
        inner.subscribers.push(subscriber.clone());
        inner.version += 1;
        info!(
            event = events::SUBSCRIBER_ADDED,
            component = COMPONENT,
            subscriber = subscriber.as_str(),
            snapshot_version = inner.version,
            subscriber_count = inner.subscribers.len(),
            "subscriber added"
        );
        Ok(subscriber)
    }

    /// Removes the first entry equal to `address`. Returns `false` if none matched.
    pub fn remove(&self, address: &str) -> bool {
        let mut inner = self.write();
        let Some(index) = inner
            .subscribers
            .iter()
            .position(|subscriber| subscriber.as_str() == address)
        else {
            debug!(
                event = events::SUBSCRIBER_REMOVED,
                component = COMPONENT,
                subscriber = address,
                removed = false,
                "no such subscriber"
            );
            return false;
        };

        inner.subscribers.remove(index);
        inner.version += 1;
        info!(
            event = events::SUBSCRIBER_REMOVED,
            component = COMPONENT,
            subscriber = address,
            removed = true,
            snapshot_version = inner.version,
            subscriber_count = inner.subscribers.len(),
            "subscriber removed"
        );
        true
    }

    pub fn clear(&self) {
        let mut inner = self.write();
        inner.subscribers.clear();
        inner.version += 1;
    }

    pub fn len(&self) -> usize {
        self.read().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().subscribers.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.read().version
    }

    /// Copies the current set under the read lock.
    pub fn snapshot(&self) -> SubscriberSnapshot {
        let inner = self.read();
        SubscriberSnapshot {
            version: inner.version,
            subscribers: inner.subscribers.clone(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
