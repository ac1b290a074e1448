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

//! Data-plane layer.
//!
//! Owns the subscriber set, the delivery client and the fan-out worker that turns
//! one formatted notification into one delivery attempt per subscriber.

pub(crate) mod delivery_client;
pub(crate) mod fanout_dispatcher;
pub(crate) mod subscriber_registry;
