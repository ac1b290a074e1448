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

//! Control-plane layer.
//!
//! Owns the upstream service links and the module's event subscription. All state
//! here is mutated only from host callbacks, which the host serialises on its event
//! loop; nothing in this layer suspends or performs network I/O of its own.

pub(crate) mod event_subscription;
pub(crate) mod service_manager;
