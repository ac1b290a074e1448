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

use serde::Deserialize;
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::Path;

/// Ordered host events and administrative actions to replay against the relay.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ReplayScript {
    pub(crate) steps: Vec<ReplayStep>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum ReplayStep {
    SwitchAdded { dpid: u64 },
    SwitchRemoved { dpid: u64 },
    PortAdded { dpid: u64, port: u32 },
    PortRemoved { dpid: u64, port: u32 },
    CoreLinkDown,
    CoreLinkUp,
    AddSubscriber { address: String },
    RemoveSubscriber { address: String },
    Pause { ms: u64 },
}

#[derive(Debug)]
pub(crate) enum ScriptError {
    Io(std::io::Error),
    Parse(json5::Error),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Io(err) => write!(f, "unable to read event script: {err}"),
            ScriptError::Parse(err) => write!(f, "unable to parse event script: {err}"),
        }
    }
}

impl std::error::Error for ScriptError {}

impl ReplayScript {
    pub(crate) fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path).map_err(ScriptError::Io)?;
        Self::from_json5_str(&contents)
    }

    pub(crate) fn from_json5_str(contents: &str) -> Result<Self, ScriptError> {
        json5::from_str(contents).map_err(ScriptError::Parse)
    }
}
