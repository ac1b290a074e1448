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

mod script;

use crate::script::{ReplayScript, ReplayStep};
use clap::Parser;
use notification_relay::{NotificationRelay, PortNo, RelayConfig, SwitchId};
use simulated_host::SimulatedHost;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Replays a scripted sequence of topology events through the notification relay
/// against an in-process host, delivering to the configured subscribers.
#[derive(Parser)]
#[command()]
struct ReplayArgs {
    /// Relay configuration (JSON5).
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Event script (JSON5).
    #[arg(short, long, value_name = "FILE")]
    events: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args = ReplayArgs::parse();
    let config = RelayConfig::from_file(&args.config)?;
    let script = ReplayScript::from_file(&args.events)?;

    info!(
        steps = script.steps.len(),
        subscribers = config.subscribers.len(),
        "starting notification relay replay"
    );

    let host = Arc::new(SimulatedHost::new());
    let relay = NotificationRelay::init(host.clone(), config)?;

    for step in script.steps {
        apply_step(&host, &relay, step).await;
    }

    relay.shutdown().await;
    info!(
        registrations = host.registration_attempts(),
        "replay finished"
    );
    Ok(())
}

async fn apply_step(host: &SimulatedHost, relay: &NotificationRelay, step: ReplayStep) {
    match step {
        ReplayStep::SwitchAdded { dpid } => host.fire_switch_added(SwitchId(dpid)),
        ReplayStep::SwitchRemoved { dpid } => host.fire_switch_removed(SwitchId(dpid)),
        ReplayStep::PortAdded { dpid, port } => host.fire_port_added(SwitchId(dpid), PortNo(port)),
        ReplayStep::PortRemoved { dpid, port } => {
            host.fire_port_removed(SwitchId(dpid), PortNo(port))
        }
        ReplayStep::CoreLinkDown => host.drop_core_link(),
        ReplayStep::CoreLinkUp => host.restore_core_link(),
        ReplayStep::AddSubscriber { address } => {
            if let Err(err) = relay.subscribers().add(&address) {
                warn!(err = %err, "skipping subscriber");
            }
        }
        ReplayStep::RemoveSubscriber { address } => {
            relay.subscribers().remove(&address);
        }
        ReplayStep::Pause { ms } => tokio::time::sleep(Duration::from_millis(ms)).await,
    }
}
