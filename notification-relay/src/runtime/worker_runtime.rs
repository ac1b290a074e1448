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

//! Runtime helper for spawning the fan-out dispatch loop.

use crate::notification::NotificationMessage;
use crate::observability::events;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::thread;
use tokio::runtime::Builder;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error};

pub(crate) const DISPATCH_RUNTIME_THREAD_NAME: &str = "relay-dispatch";
const COMPONENT: &str = "worker_runtime";

/// Runs `run_loop` on a dedicated thread that owns a current-thread Tokio runtime.
///
/// Delivery I/O therefore never runs on the host's event loop.
pub(crate) fn spawn_dispatch_loop<F, Fut>(
    thread_name: String,
    message_receiver: UnboundedReceiver<Arc<NotificationMessage>>,
    run_loop: F,
) -> io::Result<thread::JoinHandle<()>>
where
    F: FnOnce(UnboundedReceiver<Arc<NotificationMessage>>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + 'static,
{
    debug!(
        event = events::RUNTIME_SPAWN_START,
        component = COMPONENT,
        worker_thread = thread_name.as_str(),
        "spawning dispatch runtime thread"
    );

    let handle = thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!(
                        event = events::RUNTIME_SPAWN_FAILED,
                        component = COMPONENT,
                        err = %err,
                        "failed to build dispatch runtime; notifications will not be delivered"
                    );
                    return;
                }
            };

            runtime.block_on(run_loop(message_receiver));
        })
        .map_err(|err| {
            error!(
                event = events::RUNTIME_SPAWN_FAILED,
                component = COMPONENT,
                worker_thread = thread_name.as_str(),
                err = %err,
                "failed to spawn dispatch runtime thread"
            );
            err
        })?;

    debug!(
        event = events::RUNTIME_SPAWN_OK,
        component = COMPONENT,
        worker_thread = thread_name.as_str(),
        "dispatch runtime thread started"
    );
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::spawn_dispatch_loop;
    use crate::notification::NotificationMessage;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[test]
    fn dispatch_loop_runs_on_named_thread_until_channel_closes() {
        let (sender, receiver) = mpsc::unbounded_channel::<Arc<NotificationMessage>>();
        sender
            .send(Arc::new(NotificationMessage::new("{}").unwrap()))
            .unwrap();
        drop(sender);

        let (seen_tx, seen_rx) = std::sync::mpsc::channel();
        let handle = spawn_dispatch_loop(
            "relay-test".to_string(),
            receiver,
            move |mut receiver| async move {
                let thread_name = std::thread::current().name().map(str::to_string);
                let mut received = 0;
                while receiver.recv().await.is_some() {
                    received += 1;
                }
                seen_tx.send((thread_name, received)).unwrap();
            },
        )
        .expect("thread should spawn");

        handle.join().expect("loop should finish");
        let (thread_name, received) = seen_rx.recv().unwrap();
        assert_eq!(thread_name.as_deref(), Some("relay-test"));
        assert_eq!(received, 1);
    }
}
