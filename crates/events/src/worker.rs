use std::io;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::bus::{Poll, Subscription};
use crate::event::EngineEvent;
use crate::listener::{EngineListener, dispatch};

/// Handle to control and join a background listener worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    ///
    /// Events already queued on the subscription are delivered first.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Delivers bus events to a single listener on a dedicated thread.
///
/// - One thread per listener, so callbacks observe publish order
/// - Callback errors are logged and do not stop delivery
/// - Supports graceful shutdown
#[derive(Debug)]
pub struct ListenerWorker;

impl ListenerWorker {
    pub fn spawn(
        name: impl Into<String>,
        sub: Subscription<EngineEvent>,
        listener: Arc<dyn EngineListener>,
    ) -> io::Result<WorkerHandle> {
        let name = name.into();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread_name = name.clone();
        let join = thread::Builder::new()
            .name(thread_name)
            .spawn(move || worker_loop(&name, sub, shutdown_rx, listener.as_ref()))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn worker_loop(
    name: &str,
    sub: Subscription<EngineEvent>,
    shutdown_rx: mpsc::Receiver<()>,
    listener: &dyn EngineListener,
) {
    let tick = Duration::from_millis(250);

    loop {
        match sub.poll(tick) {
            Poll::Message(event) => deliver(name, listener, &event),
            Poll::Idle => {}
            Poll::Closed => break,
        }

        if shutdown_rx.try_recv().is_ok() {
            // Flush what is already queued, then stop.
            for event in sub.drain() {
                deliver(name, listener, &event);
            }
            break;
        }
    }
}

fn deliver(name: &str, listener: &dyn EngineListener, event: &EngineEvent) {
    if let Err(err) = dispatch(listener, event) {
        warn!(
            worker = name,
            event_type = event.event_type(),
            error = %err,
            "listener callback failed"
        );
    }
}
