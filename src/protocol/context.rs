//! Per-session context handed to every protocol action.

use crate::core::Event;
use crate::protocol::channel::{OutboundChannel, ShutdownHandle};
use crate::protocol::sender::BulkSender;
use crate::protocol::signal::FINISH_RX_SERVER;
use crate::protocol::store::{Payload, TransitionStore};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// Everything an action may touch during one session.
///
/// Lives exactly as long as the session. Nothing here is shared with other
/// sessions apart from the store, which belongs to the caller.
pub struct SessionContext<T> {
    session_id: Uuid,
    output: OutboundChannel,
    store: Arc<TransitionStore<T>>,
    shutdown: ShutdownHandle,
    local_events: mpsc::UnboundedSender<Event>,
    bulk_interval: Duration,
    bulk_task: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Payload> SessionContext<T> {
    /// Create a context whose shutdown handle releases `output`.
    ///
    /// Events raised from outside the state machine's own call stack (the
    /// bulk sender's completion) are sent on `local_events`.
    pub fn new(
        output: OutboundChannel,
        store: Arc<TransitionStore<T>>,
        local_events: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            shutdown: ShutdownHandle::new(output.clone()),
            output,
            store,
            local_events,
            bulk_interval: Duration::from_secs(1),
            bulk_task: Mutex::new(None),
        }
    }

    pub fn with_session_id(mut self, session_id: Uuid) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_bulk_interval(mut self, interval: Duration) -> Self {
        self.bulk_interval = interval;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn output(&self) -> &OutboundChannel {
        &self.output
    }

    pub fn store(&self) -> &Arc<TransitionStore<T>> {
        &self.store
    }

    pub fn shutdown(&self) -> &ShutdownHandle {
        &self.shutdown
    }

    /// Start the bulk sender unless one is already running for this session.
    ///
    /// When it has emptied the store it raises `FINISH_RX_SERVER` through the
    /// local event channel.
    pub fn start_bulk_sender(&self) -> bool {
        let mut task = self.bulk_task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            debug!("bulk sender already started");
            return false;
        }

        info!(interval = ?self.bulk_interval, "starting bulk sender");
        let sender = BulkSender::new(self.output.clone(), Arc::clone(&self.store), self.bulk_interval);
        let events = self.local_events.clone();
        *task = Some(sender.spawn(move || {
            if events.send(Event::new(FINISH_RX_SERVER)).is_err() {
                debug!("session loop gone before bulk transfer finished");
            }
        }));
        true
    }

    pub fn bulk_sender_started(&self) -> bool {
        self.bulk_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Abort the bulk sender if it is still running.
    pub fn stop_bulk_sender(&self) {
        let task = self.bulk_task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task {
            if !task.is_finished() {
                debug!("aborting bulk sender");
                task.abort();
            }
        }
    }
}
