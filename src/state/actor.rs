//! The core actor: one task, one `Matrix`, one event at a time.
//!
//! Every input (a connection appearing, a line, a disconnect, deferred work
//! re-entering the pipeline) is a [`CoreEvent`]. The actor finishes an event,
//! including every hook it fires, before it looks at the next one.

use std::panic::{self, AssertUnwindSafe};

use slirc_proto::Message;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{Matrix, Uid};
use crate::hooks::panic_message;
use crate::metrics;

/// Capacity of the core inbox.
pub const CORE_QUEUE_LEN: usize = 4096;

/// Work handed back to the core from outside the tick that scheduled it.
pub type Deferred = Box<dyn FnOnce(&mut Matrix) + Send>;

pub enum CoreEvent {
    Connected {
        uid: Uid,
        host: String,
        sender: mpsc::Sender<Message>,
    },
    Line {
        uid: Uid,
        line: String,
    },
    Disconnected {
        uid: Uid,
        reason: String,
    },
    Resume(Deferred),
}

impl std::fmt::Debug for CoreEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected { uid, host, .. } => write!(f, "Connected({uid}, {host})"),
            Self::Line { uid, line } => write!(f, "Line({uid}, {line:?})"),
            Self::Disconnected { uid, reason } => write!(f, "Disconnected({uid}, {reason})"),
            Self::Resume(_) => f.write_str("Resume"),
        }
    }
}

/// Cloneable sender into the core.
#[derive(Clone)]
pub struct CoreHandle {
    tx: mpsc::Sender<CoreEvent>,
}

impl CoreHandle {
    pub async fn send(&self, event: CoreEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    /// Re-enter the pipeline with `f` as a fresh top-level event.
    ///
    /// Extensions call this from spawned tasks once their slow work is done;
    /// `f` then runs on the core like any other input.
    pub async fn defer<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Matrix) + Send + 'static,
    {
        self.send(CoreEvent::Resume(Box::new(f))).await
    }

    /// Non-blocking [`defer`](Self::defer), usable from inside a hook.
    pub fn try_defer<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut Matrix) + Send + 'static,
    {
        self.tx.try_send(CoreEvent::Resume(Box::new(f))).is_ok()
    }
}

impl std::fmt::Debug for CoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreHandle").finish_non_exhaustive()
    }
}

impl Matrix {
    /// Process one top-level event to completion.
    pub fn handle_event(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::Connected { uid, host, sender } => {
                self.add_user(uid, &host, Some(sender));
            }
            CoreEvent::Line { uid, line } => {
                if !self.users.contains_key(&uid) {
                    return;
                }
                match line.parse::<Message>() {
                    Ok(msg) => self.dispatch_command(&uid, &msg),
                    Err(e) => debug!(uid = %uid, error = %e, "Dropping unparseable line"),
                }
            }
            CoreEvent::Disconnected { uid, reason } => {
                self.remove_user(&uid, &reason);
            }
            CoreEvent::Resume(work) => {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| work(self))) {
                    error!(panic = panic_message(payload.as_ref()), "Deferred work panicked");
                    metrics::record_hook_error("resume");
                }
            }
        }
        self.flush_disconnects();
    }

    /// Tear down users marked for disconnection during this tick.
    fn flush_disconnects(&mut self) {
        loop {
            let pending = self.take_disconnects();
            if pending.is_empty() {
                break;
            }
            for (uid, reason) in pending {
                if let Some(user) = self.users.get(&uid) {
                    let error = Message::new("ERROR", vec![format!("Closing Link: {} ({reason})", user.host)]);
                    let _ = user.try_send(error);
                }
                self.remove_user(&uid, &reason);
            }
        }
    }
}

/// Drive `matrix` from `rx` until every sender is gone.
pub async fn run(mut matrix: Matrix, mut rx: mpsc::Receiver<CoreEvent>) {
    info!(server = %matrix.server.name, "Core actor started");
    while let Some(event) = rx.recv().await {
        matrix.handle_event(event);
    }
    warn!("Core inbox closed, shutting down");
}

/// Spawn the core actor and return its handle.
pub fn spawn(mut matrix: Matrix) -> (CoreHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(CORE_QUEUE_LEN);
    let handle = CoreHandle { tx };
    matrix.set_handle(handle.clone());
    let task = tokio::spawn(run(matrix, rx));
    (handle, task)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::Config;

    fn matrix() -> Matrix {
        Matrix::new(Arc::new(Config::default())).unwrap()
    }

    #[tokio::test]
    async fn deferred_work_runs_on_the_core() {
        let (core, task) = spawn(matrix());
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        let uid = "001AAAAAZ".to_string();
        let (out_tx, _out_rx) = mpsc::channel(8);
        assert!(
            core.send(CoreEvent::Connected {
                uid: uid.clone(),
                host: "host.example".to_string(),
                sender: out_tx,
            })
            .await
        );
        assert!(
            core.defer(move |m: &mut Matrix| {
                let _ = done_tx.send(m.users.contains_key(&uid));
            })
            .await
        );

        assert!(done_rx.await.unwrap());
        drop(core);
        task.abort();
    }

    #[test]
    fn disconnects_are_flushed_with_an_error_line() {
        let mut m = matrix();
        let uid = m.uid_gen.next_uid();
        let (tx, mut rx) = mpsc::channel(8);
        m.add_user(uid.clone(), "host.example", Some(tx));

        let target = uid.clone();
        m.handle_event(CoreEvent::Resume(Box::new(move |m: &mut Matrix| {
            m.request_disconnect(&target, "Bad behaviour");
        })));

        assert!(!m.users.contains_key(&uid));
        let error = rx.try_recv().unwrap();
        assert_eq!(error.command, "ERROR");
        assert_eq!(error.params, ["Closing Link: host.example (Bad behaviour)"]);
    }

    #[test]
    fn panicking_deferred_work_is_contained() {
        let mut m = matrix();
        m.handle_event(CoreEvent::Resume(Box::new(|_: &mut Matrix| panic!("deferred"))));

        let uid = m.uid_gen.next_uid();
        m.handle_event(CoreEvent::Resume(Box::new({
            let uid = uid.clone();
            move |m: &mut Matrix| m.add_user(uid, "host.example", None)
        })));
        assert!(m.users.contains_key(&uid));
    }

    #[test]
    fn lines_from_unknown_users_are_ignored() {
        let mut m = matrix();
        m.handle_event(CoreEvent::Line {
            uid: "001GHOST00".to_string(),
            line: "NICK ghost".to_string(),
        });
        assert!(m.find_uid("ghost").is_none());
    }
}
