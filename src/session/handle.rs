use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::PlayerSession;
use crate::domain::errors::{PlayerError, PlayerResult};

type Job = Box<dyn FnOnce(&mut PlayerSession) + Send>;

enum Envelope {
    Run(Job),
    Shutdown,
}

/// Cloneable entry point to a [`PlayerSession`] living on its own thread.
/// Requests run one at a time in arrival order.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Envelope>,
}

/// Join guard for the session thread.
pub struct SessionWorker {
    thread: JoinHandle<()>,
}

impl SessionHandle {
    /// Starts the session thread. `build` runs on that thread, so engine
    /// clients are created, used and dropped outside any async runtime.
    pub fn spawn<F>(build: F) -> Result<(Self, SessionWorker)>
    where
        F: FnOnce() -> Result<PlayerSession> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<()>>();

        let thread = thread::Builder::new()
            .name("player-session".to_string())
            .spawn(move || {
                let mut session = match build() {
                    Ok(session) => {
                        let _ = ready_tx.send(Ok(()));
                        session
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                while let Some(envelope) = rx.blocking_recv() {
                    match envelope {
                        Envelope::Run(job) => job(&mut session),
                        Envelope::Shutdown => break,
                    }
                }
                rx.close();

                if let Err(err) = session.shutdown() {
                    warn!(error = %err, "player shutdown failed");
                }
                debug!("player session stopped");
            })
            .context("failed to start player session thread")?;

        ready_rx
            .recv()
            .map_err(|_| anyhow!("player session thread exited during startup"))?
            .context("failed to build player session")?;

        Ok((Self { tx }, SessionWorker { thread }))
    }

    pub async fn request<T, F>(&self, f: F) -> PlayerResult<T>
    where
        F: FnOnce(&mut PlayerSession) -> PlayerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let reply = self.submit(f)?;
        reply.await.map_err(|_| PlayerError::SessionClosed)?
    }

    /// Same as [`request`](Self::request) for callers outside an async runtime.
    pub fn blocking_request<T, F>(&self, f: F) -> PlayerResult<T>
    where
        F: FnOnce(&mut PlayerSession) -> PlayerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let reply = self.submit(f)?;
        reply.blocking_recv().map_err(|_| PlayerError::SessionClosed)?
    }

    /// Asks the session thread to shut the engine down and exit. Requests
    /// still queued behind this one fail with `SessionClosed`.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Envelope::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn submit<T, F>(&self, f: F) -> PlayerResult<oneshot::Receiver<PlayerResult<T>>>
    where
        F: FnOnce(&mut PlayerSession) -> PlayerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |session| {
            let _ = reply_tx.send(f(session));
        });
        self.tx
            .send(Envelope::Run(job))
            .map_err(|_| PlayerError::SessionClosed)?;
        Ok(reply_rx)
    }
}

impl SessionWorker {
    pub fn join(self) -> Result<()> {
        self.thread
            .join()
            .map_err(|_| anyhow!("player session thread panicked"))
    }
}
