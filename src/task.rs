//! Background work that reports back through the action channel.
//!
//! [`spawn`] runs one remote call and delivers exactly one message for it.
//! [`spawn_with_progress`] additionally hands the call a [`ProgressReporter`];
//! the matching [`ProgressListener`] yields snapshots one at a time, and the
//! receiver re-arms it after handling each one. Only the newest unread
//! snapshot is kept, so a slow consumer skips snapshots but never loses the
//! result.

use std::future::Future;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::{FetchResult, Result};
use crate::types::Progress;

/// Run `fut` in the background and send `done(outcome)` once it settles.
///
/// Errors, panics and aborts all become `Err` values in the message.
pub fn spawn<T, M, Fut, D>(tx: &mpsc::UnboundedSender<M>, fut: Fut, done: D) -> JoinHandle<()>
where
    T: Send + 'static,
    M: Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
    D: FnOnce(FetchResult<T>) -> M + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        let outcome = match tokio::spawn(fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "background fetch failed");
                Err(e.to_string())
            }
            Err(e) => {
                tracing::error!(error = %e, "background fetch aborted");
                Err(format!("background task aborted: {}", e))
            }
        };
        // The receiver is gone only while shutting down.
        tx.send(done(outcome)).ok();
    })
}

/// Like [`spawn`], for operations that report progress before finishing.
///
/// Returns the listener for the progress side. Nothing is delivered for
/// progress until [`ProgressListener::listen`] is called on it.
pub fn spawn_with_progress<T, M, F, Fut, D>(
    tx: &mpsc::UnboundedSender<M>,
    op: F,
    done: D,
) -> ProgressListener
where
    T: Send + 'static,
    M: Send + 'static,
    F: FnOnce(ProgressReporter) -> Fut,
    Fut: Future<Output = Result<T>> + Send + 'static,
    D: FnOnce(FetchResult<T>) -> M + Send + 'static,
{
    let (reporter, listener) = progress_channel();
    // The reporter moves into the future and closes the channel when it ends.
    spawn(tx, op(reporter), done);
    listener
}

/// Create a connected reporter/listener pair.
pub fn progress_channel() -> (ProgressReporter, ProgressListener) {
    let (tx, rx) = watch::channel(None);
    (ProgressReporter { tx }, ProgressListener { rx })
}

/// Sending half handed to a long-running operation
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: watch::Sender<Option<Progress>>,
}

impl ProgressReporter {
    /// Publish a snapshot, replacing any the listener has not read yet.
    pub fn report(&self, progress: Progress) {
        self.tx.send_replace(Some(progress));
    }
}

/// Receiving half; travels inside the message it produced so it can be re-armed.
#[derive(Debug, Clone)]
pub struct ProgressListener {
    rx: watch::Receiver<Option<Progress>>,
}

impl ProgressListener {
    /// Wait in the background for the next snapshot and deliver it as
    /// `wrap(snapshot, self)`. Delivers nothing once the reporter is dropped
    /// and every snapshot has been read.
    pub fn listen<M, W>(mut self, tx: &mpsc::UnboundedSender<M>, wrap: W) -> JoinHandle<()>
    where
        M: Send + 'static,
        W: FnOnce(Progress, ProgressListener) -> M + Send + 'static,
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            loop {
                if self.rx.changed().await.is_err() {
                    tracing::trace!("progress channel closed");
                    return;
                }
                let snapshot = self.rx.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    tx.send(wrap(snapshot, self)).ok();
                    return;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashError;
    use std::time::Duration;
    use tokio::time::timeout;

    #[derive(Debug)]
    enum Msg {
        Done(FetchResult<u32>),
        Progress(Progress, ProgressListener),
    }

    async fn recv(rx: &mut mpsc::UnboundedReceiver<Msg>) -> Msg {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for message")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn spawn_delivers_value_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn(&tx, async { Ok(7) }, Msg::Done);
        drop(tx);

        assert!(matches!(recv(&mut rx).await, Msg::Done(Ok(7))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn spawn_forwards_errors_as_data() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn(
            &tx,
            async { Err::<u32, _>(DashError::Api("rate limited".into())) },
            Msg::Done,
        );
        drop(tx);

        match recv(&mut rx).await {
            Msg::Done(Err(e)) => assert_eq!(e, "API error: rate limited"),
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn spawn_reports_panics() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn(
            &tx,
            async {
                if true {
                    panic!("boom");
                }
                Ok(1)
            },
            Msg::Done,
        );
        drop(tx);

        assert!(matches!(recv(&mut rx).await, Msg::Done(Err(_))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn unread_snapshot_is_replaced() {
        let (reporter, listener) = progress_channel();
        let (tx, mut rx) = mpsc::unbounded_channel();

        reporter.report(Progress::new(1, 3, "a"));
        reporter.report(Progress::new(2, 3, "b"));
        listener.listen(&tx, Msg::Progress);

        match recv(&mut rx).await {
            Msg::Progress(p, _) => assert_eq!(p, Progress::new(2, 3, "b")),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn listener_stops_after_close() {
        let (reporter, listener) = progress_channel();
        let (tx, mut rx) = mpsc::unbounded_channel();

        reporter.report(Progress::new(3, 3, "last"));
        drop(reporter);

        // The final snapshot is still delivered after the reporter is gone.
        listener.listen(&tx, Msg::Progress);
        let listener = match recv(&mut rx).await {
            Msg::Progress(p, listener) => {
                assert_eq!(p.processed, 3);
                listener
            }
            other => panic!("unexpected message: {:?}", other),
        };

        // Re-arming on a closed, fully-read channel delivers nothing.
        let handle = listener.listen(&tx, Msg::Progress);
        handle.await.unwrap();
        drop(tx);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn progress_and_result_share_one_stream() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (gate_tx, gate_rx) = tokio::sync::oneshot::channel::<()>();

        let listener = spawn_with_progress(
            &tx,
            |reporter| async move {
                reporter.report(Progress::new(1, 3, "a"));
                reporter.report(Progress::new(2, 3, "b"));
                gate_rx.await.ok();
                Ok(42)
            },
            Msg::Done,
        );
        listener.listen(&tx, Msg::Progress);

        // The operation is parked on the gate, so progress must arrive first.
        let listener = match recv(&mut rx).await {
            Msg::Progress(p, listener) => {
                assert!(p.processed >= 1 && p.processed <= 2);
                listener
            }
            other => panic!("unexpected message: {:?}", other),
        };
        gate_tx.send(()).unwrap();
        listener.listen(&tx, Msg::Progress);
        drop(tx);

        let mut results = 0;
        let mut last_progress = None;
        while let Some(msg) = rx.recv().await {
            match msg {
                Msg::Done(result) => {
                    assert_eq!(result, Ok(42));
                    results += 1;
                }
                Msg::Progress(p, _) => last_progress = Some(p),
            }
        }
        assert_eq!(results, 1);
        if let Some(p) = last_progress {
            assert_eq!(p, Progress::new(2, 3, "b"));
        }
    }
}
