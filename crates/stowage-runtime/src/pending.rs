//! Completion handles for external I/O polled from the tick

use std::task::Poll;
use stowage_core::{StowageError, StowageResult};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

/// Result of an external request that the tick polls without blocking
///
/// A `Pending` either already holds its result or waits on a one-shot channel
/// filled by a [`Completer`], usually from a blocking task on the
/// [`IoRuntime`](crate::IoRuntime).
#[derive(Debug)]
pub struct Pending<T> {
    inner: Inner<T>,
}

#[derive(Debug)]
enum Inner<T> {
    Ready(StowageResult<T>),
    Waiting(oneshot::Receiver<StowageResult<T>>),
    Taken,
}

/// Write side of a [`Pending`]
#[derive(Debug)]
pub struct Completer<T> {
    sender: oneshot::Sender<StowageResult<T>>,
}

impl<T> Pending<T> {
    /// A request that has already finished
    pub fn ready(result: StowageResult<T>) -> Self {
        Self {
            inner: Inner::Ready(result),
        }
    }

    /// A request finished later through the returned [`Completer`]
    pub fn channel() -> (Completer<T>, Pending<T>) {
        let (sender, receiver) = oneshot::channel();
        (
            Completer { sender },
            Self {
                inner: Inner::Waiting(receiver),
            },
        )
    }

    /// Check for the result without blocking
    ///
    /// Yields the result exactly once. A completer dropped without
    /// completing, or a poll after the result was taken, yields an
    /// `Internal` error.
    pub fn poll(&mut self) -> Poll<StowageResult<T>> {
        match std::mem::replace(&mut self.inner, Inner::Taken) {
            Inner::Ready(result) => Poll::Ready(result),
            Inner::Waiting(mut receiver) => match receiver.try_recv() {
                Ok(result) => Poll::Ready(result),
                Err(TryRecvError::Empty) => {
                    self.inner = Inner::Waiting(receiver);
                    Poll::Pending
                }
                Err(TryRecvError::Closed) => Poll::Ready(Err(StowageError::Internal(
                    "I/O request dropped without completing".to_string(),
                ))),
            },
            Inner::Taken => Poll::Ready(Err(StowageError::Internal(
                "result already taken".to_string(),
            ))),
        }
    }

    /// Whether the result has already been taken by [`poll`](Self::poll)
    pub fn is_taken(&self) -> bool {
        matches!(self.inner, Inner::Taken)
    }
}

impl<T> Completer<T> {
    /// Deliver the result. Returns `false` if nobody is waiting any more.
    pub fn complete(self, result: StowageResult<T>) -> bool {
        self.sender.send(result).is_ok()
    }
}
