/*!
 * Settle-Once Results
 * Promise/resolver pair backing every queued handle operation
 */

use futures::channel::oneshot;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::errors::{FsError, FsResult};

/// Pending result of a queued operation
///
/// Settles exactly once, when the agent runs the step that resolves or
/// rejects it. Awaitable, or driven synchronously with `Agent::block_on`.
#[must_use = "promises settle only when the agent runs; drive them with Agent::block_on"]
pub struct Promise<T> {
    rx: oneshot::Receiver<FsResult<T>>,
}

/// Settling side of a [`Promise`]
pub(crate) struct Resolver<T> {
    tx: oneshot::Sender<FsResult<T>>,
}

/// Create a linked resolver/promise pair
pub(crate) fn promise<T>() -> (Resolver<T>, Promise<T>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx }, Promise { rx })
}

impl<T> Resolver<T> {
    pub fn settle(self, result: FsResult<T>) {
        // The caller may have dropped the promise; nothing to deliver then
        let _ = self.tx.send(result);
    }
}

impl<T> Promise<T> {
    /// Promise that is already rejected, for synchronous validation failures
    pub fn rejected(error: FsError) -> Self {
        let (resolver, promise) = promise();
        resolver.settle(Err(error));
        promise
    }

    /// Promise that is already resolved
    pub fn resolved(value: T) -> Self {
        let (resolver, promise) = promise();
        resolver.settle(Ok(value));
        promise
    }

    /// Take the result if the promise has settled
    pub fn try_take(&mut self) -> Option<FsResult<T>> {
        match self.rx.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(abandoned())),
        }
    }
}

impl<T> Future for Promise<T> {
    type Output = FsResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(abandoned())),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn abandoned() -> FsError {
    FsError::InvalidState("operation was dropped before it settled".into())
}
