use std::{pin::Pin, task::Context};

use futures::{future::BoxFuture, Future};

/// A future polled once per frame with a noop waker. Gateway calls complete a
/// oneshot from a worker thread, so progress is observable on any later poll
/// as long as the UI keeps repainting while a call is in flight.
pub struct AsyncTask<T>(BoxFuture<'static, T>);

impl<T> AsyncTask<T> {
    pub fn new(fut: BoxFuture<'static, T>) -> Self {
        Self(fut)
    }

    pub fn data(&mut self) -> Option<T> {
        let waker = std::task::Waker::noop();
        let mut cx = Context::from_waker(waker);
        match Pin::new(&mut self.0).poll(&mut cx) {
            std::task::Poll::Ready(r) => {
                #[cfg(debug_assertions)]
                {
                    self.0 = Box::pin(std::future::poll_fn(|_| {
                        panic!("AsyncTask polled after completion")
                    }));
                }
                Some(r)
            }
            std::task::Poll::Pending => None,
        }
    }
}

/// An in-flight gateway call tagged with the session generation it was issued
/// under, so the reducer can drop replies that outlived a Reset or re-upload.
pub struct PendingCall<T> {
    generation: u64,
    task: AsyncTask<T>,
}

impl<T> PendingCall<T> {
    pub fn new(generation: u64, fut: BoxFuture<'static, T>) -> Self {
        Self {
            generation,
            task: AsyncTask::new(fut),
        }
    }

    /// Ready value together with the issue-time generation, or None while the
    /// call is still running.
    pub fn poll(&mut self) -> Option<(u64, T)> {
        let generation = self.generation;
        self.task.data().map(|value| (generation, value))
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;

    use super::*;

    #[test]
    fn ready_future_resolves_on_first_poll() {
        let mut task = AsyncTask::new(async { 7 }.boxed());
        assert_eq!(task.data(), Some(7));
    }

    #[test]
    fn oneshot_resolves_after_send() {
        let (tx, rx) = futures::channel::oneshot::channel();
        let mut call = PendingCall::new(3, rx.map(|r| r.unwrap()).boxed());
        assert!(call.poll().is_none());
        tx.send("done").unwrap();
        assert_eq!(call.poll(), Some((3, "done")));
    }
}
