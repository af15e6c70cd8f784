//! The single-result adapter: one engine callback becomes one awaited
//! result.
//!
//! The engine completes every request by invoking a callback exactly once.
//! [`Resolver`] is the bridge: it owns a oneshot sender, and both of its
//! settle methods consume `self`, so a request outcome can be delivered at
//! most once — double resolution is unrepresentable rather than checked.

use burrowdb_engine::{Completion, EngineError, EngineResult};
use tokio::sync::oneshot;

/// One-shot resolver for a pending engine request.
pub(crate) struct Resolver<T> {
    sender: oneshot::Sender<EngineResult<T>>,
}

impl<T: Send + 'static> Resolver<T> {
    fn settle(self, result: EngineResult<T>) {
        // The receiver may have been dropped by a caller that gave up on
        // the operation; there is nobody left to notify then.
        let _ = self.sender.send(result);
    }

    /// Delivers the success event.
    pub(crate) fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    /// Delivers the error event.
    pub(crate) fn fail(self, error: EngineError) {
        self.settle(Err(error));
    }

    /// Wraps the resolver into the engine's callback shape.
    pub(crate) fn completion(self) -> Completion<T> {
        Box::new(move |result| match result {
            Ok(value) => self.resolve(value),
            Err(error) => self.fail(error),
        })
    }
}

/// Issues one engine request and suspends until its completion fires.
///
/// `issue` receives the completion callback and must hand it to exactly one
/// engine request. If the engine drops the callback without invoking it
/// (worker shut down mid-request), the await resolves to `EngineClosed`.
pub(crate) async fn await_engine<T, F>(issue: F) -> EngineResult<T>
where
    T: Send + 'static,
    F: FnOnce(Completion<T>),
{
    let (sender, receiver) = oneshot::channel();
    issue(Resolver { sender }.completion());
    receiver.await.unwrap_or(Err(EngineError::EngineClosed))
}
