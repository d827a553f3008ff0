// Copyright (c) The testtree Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moving records from producer threads onto the mutator thread.
//!
//! Producers hold a [`ResultSender`] and call [`submit`](ResultSender::submit)
//! from any thread. Submissions go onto an unbounded queue and are applied to
//! the tree by a [`ConfinementDispatcher`] running on the mutator thread, in
//! the order they were enqueued.
//!
//! The queue exists before the dispatcher does: records submitted before the
//! mutator starts stay queued until it drains them.

use crate::{
    config::TestTreeConfig,
    errors::MutatorSpawnError,
    events::TreeEvent,
    tree::{ResultTree, TreeSnapshot},
};
use debug_ignore::DebugIgnore;
use std::{marker::PhantomData, num::NonZeroUsize, thread};
use testtree_metadata::ResultRecord;
use tokio::sync::mpsc::{
    UnboundedReceiver, UnboundedSender, error::TryRecvError, unbounded_channel,
};
use tracing::{debug, trace};

/// Creates a new queue, returning the producer and mutator halves.
pub fn result_channel() -> (ResultSender, PendingResults) {
    let (tx, rx) = unbounded_channel();
    (ResultSender { tx }, PendingResults { rx })
}

/// The producer half of the queue.
///
/// Cheap to clone; give each producer thread its own clone. The mutator loop
/// finishes once every sender has been dropped.
#[derive(Clone, Debug)]
pub struct ResultSender {
    tx: UnboundedSender<ResultRecord>,
}

impl ResultSender {
    /// Queues `record` to be applied on the mutator thread and returns
    /// immediately.
    ///
    /// This never blocks and never fails. It may be called from the mutator
    /// thread itself, in which case the record is applied on a later drain.
    pub fn submit(&self, record: ResultRecord) {
        if let Err(error) = self.tx.send(record) {
            // The receiver is only dropped once the run is over.
            debug!(
                series = error.0.series_name(),
                display_name = error.0.display_name(),
                "mutator has shut down, dropping result record",
            );
        }
    }
}

/// The mutator half of the queue, before it is attached to a dispatcher.
#[derive(Debug)]
pub struct PendingResults {
    rx: UnboundedReceiver<ResultRecord>,
}

/// Applies queued records to a [`ResultTree`] it owns, on the thread that
/// created it.
///
/// The tree is created in [`new`](Self::new) and is confined to the calling
/// thread from then on. `callback` is called on that thread with every
/// [`TreeEvent`].
///
/// A dispatcher cannot be sent to another thread, so [`run`](Self::run) must
/// be driven where the dispatcher was created: on a current-thread runtime,
/// inside a `LocalSet`, or through [`MutatorThread`].
///
/// ```compile_fail
/// use testtree_core::{dispatcher::ConfinementDispatcher, events::TreeEvent};
///
/// fn assert_send<T: Send>() {}
/// assert_send::<ConfinementDispatcher<fn(TreeEvent)>>();
/// ```
#[derive_where::derive_where(Debug)]
pub struct ConfinementDispatcher<F> {
    tree: ResultTree,
    rx: UnboundedReceiver<ResultRecord>,
    callback: DebugIgnore<F>,
    yield_every: NonZeroUsize,
    // Pins the dispatcher to the thread that owns its tree.
    _not_send: PhantomData<*const ()>,
}

impl<F> ConfinementDispatcher<F>
where
    F: FnMut(TreeEvent),
{
    /// Creates a dispatcher, and a tree confined to the current thread.
    pub fn new(pending: PendingResults, config: &TestTreeConfig, callback: F) -> Self {
        Self {
            tree: ResultTree::new(config.tree()),
            rx: pending.rx,
            callback: DebugIgnore(callback),
            yield_every: config.dispatcher().yield_every,
            _not_send: PhantomData,
        }
    }

    /// Applies every record currently in the queue, then returns the number
    /// applied.
    ///
    /// Does not wait for more records to arrive, so hosts with their own event
    /// loop can call this whenever they get a chance.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(record) => {
                    self.apply(record);
                    applied += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        trace!(applied, "drained pending results");
        applied
    }

    /// Applies records as they arrive until every [`ResultSender`] has been
    /// dropped and the queue is empty, then returns the number applied.
    ///
    /// Yields to the runtime after every `dispatcher.yield-every` records.
    pub async fn run(&mut self) -> usize {
        debug!(yield_every = self.yield_every.get(), "mutator loop started");

        let mut applied = 0;
        while let Some(record) = self.rx.recv().await {
            self.apply(record);
            applied += 1;
            if applied % self.yield_every.get() == 0 {
                tokio::task::yield_now().await;
            }
        }

        debug!(applied, "all result senders dropped, mutator loop finished");
        applied
    }

    /// Returns the tree.
    pub fn tree(&self) -> &ResultTree {
        &self.tree
    }

    /// Returns the tree and the callback.
    pub fn into_parts(self) -> (ResultTree, F) {
        (self.tree, self.callback.0)
    }

    fn apply(&mut self, record: ResultRecord) {
        let callback = &mut *self.callback;
        self.tree.upsert(record, callback);
    }
}

/// A dedicated mutator thread running a [`ConfinementDispatcher`].
///
/// The thread drives the dispatcher on a current-thread Tokio runtime until
/// every [`ResultSender`] is dropped, then hands back a snapshot of the final
/// tree.
#[derive(Debug)]
pub struct MutatorThread {
    handle: thread::JoinHandle<TreeSnapshot>,
}

impl MutatorThread {
    /// Spawns the thread. The tree is created on it, and `callback` is called
    /// on it.
    pub fn spawn<F>(
        pending: PendingResults,
        config: TestTreeConfig,
        callback: F,
    ) -> Result<Self, MutatorSpawnError>
    where
        F: FnMut(TreeEvent) + Send + 'static,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(MutatorSpawnError::TokioRuntimeCreate)?;

        let handle = thread::Builder::new()
            .name("testtree-mutator".to_owned())
            .spawn(move || {
                let mut dispatcher = ConfinementDispatcher::new(pending, &config, callback);
                runtime.block_on(dispatcher.run());
                dispatcher.tree().snapshot()
            })
            .map_err(MutatorSpawnError::ThreadSpawn)?;

        Ok(Self { handle })
    }

    /// Waits for the thread to finish, which happens once every
    /// [`ResultSender`] has been dropped, and returns the final tree.
    ///
    /// If the thread panicked, the panic is propagated.
    pub fn join(self) -> TreeSnapshot {
        match self.handle.join() {
            Ok(snapshot) => snapshot,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
