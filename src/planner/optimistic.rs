//! Optimistic mutations: change the local store first, ask the remote afterwards, and undo the local change if the remote refused it

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{PlannerError, RemoteError};
use crate::store::TaskStore;

/// How an optimistic mutation ended
#[derive(Debug)]
pub(crate) enum Outcome<T> {
    /// The remote accepted the change, and the store has been reconciled with its answer
    Confirmed(T),
    /// The remote refused the change, and the store has been rolled back
    RolledBack(RemoteError),
}

/// Lock a store. A poisoned lock still holds a consistent store, since no mutation panics half-way
pub(crate) fn lock(store: &Mutex<TaskStore>) -> MutexGuard<'_, TaskStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run an optimistic mutation.
///
/// * `apply` changes the store right away. It returns what the remote call needs, and what `rollback` needs to undo the change.
///   In case it fails, nothing has been changed and the remote is not called.
/// * `call_remote` is then awaited. The store is not locked meanwhile, so that other mutations can be applied.
/// * depending on the remote answer, either `reconcile` or `rollback` is applied to the store.
pub(crate) async fn run<P, U, A, C, Fut, R, Rc, T, Rb>(
    store: &Mutex<TaskStore>,
    apply: A,
    call_remote: C,
    reconcile: Rc,
    rollback: Rb,
) -> Result<Outcome<T>, PlannerError>
where
    A: FnOnce(&mut TaskStore) -> Result<(P, U), PlannerError>,
    C: FnOnce(P) -> Fut,
    Fut: Future<Output = Result<R, RemoteError>>,
    Rc: FnOnce(&mut TaskStore, R) -> T,
    Rb: FnOnce(&mut TaskStore, U),
{
    let (payload, undo) = {
        let mut guard = lock(store);
        apply(&mut *guard)?
    };

    match call_remote(payload).await {
        Ok(answer) => {
            let mut guard = lock(store);
            Ok(Outcome::Confirmed(reconcile(&mut *guard, answer)))
        },
        Err(err) => {
            let mut guard = lock(store);
            rollback(&mut *guard, undo);
            Ok(Outcome::RolledBack(err))
        },
    }
}
