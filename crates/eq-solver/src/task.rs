//! Equilibration on a background thread.

use crate::equilibrium::{EquilibriumResult, EquilibriumSolver};
use crate::error::{SolverError, SolverResult};
use crate::restrictions::EquilibriumRestrictions;
use eq_chem::ChemicalState;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

/// Handle to an equilibration running on a worker thread.
///
/// The result is delivered once, whole, when the worker finishes.
pub struct EquilibriumTask {
    receiver: Receiver<SolverResult<EquilibriumResult>>,
    handle: Option<JoinHandle<()>>,
}

impl EquilibriumSolver {
    /// Equilibrate `state` on a new thread. The state is moved to the worker.
    pub fn spawn(&self, state: ChemicalState) -> EquilibriumTask {
        self.spawn_with_restrictions(state, EquilibriumRestrictions::new())
    }

    /// Background variant of
    /// [`equilibrate_with_restrictions`](EquilibriumSolver::equilibrate_with_restrictions).
    pub fn spawn_with_restrictions(
        &self,
        state: ChemicalState,
        restrictions: EquilibriumRestrictions,
    ) -> EquilibriumTask {
        let (tx, rx) = mpsc::channel();
        let solver = self.clone();
        let handle = thread::spawn(move || {
            let result = solver.equilibrate_with_restrictions(&state, &restrictions);
            // The receiver may have been dropped; nothing to report then.
            let _ = tx.send(result);
        });
        EquilibriumTask {
            receiver: rx,
            handle: Some(handle),
        }
    }
}

impl EquilibriumTask {
    /// The result if the worker has finished, without blocking.
    pub fn try_result(&mut self) -> Option<SolverResult<EquilibriumResult>> {
        match self.receiver.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(worker_lost())),
        }
    }

    /// Block until the worker delivers its result.
    pub fn wait(mut self) -> SolverResult<EquilibriumResult> {
        let result = self.receiver.recv().unwrap_or_else(|_| Err(worker_lost()));
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_lost() -> SolverError {
    SolverError::Worker {
        what: "equilibrium worker stopped without a result".to_string(),
    }
}
