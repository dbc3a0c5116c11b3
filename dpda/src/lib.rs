//! Deterministic pushdown automata: a loader for the sectioned text format
//! and a step-wise simulator.
//!
//! ```
//! let src = "\
//! states: q0, qA
//! alphabet: a, INPUT_END
//! initial_state: q0
//! final_states: qA
//! rejecting_states:
//! transition_function:
//!     q0:
//!         (a, STACK_END) -> q0 [STACK_END, a]
//!         (a, a) -> q0 [a, a]
//!         (INPUT_END, a) -> qA [a]
//! ";
//! let spec = dpda::load(src).unwrap();
//! assert_eq!(dpda::run(&spec, "aa").verdict, dpda::Verdict::Accepted);
//! assert_eq!(dpda::run(&spec, "").verdict, dpda::Verdict::Stuck);
//! ```

pub mod automatan;
pub mod loader;

pub use automatan::{
    INPUT_END, STACK_END,
    pda::AutomatonSpec,
    sim::{Run, Simulator, SimulatorResult, Step, StepLimitExceeded, Verdict, run, run_bounded},
};
pub use loader::{Diagnostic, LoadError, load};
