//! Planner registration hooks
//!
//! The planner calls these slots while registering codelets. They start out
//! empty and are filled with the threaded variants by a successful
//! [`threads_init`](crate::threads_init), which makes block-parallel solvers
//! available to the planner.

use parking_lot::RwLock;
use std::fmt;

lazy_static::lazy_static! {
    static ref HOOKS: RwLock<RegistrationHooks> = RwLock::new(RegistrationHooks::default());
}

/// Codelet being registered with the planner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeletDesc {
    /// Codelet name
    pub name: String,
    /// Radix handled by the codelet
    pub radix: usize,
}

impl CodeletDesc {
    pub fn new(name: impl Into<String>, radix: usize) -> Self {
        CodeletDesc {
            name: name.into(),
            radix,
        }
    }
}

/// Solver families that have threaded variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverFamily {
    /// Complex DFT, Cooley-Tukey decimation in time
    DftCtDit,
    /// Real DFT, half-complex decimation in time
    RdftHc2hcDit,
    /// Real DFT, half-complex decimation in frequency
    RdftHc2hcDif,
}

/// Solver offered to the planner by a hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverDescriptor {
    /// Solver family
    pub family: SolverFamily,
    /// Codelet the solver wraps
    pub codelet: CodeletDesc,
    /// Whether the solver distributes its loop with `spawn_loop`
    pub threaded: bool,
}

/// Receiver of solvers offered by the hooks
pub trait Planner {
    fn register_solver(&mut self, solver: SolverDescriptor);
}

/// Hook signature shared by all three slots
pub type RegistrationHook = fn(&mut dyn Planner, &CodeletDesc);

/// The three hook slots
#[derive(Clone, Copy, Default)]
pub struct RegistrationHooks {
    pub kdft_dit: Option<RegistrationHook>,
    pub khc2hc_dit: Option<RegistrationHook>,
    pub khc2hc_dif: Option<RegistrationHook>,
}

impl RegistrationHooks {
    /// Hooks registering the threaded solver variants
    pub fn threaded() -> Self {
        RegistrationHooks {
            kdft_dit: Some(kdft_dit_register_hook),
            khc2hc_dit: Some(khc2hc_dit_register_hook),
            khc2hc_dif: Some(khc2hc_dif_register_hook),
        }
    }

    /// Whether every slot is filled
    pub fn is_installed(&self) -> bool {
        self.kdft_dit.is_some() && self.khc2hc_dit.is_some() && self.khc2hc_dif.is_some()
    }
}

impl fmt::Debug for RegistrationHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationHooks")
            .field("kdft_dit", &self.kdft_dit.is_some())
            .field("khc2hc_dit", &self.khc2hc_dit.is_some())
            .field("khc2hc_dif", &self.khc2hc_dif.is_some())
            .finish()
    }
}

fn register_threaded(planner: &mut dyn Planner, family: SolverFamily, codelet: &CodeletDesc) {
    planner.register_solver(SolverDescriptor {
        family,
        codelet: codelet.clone(),
        threaded: true,
    });
}

fn kdft_dit_register_hook(planner: &mut dyn Planner, codelet: &CodeletDesc) {
    register_threaded(planner, SolverFamily::DftCtDit, codelet);
}

fn khc2hc_dit_register_hook(planner: &mut dyn Planner, codelet: &CodeletDesc) {
    register_threaded(planner, SolverFamily::RdftHc2hcDit, codelet);
}

fn khc2hc_dif_register_hook(planner: &mut dyn Planner, codelet: &CodeletDesc) {
    register_threaded(planner, SolverFamily::RdftHc2hcDif, codelet);
}

/// Currently installed hooks
pub fn registration_hooks() -> RegistrationHooks {
    *HOOKS.read()
}

pub(crate) fn install(hooks: RegistrationHooks) {
    *HOOKS.write() = hooks;
    tracing::trace!(?hooks, "registration hooks installed");
}
