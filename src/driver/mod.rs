//! Coupling driver lifecycle: construct → step (repeatable) → finalize.
//!
//! Construction validates the configuration before any communication, then
//! (active ranks only) writes the session marker on rank 0, initializes the
//! solver and builds the partition layout. Construction closes with an
//! agreement over the *world* group, so a failure on any rank fails every
//! rank instead of leaving peers in a barrier. Teardown closes with a world
//! barrier.
//!
//! Element data is reachable only through [`NekDriver::active`], which is
//! `None` on ranks outside the active group.

pub mod active;
pub mod config;
pub mod session;

pub use active::ActiveNek;
pub use config::NekConfig;
pub use session::{SESSION_FILE, SessionMarker, read_session_marker, write_session_marker};

use crate::algs::communicator::{Communicator, all_ok};
use crate::coupling_error::CouplingError;
use crate::solver::{NekSolver, SizeLimits};

/// What this rank does in the session.
pub enum Role<C, S> {
    /// Holds elements and runs the solver.
    Active(ActiveNek<C, S>),
    /// Only takes part in the world barriers.
    Inactive,
}

/// Drives one coupled session of the external solver.
pub struct NekDriver<'w, W: Communicator, C: Communicator, S: NekSolver> {
    world: &'w W,
    config: NekConfig,
    limits: SizeLimits,
    role: Role<C, S>,
    finalized: bool,
}

impl<'w, W: Communicator, C: Communicator, S: NekSolver> NekDriver<'w, W, C, S> {
    /// Start a session.
    ///
    /// `world` spans every process; `comm` is `Some` exactly on the active
    /// ranks. Collective over `world` (and over `comm` on active ranks).
    ///
    /// A rank whose own setup failed returns that error; every other rank
    /// returns [`CouplingError::PeerFailed`] with its solver already ended.
    pub fn new(world: &'w W, comm: Option<C>, solver: S, config: NekConfig) -> Result<Self, CouplingError> {
        config.validate_pressure()?;
        let limits = solver.size_limits();

        let role = match comm {
            Some(comm) => ActiveNek::initialize(comm, solver, &config).map(Role::Active),
            None => Ok(Role::Inactive),
        };

        let everyone_ok = all_ok(world, role.is_ok());
        let role = role?;
        if !everyone_ok {
            if let Role::Active(mut nek) = role {
                nek.solver.end();
            }
            log::warn!("world rank {}: a peer failed to start the session", world.rank());
            return Err(CouplingError::PeerFailed);
        }
        log::info!(
            "world rank {}: coupling session started ({})",
            world.rank(),
            if matches!(role, Role::Active(_)) { "active" } else { "inactive" }
        );

        Ok(Self {
            world,
            config,
            limits,
            role,
            finalized: false,
        })
    }

    pub fn is_active(&self) -> bool {
        matches!(self.role, Role::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveNek<C, S>> {
        match &self.role {
            Role::Active(nek) => Some(nek),
            Role::Inactive => None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut ActiveNek<C, S>> {
        match &mut self.role {
            Role::Active(nek) => Some(nek),
            Role::Inactive => None,
        }
    }

    pub fn role(&self) -> &Role<C, S> {
        &self.role
    }

    pub fn world(&self) -> &W {
        self.world
    }

    pub fn config(&self) -> &NekConfig {
        &self.config
    }

    pub fn pressure(&self) -> f64 {
        self.config.pressure
    }

    /// Sizes compiled into the solver.
    pub fn limits(&self) -> SizeLimits {
        self.limits
    }

    /// End the solver (active ranks) and synchronize the world.
    ///
    /// Returns the solver handle on active ranks.
    pub fn finalize(mut self) -> Option<S> {
        self.teardown(true);
        match std::mem::replace(&mut self.role, Role::Inactive) {
            Role::Active(nek) => Some(nek.solver),
            Role::Inactive => None,
        }
    }

    fn teardown(&mut self, barrier: bool) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        if let Role::Active(nek) = &mut self.role {
            nek.solver.end();
            log::info!("rank {}: solver ended after {} steps", nek.rank(), nek.steps());
        }
        if barrier {
            self.world.barrier();
        }
    }
}

impl<W: Communicator, C: Communicator, S: NekSolver> Drop for NekDriver<'_, W, C, S> {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        if std::thread::panicking() {
            // Peers may never reach the barrier.
            log::warn!("world rank {}: driver dropped while panicking; skipping barrier", self.world.rank());
            self.teardown(false);
        } else {
            log::warn!("world rank {}: driver dropped without finalize", self.world.rank());
            self.teardown(true);
        }
    }
}
