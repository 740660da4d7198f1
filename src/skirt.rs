//! The skirt simulation instance: owns the grid, springs and bone bindings
//! and runs one fixed step at a time.

use crate::binding::{bind_chain, BoneBinding, BoneChain};
use crate::collision::{resolve_collisions, PenetrationTestable};
use crate::config::SkirtConfig;
use crate::debug::{draw_grid, DebugDraw};
use crate::error::SkirtError;
use crate::grid::SkirtGrid;
use crate::observer::StepObserver;
use crate::skeleton::Skeleton;
use crate::solver::{Dynamics, Integrator};
use crate::spring::{build_springs, Spring};
use alloc::vec::Vec;
use glam::Affine3A;
use log::{debug, trace, warn};

/// Counts reported by one [`SkirtSimulation::step`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Springs that were over their stretch limit.
    pub corrections: usize,
    /// Edge/volume penetrations that were resolved.
    pub contacts: usize,
}

/// One simulated skirt.
///
/// Nothing is allocated until [`initialize`](Self::initialize). Before that,
/// and after [`shutdown`](Self::shutdown), stepping and bone updates do
/// nothing.
#[derive(Clone, Debug)]
pub struct SkirtSimulation {
    config: SkirtConfig,
    grid: Option<SkirtGrid>,
    springs: Vec<Spring>,
    chains: Vec<BoneChain>,
    bindings: Vec<BoneBinding>,
    root: Affine3A,
    needs_rebuild: bool,
}

impl SkirtSimulation {
    /// Creates an idle simulation. `config` is clamped into range.
    pub fn new(config: SkirtConfig) -> Self {
        SkirtSimulation {
            config: config.sanitized(),
            grid: None,
            springs: Vec::new(),
            chains: Vec::new(),
            bindings: Vec::new(),
            root: Affine3A::IDENTITY,
            needs_rebuild: false,
        }
    }

    /// Generates particles at rest under `root` and builds the springs.
    pub fn initialize(&mut self, root: &Affine3A) -> Result<(), SkirtError> {
        self.config.validate()?;
        self.root = *root;
        self.rebuild(root);
        debug!(
            "skirt initialized: {} particles, {} springs",
            self.particle_count(),
            self.springs.len()
        );
        Ok(())
    }

    /// Drops the grid and all bindings.
    pub fn shutdown(&mut self) {
        self.grid = None;
        self.springs.clear();
        self.chains.clear();
        self.bindings.clear();
        self.needs_rebuild = false;
        debug!("skirt shut down");
    }

    /// Captures a chain for every configured root bone and binds it to the
    /// rest grid. Returns the number of bindings.
    ///
    /// Chains are captured up to the current ring count; a later topology
    /// change rebinds the captured links but cannot extend them.
    pub fn bind_bones<S: Skeleton + ?Sized>(&mut self, skeleton: &S) -> Result<usize, SkirtError> {
        if self.needs_rebuild {
            let root = self.root;
            self.rebuild(&root);
        }
        let grid = self.grid.as_ref().ok_or(SkirtError::NotInitialized)?;
        let max_links = grid.ring_count().saturating_sub(1);

        let chains = self
            .config
            .bone_roots
            .iter()
            .map(|&bone| BoneChain::capture(skeleton, bone, max_links))
            .collect::<Result<Vec<_>, _>>()?;
        let bindings: Vec<BoneBinding> =
            chains.iter().flat_map(|chain| bind_chain(grid, &self.root, chain)).collect();

        debug!("bound {} bones across {} chains", bindings.len(), chains.len());
        self.chains = chains;
        self.bindings = bindings;
        Ok(self.bindings.len())
    }

    /// Advances the skirt one fixed step: integrator, then collisions
    /// against `volumes` in order.
    ///
    /// A pending topology change is applied first. Does nothing, and calls
    /// no observer hooks, before `initialize`.
    pub fn step<V, O>(&mut self, root: &Affine3A, volumes: &[V], observer: &mut O) -> StepReport
    where
        V: PenetrationTestable,
        O: StepObserver,
    {
        if self.grid.is_none() {
            return StepReport::default();
        }
        self.root = *root;
        if self.needs_rebuild {
            self.rebuild(root);
        }

        let dynamics = Dynamics::from(&self.config);
        let radius = self.config.collision_radius;
        let Some(grid) = self.grid.as_mut() else {
            return StepReport::default();
        };

        let corrections = Integrator::new(grid, &self.springs).step(root, &dynamics, observer);
        let contacts = resolve_collisions(grid, root, radius, volumes);
        observer.on_collisions(contacts);
        observer.on_step_complete();

        trace!("skirt step: {} stretch corrections, {} contacts", corrections, contacts);
        StepReport { corrections, contacts }
    }

    /// Writes the pose of every bound bone into `skeleton`.
    pub fn update_bones<S: Skeleton + ?Sized>(&self, skeleton: &mut S) {
        let Some(grid) = &self.grid else {
            return;
        };
        for binding in &self.bindings {
            skeleton.set_world_pose(binding.bone, binding.solve(grid.particles()));
        }
    }

    /// Draws the live grid, or a rest preview under `root` when not
    /// initialized.
    pub fn draw_debug<D: DebugDraw + ?Sized>(&self, root: &Affine3A, draw: &mut D) {
        match &self.grid {
            Some(grid) => draw_grid(grid, draw),
            None => {
                let preview = SkirtGrid::generate(
                    &self.config.rings,
                    self.config.segments,
                    self.config.starting_angle,
                    root,
                );
                draw_grid(&preview, draw);
            }
        }
    }

    /// Replaces the configuration. Changes to rings, segment count or
    /// starting angle regenerate the grid at the start of the next step.
    pub fn set_config(&mut self, config: SkirtConfig) {
        let config = config.sanitized();
        if self.grid.is_some() && self.config.topology_differs(&config) {
            if !self.chains.is_empty() {
                warn!(
                    "skirt topology changed with {} bound chains; rebinding from captured poses",
                    self.chains.len()
                );
            }
            self.needs_rebuild = true;
        }
        self.config = config;
    }

    fn rebuild(&mut self, root: &Affine3A) {
        let grid = SkirtGrid::generate(
            &self.config.rings,
            self.config.segments,
            self.config.starting_angle,
            root,
        );
        self.springs = build_springs(&grid);
        self.bindings = self
            .chains
            .iter()
            .flat_map(|chain| bind_chain(&grid, root, chain))
            .collect();
        debug!(
            "skirt topology generated: {} rings x {} segments, {} springs, {} bindings",
            grid.ring_count(),
            grid.segment_count(),
            self.springs.len(),
            self.bindings.len()
        );
        self.grid = Some(grid);
        self.needs_rebuild = false;
    }

    pub fn config(&self) -> &SkirtConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.grid.is_some()
    }

    /// Whether a topology change is waiting for the next step.
    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    pub fn grid(&self) -> Option<&SkirtGrid> {
        self.grid.as_ref()
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn chains(&self) -> &[BoneChain] {
        &self.chains
    }

    pub fn bindings(&self) -> &[BoneBinding] {
        &self.bindings
    }

    pub fn particle_count(&self) -> usize {
        self.grid.as_ref().map_or(0, SkirtGrid::particle_count)
    }
}
