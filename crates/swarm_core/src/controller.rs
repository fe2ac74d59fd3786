//! The per-tick decision loop.
//!
//! [`TacticalController::decide`] is the only entry point the host calls. It
//! folds the snapshot into the entity view, refreshes the groups, lets the
//! planners fill the action queue in priority order and drains at most one
//! step into a host command.

use tracing::debug;

use crate::action_queue::{ActionQueue, Priority, Step};
use crate::command::{Command, Selection};
use crate::config::TacticsConfig;
use crate::constants::GameConstants;
use crate::engagement::EngagementSelector;
use crate::entity_view::EntityView;
use crate::error::Result;
use crate::formation::{FormationPhase, FormationSequencer};
use crate::groups::GroupRegistry;
use crate::production::ProductionManager;
use crate::strike::StrikeCoordinator;
use crate::world::WorldSnapshot;

/// Owns all per-match state of one player's controller.
#[derive(Debug, Clone)]
pub struct TacticalController {
    config: TacticsConfig,
    view: EntityView,
    registry: GroupRegistry,
    queue: ActionQueue,
    sequencer: FormationSequencer,
    strikes: StrikeCoordinator,
    production: ProductionManager,
}

impl TacticalController {
    /// Create a controller for a new match.
    ///
    /// # Errors
    /// Returns [`crate::error::TacticsError::InvalidConfig`] if `config`
    /// fails validation.
    pub fn new(config: TacticsConfig) -> Result<Self> {
        config.validate()?;
        let sequencer = if config.run_formation {
            FormationSequencer::new()
        } else {
            FormationSequencer::released()
        };
        Ok(Self {
            config,
            view: EntityView::new(),
            registry: GroupRegistry::new(),
            queue: ActionQueue::new(),
            sequencer,
            strikes: StrikeCoordinator::new(),
            production: ProductionManager::new(),
        })
    }

    /// Decide this tick's command, if any.
    ///
    /// Never fails: anything that cannot be acted on costs at most the tick.
    pub fn decide(&mut self, world: &WorldSnapshot, constants: &GameConstants) -> Option<Command> {
        self.view.ingest(world);
        if self.view.me().remaining_action_cooldown > 0 {
            return None;
        }

        self.registry.adopt_untracked(&self.view, constants);
        self.registry
            .refresh(&self.view, constants, &self.config, &self.queue);
        for tag in self.registry.prune() {
            debug!(tick = self.view.tick(), group = tag, "Group pruned");
        }
        self.strikes.update(&self.view, constants, &self.queue);

        self.plan_priority(constants);
        if self.queue.is_idle(Priority::Ordinary) {
            self.plan_ordinary(constants);
        }
        self.drain(constants)
    }

    fn plan_priority(&mut self, constants: &GameConstants) {
        let evading = self.strikes.plan_evasion(
            &self.view,
            constants,
            &self.config,
            &mut self.registry,
            &mut self.queue,
        );
        if evading == 0 && self.queue.is_idle(Priority::Urgent) {
            self.strikes.plan_offense(
                &self.view,
                constants,
                &self.config,
                &mut self.registry,
                &mut self.queue,
            );
        }
    }

    fn plan_ordinary(&mut self, constants: &GameConstants) {
        if !self.sequencer.is_released() {
            self.sequencer.advance(
                &self.view,
                constants,
                &self.config,
                &mut self.registry,
                &mut self.queue,
            );
            return;
        }
        self.production.plan(
            &self.view,
            constants,
            &self.config,
            &mut self.registry,
            &mut self.queue,
        );
        EngagementSelector::new(&self.config, constants).plan(
            &self.view,
            &mut self.registry,
            &mut self.queue,
            self.strikes.strike_group(),
        );
    }

    fn drain(&mut self, constants: &GameConstants) -> Option<Command> {
        let tick = self.view.tick();
        let command = match self.queue.next_step()? {
            Step::Select(selection) => {
                if let Selection::Group(tag) = selection {
                    self.registry.note_command(tag, tick);
                }
                selection.to_command()
            }
            Step::Command(pending) => {
                let Some(command) = pending.materialize(&self.view, constants, &self.config)
                else {
                    debug!(tick, ?pending, "Plan step dropped");
                    return None;
                };
                if let Some(tag) = pending.group() {
                    self.registry.note_command(tag, tick);
                }
                command
            }
        };
        debug!(tick, ?command, "Command emitted");
        Some(command)
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &TacticsConfig {
        &self.config
    }

    /// Entity cache built from the snapshots seen so far.
    #[must_use]
    pub fn view(&self) -> &EntityView {
        &self.view
    }

    /// Current groups.
    #[must_use]
    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    /// Steps waiting to be emitted.
    #[must_use]
    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }

    /// Formation phase reached so far.
    #[must_use]
    pub fn phase(&self) -> FormationPhase {
        self.sequencer.phase()
    }

    /// Group held back for an own strike, if any.
    #[must_use]
    pub fn strike_group(&self) -> Option<crate::units::GroupTag> {
        self.strikes.strike_group()
    }
}
