//! Factory production switching and release of produced units as new groups.

use std::collections::BTreeMap;

use tracing::info;

use crate::action_queue::{ActionQueue, Priority};
use crate::command::{PendingCommand, Rect, Selection};
use crate::config::TacticsConfig;
use crate::constants::GameConstants;
use crate::entity_view::EntityView;
use crate::groups::GroupRegistry;
use crate::units::{GroupTag, InstallationId, UnitCategory};
use crate::world::InstallationKind;

/// Keeps own factories on accepted categories and groups their output.
#[derive(Debug, Clone, Default)]
pub struct ProductionManager {
    requested: BTreeMap<InstallationId, UnitCategory>,
    released: BTreeMap<InstallationId, GroupTag>,
}

impl ProductionManager {
    /// Create a manager with no requests in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Category last requested for a factory.
    #[must_use]
    pub fn requested(&self, installation: InstallationId) -> Option<UnitCategory> {
        self.requested.get(&installation).copied()
    }

    /// Queue production switches and factory releases. Returns the number of
    /// factories acted on.
    pub fn plan(
        &mut self,
        view: &EntityView,
        constants: &GameConstants,
        config: &TacticsConfig,
        registry: &mut GroupRegistry,
        queue: &mut ActionQueue,
    ) -> usize {
        let accepted = &config.production_preference;
        let Some(&preferred) = accepted.first() else {
            return 0;
        };
        let me = view.me().id;
        let size = constants.installation_size;
        let mut acted = 0;

        for factory in view
            .installations()
            .iter()
            .filter(|i| i.kind == InstallationKind::Factory && i.owner == Some(me))
        {
            let current = factory.production.filter(|c| accepted.contains(c));
            let Some(current) = current else {
                if self.requested(factory.id) != Some(preferred) {
                    self.request(factory.id, preferred, queue);
                    acted += 1;
                }
                continue;
            };

            let previous_release_pending = self
                .released
                .get(&factory.id)
                .and_then(|tag| registry.get(*tag))
                .is_some_and(|g| g.is_empty());
            if previous_release_pending {
                continue;
            }

            let center = factory.center(size);
            let waiting = view
                .untagged_own()
                .filter(|u| u.category == current)
                .filter(|u| u.position.distance(center) < config.factory_release_radius)
                .count();
            if waiting <= config.factory_release_count {
                continue;
            }

            let alternate = accepted
                .iter()
                .position(|c| *c == current)
                .and_then(|i| accepted.get((i + 1) % accepted.len()))
                .copied()
                .unwrap_or(preferred);
            self.request(factory.id, alternate, queue);

            let tag = registry.create(current, constants);
            let footprint = Rect::new(
                factory.top_left.x,
                factory.top_left.y,
                factory.top_left.x + size,
                factory.top_left.y + size,
            );
            queue.push(
                Priority::Ordinary,
                Some(Selection::Rect {
                    rect: footprint,
                    category: Some(current),
                }),
                PendingCommand::Assign { group: tag },
            );
            queue.push_for_group(
                Priority::Ordinary,
                tag,
                PendingCommand::Scale {
                    group: tag,
                    about: center,
                    factor: config.compress_factor,
                },
            );
            if let Some(group) = registry.get_mut(tag) {
                group.is_compressing = true;
            }
            self.released.insert(factory.id, tag);
            info!(tick = view.tick(), installation = factory.id, group = tag, waiting, "Factory output released");
            acted += 1;
        }
        acted
    }

    fn request(&mut self, installation: InstallationId, category: UnitCategory, queue: &mut ActionQueue) {
        queue.push(
            Priority::Ordinary,
            None,
            PendingCommand::StartProduction {
                installation,
                category,
            },
        );
        self.requested.insert(installation, category);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use crate::world::{Installation, UnitSnapshot, WorldSnapshot};

    fn factory(production: Option<UnitCategory>) -> Installation {
        Installation {
            id: 5,
            owner: Some(1),
            kind: InstallationKind::Factory,
            top_left: Vec2::new(200.0, 200.0),
            production,
        }
    }

    fn view_with(installation: Installation, units: Vec<UnitSnapshot>) -> EntityView {
        let mut world = WorldSnapshot::empty(0, 1024.0, 1, 2);
        world.installations = vec![installation];
        world.new_units = units;
        let mut view = EntityView::new();
        view.ingest(&world);
        view
    }

    #[test]
    fn test_idle_factory_switched_once() {
        let view = view_with(factory(None), Vec::new());
        let constants = GameConstants::default();
        let config = TacticsConfig::default();
        let mut manager = ProductionManager::new();
        let mut registry = GroupRegistry::new();
        let mut queue = ActionQueue::new();

        assert_eq!(manager.plan(&view, &constants, &config, &mut registry, &mut queue), 1);
        assert_eq!(manager.requested(5), Some(UnitCategory::AirTransport));
        assert_eq!(manager.plan(&view, &constants, &config, &mut registry, &mut queue), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_accepted_production_left_alone() {
        let view = view_with(factory(Some(UnitCategory::GroundLight)), Vec::new());
        let mut queue = ActionQueue::new();
        let acted = ProductionManager::new().plan(
            &view,
            &GameConstants::default(),
            &TacticsConfig::default(),
            &mut GroupRegistry::new(),
            &mut queue,
        );
        assert_eq!(acted, 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_crowded_factory_releases_group() {
        let units: Vec<UnitSnapshot> = (0..40)
            .map(|i| UnitSnapshot {
                id: 100 + i,
                owner: 1,
                category: UnitCategory::AirTransport,
                position: Vec2::new(232.0, 232.0)
                    + Vec2::new((i % 8) as f64 * 3.0 - 12.0, (i / 8) as f64 * 3.0 - 6.0),
                health: 100,
                max_health: 100,
                group: None,
            })
            .collect();
        let view = view_with(factory(Some(UnitCategory::AirTransport)), units);
        let constants = GameConstants::default();
        let config = TacticsConfig::default();
        let mut manager = ProductionManager::new();
        let mut registry = GroupRegistry::new();
        let mut queue = ActionQueue::new();

        assert_eq!(manager.plan(&view, &constants, &config, &mut registry, &mut queue), 1);
        assert_eq!(manager.requested(5), Some(UnitCategory::GroundLight));
        assert_eq!(registry.len(), 1);
        assert!(registry.iter().all(|g| g.is_compressing));
        // StartProduction, Assign, Scale
        assert_eq!(queue.len(), 3);

        // The new group is still empty, so no second release.
        assert_eq!(manager.plan(&view, &constants, &config, &mut registry, &mut queue), 0);
    }
}
