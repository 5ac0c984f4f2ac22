//! The coordinator's per-tick logic: drain finished products at the inlet,
//! inject raw components at the outlet.
//!
//! The coordinator owns the production plan. Component stock is sized at
//! startup as planned units × components required; distribution walks the
//! kinds round-robin and is throttled when the ring is nearly full of
//! in-flight work. Running out of stock or robots is a normal steady state,
//! not an error.

use std::sync::Arc;

use tracing::{debug, info};

use carousel_contracts::error::{CarouselError, CarouselResult};
use carousel_contracts::item::{Component, ProductKind, SlotContent};
use carousel_contracts::recipe::RecipeCatalog;
use carousel_ring::Ring;

/// What the coordinator did on one tick. Draining and distributing can both
/// happen on the same tick; they touch different slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoordinatorOutcome {
    pub drained: Option<ProductKind>,
    pub distributed: Option<ProductKind>,
}

/// Per-kind production accounting, exported for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionSummary {
    pub planned: Vec<u32>,
    pub completed: Vec<u32>,
    pub remaining_stock: Vec<u32>,
}

/// The server side of the line: plan, stock, and completion counters.
pub struct Coordinator {
    catalog: Arc<RecipeCatalog>,
    /// Units still to produce, per kind. Saturating: draining more than
    /// planned never underflows.
    planned: Vec<u32>,
    completed: Vec<u32>,
    /// Raw components left to inject, per kind.
    stock: Vec<u32>,
    /// Round-robin cursor over kinds for distribution.
    cursor: usize,
    /// Inject only while strictly more than this many slots are empty.
    empty_slack: usize,
}

impl Coordinator {
    /// Build a coordinator for a production plan (`planned[i]` units of
    /// kind `i+1`). Stock is derived from the plan and the recipes; the plan
    /// must cover every catalog kind exactly once.
    pub fn new(
        catalog: Arc<RecipeCatalog>,
        planned: Vec<u32>,
        empty_slack: usize,
    ) -> CarouselResult<Self> {
        let kinds = catalog.kind_count();
        if planned.len() != kinds {
            return Err(CarouselError::ConfigInvalid {
                reason: format!(
                    "production plan covers {} kinds, catalog has {}",
                    planned.len(),
                    kinds
                ),
            });
        }
        let stock = catalog
            .iter()
            .zip(planned.iter())
            .map(|(recipe, units)| units * recipe.components_required)
            .collect();
        Ok(Self {
            catalog,
            planned,
            completed: vec![0; kinds],
            stock,
            cursor: 0,
            empty_slack,
        })
    }

    pub fn completed(&self, kind: ProductKind) -> u32 {
        self.completed[kind.index()]
    }

    pub fn remaining_stock(&self, kind: ProductKind) -> u32 {
        self.stock[kind.index()]
    }

    fn total_stock(&self) -> u32 {
        self.stock.iter().sum()
    }

    pub fn summary(&self) -> ProductionSummary {
        ProductionSummary {
            planned: self.planned.clone(),
            completed: self.completed.clone(),
            remaining_stock: self.stock.clone(),
        }
    }

    /// React to one tick. Runs entirely under the caller's ring lock.
    pub fn on_tick(&mut self, ring: &mut Ring) -> CoordinatorOutcome {
        CoordinatorOutcome {
            drained: self.drain(ring),
            distributed: self.distribute(ring),
        }
    }

    /// Take a completed product off the inlet slot and book it.
    fn drain(&mut self, ring: &mut Ring) -> Option<ProductKind> {
        let inlet = ring.inlet();
        let SlotContent::Product(product) = *ring.slot(inlet) else {
            return None;
        };
        if !product.stage.is_complete() {
            return None;
        }

        *ring.slot_mut(inlet) = SlotContent::Empty;
        let index = product.kind.index();
        self.completed[index] += 1;
        self.planned[index] = self.planned[index].saturating_sub(1);
        info!(
            kind = %product.kind,
            completed = self.completed[index],
            remaining_planned = self.planned[index],
            "finished product drained"
        );
        Some(product.kind)
    }

    /// Inject one component at the outlet, round-robin over kinds with
    /// remaining stock. Gated on connected robots, a free outlet, positive
    /// stock, and enough empty slots to keep the ring from flooding.
    fn distribute(&mut self, ring: &mut Ring) -> Option<ProductKind> {
        if ring.robot_count() == 0 {
            return None;
        }
        let outlet = ring.outlet();
        if !ring.slot(outlet).is_empty() {
            return None;
        }
        if self.total_stock() == 0 {
            return None;
        }
        if ring.empty_slots() <= self.empty_slack {
            return None;
        }

        let kinds = self.stock.len();
        for offset in 0..kinds {
            let index = (self.cursor + offset) % kinds;
            if self.stock[index] == 0 {
                continue;
            }
            self.stock[index] -= 1;
            self.cursor = (index + 1) % kinds;
            let kind = ProductKind::from_index(index);
            *ring.slot_mut(outlet) = SlotContent::Component(Component { kind });
            debug!(%kind, remaining = self.stock[index], "component distributed");
            return Some(kind);
        }
        None
    }

    /// Components of `kind` not yet injected nor consumed into completed
    /// products, as seen by the conservation property.
    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carousel_contracts::item::{Product, ProductStage};
    use carousel_contracts::robot::AgentId;
    use carousel_ring::Occupant;

    fn setup(planned: Vec<u32>) -> (Coordinator, Ring) {
        let catalog = Arc::new(RecipeCatalog::standard());
        let coordinator = Coordinator::new(catalog, planned, 3).unwrap();
        let mut ring = Ring::new(16).unwrap();
        let inlet = ring.inlet();
        let outlet = ring.outlet();
        ring.bind(inlet, Occupant::Coordinator).unwrap();
        ring.bind(outlet, Occupant::Coordinator).unwrap();
        ring.bind(4, Occupant::Robot(AgentId(1))).unwrap();
        (coordinator, ring)
    }

    #[test]
    fn plan_must_cover_every_catalog_kind() {
        let catalog = Arc::new(RecipeCatalog::standard());
        // Four kinds in the catalog; a three-entry plan must be refused, not
        // quietly truncated into short stock tables.
        assert!(Coordinator::new(catalog.clone(), vec![1, 1, 1], 3).is_err());
        assert!(Coordinator::new(catalog.clone(), vec![1; 5], 3).is_err());
        assert!(Coordinator::new(catalog, vec![1; 4], 3).is_ok());
    }

    #[test]
    fn stock_is_planned_times_required() {
        let (coordinator, _) = setup(vec![10, 15, 12, 8]);
        assert_eq!(coordinator.remaining_stock(ProductKind(1)), 30);
        assert_eq!(coordinator.remaining_stock(ProductKind(2)), 45);
        assert_eq!(coordinator.remaining_stock(ProductKind(3)), 12);
        assert_eq!(coordinator.remaining_stock(ProductKind(4)), 16);
    }

    #[test]
    fn drains_completed_product_at_inlet() {
        let (mut coordinator, mut ring) = setup(vec![1, 1, 1, 1]);
        let inlet = ring.inlet();
        *ring.slot_mut(inlet) = SlotContent::Product(Product {
            kind: ProductKind(2),
            stage: ProductStage::Complete,
        });

        let outcome = coordinator.on_tick(&mut ring);
        assert_eq!(outcome.drained, Some(ProductKind(2)));
        assert!(ring.slot(inlet).is_empty());
        assert_eq!(coordinator.completed(ProductKind(2)), 1);
        assert_eq!(coordinator.summary().planned[1], 0);
    }

    #[test]
    fn in_progress_product_at_inlet_is_left_alone() {
        let (mut coordinator, mut ring) = setup(vec![1, 1, 1, 1]);
        let inlet = ring.inlet();
        let product = SlotContent::Product(Product::new(ProductKind(2)));
        *ring.slot_mut(inlet) = product;

        let outcome = coordinator.on_tick(&mut ring);
        assert_eq!(outcome.drained, None);
        assert_eq!(*ring.slot(inlet), product);
    }

    #[test]
    fn unplanned_drain_saturates_instead_of_underflowing() {
        let (mut coordinator, mut ring) = setup(vec![0, 0, 0, 0]);
        let inlet = ring.inlet();
        *ring.slot_mut(inlet) = SlotContent::Product(Product {
            kind: ProductKind(1),
            stage: ProductStage::Complete,
        });
        coordinator.on_tick(&mut ring);
        assert_eq!(coordinator.summary().planned[0], 0);
        assert_eq!(coordinator.completed(ProductKind(1)), 1);
    }

    #[test]
    fn distribution_walks_kinds_round_robin() {
        let (mut coordinator, mut ring) = setup(vec![2, 2, 2, 2]);
        let outlet = ring.outlet();
        let mut seen = Vec::new();
        for _ in 0..4 {
            let outcome = coordinator.on_tick(&mut ring);
            seen.push(outcome.distributed.unwrap());
            *ring.slot_mut(outlet) = SlotContent::Empty; // simulate rotation
        }
        assert_eq!(
            seen,
            vec![
                ProductKind(1),
                ProductKind(2),
                ProductKind(3),
                ProductKind(4)
            ]
        );
    }

    #[test]
    fn distribution_skips_exhausted_kinds() {
        let (mut coordinator, mut ring) = setup(vec![0, 1, 0, 1]);
        let outlet = ring.outlet();
        let first = coordinator.on_tick(&mut ring).distributed;
        *ring.slot_mut(outlet) = SlotContent::Empty;
        let second = coordinator.on_tick(&mut ring).distributed;
        assert_eq!(first, Some(ProductKind(2)));
        assert_eq!(second, Some(ProductKind(4)));
    }

    #[test]
    fn no_distribution_without_robots() {
        let catalog = Arc::new(RecipeCatalog::standard());
        let mut coordinator = Coordinator::new(catalog, vec![1, 1, 1, 1], 3).unwrap();
        let mut ring = Ring::new(16).unwrap();
        let inlet = ring.inlet();
        ring.bind(inlet, Occupant::Coordinator).unwrap();
        ring.bind(0, Occupant::Coordinator).unwrap();

        assert_eq!(coordinator.on_tick(&mut ring).distributed, None);
    }

    #[test]
    fn no_distribution_onto_an_occupied_outlet() {
        let (mut coordinator, mut ring) = setup(vec![1, 1, 1, 1]);
        let outlet = ring.outlet();
        *ring.slot_mut(outlet) = SlotContent::Component(Component {
            kind: ProductKind(1),
        });
        assert_eq!(coordinator.on_tick(&mut ring).distributed, None);
    }

    #[test]
    fn empty_slack_throttles_a_crowded_ring() {
        let (mut coordinator, mut ring) = setup(vec![4, 4, 4, 4]);
        let outlet = ring.outlet();
        // Fill slots until only the slack threshold remains empty.
        for position in 1..=12 {
            *ring.slot_mut(position) = SlotContent::Component(Component {
                kind: ProductKind(1),
            });
        }
        assert_eq!(ring.empty_slots(), 4); // slack is 3: 4 > 3, still allowed
        assert!(coordinator.on_tick(&mut ring).distributed.is_some());

        // Free the outlet but crowd one more slot: exactly 3 empty remain,
        // which is at (not above) the threshold, so the gate closes.
        *ring.slot_mut(outlet) = SlotContent::Empty;
        *ring.slot_mut(13) = SlotContent::Component(Component {
            kind: ProductKind(1),
        });
        assert_eq!(ring.empty_slots(), 3);
        assert_eq!(coordinator.on_tick(&mut ring).distributed, None);
    }

    #[test]
    fn exhausted_stock_is_a_quiet_steady_state() {
        let (mut coordinator, mut ring) = setup(vec![0, 0, 0, 0]);
        assert_eq!(coordinator.on_tick(&mut ring), CoordinatorOutcome::default());
    }
}
