//! # carousel-core
//!
//! The per-tick decision logic of the production line:
//!
//! - [`Robot`] — the worker state machine (absorb components, operate on
//!   products, place held work)
//! - [`Coordinator`] — the server side (drain finished products, inject raw
//!   components)
//!
//! Both operate on `&mut Ring` and are driven by the runtime, which calls
//! them under the single ring lock so every read-then-act sequence is
//! atomic with respect to rotation and to the other workers.

pub mod coordinator;
pub mod robot;

pub use coordinator::{Coordinator, CoordinatorOutcome, ProductionSummary};
pub use robot::{Robot, RobotAction};

#[cfg(test)]
mod scenarios {
    //! Whole-line scenarios: coordinator and robots driven tick by tick on
    //! one thread, with the rotation performed explicitly between reactions.

    use std::sync::Arc;

    use carousel_contracts::config::ScenarioConfig;
    use carousel_contracts::item::{Operation, ProductKind, SlotContent};
    use carousel_contracts::recipe::{Recipe, RecipeCatalog};
    use carousel_contracts::robot::{AgentId, RobotProfile};
    use carousel_ring::{assign_position, Occupant, Ring};

    use crate::{Coordinator, Robot, RobotAction};

    fn bind_coordinator(ring: &mut Ring) {
        let inlet = ring.inlet();
        let outlet = ring.outlet();
        ring.bind(inlet, Occupant::Coordinator).unwrap();
        ring.bind(outlet, Occupant::Coordinator).unwrap();
    }

    /// One committed rotation followed by every party's reaction, in the
    /// deterministic order coordinator-then-robots.
    fn tick(ring: &mut Ring, coordinator: &mut Coordinator, robots: &mut [Robot]) {
        ring.rotate();
        coordinator.on_tick(ring);
        for robot in robots.iter_mut() {
            robot.on_tick(ring);
        }
    }

    /// A ring of four slots, one product kind needing a single component and
    /// a single operation, one unit of stock, one robot whose primary op
    /// matches. Absorb and place take two ticks; two more rotations carry
    /// the finished product to the inlet.
    #[test]
    fn scenario_single_component_product_end_to_end() {
        let catalog = Arc::new(
            RecipeCatalog::new(vec![Recipe {
                kind: ProductKind(1),
                components_required: 1,
                ops: vec![Operation('1')],
            }])
            .unwrap(),
        );
        let mut ring = Ring::new(4).unwrap();
        bind_coordinator(&mut ring);
        let mut coordinator = Coordinator::new(catalog.clone(), vec![1], 3).unwrap();

        let profile = RobotProfile::new(
            AgentId(1),
            vec![Operation('1')],
            vec![ProductKind(1)],
            vec![ProductKind(1)],
        )
        .unwrap();
        ring.bind(1, Occupant::Robot(AgentId(1))).unwrap();
        let mut robot = Robot::new(profile, 1, catalog);

        // Tick 1: the coordinator injects the only component at the outlet.
        ring.rotate();
        let outcome = coordinator.on_tick(&mut ring);
        assert_eq!(outcome.distributed, Some(ProductKind(1)));
        assert_eq!(robot.on_tick(&mut ring), RobotAction::Idle);

        // Ticks 2-3: the component travels 0 → 3 → 2.
        for _ in 0..2 {
            tick(&mut ring, &mut coordinator, std::slice::from_mut(&mut robot));
        }
        assert!(matches!(*ring.slot(1), SlotContent::Empty));

        // Tick 4: 2 → 1; the robot absorbs it, and since the recipe needs
        // exactly one component and the primary op matches the single
        // operation, the product completes at assembly.
        ring.rotate();
        coordinator.on_tick(&mut ring);
        assert_eq!(
            robot.on_tick(&mut ring),
            RobotAction::Assembled {
                kind: ProductKind(1),
                operated: true
            }
        );
        assert!(robot
            .held_product(ProductKind(1))
            .unwrap()
            .stage
            .is_complete());

        // Tick 5: the robot places the finished product.
        ring.rotate();
        coordinator.on_tick(&mut ring);
        assert_eq!(
            robot.on_tick(&mut ring),
            RobotAction::PlacedProduct {
                kind: ProductKind(1)
            }
        );
        assert!(matches!(*ring.slot(1), SlotContent::Product(_)));

        // Ticks 6-7: 1 → 0 → inlet; the coordinator drains it.
        tick(&mut ring, &mut coordinator, std::slice::from_mut(&mut robot));
        assert_eq!(coordinator.completed(ProductKind(1)), 0);
        tick(&mut ring, &mut coordinator, std::slice::from_mut(&mut robot));
        assert_eq!(coordinator.completed(ProductKind(1)), 1);
    }

    /// Components are conserved per kind across hundreds of ticks of the
    /// full reference line: whatever is not still in coordinator stock is
    /// on the ring, inside a robot, or booked as completed production.
    #[test]
    fn conservation_holds_across_the_reference_run() {
        let config = ScenarioConfig::default();
        let catalog = Arc::new(config.catalog().unwrap());
        let planned = config.planned_units();
        let initial: Vec<u32> = catalog
            .iter()
            .zip(planned.iter())
            .map(|(recipe, units)| units * recipe.components_required)
            .collect();

        let mut ring = Ring::new(config.simulation.ring_slots).unwrap();
        bind_coordinator(&mut ring);
        let mut coordinator =
            Coordinator::new(catalog.clone(), planned, config.simulation.empty_slack).unwrap();

        let mut robots: Vec<Robot> = config
            .robot_profiles()
            .unwrap()
            .into_iter()
            .map(|profile| {
                let position = assign_position(&ring, config.simulation.max_robots).unwrap();
                ring.bind(position, Occupant::Robot(profile.id)).unwrap();
                Robot::new(profile, position, catalog.clone())
            })
            .collect();

        for _ in 0..400 {
            tick(&mut ring, &mut coordinator, &mut robots);

            for recipe in catalog.iter() {
                let kind = recipe.kind;
                let required = recipe.components_required;

                let mut on_ring = 0u32;
                for position in 0..ring.len() {
                    match *ring.slot(position) {
                        SlotContent::Component(c) if c.kind == kind => on_ring += 1,
                        SlotContent::Product(p) if p.kind == kind => on_ring += required,
                        _ => {}
                    }
                }
                let in_robots: u32 = robots.iter().map(|r| r.absorbed_components(kind)).sum();
                let consumed = coordinator.completed(kind) * required;
                let in_stock = coordinator.remaining_stock(kind);

                assert_eq!(
                    on_ring + in_robots + consumed + in_stock,
                    initial[kind.index()],
                    "conservation violated for {kind}"
                );
            }
        }

        // The homogeneous all-kinds fleet should actually produce something
        // in 400 ticks; a silent deadlock here would make the property vacuous.
        let total_completed: u32 = catalog.iter().map(|r| coordinator.completed(r.kind)).sum();
        assert!(total_completed > 0, "line produced nothing in 400 ticks");
    }
}
