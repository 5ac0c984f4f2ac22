//! The robot decision state machine.
//!
//! On every tick a robot inspects the slot at its bound position and takes
//! exactly one action: absorb a component, operate on a product, or place
//! something it is holding. Every branch is total — "not eligible" is a
//! normal outcome, never an error — and the slot is mutated at most once
//! per tick.
//!
//! All methods here run under the caller's ring lock; the robot's own
//! inventory is thread-private and needs no synchronization.

use std::sync::Arc;

use tracing::debug;

use carousel_contracts::item::{Component, Product, ProductKind, ProductStage, SlotContent};
use carousel_contracts::recipe::{RecipeCatalog, COMPONENT_CAP};
use carousel_contracts::robot::{AgentId, Mode, RobotProfile};
use carousel_ring::Ring;

/// What a robot did on one tick. Returned for logging and the journal;
/// `Idle` covers every not-eligible combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RobotAction {
    Idle,
    /// Absorbed a component without reaching the recipe's required count.
    TookComponent { kind: ProductKind },
    /// Absorbed the last required component and assembled a product.
    /// `operated` is true when the robot's primary op matched the recipe's
    /// first op and was performed immediately.
    Assembled { kind: ProductKind, operated: bool },
    /// Picked up an in-progress product and performed its next operation.
    Operated { kind: ProductKind, completed: bool },
    /// Put a stranded component back on an otherwise idle ring.
    ReleasedComponent { kind: ProductKind },
    /// Placed a held product back on the ring.
    PlacedProduct { kind: ProductKind },
}

/// One worker on the line: a capability profile, a bound position, and
/// private per-kind inventory.
pub struct Robot {
    profile: RobotProfile,
    mode: Mode,
    position: usize,
    catalog: Arc<RecipeCatalog>,
    /// Components held per kind; reset to zero when a product is assembled.
    held_components: Vec<u32>,
    /// At most one held product per kind awaiting placement.
    held_products: Vec<Option<Product>>,
    /// Round-robin cursor over kinds for product placement.
    place_cursor: usize,
}

impl Robot {
    pub fn new(profile: RobotProfile, position: usize, catalog: Arc<RecipeCatalog>) -> Self {
        let kinds = catalog.kind_count();
        Self {
            profile,
            mode: Mode::Normal,
            position,
            catalog,
            held_components: vec![0; kinds],
            held_products: vec![None; kinds],
            place_cursor: 0,
        }
    }

    pub fn id(&self) -> AgentId {
        self.profile.id
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Flip normal/degraded. Only the capability sets consulted by future
    /// decisions change; no ring or inventory state is touched.
    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
        debug!(robot = %self.profile.id, mode = %self.mode, "mode toggled");
    }

    pub fn held_components(&self, kind: ProductKind) -> u32 {
        self.held_components[kind.index()]
    }

    pub fn held_product(&self, kind: ProductKind) -> Option<&Product> {
        self.held_products[kind.index()].as_ref()
    }

    /// Total components currently inside this robot (held loose plus those
    /// absorbed into held products). Used by the conservation property.
    pub fn absorbed_components(&self, kind: ProductKind) -> u32 {
        let index = kind.index();
        let in_products = match self.held_products[index] {
            Some(_) => self
                .catalog
                .get(kind)
                .map(|r| r.components_required)
                .unwrap_or(0),
            None => 0,
        };
        self.held_components[index] + in_products
    }

    /// React to one tick. Runs entirely under the caller's ring lock.
    pub fn on_tick(&mut self, ring: &mut Ring) -> RobotAction {
        let action = match *ring.slot(self.position) {
            SlotContent::Component(component) => self.react_to_component(ring, component),
            SlotContent::Product(product) => self.react_to_product(ring, product),
            SlotContent::Empty => self.react_to_empty(ring),
        };
        if action != RobotAction::Idle {
            debug!(robot = %self.profile.id, position = self.position, ?action, "tick reaction");
        }
        action
    }

    // ── Component branch ─────────────────────────────────────────────────

    fn can_take_component(&self, kind: ProductKind) -> bool {
        let Ok(recipe) = self.catalog.get(kind) else {
            return false;
        };
        if !self.profile.accepts(kind, self.mode) {
            return false;
        }
        let held = self.held_components[kind.index()];
        if held >= COMPONENT_CAP {
            return false;
        }
        // Back-pressure: the pickup that would assemble a product is only
        // allowed while no finished instance of that kind awaits placement.
        if held + 1 == recipe.components_required {
            return self.held_products[kind.index()].is_none();
        }
        true
    }

    fn react_to_component(&mut self, ring: &mut Ring, component: Component) -> RobotAction {
        let kind = component.kind;
        if !self.can_take_component(kind) {
            return RobotAction::Idle;
        }
        // Eligibility implies the recipe exists.
        let Ok(recipe) = self.catalog.get(kind) else {
            return RobotAction::Idle;
        };

        *ring.slot_mut(self.position) = SlotContent::Empty;
        let index = kind.index();
        self.held_components[index] += 1;

        if self.held_components[index] < recipe.components_required {
            return RobotAction::TookComponent { kind };
        }

        // Required count reached: the batch becomes a product.
        self.held_components[index] = 0;
        let mut product = Product::new(kind);
        let operated = self.profile.primary_op() == recipe.first_op();
        if operated {
            product.advance(recipe);
        }
        self.held_products[index] = Some(product);
        RobotAction::Assembled { kind, operated }
    }

    // ── Product branch ───────────────────────────────────────────────────

    fn can_take_product(&self, product: &Product) -> bool {
        let ProductStage::InProgress(_) = product.stage else {
            return false;
        };
        let kind = product.kind;
        if self.held_products[kind.index()].is_some() {
            return false;
        }
        if !self.profile.accepts(kind, self.mode) {
            return false;
        }
        let Ok(recipe) = self.catalog.get(kind) else {
            return false;
        };
        let Some(next_op) = product.next_operation(recipe) else {
            return false;
        };
        match self.mode {
            Mode::Normal => self.profile.primary_op() == next_op,
            Mode::Degraded => self.profile.covers_op(next_op),
        }
    }

    fn react_to_product(&mut self, ring: &mut Ring, mut product: Product) -> RobotAction {
        if !self.can_take_product(&product) {
            return RobotAction::Idle;
        }
        let Ok(recipe) = self.catalog.get(product.kind) else {
            return RobotAction::Idle;
        };

        *ring.slot_mut(self.position) = SlotContent::Empty;
        let completed = product.advance(recipe);
        let kind = product.kind;
        self.held_products[kind.index()] = Some(product);
        RobotAction::Operated { kind, completed }
    }

    // ── Empty branch ─────────────────────────────────────────────────────

    /// A held batch that can never complete on its own: one component of a
    /// multi-component recipe, or two of a three-component recipe. Only
    /// relevant when the whole ring has gone idle.
    fn stranded_kind(&self) -> Option<ProductKind> {
        for (index, &held) in self.held_components.iter().enumerate() {
            let kind = ProductKind::from_index(index);
            let Ok(recipe) = self.catalog.get(kind) else {
                continue;
            };
            let required = recipe.components_required;
            if (held == 1 && required > 1) || (held == 2 && required == 3) {
                return Some(kind);
            }
        }
        None
    }

    fn react_to_empty(&mut self, ring: &mut Ring) -> RobotAction {
        // Stranded-component relief: only when every slot is empty, put one
        // component back so another robot can finish the batch.
        if ring.empty_slots() == ring.len() {
            if let Some(kind) = self.stranded_kind() {
                *ring.slot_mut(self.position) = SlotContent::Component(Component { kind });
                self.held_components[kind.index()] -= 1;
                return RobotAction::ReleasedComponent { kind };
            }
        }

        // Place one held product, round-robin over kinds.
        let kinds = self.held_products.len();
        for offset in 0..kinds {
            let index = (self.place_cursor + offset) % kinds;
            if let Some(product) = self.held_products[index].take() {
                let kind = product.kind;
                *ring.slot_mut(self.position) = SlotContent::Product(product);
                self.place_cursor = (index + 1) % kinds;
                return RobotAction::PlacedProduct { kind };
            }
        }
        RobotAction::Idle
    }
}
