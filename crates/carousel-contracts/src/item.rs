//! Items that travel on the ring: components, products, and slot contents.
//!
//! A slot holds exactly one of Empty / Component / Product. Components are
//! immutable values consumed on pickup; a product carries the only mutable
//! cursor in the data model — its production stage.

use serde::{Deserialize, Serialize};

use crate::recipe::Recipe;

/// Identifies one of the K product kinds (`1..=K`).
///
/// A component of kind `k` is raw material for a product of kind `k`;
/// the kind doubles as the index into every per-kind counter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductKind(pub u8);

impl ProductKind {
    /// Zero-based index for per-kind tables (`kind 1` → `0`).
    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Inverse of [`ProductKind::index`].
    pub fn from_index(index: usize) -> Self {
        Self(index as u8 + 1)
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A single operation code (`'1'..='6'` in the standard catalog).
///
/// Each robot performs one *primary* operation and may cover more in
/// degraded mode; each recipe is an ordered sequence of these codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation(pub char);

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Op{}", self.0)
    }
}

/// A raw component awaiting pickup. Consumed when a robot absorbs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub kind: ProductKind,
}

/// Where a product stands in its recipe's operation sequence.
///
/// `InProgress(i)` means `ops[i]` is the next required operation.
/// `Complete` is terminal: a completed product is never operated on again,
/// only drained by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStage {
    InProgress(usize),
    Complete,
}

impl ProductStage {
    pub fn is_complete(self) -> bool {
        matches!(self, ProductStage::Complete)
    }
}

/// An in-progress or finished product travelling on the ring (or held by a
/// robot awaiting placement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub kind: ProductKind,
    pub stage: ProductStage,
}

impl Product {
    /// A freshly assembled product: all components absorbed, no operation
    /// performed yet.
    pub fn new(kind: ProductKind) -> Self {
        Self {
            kind,
            stage: ProductStage::InProgress(0),
        }
    }

    /// The next operation this product requires, or `None` once complete.
    pub fn next_operation(&self, recipe: &Recipe) -> Option<Operation> {
        match self.stage {
            ProductStage::InProgress(i) => recipe.ops.get(i).copied(),
            ProductStage::Complete => None,
        }
    }

    /// Perform the pending operation: advance the cursor by one and mark the
    /// product complete when the cursor reaches the end of the recipe.
    ///
    /// Returns `true` if the product is complete after this operation.
    /// Calling this on an already-complete product is a no-op; the stage
    /// cursor never moves backwards.
    pub fn advance(&mut self, recipe: &Recipe) -> bool {
        if let ProductStage::InProgress(i) = self.stage {
            let next = i + 1;
            self.stage = if next >= recipe.ops.len() {
                ProductStage::Complete
            } else {
                ProductStage::InProgress(next)
            };
        }
        self.stage.is_complete()
    }
}

impl std::fmt::Display for Product {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.stage {
            ProductStage::Complete => write!(f, "P{} complete", self.kind.0),
            ProductStage::InProgress(i) => write!(f, "P{} at step {}", self.kind.0, i),
        }
    }
}

/// The tagged contents of one ring slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotContent {
    Empty,
    Component(Component),
    Product(Product),
}

impl SlotContent {
    pub fn is_empty(&self) -> bool {
        matches!(self, SlotContent::Empty)
    }
}

impl Default for SlotContent {
    fn default() -> Self {
        SlotContent::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::RecipeCatalog;

    #[test]
    fn kind_index_round_trips() {
        for raw in 1..=4u8 {
            let kind = ProductKind(raw);
            assert_eq!(ProductKind::from_index(kind.index()), kind);
        }
    }

    #[test]
    fn advance_walks_recipe_then_completes() {
        let catalog = RecipeCatalog::standard();
        let kind = ProductKind(4); // ops "461"
        let recipe = catalog.get(kind).unwrap();

        let mut product = Product::new(kind);
        assert_eq!(product.next_operation(recipe), Some(Operation('4')));

        assert!(!product.advance(recipe));
        assert_eq!(product.next_operation(recipe), Some(Operation('6')));

        assert!(!product.advance(recipe));
        assert_eq!(product.next_operation(recipe), Some(Operation('1')));

        assert!(product.advance(recipe));
        assert!(product.stage.is_complete());
        assert_eq!(product.next_operation(recipe), None);
    }

    #[test]
    fn advance_is_idempotent_once_complete() {
        let catalog = RecipeCatalog::standard();
        let kind = ProductKind(3); // 1 component, ops "13513"
        let recipe = catalog.get(kind).unwrap();

        let mut product = Product {
            kind,
            stage: ProductStage::Complete,
        };
        assert!(product.advance(recipe));
        assert!(product.stage.is_complete());
    }

    #[test]
    fn single_op_recipe_completes_on_first_advance() {
        let recipe = Recipe {
            kind: ProductKind(1),
            components_required: 1,
            ops: vec![Operation('1')],
        };
        let mut product = Product::new(ProductKind(1));
        assert!(product.advance(&recipe));
    }
}
