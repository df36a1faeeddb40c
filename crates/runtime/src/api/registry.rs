//! Provider registry for routing turns to decision providers.
//!
//! Resolution order for an acting combatant:
//! 1. Combatant binding
//! 2. Side binding
//! 3. Default provider

use std::collections::HashMap;
use std::sync::Arc;

use battle_core::{CombatantId, Side};

use super::{DecisionProvider, PassProvider};

pub struct ProviderRegistry {
    /// Uses Arc so a provider can be awaited without borrowing the registry.
    default: Arc<dyn DecisionProvider>,
    sides: HashMap<Side, Arc<dyn DecisionProvider>>,
    combatants: HashMap<CombatantId, Arc<dyn DecisionProvider>>,
}

impl ProviderRegistry {
    /// Create a registry that passes for everyone.
    pub fn new() -> Self {
        Self::with_default(PassProvider)
    }

    pub fn with_default(provider: impl DecisionProvider + 'static) -> Self {
        Self {
            default: Arc::new(provider),
            sides: HashMap::new(),
            combatants: HashMap::new(),
        }
    }

    /// Route every member of `side` to `provider` unless bound individually.
    pub fn bind_side(&mut self, side: Side, provider: impl DecisionProvider + 'static) {
        self.sides.insert(side, Arc::new(provider));
    }

    pub fn bind_combatant(
        &mut self,
        combatant: CombatantId,
        provider: impl DecisionProvider + 'static,
    ) {
        self.combatants.insert(combatant, Arc::new(provider));
    }

    /// Share one provider instance between several bindings.
    pub fn bind_shared(&mut self, combatant: CombatantId, provider: Arc<dyn DecisionProvider>) {
        self.combatants.insert(combatant, provider);
    }

    /// Returns the previous binding, if any.
    pub fn unbind_combatant(
        &mut self,
        combatant: CombatantId,
    ) -> Option<Arc<dyn DecisionProvider>> {
        self.combatants.remove(&combatant)
    }

    pub fn provider_for(&self, combatant: CombatantId, side: Side) -> Arc<dyn DecisionProvider> {
        self.combatants
            .get(&combatant)
            .or_else(|| self.sides.get(&side))
            .unwrap_or(&self.default)
            .clone()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
