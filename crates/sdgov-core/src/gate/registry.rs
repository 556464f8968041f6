//! Gate definitions and the lookup registry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::error::GateError;
use crate::work::Phase;

/// One weighted rule within a gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule name; also the key into the check registry.
    pub name: String,

    /// Aggregation weight. Must be positive.
    pub weight: f64,

    /// Whether a failure of this rule alone forces a `Fail` verdict.
    #[serde(default)]
    pub required: bool,
}

/// A named quality checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDefinition {
    /// Gate identifier.
    pub id: String,

    /// Phases this gate guards. An advance out of a bound phase requires
    /// the latest result of this gate to be a pass. Unbound gates are
    /// runnable but never gate advancement.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bound_phases: Vec<Phase>,

    /// Ordered rule set.
    pub rules: Vec<Rule>,
}

impl GateDefinition {
    /// Sum of all rule weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.rules.iter().map(|r| r.weight).sum()
    }
}

/// Read-only lookup of configured gates.
#[derive(Debug, Clone, Default)]
pub struct GateRegistry {
    gates: HashMap<String, GateDefinition>,
}

impl GateRegistry {
    /// Builds a registry from gate definitions.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidDefinition`] for a duplicate gate id,
    /// a gate with no rules, a non-positive rule weight, or a duplicate
    /// rule name within one gate. These are deployment defects caught at
    /// load time.
    pub fn new(definitions: Vec<GateDefinition>) -> Result<Self, GateError> {
        let mut gates = HashMap::with_capacity(definitions.len());
        for def in definitions {
            if def.rules.is_empty() {
                return Err(GateError::InvalidDefinition {
                    gate_id: def.id,
                    reason: "gate has no rules".to_string(),
                });
            }
            let mut seen = std::collections::HashSet::new();
            for rule in &def.rules {
                if !(rule.weight > 0.0 && rule.weight.is_finite()) {
                    return Err(GateError::InvalidDefinition {
                        gate_id: def.id.clone(),
                        reason: format!("rule '{}' has non-positive weight", rule.name),
                    });
                }
                if !seen.insert(rule.name.as_str()) {
                    return Err(GateError::InvalidDefinition {
                        gate_id: def.id.clone(),
                        reason: format!("duplicate rule name '{}'", rule.name),
                    });
                }
            }
            if gates.insert(def.id.clone(), def.clone()).is_some() {
                return Err(GateError::InvalidDefinition {
                    gate_id: def.id,
                    reason: "duplicate gate id".to_string(),
                });
            }
        }
        Ok(Self { gates })
    }

    /// Looks up a gate by id.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnknownGate`] if no gate with this id is
    /// configured.
    pub fn get(&self, gate_id: &str) -> Result<&GateDefinition, GateError> {
        self.gates.get(gate_id).ok_or_else(|| GateError::UnknownGate {
            gate_id: gate_id.to_string(),
        })
    }

    /// Gates bound to the given phase.
    pub fn bound_to(&self, phase: Phase) -> impl Iterator<Item = &GateDefinition> {
        self.gates
            .values()
            .filter(move |def| def.bound_phases.contains(&phase))
    }

    /// Number of configured gates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}
