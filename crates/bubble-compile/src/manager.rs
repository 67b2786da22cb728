//! Pass manager for orchestrating compilation.

use tracing::{debug, info, instrument};

use bubble_ir::CircuitDag;

use crate::error::CompileResult;
use crate::pass::Pass;
use crate::passes::agnostic::clifford::CliffordConfig;
use crate::passes::{CliffordReduction, CliffordSimp, IntegrityVerification, Optimize1qGates};
use crate::property::PropertySet;

/// Manages and executes a sequence of compilation passes.
pub struct PassManager {
    /// The passes to execute, in order.
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self { passes: vec![] }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes on the given DAG.
    #[instrument(skip(self, dag, properties))]
    pub fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on circuit with {} qubits",
            self.passes.len(),
            dag.num_qubits()
        );

        for pass in &self.passes {
            if pass.should_run(dag, properties) {
                debug!("Running {:?} pass: {}", pass.kind(), pass.name());
                pass.run(dag, properties)?;
                debug!("Pass {} completed, ops: {}", pass.name(), dag.num_ops());
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }

        info!(
            "Pass manager completed, final depth: {}, ops: {}",
            dag.depth()?,
            dag.num_ops()
        );

        Ok(())
    }

    /// Names of the scheduled passes, in order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating pass managers with preset configurations.
pub struct PassManagerBuilder {
    /// Optimization level (0-3).
    optimization_level: u8,
    /// Options for the Clifford passes.
    clifford: CliffordConfig,
    /// Initial properties.
    properties: PropertySet,
}

impl PassManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            optimization_level: 1,
            clifford: CliffordConfig::default(),
            properties: PropertySet::new(),
        }
    }

    /// Set the optimization level.
    ///
    /// - Level 0: No passes
    /// - Level 1: Single-qubit fusion (default)
    /// - Level 2: + Clifford reduction
    /// - Level 3: + Clifford simp with non-Clifford squashing
    #[must_use]
    pub fn with_optimization_level(mut self, level: u8) -> Self {
        self.optimization_level = level.min(3);
        self
    }

    /// Set the options of the Clifford passes.
    #[must_use]
    pub fn with_clifford_config(mut self, config: CliffordConfig) -> Self {
        self.clifford = config;
        self
    }

    /// Set the initial properties.
    #[must_use]
    pub fn with_properties(mut self, properties: PropertySet) -> Self {
        self.properties = properties;
        self
    }

    /// Build the pass manager and return it with the properties.
    pub fn build(self) -> (PassManager, PropertySet) {
        let mut pm = PassManager::new();

        if self.optimization_level >= 1 {
            pm.add_pass(Optimize1qGates::new());
        }

        match self.optimization_level {
            2 => pm.add_pass(CliffordReduction::with_config(self.clifford)),
            3 => pm.add_pass(CliffordSimp::with_config(self.clifford)),
            _ => {}
        }

        // Verify the rewritten DAG as the final pass.
        if self.optimization_level >= 1 {
            pm.add_pass(IntegrityVerification::new());
        }

        (pm, self.properties)
    }
}

impl Default for PassManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::agnostic::clifford::{CliffordReport, InteractionGate};
    use crate::passes::VerificationResult;
    use bubble_ir::{Circuit, QubitId};

    #[test]
    fn test_empty_pass_manager() {
        let pm = PassManager::new();
        assert!(pm.is_empty());
        assert_eq!(pm.len(), 0);
    }

    #[test]
    fn test_pass_manager_run() {
        let pm = PassManager::new();
        let mut props = PropertySet::new();

        let mut circuit = Circuit::with_size("test", 2, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();

        let mut dag = circuit.into_dag();
        pm.run(&mut dag, &mut props).unwrap();

        assert_eq!(dag.num_ops(), 2);
    }

    #[test]
    fn test_pass_manager_builder_levels() {
        let (pm, _) = PassManagerBuilder::new().with_optimization_level(0).build();
        assert!(pm.is_empty());

        let (pm, _) = PassManagerBuilder::new().build();
        assert_eq!(pm.pass_names(), ["Optimize1qGates", "integrity_verification"]);

        let (pm, _) = PassManagerBuilder::new().with_optimization_level(2).build();
        assert_eq!(
            pm.pass_names(),
            ["Optimize1qGates", "CliffordReduction", "integrity_verification"]
        );

        let (pm, _) = PassManagerBuilder::new().with_optimization_level(7).build();
        assert_eq!(
            pm.pass_names(),
            ["Optimize1qGates", "CliffordSimp", "integrity_verification"]
        );
    }

    #[test]
    fn test_pass_manager_runs_clifford_reduction() {
        let config = CliffordConfig::default().with_interaction_gate(InteractionGate::Cx);
        let (pm, mut props) = PassManagerBuilder::new()
            .with_optimization_level(2)
            .with_clifford_config(config)
            .build();

        let mut circuit = Circuit::with_size("pair", 2, 0);
        circuit
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .s(QubitId(1))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap();
        let mut dag = circuit.into_dag();
        pm.run(&mut dag, &mut props).unwrap();

        let report = props.get::<CliffordReport>().unwrap();
        assert!(report.changed);
        assert_eq!(report.replacements, 1);
        assert!(props.get::<VerificationResult>().unwrap().passed);
        assert!(props.permutation().unwrap().is_identity());
    }
}
