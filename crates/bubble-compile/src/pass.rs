//! The interface every scheduled pass implements.

use bubble_ir::CircuitDag;

use crate::error::CompileResult;
use crate::property::PropertySet;

/// Whether a pass may rewrite the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Leaves the DAG as it found it. Results go to the property set.
    Analysis,
    /// Rewrites the DAG in place.
    Transformation,
}

/// One step of a [`PassManager`](crate::PassManager) schedule.
///
/// A pass gets the DAG and the shared [`PropertySet`]. Reductions that
/// permute the outputs record the permutation there, so later passes and
/// the caller can undo the relabelling.
pub trait Pass: Send + Sync {
    /// Name used in logs and in [`PassManager::pass_names`](crate::PassManager::pass_names).
    fn name(&self) -> &str;

    fn kind(&self) -> PassKind;

    fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()>;

    /// Cheap precheck; the manager skips the pass when this is false.
    fn should_run(&self, _dag: &CircuitDag, _properties: &PropertySet) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountOps;

    impl Pass for CountOps {
        fn name(&self) -> &'static str {
            "count_ops"
        }

        fn kind(&self) -> PassKind {
            PassKind::Analysis
        }

        fn run(&self, dag: &mut CircuitDag, properties: &mut PropertySet) -> CompileResult<()> {
            properties.insert(dag.num_ops());
            Ok(())
        }
    }

    #[test]
    fn test_analysis_pass_publishes_through_properties() {
        let pass = CountOps;
        let mut dag = CircuitDag::new();
        let mut props = PropertySet::new();

        assert_eq!(pass.kind(), PassKind::Analysis);
        assert!(pass.should_run(&dag, &props));
        pass.run(&mut dag, &mut props).unwrap();
        assert_eq!(props.get::<usize>(), Some(&0));
    }
}
