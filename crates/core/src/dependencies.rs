//! Dependency resolver: which migration units a pipeline refers to.
//!
//! A single structural walk over the typed step tree. Every destination,
//! every step of a multi-stage sequence and every id of a multi-target
//! reference is visited.

use std::collections::BTreeSet;

use crate::step::{MigrationRef, Pipeline, Process, TransformStep};

/// Visitor over a pipeline's step tree.
///
/// The default methods recurse; implementors override the hooks they care
/// about and call the `walk_*` helpers to keep descending.
pub trait StepVisitor {
    fn visit_pipeline(&mut self, pipeline: &Pipeline) {
        for (_, process) in pipeline.iter() {
            self.visit_process(process);
        }
    }

    fn visit_process(&mut self, process: &Process) {
        walk_process(self, process);
    }

    fn visit_step(&mut self, step: &TransformStep) {
        walk_step(self, step);
    }

    fn visit_migration(&mut self, _migration: &MigrationRef) {}
}

pub fn walk_process<V: StepVisitor + ?Sized>(visitor: &mut V, process: &Process) {
    match process {
        Process::Single(step) => visitor.visit_step(step),
        Process::Sequence(steps) => {
            for step in steps {
                visitor.visit_step(step);
            }
        }
    }
}

pub fn walk_step<V: StepVisitor + ?Sized>(visitor: &mut V, step: &TransformStep) {
    if let Some(migration) = step.migration() {
        visitor.visit_migration(migration);
    }
}

#[derive(Default)]
struct DependencyCollector {
    ids: BTreeSet<String>,
}

impl StepVisitor for DependencyCollector {
    fn visit_migration(&mut self, migration: &MigrationRef) {
        self.ids.extend(migration.ids().iter().cloned());
    }
}

/// Every unit id referenced anywhere in `pipeline`, deduplicated.
///
/// The result may contain the caller's own id; the planner strips it.
pub fn collect_dependencies(pipeline: &Pipeline) -> BTreeSet<String> {
    let mut collector = DependencyCollector::default();
    collector.visit_pipeline(pipeline);
    collector.ids
}
