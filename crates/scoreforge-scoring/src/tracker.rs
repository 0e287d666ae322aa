//! Four-point working solution tracking for undo corruption reports.
//!
//! The director records the solution before a move, after it, and after
//! its undo. On an undo score mismatch it adds from-scratch versions of the
//! "before" and "after undo" points, with every shadow recomputed, and the
//! tracker diffs the five snapshots into a readable diagnosis.

use std::fmt::Write;

use scoreforge_core::domain::{
    SnapshotFilter, SolutionDescriptor, VariableDifference, VariableSnapshot, WorkingSolution,
};
use scoreforge_core::error::UndoCorruptionSolutions;

/// Differences listed per section before the rest is summarized.
const DISPLAY_LIMIT: usize = 5;

#[derive(Debug, Clone)]
struct TrackedPoint {
    solution: WorkingSolution,
    variables: VariableSnapshot,
}

impl TrackedPoint {
    fn capture(descriptor: &SolutionDescriptor, solution: &WorkingSolution) -> Self {
        Self {
            solution: solution.shallow_copy(),
            variables: VariableSnapshot::capture(descriptor, solution, SnapshotFilter::All),
        }
    }
}

#[derive(Debug, Default)]
pub struct SolutionTracker {
    before_move: Option<TrackedPoint>,
    after_move: Option<TrackedPoint>,
    after_undo: Option<TrackedPoint>,
    before_from_scratch: Option<VariableSnapshot>,
    undo_from_scratch: Option<VariableSnapshot>,
}

impl SolutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_before_move_solution(
        &mut self,
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
    ) {
        self.before_move = Some(TrackedPoint::capture(descriptor, solution));
        self.after_move = None;
        self.after_undo = None;
        self.before_from_scratch = None;
        self.undo_from_scratch = None;
    }

    pub fn set_after_move_solution(
        &mut self,
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
    ) {
        self.after_move = Some(TrackedPoint::capture(descriptor, solution));
    }

    pub fn set_after_undo_solution(
        &mut self,
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
    ) {
        self.after_undo = Some(TrackedPoint::capture(descriptor, solution));
    }

    pub fn set_before_from_scratch_solution(
        &mut self,
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
    ) {
        self.before_from_scratch =
            Some(VariableSnapshot::capture(descriptor, solution, SnapshotFilter::All));
    }

    pub fn set_undo_from_scratch_solution(
        &mut self,
        descriptor: &SolutionDescriptor,
        solution: &WorkingSolution,
    ) {
        self.undo_from_scratch =
            Some(VariableSnapshot::capture(descriptor, solution, SnapshotFilter::All));
    }

    /// The solution as it was before the last tracked move.
    pub fn before_move_solution(&self) -> Option<&WorkingSolution> {
        self.before_move.as_ref().map(|p| &p.solution)
    }

    pub fn after_undo_solution(&self) -> Option<&WorkingSolution> {
        self.after_undo.as_ref().map(|p| &p.solution)
    }

    /// Copies of the three tracked points, once all three are recorded.
    pub fn corruption_solutions(&self) -> Option<UndoCorruptionSolutions> {
        match (&self.before_move, &self.after_move, &self.after_undo) {
            (Some(before), Some(after), Some(undo)) => Some(UndoCorruptionSolutions {
                before_move: before.solution.clone(),
                after_move: after.solution.clone(),
                after_undo: undo.solution.clone(),
            }),
            _ => None,
        }
    }

    /// Diagnosis of an undo corruption from the recorded snapshots.
    pub fn build_score_corruption_message(&self) -> String {
        let mut message = String::new();
        if let (Some(before), Some(undo)) = (&self.before_move, &self.after_undo) {
            append_section(
                &mut message,
                "Variables that are different between before and undo:",
                &before.variables.differences(&undo.variables),
            );
        }
        if let (Some(scratch), Some(before)) = (&self.before_from_scratch, &self.before_move) {
            append_section(
                &mut message,
                "Variables that are different between from scratch and before:",
                &scratch.differences(&before.variables),
            );
        }
        if let (Some(scratch), Some(undo)) = (&self.undo_from_scratch, &self.after_undo) {
            append_section(
                &mut message,
                "Variables that are different between from scratch and undo:",
                &scratch.differences(&undo.variables),
            );
        }
        message
    }
}

fn append_section(message: &mut String, title: &str, differences: &[VariableDifference]) {
    if differences.is_empty() {
        return;
    }
    let _ = writeln!(message, "{}", title);
    message.push_str(&format_list(differences));
}

/// `  - item` lines, capped at five with an overflow count. Empty for no items.
pub(crate) fn format_list<T: std::fmt::Display>(items: &[T]) -> String {
    let mut out = String::new();
    for item in items.iter().take(DISPLAY_LIMIT) {
        let _ = writeln!(out, "  - {}", item);
    }
    if items.len() > DISPLAY_LIMIT {
        let _ = writeln!(out, "  ...({} more)", items.len() - DISPLAY_LIMIT);
    }
    out
}
