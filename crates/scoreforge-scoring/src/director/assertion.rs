// Score and shadow variable corruption checks.

use scoreforge_core::domain::{SnapshotFilter, VariableSnapshot, WorkingSolution};
use scoreforge_core::{InnerScore, Result, Score, ScoreForgeError};
use tracing::{trace, warn};

use super::inner::{require, InnerScoreDirector};
use crate::api::ConstraintMatchPolicy;
use crate::corruption::{
    build_score_corruption_analysis, build_shadow_variable_analysis, describe_shadow_violations,
    score_difference,
};
use crate::moves::Move;

impl<Sc: Score> InnerScoreDirector<Sc> {
    /// Recalculates the score and compares it to `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::ScoreCorruption`] on a mismatch.
    pub fn assert_expected_working_score(
        &mut self,
        expected: InnerScore<Sc>,
        completed_action: &str,
    ) -> Result<()> {
        let working = self.calculate_score()?;
        if working != expected {
            let difference = score_difference(expected, working);
            warn!(event = "score_corruption", %difference, action = completed_action);
            return Err(ScoreForgeError::ScoreCorruption(format!(
                "Score corruption ({}): the expectedWorkingScore ({}) is not the workingScore ({}) after completedAction ({}).",
                difference, expected, working, completed_action
            )));
        }
        Ok(())
    }

    /// Forces every shadow variable to be recomputed and checks that none
    /// changed and that the score stayed `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::VariableCorruption`] when a shadow value
    /// was stale, or when the score changed anyway.
    pub fn assert_shadow_variables_are_not_stale(
        &mut self,
        expected: InnerScore<Sc>,
        completed_action: &str,
    ) -> Result<()> {
        if let Some(violation) = self.create_shadow_variables_violation_message()? {
            warn!(event = "shadow_variable_corruption", action = completed_action);
            return Err(ScoreForgeError::VariableCorruption(format!(
                "Shadow variable corruption after completedAction ({}):\n{}",
                completed_action, violation
            )));
        }
        let working = self.calculate_score()?;
        if working != expected {
            self.assert_working_score_from_scratch(working, completed_action)?;
            return Err(ScoreForgeError::VariableCorruption(format!(
                "Impossible shadow variable corruption ({}): the expectedWorkingScore ({}) is not the workingScore ({}) after all shadow variables were recomputed without changes to the genuine variables after completedAction ({}).\nBut all the shadow variable values are still the same, so this is impossible.\nMaybe run with the tracked full assert environment mode to fail earlier.",
                score_difference(expected, working),
                expected,
                working,
                completed_action
            )));
        }
        Ok(())
    }

    // Snapshots the shadow variables, forces a full recomputation and
    // reports whatever moved.
    fn create_shadow_variables_violation_message(&mut self) -> Result<Option<String>> {
        let before = VariableSnapshot::capture(
            &self.descriptor,
            require(&self.working_solution)?,
            SnapshotFilter::Shadow,
        );
        self.force_trigger_variable_listeners()?;
        let after = VariableSnapshot::capture(
            &self.descriptor,
            require(&self.working_solution)?,
            SnapshotFilter::Shadow,
        );
        Ok(describe_shadow_violations(&before.differences(&after)))
    }

    /// Compares the working score to a from-scratch calculation on a
    /// derived director.
    pub fn assert_working_score_from_scratch(
        &mut self,
        working_score: InnerScore<Sc>,
        completed_action: &str,
    ) -> Result<()> {
        self.assert_score_from_scratch(working_score, completed_action, false)
    }

    /// Like [`assert_working_score_from_scratch`](Self::assert_working_score_from_scratch),
    /// for a score predicted by another director, such as a move thread.
    pub fn assert_predicted_score_from_scratch(
        &mut self,
        predicted_score: InnerScore<Sc>,
        completed_action: &str,
    ) -> Result<()> {
        self.assert_score_from_scratch(predicted_score, completed_action, true)
    }

    fn assert_score_from_scratch(
        &mut self,
        score: InnerScore<Sc>,
        completed_action: &str,
        predicted: bool,
    ) -> Result<()> {
        let factory = self.factory.assertion_factory();
        let solution = require(&self.working_solution)?.clone();
        factory.with_assertion_score_director(false, ConstraintMatchPolicy::Enabled, |uncorrupted| {
            uncorrupted.set_working_solution(solution)?;
            let uncorrupted_score = uncorrupted.calculate_score()?;
            if score == uncorrupted_score {
                return Ok(());
            }
            let working_matches = if self.constraint_match_policy.is_enabled() {
                Some(self.constraint_match_map()?)
            } else {
                None
            };
            let uncorrupted_matches = uncorrupted.constraint_match_map()?;
            let analysis = build_score_corruption_analysis(
                working_matches.as_ref(),
                self.constraint_match_policy,
                Some(&uncorrupted_matches),
                uncorrupted.constraint_match_policy(),
                predicted,
                &self.to_string(),
            );
            let violation = self.create_shadow_variables_violation_message()?;
            let shadow_analysis = build_shadow_variable_analysis(violation.as_deref(), predicted);
            let difference = score_difference(score, uncorrupted_score);
            warn!(event = "score_corruption", %difference, action = completed_action, predicted);
            Err(ScoreForgeError::ScoreCorruption(format!(
                "Score corruption ({}): the {} ({}) is not the uncorruptedScore ({}) after completedAction ({}):\n{}\n{}",
                difference,
                if predicted { "predictedScore" } else { "workingScore" },
                score,
                uncorrupted_score,
                completed_action,
                analysis,
                shadow_analysis
            )))
        })
    }

    /// Checks that undoing `mv` restored `before_move_score`.
    ///
    /// On a mismatch the working score is first checked from scratch and
    /// for stale shadows, so a plain score or shadow corruption is reported
    /// as such. Otherwise the undo itself is at fault.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::UndoScoreCorruption`], carrying the
    /// tracked solutions when working solution tracking is on.
    pub fn assert_expected_undo_move_score(
        &mut self,
        mv: &dyn Move<Sc>,
        before_move_score: InnerScore<Sc>,
        execution_point: &str,
    ) -> Result<()> {
        let undo_score = self.calculate_score()?;
        if undo_score == before_move_score {
            return Ok(());
        }
        trace!("Corruption detected. Diagnosing...");
        self.track_after_undo();
        let undo_move_text = self
            .undo_move_text
            .clone()
            .unwrap_or_else(|| format!("Undo({})", mv));
        self.assert_working_score_from_scratch(undo_score, &undo_move_text)?;
        self.assert_shadow_variables_are_not_stale(undo_score, &undo_move_text)?;

        let diagnosis = self.diagnose_undo_corruption()?;
        let difference = score_difference(before_move_score, undo_score);
        let message = format!(
            "UndoMove corruption ({}):\n   the beforeMoveScore ({}) is not the undoScore ({}),\n   which is the uncorruptedScore ({}) of the workingSolution.\n\nCorruption diagnosis:\n{}\n\n1) Enable the tracked full assert environment mode (if you haven't already)\n   to fail faster in case of a score corruption or shadow variable corruption.\n   Let the solver run until it reaches the same point in its lifecycle ({}),\n   even though it may take a very long time.\n   If the solver fails before reaching that point,\n   there may be yet another problem that needs to be fixed.\n\n2) If you use custom moves, check the undo of the custom move class ({}).\n   The move ({}) might have a corrupted undoMove ({}).\n\n3) If you use custom shadow variables, check them for shadow variables that are used by score constraints\n   that could cause the scoreDifference ({}).",
            difference,
            before_move_score,
            undo_score,
            undo_score,
            diagnosis,
            execution_point,
            mv.type_name(),
            mv,
            undo_move_text,
            difference
        );
        warn!(event = "undo_score_corruption", %difference, execution_point);
        let solutions = self
            .tracker
            .as_ref()
            .and_then(|tracker| tracker.corruption_solutions())
            .map(Box::new);
        Err(ScoreForgeError::UndoScoreCorruption { message, solutions })
    }

    // Adds the from-scratch points to the tracker and renders its diff.
    fn diagnose_undo_corruption(&mut self) -> Result<String> {
        let Some(tracker) = self.tracker.as_ref() else {
            return Ok(
                "  Enable working solution tracking for a variable-level diagnosis.".to_string(),
            );
        };
        let before_from_scratch = match tracker.before_move_solution() {
            Some(before) => Some(self.shadows_from_scratch(before)?),
            None => None,
        };
        let undo_from_scratch = self.shadows_from_scratch(require(&self.working_solution)?)?;
        let Some(tracker) = self.tracker.as_mut() else {
            return Ok(String::new());
        };
        if let Some(before) = &before_from_scratch {
            tracker.set_before_from_scratch_solution(&self.descriptor, before);
        }
        tracker.set_undo_from_scratch_solution(&self.descriptor, &undo_from_scratch);
        let diagnosis = tracker.build_score_corruption_message();
        if diagnosis.is_empty() {
            return Ok(
                "  No variable differences were found between the tracked solutions.".to_string(),
            );
        }
        Ok(diagnosis)
    }

    // A copy of `solution` with every shadow recomputed by a fresh engine.
    fn shadows_from_scratch(&self, solution: &WorkingSolution) -> Result<WorkingSolution> {
        let mut copy = solution.clone();
        let mut engine = self.factory.new_shadow_propagation();
        engine.reset_working_solution(&copy);
        for update in engine.force_trigger_all(&copy)? {
            copy.set_value(update.entity, update.variable.ordinal, update.value)?;
        }
        engine.close();
        Ok(copy)
    }
}
