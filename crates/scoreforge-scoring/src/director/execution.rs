// Move execution on the inner score director.

use scoreforge_core::{InnerScore, Result, Score};
use tracing::trace;

use super::ephemeral::EphemeralScoreDirector;
use super::inner::InnerScoreDirector;
use crate::moves::Move;

impl<Sc: Score> InnerScoreDirector<Sc> {
    /// Executes `mv` permanently and returns the new score.
    pub fn do_move(&mut self, mv: &dyn Move<Sc>) -> Result<InnerScore<Sc>> {
        mv.do_move(self)?;
        let score = self.calculate_score()?;
        trace!(event = "move_done", %mv, %score);
        Ok(score)
    }

    /// Executes `mv` in an undo-recording scope, calculates the score, hands
    /// it to `consumer`, and undoes the move.
    ///
    /// With `assert_move_score_from_scratch`, the score after the move is
    /// checked against a from-scratch calculation before the undo.
    ///
    /// The registered undo actions run on every exit path, so a move that
    /// fails halfway or a failed assertion leaves the solution as it was.
    /// The first error wins.
    pub fn do_and_process_move(
        &mut self,
        mv: &dyn Move<Sc>,
        assert_move_score_from_scratch: bool,
        consumer: Option<&mut dyn FnMut(InnerScore<Sc>)>,
    ) -> Result<InnerScore<Sc>> {
        self.track_before_move();
        let mut ephemeral = EphemeralScoreDirector::new(self);
        let processed =
            Self::process_move(&mut ephemeral, mv, assert_move_score_from_scratch, consumer);
        let undone = ephemeral.undo_changes();
        let score = processed?;
        undone?;
        Ok(score)
    }

    fn process_move(
        ephemeral: &mut EphemeralScoreDirector<'_, Sc>,
        mv: &dyn Move<Sc>,
        assert_move_score_from_scratch: bool,
        consumer: Option<&mut dyn FnMut(InnerScore<Sc>)>,
    ) -> Result<InnerScore<Sc>> {
        mv.do_move(ephemeral)?;
        let director = ephemeral.director();
        let score = director.calculate_score()?;
        director.track_after_move();
        if assert_move_score_from_scratch {
            director.undo_move_text = Some(format!("Undo({})", mv));
            director.assert_working_score_from_scratch(score, &mv.to_string())?;
        }
        trace!(event = "move_evaluated", %mv, %score);
        if let Some(consumer) = consumer {
            consumer(score);
        }
        Ok(score)
    }

    /// Evaluates `mv` without keeping it.
    pub fn execute_temporary_move(
        &mut self,
        mv: &dyn Move<Sc>,
        assert_move_score_from_scratch: bool,
    ) -> Result<InnerScore<Sc>> {
        self.do_and_process_move(mv, assert_move_score_from_scratch, None)
    }

    /// Evaluates `mv` without keeping it, optionally checking that the undo
    /// restored the score from before the move.
    pub fn evaluate_move(
        &mut self,
        mv: &dyn Move<Sc>,
        assert_move_score_from_scratch: bool,
        assert_expected_undo_move_score: bool,
    ) -> Result<InnerScore<Sc>> {
        let before_move_score = if assert_expected_undo_move_score {
            Some(self.calculate_score()?)
        } else {
            None
        };
        let score = self.do_and_process_move(mv, assert_move_score_from_scratch, None)?;
        if let Some(before_move_score) = before_move_score {
            self.assert_expected_undo_move_score(mv, before_move_score, "move evaluation")?;
        }
        Ok(score)
    }

    pub(super) fn track_before_move(&mut self) {
        if let (Some(tracker), Some(solution)) =
            (self.tracker.as_mut(), self.working_solution.as_ref())
        {
            tracker.set_before_move_solution(&self.descriptor, solution);
        }
    }

    pub(super) fn track_after_move(&mut self) {
        if let (Some(tracker), Some(solution)) =
            (self.tracker.as_mut(), self.working_solution.as_ref())
        {
            tracker.set_after_move_solution(&self.descriptor, solution);
        }
    }

    pub(super) fn track_after_undo(&mut self) {
        if let (Some(tracker), Some(solution)) =
            (self.tracker.as_mut(), self.working_solution.as_ref())
        {
            tracker.set_after_undo_solution(&self.descriptor, solution);
        }
    }
}
