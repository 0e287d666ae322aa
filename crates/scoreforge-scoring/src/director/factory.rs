//! Score director factory for creating score directors.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use scoreforge_config::ScoreDirectorConfig;
use scoreforge_core::domain::{DeepSolutionCloner, SolutionCloner, SolutionDescriptor};
use scoreforge_core::{Result, Score};
use tracing::debug;

use super::inner::InnerScoreDirector;
use crate::api::{CalculatorSupplier, ConstraintMatchPolicy, ScoreCalculator};
use crate::shadow::{InverseRelationPropagation, ShadowPropagation, ShadowSupplier};

/// Kind of director built for another thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildThreadType {
    /// Solves one partition of the problem on its own working solution.
    Partition,
    /// Evaluates moves on a clone of the parent's working solution.
    MoveThread,
}

/// Factory for score directors over one solution model.
///
/// The factory owns everything directors share: the descriptor, the
/// calculator and shadow propagation suppliers, the cloner and the
/// configuration. Every director gets its own calculator and engine.
///
/// # Example
///
/// ```ignore
/// let factory = Arc::new(ScoreDirectorFactory::new(descriptor, EasyScoreCalculator::supplier(score)));
/// let mut director = factory.build_default();
/// director.set_working_solution(solution)?;
/// let score = director.calculate_score()?;
/// ```
pub struct ScoreDirectorFactory<Sc: Score> {
    solution_descriptor: Arc<SolutionDescriptor>,
    calculator_supplier: CalculatorSupplier<Sc>,
    shadow_supplier: ShadowSupplier,
    cloner: Arc<dyn SolutionCloner>,
    config: ScoreDirectorConfig,
    assertion_factory: Option<Arc<ScoreDirectorFactory<Sc>>>,
}

impl<Sc: Score> ScoreDirectorFactory<Sc> {
    /// Creates a factory with the default configuration, inverse relation
    /// propagation and deep cloning.
    pub fn new(
        solution_descriptor: Arc<SolutionDescriptor>,
        calculator_supplier: CalculatorSupplier<Sc>,
    ) -> Self {
        Self {
            solution_descriptor,
            calculator_supplier,
            shadow_supplier: InverseRelationPropagation::supplier(),
            cloner: Arc::new(DeepSolutionCloner),
            config: ScoreDirectorConfig::default(),
            assertion_factory: None,
        }
    }

    pub fn with_shadow_propagation(mut self, shadow_supplier: ShadowSupplier) -> Self {
        self.shadow_supplier = shadow_supplier;
        self
    }

    pub fn with_cloner(mut self, cloner: Arc<dyn SolutionCloner>) -> Self {
        self.cloner = cloner;
        self
    }

    pub fn with_config(mut self, config: ScoreDirectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses directors of `assertion_factory` for from-scratch checks, such as
    /// a factory with a non-incremental calculator.
    pub fn with_assertion_factory(
        mut self,
        assertion_factory: Arc<ScoreDirectorFactory<Sc>>,
    ) -> Self {
        self.assertion_factory = Some(assertion_factory);
        self
    }

    /// Returns a reference to the solution descriptor.
    pub fn solution_descriptor(&self) -> &Arc<SolutionDescriptor> {
        &self.solution_descriptor
    }

    pub fn config(&self) -> &ScoreDirectorConfig {
        &self.config
    }

    pub fn cloner(&self) -> &Arc<dyn SolutionCloner> {
        &self.cloner
    }

    pub(crate) fn new_calculator(&self) -> Box<dyn ScoreCalculator<Sc>> {
        (self.calculator_supplier)(&self.solution_descriptor)
    }

    pub(crate) fn new_shadow_propagation(&self) -> Box<dyn ShadowPropagation> {
        (self.shadow_supplier)(&self.solution_descriptor)
    }

    /// The factory whose directors verify scores from scratch.
    pub fn assertion_factory(self: &Arc<Self>) -> Arc<Self> {
        self.assertion_factory.clone().unwrap_or_else(|| self.clone())
    }

    /// Creates a new score director.
    pub fn build_score_director(
        self: &Arc<Self>,
        lookup_enabled: bool,
        constraint_match_policy: ConstraintMatchPolicy,
    ) -> InnerScoreDirector<Sc> {
        debug!(
            event = "score_director_created",
            solution = self.solution_descriptor.name,
            lookup_enabled,
            %constraint_match_policy,
        );
        InnerScoreDirector::new(self.clone(), lookup_enabled, constraint_match_policy, false)
    }

    /// Creates a director with the lookup and constraint match settings of
    /// the configuration.
    pub fn build_default(self: &Arc<Self>) -> InnerScoreDirector<Sc> {
        self.build_score_director(
            self.config.lookup_enabled,
            ConstraintMatchPolicy::from_enabled(self.config.constraint_match_enabled),
        )
    }

    /// Creates a director for assertions or child threads.
    pub fn build_derived(
        self: &Arc<Self>,
        lookup_enabled: bool,
        constraint_match_policy: ConstraintMatchPolicy,
    ) -> InnerScoreDirector<Sc> {
        debug!(
            event = "derived_score_director_created",
            solution = self.solution_descriptor.name,
            lookup_enabled,
            %constraint_match_policy,
        );
        InnerScoreDirector::new(self.clone(), lookup_enabled, constraint_match_policy, true)
    }

    /// Runs `f` on a derived director that is closed afterwards, whatever
    /// `f` returns.
    pub fn with_assertion_score_director<R>(
        self: &Arc<Self>,
        lookup_enabled: bool,
        constraint_match_policy: ConstraintMatchPolicy,
        f: impl FnOnce(&mut InnerScoreDirector<Sc>) -> Result<R>,
    ) -> Result<R> {
        let mut scoped =
            ScopedScoreDirector::new(self.build_derived(lookup_enabled, constraint_match_policy));
        f(&mut scoped)
    }
}

impl<Sc: Score> fmt::Debug for ScoreDirectorFactory<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreDirectorFactory")
            .field("solution", &self.solution_descriptor.name)
            .field("cloner", &self.cloner)
            .field("config", &self.config)
            .field("has_assertion_factory", &self.assertion_factory.is_some())
            .finish()
    }
}

/// Closes the wrapped director when dropped.
#[derive(Debug)]
pub struct ScopedScoreDirector<Sc: Score> {
    inner: InnerScoreDirector<Sc>,
}

impl<Sc: Score> ScopedScoreDirector<Sc> {
    pub fn new(inner: InnerScoreDirector<Sc>) -> Self {
        Self { inner }
    }
}

impl<Sc: Score> Deref for ScopedScoreDirector<Sc> {
    type Target = InnerScoreDirector<Sc>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<Sc: Score> DerefMut for ScopedScoreDirector<Sc> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl<Sc: Score> Drop for ScopedScoreDirector<Sc> {
    fn drop(&mut self) {
        self.inner.close();
    }
}
