//! Solution descriptor.

use std::fmt;

use super::entity::{EntityDeclaration, EntityDescriptor};
use super::problem_fact::FactClassDescriptor;
use super::value_range::{ValueRangeDescriptor, ValueRangeProvider};
use super::var_descriptor::{DeclaredKind, VariableDescriptor};
use crate::domain::variable::{GenuineKind, ShadowKind, VariableKind, VariableRef};
use crate::error::{Result, ScoreForgeError};

/// Describes a planning solution at runtime.
///
/// Immutable once built and shared (`Arc`) by every score director created
/// from the same factory, including derived ones.
#[derive(Debug, Clone)]
pub struct SolutionDescriptor {
    pub name: &'static str,
    pub entity_descriptors: Vec<EntityDescriptor>,
    pub fact_classes: Vec<FactClassDescriptor>,
    pub value_range_descriptors: Vec<ValueRangeDescriptor>,
    list_variable: Option<VariableRef>,
}

impl SolutionDescriptor {
    pub fn builder(name: &'static str) -> SolutionDescriptorBuilder {
        SolutionDescriptorBuilder {
            name,
            entities: Vec::new(),
            fact_classes: Vec::new(),
            providers: Vec::new(),
        }
    }

    pub fn entity_descriptor(&self, index: usize) -> Option<&EntityDescriptor> {
        self.entity_descriptors.get(index)
    }

    pub fn find_entity_descriptor(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entity_descriptors.iter().find(|d| d.name == name)
    }

    pub fn find_fact_class(&self, name: &str) -> Option<&FactClassDescriptor> {
        self.fact_classes.iter().find(|d| d.name == name)
    }

    pub fn fact_class(&self, index: usize) -> Option<&FactClassDescriptor> {
        self.fact_classes.get(index)
    }

    /// Resolves `entity.variable` to a [`VariableRef`].
    pub fn variable_ref(&self, entity: &str, variable: &str) -> Option<VariableRef> {
        self.find_entity_descriptor(entity)
            .and_then(|d| d.variable(variable))
            .map(VariableDescriptor::variable_ref)
    }

    /// Looks up a variable descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::DomainModel`] for a reference this
    /// descriptor did not produce.
    pub fn variable(&self, variable: VariableRef) -> Result<&VariableDescriptor> {
        self.entity_descriptors
            .get(variable.entity_descriptor)
            .and_then(|d| d.variables.get(variable.ordinal))
            .ok_or_else(|| {
                ScoreForgeError::DomainModel(format!(
                    "The variable reference ({}) does not exist in solution descriptor ({}).",
                    variable, self.name
                ))
            })
    }

    /// Qualified `Entity.variable` name, for messages.
    pub fn variable_name(&self, variable: VariableRef) -> String {
        match self.variable(variable) {
            Ok(descriptor) => format!(
                "{}.{}",
                self.entity_descriptors[variable.entity_descriptor].name, descriptor.name
            ),
            Err(_) => variable.to_string(),
        }
    }

    pub fn value_range_descriptor(&self, index: usize) -> Option<&ValueRangeDescriptor> {
        self.value_range_descriptors.get(index)
    }

    /// The single list variable of the model, if any.
    pub fn list_variable(&self) -> Option<&VariableDescriptor> {
        self.list_variable.and_then(|v| self.variable(v).ok())
    }

    /// True when the model has no list variable.
    pub fn is_basic_only(&self) -> bool {
        self.list_variable.is_none()
    }

    /// The fact class flagged as constraint configuration, if any.
    pub fn constraint_configuration_class(&self) -> Option<&FactClassDescriptor> {
        self.fact_classes.iter().find(|c| c.constraint_configuration)
    }

    pub fn all_variables(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.entity_descriptors.iter().flat_map(|e| e.variables.iter())
    }

    /// Inverse shadows whose source is a basic variable.
    ///
    /// The list inverse maintained for list variables is excluded.
    pub fn basic_inverse_shadows(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.all_variables()
            .filter(|v| matches!(v.kind, VariableKind::Shadow(ShadowKind::Inverse { .. })))
    }
}

impl fmt::Display for SolutionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builds a [`SolutionDescriptor`], resolving every name exactly once.
///
/// # Example
///
/// ```
/// use scoreforge_core::domain::{
///     EntityDeclaration, SolutionDescriptor, ValueRange, ValueRangeProvider, VariableDeclaration,
/// };
///
/// let descriptor = SolutionDescriptor::builder("NQueens")
///     .with_entity(
///         EntityDeclaration::new("Queen")
///             .with_variable(VariableDeclaration::basic("row").with_value_range("rows")),
///     )
///     .with_value_range(ValueRangeProvider::from_solution("rows", |_| ValueRange::int_range(0, 8)))
///     .build()
///     .unwrap();
///
/// let row = descriptor.variable_ref("Queen", "row").unwrap();
/// assert!(descriptor.variable(row).unwrap().kind.is_basic());
/// ```
#[derive(Debug, Clone)]
pub struct SolutionDescriptorBuilder {
    name: &'static str,
    entities: Vec<EntityDeclaration>,
    fact_classes: Vec<(&'static str, bool)>,
    providers: Vec<ValueRangeProvider>,
}

impl SolutionDescriptorBuilder {
    pub fn with_entity(mut self, entity: EntityDeclaration) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_fact_class(mut self, name: &'static str) -> Self {
        self.fact_classes.push((name, false));
        self
    }

    /// Declares the singleton fact class that holds constraint weights.
    pub fn with_constraint_configuration(mut self, name: &'static str) -> Self {
        self.fact_classes.push((name, true));
        self
    }

    pub fn with_value_range(mut self, provider: ValueRangeProvider) -> Self {
        self.providers.push(provider);
        self
    }

    /// Resolves sources and value ranges and validates the model.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreForgeError::DomainModel`] when a name does not resolve,
    /// a shadow's source is not a compatible genuine variable, a genuine
    /// variable lacks a value range, more than one list variable exists, or
    /// more than one constraint configuration class is declared.
    pub fn build(self) -> Result<SolutionDescriptor> {
        let name = self.name;
        if self.fact_classes.iter().filter(|(_, config)| *config).count() > 1 {
            return Err(ScoreForgeError::DomainModel(format!(
                "The solution ({}) declares more than one constraint configuration class.",
                name
            )));
        }

        let resolve = |entity: &str, variable: &str| -> Result<(VariableRef, DeclaredKind)> {
            self.entities
                .iter()
                .enumerate()
                .find(|(_, e)| e.name == entity)
                .and_then(|(ei, e)| {
                    e.variables
                        .iter()
                        .enumerate()
                        .find(|(_, v)| v.name == variable)
                        .map(|(vi, v)| (VariableRef::new(ei, vi), v.kind))
                })
                .ok_or_else(|| {
                    ScoreForgeError::DomainModel(format!(
                        "The source variable ({}.{}) does not exist in solution ({}).",
                        entity, variable, name
                    ))
                })
        };

        let mut entity_descriptors = Vec::with_capacity(self.entities.len());
        let mut value_range_descriptors = Vec::new();
        let mut list_variable = None;

        for (entity_index, entity) in self.entities.iter().enumerate() {
            let mut variables = Vec::with_capacity(entity.variables.len());
            for (ordinal, declaration) in entity.variables.iter().enumerate() {
                let variable_ref = VariableRef::new(entity_index, ordinal);
                let kind = match declaration.kind {
                    DeclaredKind::Basic => VariableKind::Genuine(GenuineKind::Basic),
                    DeclaredKind::List => {
                        if let Some(existing) = list_variable {
                            return Err(ScoreForgeError::DomainModel(format!(
                                "The solution ({}) has more than one list variable ({} and {}.{}).",
                                name, existing, entity.name, declaration.name
                            )));
                        }
                        list_variable = Some(variable_ref);
                        VariableKind::Genuine(GenuineKind::List)
                    }
                    DeclaredKind::InconsistentMarker => {
                        VariableKind::Shadow(ShadowKind::InconsistentMarker)
                    }
                    DeclaredKind::Custom => VariableKind::Shadow(ShadowKind::Custom),
                    shadow => {
                        let (source_entity, source_variable) =
                            declaration.source.ok_or_else(|| {
                                ScoreForgeError::DomainModel(format!(
                                    "The shadow variable ({}.{}) has no source variable.",
                                    entity.name, declaration.name
                                ))
                            })?;
                        let (source, source_kind) = resolve(source_entity, source_variable)?;
                        let expected = match shadow {
                            DeclaredKind::Inverse(_) => DeclaredKind::Basic,
                            _ => DeclaredKind::List,
                        };
                        if source_kind != expected {
                            return Err(ScoreForgeError::DomainModel(format!(
                                "The shadow variable ({}.{}) has a source variable ({}.{}) which is not a {} variable.",
                                entity.name,
                                declaration.name,
                                source_entity,
                                source_variable,
                                if expected == DeclaredKind::Basic { "basic" } else { "list" }
                            )));
                        }
                        match shadow {
                            DeclaredKind::Inverse(cardinality) => {
                                VariableKind::Shadow(ShadowKind::Inverse {
                                    source,
                                    cardinality,
                                })
                            }
                            DeclaredKind::ListInverse => {
                                VariableKind::Shadow(ShadowKind::ListInverse { source })
                            }
                            _ => VariableKind::Shadow(ShadowKind::Index { source }),
                        }
                    }
                };

                let value_range = if declaration.is_genuine() {
                    let provider_name = declaration.value_range.ok_or_else(|| {
                        ScoreForgeError::DomainModel(format!(
                            "The genuine variable ({}.{}) has no value range provider.",
                            entity.name, declaration.name
                        ))
                    })?;
                    let provider = self
                        .providers
                        .iter()
                        .find(|p| p.name == provider_name)
                        .ok_or_else(|| {
                            ScoreForgeError::DomainModel(format!(
                                "The value range provider ({}) of variable ({}.{}) does not exist.",
                                provider_name, entity.name, declaration.name
                            ))
                        })?;
                    let index = value_range_descriptors.len();
                    value_range_descriptors.push(ValueRangeDescriptor {
                        index,
                        provider: provider.name,
                        source: provider.source,
                        variable: variable_ref,
                        accepts_null: declaration.kind == DeclaredKind::Basic
                            && declaration.allows_unassigned,
                    });
                    Some(index)
                } else {
                    None
                };

                variables.push(VariableDescriptor {
                    name: declaration.name,
                    entity_descriptor: entity_index,
                    ordinal,
                    kind,
                    allows_unassigned: declaration.allows_unassigned,
                    value_range,
                });
            }
            entity_descriptors.push(EntityDescriptor {
                name: entity.name,
                index: entity_index,
                variables,
            });
        }

        let fact_classes = self
            .fact_classes
            .iter()
            .enumerate()
            .map(|(index, (fact_name, config))| FactClassDescriptor {
                name: fact_name,
                index,
                constraint_configuration: *config,
            })
            .collect();

        Ok(SolutionDescriptor {
            name,
            entity_descriptors,
            fact_classes,
            value_range_descriptors,
            list_variable,
        })
    }
}
