//! Builds a populated [`CollisionHandler`] from material definitions and
//! cell assignments.
//!
//! Validation is strictly ordered: every definition and assignment is checked
//! before any data table is touched, so a malformed input fails fast instead
//! of after minutes of table loading.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::collision_handler::CollisionHandler;
use crate::error::{CollisionError, Result};
use crate::library::{LibraryOptions, ScatteringCenterProvider};
use crate::material::Material;
use crate::particle::{CellId, ParticleMode, ParticleType};
use crate::scattering_center::ScatteringCenter;

/// Avogadro's number (1/mol).
const AVOGADRO: f64 = 6.02214076e23;

/// Neutron rest mass in amu; atomic weight ratios are relative to this.
const NEUTRON_AMU: f64 = 1.00866491588;

/// User-facing material description: constituent aliases and their atom
/// fractions. Densities live on the cell assignments, not here, so one
/// definition can fill cells at several densities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDefinition {
    pub id: Option<u32>,
    pub name: String,
    pub constituents: Vec<String>,
    pub fractions: Vec<f64>,
}

/// One filled cell: which material, and at what density.
///
/// A positive density is an atom density in atom/b·cm; a negative density is
/// a mass density in g/cm³ and is converted during construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellAssignment {
    pub cell: CellId,
    pub material_id: u32,
    pub density: f64,
}

/// Cross-check between the declared materials and the geometry's cell
/// assignments. Strategy object so exporters with richer geometry models can
/// substitute their own consistency rules.
pub trait GeometryModelValidator {
    fn validate(
        &self,
        definitions: &[MaterialDefinition],
        assignments: &[CellAssignment],
    ) -> Result<()>;
}

/// Default validator: every assigned material id must be declared.
#[derive(Debug, Default)]
pub struct CellMapValidator;

impl GeometryModelValidator for CellMapValidator {
    fn validate(
        &self,
        definitions: &[MaterialDefinition],
        assignments: &[CellAssignment],
    ) -> Result<()> {
        let declared: HashSet<u32> = definitions.iter().filter_map(|d| d.id).collect();
        for assignment in assignments {
            if !declared.contains(&assignment.material_id) {
                return Err(CollisionError::UndeclaredMaterial {
                    cell: assignment.cell,
                    material_id: assignment.material_id,
                });
            }
        }
        Ok(())
    }
}

/// Factory assembling the cell-to-material registry for every particle
/// family of the chosen transport mode.
pub struct CollisionHandlerFactory<P: ScatteringCenterProvider> {
    provider: P,
    mode: ParticleMode,
    options: LibraryOptions,
    validator: Box<dyn GeometryModelValidator>,
}

impl<P: ScatteringCenterProvider> CollisionHandlerFactory<P> {
    pub fn new(provider: P, mode: ParticleMode) -> Self {
        Self {
            provider,
            mode,
            options: LibraryOptions::default(),
            validator: Box::new(CellMapValidator),
        }
    }

    pub fn with_options(mut self, options: LibraryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_validator(mut self, validator: Box<dyn GeometryModelValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Build the handler: validate, load the unique scattering centers once
    /// per family, construct one material per (id, density) pair and register
    /// it with its full cell list.
    pub fn initialize_handler(
        &self,
        definitions: &[MaterialDefinition],
        assignments: &[CellAssignment],
    ) -> Result<CollisionHandler> {
        if self.options.photonuclear_data {
            return Err(CollisionError::Unsupported(
                "photonuclear data tables".to_string(),
            ));
        }

        // All structural validation happens before any table is loaded.
        for definition in definitions {
            validate_definition(definition, definitions)?;
        }
        for assignment in assignments {
            if !assignment.density.is_finite() || assignment.density == 0.0 {
                return Err(CollisionError::InvalidMaterialRepresentation {
                    material: assignment.material_id.to_string(),
                    reason: format!(
                        "cell {} assigns a non-finite or zero density {}",
                        assignment.cell, assignment.density
                    ),
                });
            }
        }
        self.validator.validate(definitions, assignments)?;

        let by_id: HashMap<u32, &MaterialDefinition> = definitions
            .iter()
            .map(|d| (d.id.expect("validated above"), d))
            .collect();

        // Resolve every constituent alias and collapse duplicates, so each
        // table is loaded exactly once per family.
        let mut unique_names: BTreeMap<String, ()> = BTreeMap::new();
        for definition in definitions {
            for alias in &definition.constituents {
                unique_names.insert(self.provider.resolve_alias(alias)?, ());
            }
        }

        let mut handler = CollisionHandler::new();
        for &family in self.mode.families() {
            let mut centers: HashMap<String, Arc<ScatteringCenter>> = HashMap::new();
            for name in unique_names.keys() {
                let center = self.provider.load(name, family, &self.options)?;
                centers.insert(name.clone(), center);
            }
            info!(
                "loaded {} {} scattering center(s)",
                centers.len(),
                family
            );

            // Group cells by (material id, density) so identical fills share
            // one material object. BTreeMap keeps registration order
            // deterministic.
            let mut groups: BTreeMap<String, (u32, f64, Vec<CellId>)> = BTreeMap::new();
            for assignment in assignments {
                let key = format!("{}_{}", assignment.material_id, assignment.density);
                groups
                    .entry(key)
                    .or_insert((assignment.material_id, assignment.density, Vec::new()))
                    .2
                    .push(assignment.cell);
            }

            for (material_id, density, cells) in groups.values() {
                let definition = by_id[material_id];
                let material =
                    self.build_material(definition, *density, &centers, family)?;
                debug!(
                    "built {} material {} at density {} for {} cell(s)",
                    family,
                    material_id,
                    material.number_density(),
                    cells.len()
                );
                handler.add_material(material, cells)?;
            }
        }
        Ok(handler)
    }

    fn build_material(
        &self,
        definition: &MaterialDefinition,
        density: f64,
        centers: &HashMap<String, Arc<ScatteringCenter>>,
        family: ParticleType,
    ) -> Result<Arc<Material>> {
        let id = definition.id.expect("validated above");
        let total: f64 = definition.fractions.iter().sum();
        let mut constituents = Vec::with_capacity(definition.constituents.len());
        for (alias, fraction) in definition.constituents.iter().zip(&definition.fractions) {
            let name = self.provider.resolve_alias(alias)?;
            let center = Arc::clone(&centers[&name]);
            debug_assert_eq!(center.family(), family);
            constituents.push((center, fraction / total));
        }

        let number_density = if density > 0.0 {
            density
        } else {
            // Mass density in g/cm3: convert through the fraction-averaged
            // atomic mass. awr * m_n gives the constituent mass in amu.
            let mean_amu: f64 = constituents
                .iter()
                .map(|(center, fraction)| fraction * center.atomic_weight_ratio() * NEUTRON_AMU)
                .sum();
            -density * AVOGADRO * 1.0e-24 / mean_amu
        };

        Ok(Arc::new(
            Material::new(id, number_density, constituents)?.with_name(definition.name.clone()),
        ))
    }
}

fn validate_definition(
    definition: &MaterialDefinition,
    all: &[MaterialDefinition],
) -> Result<()> {
    let id = definition.id.ok_or_else(|| {
        CollisionError::InvalidMaterialRepresentation {
            material: definition.name.clone(),
            reason: "no material id assigned".to_string(),
        }
    })?;
    if all.iter().filter(|d| d.id == Some(id)).count() > 1 {
        return Err(CollisionError::InvalidMaterialRepresentation {
            material: definition.name.clone(),
            reason: format!("material id {} declared more than once", id),
        });
    }
    if definition.constituents.is_empty() {
        return Err(CollisionError::InvalidMaterialRepresentation {
            material: definition.name.clone(),
            reason: "no constituents".to_string(),
        });
    }
    if definition.constituents.len() != definition.fractions.len() {
        return Err(CollisionError::InvalidMaterialRepresentation {
            material: definition.name.clone(),
            reason: format!(
                "{} constituents but {} fractions",
                definition.constituents.len(),
                definition.fractions.len()
            ),
        });
    }
    for (alias, fraction) in definition.constituents.iter().zip(&definition.fractions) {
        if *fraction <= 0.0 {
            return Err(CollisionError::InvalidMaterialRepresentation {
                material: definition.name.clone(),
                reason: format!("non-positive fraction {} for '{}'", fraction, alias),
            });
        }
    }
    Ok(())
}
