//! Data table index, load options and scattering-center loading.
//!
//! Tables are JSON files keyed by an index that maps species aliases (for
//! example "U-235" -> "U235.70c") to per-family table locations. Loaded
//! centers are cached process-wide so many materials referencing the same
//! species share one `Arc`.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{CollisionError, Result};
use crate::particle::ParticleType;
use crate::reaction::{OutgoingLaw, Reaction, ReactionKind};
use crate::scattering_center::ScatteringCenter;

/// Incoherent photon scattering model selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncoherentModel {
    WallerHartree,
    Impulse,
}

/// Knobs controlling which physics a loaded table carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryOptions {
    /// Attach photon-production channels to neutron absorption reactions.
    pub photon_production: bool,
    /// Keep fluorescence data on photoelectric absorption.
    pub atomic_relaxation: bool,
    pub incoherent_model: IncoherentModel,
    /// Photonuclear tables are not implemented; requesting them is an error.
    pub photonuclear_data: bool,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            photon_production: true,
            atomic_relaxation: true,
            incoherent_model: IncoherentModel::WallerHartree,
            photonuclear_data: false,
        }
    }
}

impl LibraryOptions {
    /// Short tag folded into cache keys so differently-configured loads of
    /// the same table do not collide.
    fn cache_tag(&self) -> String {
        format!(
            "pp{}-ar{}-{}",
            self.photon_production as u8,
            self.atomic_relaxation as u8,
            match self.incoherent_model {
                IncoherentModel::WallerHartree => "wh",
                IncoherentModel::Impulse => "imp",
            }
        )
    }
}

/// Location of one table on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableLocation {
    pub file_path: PathBuf,
    pub table_name: String,
}

/// Per-family table locations for one species. A coupled-mode problem needs
/// several families from the same species; families with no data are simply
/// absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableEntry {
    #[serde(default)]
    pub neutron: Option<TableLocation>,
    #[serde(default)]
    pub photon: Option<TableLocation>,
    #[serde(default)]
    pub electron: Option<TableLocation>,
}

impl TableEntry {
    pub fn location(&self, family: ParticleType) -> Option<&TableLocation> {
        match family {
            ParticleType::Neutron => self.neutron.as_ref(),
            ParticleType::Photon => self.photon.as_ref(),
            ParticleType::Electron => self.electron.as_ref(),
        }
    }
}

/// Index mapping species names and aliases to table locations.
///
/// `aliases` holds one-hop indirections ("U-235" -> "U235") so inputs can use
/// friendly names while the entries stay keyed by canonical species name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataTableIndex {
    pub entries: HashMap<String, TableEntry>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl DataTableIndex {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| CollisionError::MalformedDataTable {
            name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            CollisionError::MalformedDataTable {
                name: path.display().to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Resolve `alias` to the canonical entry key. A name that is already an
    /// entry key resolves to itself; alias chains are not followed.
    pub fn resolve_alias<'a>(&'a self, alias: &'a str) -> Result<&'a str> {
        if self.entries.contains_key(alias) {
            return Ok(alias);
        }
        if let Some(target) = self.aliases.get(alias) {
            if self.entries.contains_key(target.as_str()) {
                return Ok(target);
            }
        }
        Err(CollisionError::UnknownScatteringCenter {
            alias: alias.to_string(),
        })
    }

    pub fn entry(&self, key: &str) -> Result<&TableEntry> {
        self.entries
            .get(key)
            .ok_or_else(|| CollisionError::UnknownScatteringCenter {
                alias: key.to_string(),
            })
    }
}

/// On-disk reaction record: the cross section starts at `threshold_idx` on
/// the parent energy grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReaction {
    pub kind: ReactionKind,
    #[serde(default)]
    pub threshold_idx: usize,
    pub cross_section: Vec<f64>,
    #[serde(default)]
    pub q_value_ev: f64,
    pub law: OutgoingLaw,
}

/// On-disk scattering center record: one shared energy grid plus the
/// threshold-truncated reaction channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScatteringCenterTable {
    pub name: String,
    pub family: ParticleType,
    pub atomic_number: u32,
    #[serde(default)]
    pub mass_number: Option<u32>,
    pub atomic_weight_ratio: f64,
    pub energy: Vec<f64>,
    pub reactions: Vec<TableReaction>,
}

impl ScatteringCenterTable {
    /// Validate the table and build the in-memory scattering center,
    /// applying the load options.
    pub fn build(&self, options: &LibraryOptions) -> Result<ScatteringCenter> {
        if self.energy.is_empty() {
            return Err(CollisionError::MalformedDataTable {
                name: self.name.clone(),
                reason: "empty energy grid".to_string(),
            });
        }
        for (i, pair) in self.energy.windows(2).enumerate() {
            if !(pair[1] > pair[0]) {
                return Err(CollisionError::MalformedDataTable {
                    name: self.name.clone(),
                    reason: format!(
                        "energy grid is not strictly ascending at index {} ({} then {})",
                        i, pair[0], pair[1]
                    ),
                });
            }
        }
        // Photoatomic lookups interpolate log-log, which needs positive grid
        // energies.
        if self.family == ParticleType::Photon && self.energy[0] <= 0.0 {
            return Err(CollisionError::MalformedDataTable {
                name: self.name.clone(),
                reason: format!("non-positive energy {} in a photon grid", self.energy[0]),
            });
        }
        let mut reactions = Vec::with_capacity(self.reactions.len());
        for table_reaction in &self.reactions {
            let idx = table_reaction.threshold_idx;
            if idx >= self.energy.len() {
                return Err(CollisionError::MalformedDataTable {
                    name: self.name.clone(),
                    reason: format!(
                        "{:?} threshold index {} outside the {}-point energy grid",
                        table_reaction.kind,
                        idx,
                        self.energy.len()
                    ),
                });
            }
            let grid = &self.energy[idx..];
            if table_reaction.cross_section.len() != grid.len() {
                return Err(CollisionError::MalformedDataTable {
                    name: self.name.clone(),
                    reason: format!(
                        "{:?} has {} cross section values for {} grid points above threshold",
                        table_reaction.kind,
                        table_reaction.cross_section.len(),
                        grid.len()
                    ),
                });
            }
            reactions.push(Reaction {
                kind: table_reaction.kind,
                threshold_idx: idx,
                energy: grid.to_vec(),
                cross_section: table_reaction.cross_section.clone(),
                q_value_ev: table_reaction.q_value_ev,
                law: apply_options(table_reaction.kind, table_reaction.law.clone(), options),
            });
        }
        ScatteringCenter::new(
            self.name.clone(),
            self.family,
            self.atomic_number,
            self.mass_number,
            self.atomic_weight_ratio,
            reactions,
        )
    }
}

/// Rewrite a channel's outgoing law according to the load options.
fn apply_options(kind: ReactionKind, law: OutgoingLaw, options: &LibraryOptions) -> OutgoingLaw {
    match law {
        OutgoingLaw::PhotoelectricAbsorption { .. } if !options.atomic_relaxation => {
            OutgoingLaw::PhotoelectricAbsorption {
                fluorescence_ev: None,
            }
        }
        OutgoingLaw::MultiplicityEmission {
            product: ParticleType::Photon,
            ..
        } if kind.is_absorption() && !options.photon_production => {
            // Capture without photon production reverts to plain absorption.
            OutgoingLaw::Disappearance
        }
        other => other,
    }
}

/// Source of scattering centers for the factory.
///
/// `load` returns a shared handle; implementations are expected to hand out
/// the same `Arc` for repeated requests of the same (name, family, options).
pub trait ScatteringCenterProvider {
    fn load(
        &self,
        alias: &str,
        family: ParticleType,
        options: &LibraryOptions,
    ) -> Result<Arc<ScatteringCenter>>;

    /// Canonical species name for `alias`, used for deduplication before
    /// loading.
    fn resolve_alias(&self, alias: &str) -> Result<String>;
}

static CENTER_CACHE: Lazy<Mutex<HashMap<String, Arc<ScatteringCenter>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Drop every cached scattering center. Mainly for tests that measure load
/// behavior.
pub fn clear_center_cache() {
    CENTER_CACHE
        .lock()
        .expect("scattering center cache poisoned")
        .clear();
}

/// Provider reading JSON tables from disk through a [`DataTableIndex`], with
/// a process-wide cache.
#[derive(Debug)]
pub struct JsonLibrary {
    index: DataTableIndex,
}

impl JsonLibrary {
    pub fn new(index: DataTableIndex) -> Self {
        Self { index }
    }

    pub fn from_index_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(DataTableIndex::from_json_file(path)?))
    }

    fn read_table(&self, key: &str, family: ParticleType) -> Result<ScatteringCenterTable> {
        let entry = self.index.entry(key)?;
        let location =
            entry
                .location(family)
                .ok_or_else(|| CollisionError::MalformedDataTable {
                    name: key.to_string(),
                    reason: format!("no {} table available for this species", family),
                })?;
        let file =
            File::open(&location.file_path).map_err(|e| CollisionError::MalformedDataTable {
                name: location.table_name.clone(),
                reason: format!("{}: {}", location.file_path.display(), e),
            })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            CollisionError::MalformedDataTable {
                name: location.table_name.clone(),
                reason: e.to_string(),
            }
        })
    }
}

impl ScatteringCenterProvider for JsonLibrary {
    fn load(
        &self,
        alias: &str,
        family: ParticleType,
        options: &LibraryOptions,
    ) -> Result<Arc<ScatteringCenter>> {
        if options.photonuclear_data {
            return Err(CollisionError::Unsupported(
                "photonuclear data tables".to_string(),
            ));
        }
        let key = self.index.resolve_alias(alias)?.to_string();
        let cache_key = format!("{}:{}:{}", family, key, options.cache_tag());

        let cache = CENTER_CACHE
            .lock()
            .expect("scattering center cache poisoned");
        if let Some(center) = cache.get(&cache_key) {
            debug!("scattering center cache hit for {}", cache_key);
            return Ok(Arc::clone(center));
        }
        drop(cache);

        let table = self.read_table(&key, family)?;
        if table.family != family {
            return Err(CollisionError::MalformedDataTable {
                name: table.name.clone(),
                reason: format!(
                    "table holds {} data but {} data was requested",
                    table.family, family
                ),
            });
        }
        let center = Arc::new(table.build(options)?);

        let mut cache = CENTER_CACHE
            .lock()
            .expect("scattering center cache poisoned");
        let center = cache
            .entry(cache_key)
            .or_insert_with(|| Arc::clone(&center));
        Ok(Arc::clone(center))
    }

    fn resolve_alias(&self, alias: &str) -> Result<String> {
        Ok(self.index.resolve_alias(alias)?.to_string())
    }
}

/// Provider serving tables from memory, keyed by species name. Used by tests
/// and by callers that construct their tables programmatically.
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    tables: HashMap<String, Vec<ScatteringCenterTable>>,
    aliases: HashMap<String, String>,
    cache: Mutex<HashMap<String, Arc<ScatteringCenter>>>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under its own name as the species key.
    pub fn insert(&mut self, table: ScatteringCenterTable) {
        self.insert_for(table.name.clone(), table);
    }

    /// Register a table under an explicit species key, so one species can
    /// carry tables for several families.
    pub fn insert_for(&mut self, species: impl Into<String>, table: ScatteringCenterTable) {
        self.tables.entry(species.into()).or_default().push(table);
    }

    pub fn insert_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }

    fn resolve<'a>(&'a self, alias: &'a str) -> Result<&'a str> {
        if self.tables.contains_key(alias) {
            return Ok(alias);
        }
        if let Some(target) = self.aliases.get(alias) {
            if self.tables.contains_key(target.as_str()) {
                return Ok(target);
            }
        }
        Err(CollisionError::UnknownScatteringCenter {
            alias: alias.to_string(),
        })
    }
}

impl ScatteringCenterProvider for InMemoryLibrary {
    fn load(
        &self,
        alias: &str,
        family: ParticleType,
        options: &LibraryOptions,
    ) -> Result<Arc<ScatteringCenter>> {
        if options.photonuclear_data {
            return Err(CollisionError::Unsupported(
                "photonuclear data tables".to_string(),
            ));
        }
        let key = self.resolve(alias)?.to_string();
        let cache_key = format!("{}:{}:{}", family, key, options.cache_tag());
        let mut cache = self.cache.lock().expect("in-memory cache poisoned");
        if let Some(center) = cache.get(&cache_key) {
            return Ok(Arc::clone(center));
        }
        let table = self.tables[&key]
            .iter()
            .find(|t| t.family == family)
            .ok_or_else(|| CollisionError::MalformedDataTable {
                name: key.clone(),
                reason: format!("no {} table available for this species", family),
            })?;
        let center = Arc::new(table.build(options)?);
        cache.insert(cache_key, Arc::clone(&center));
        Ok(center)
    }

    fn resolve_alias(&self, alias: &str) -> Result<String> {
        Ok(self.resolve(alias)?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::{EnergySpectrum, NuclearReactionKind, PhotoatomicReactionKind};

    fn capture_with_photons() -> TableReaction {
        TableReaction {
            kind: ReactionKind::Nuclear(NuclearReactionKind::RadiativeCapture),
            threshold_idx: 0,
            cross_section: vec![2.0, 2.0, 2.0],
            q_value_ev: 6.5e6,
            law: OutgoingLaw::MultiplicityEmission {
                product: ParticleType::Photon,
                multiplicity: 1.0,
                spectrum: EnergySpectrum::Discrete { energy_ev: 6.5e6 },
            },
        }
    }

    fn neutron_table(name: &str) -> ScatteringCenterTable {
        ScatteringCenterTable {
            name: name.to_string(),
            family: ParticleType::Neutron,
            atomic_number: 26,
            mass_number: Some(56),
            atomic_weight_ratio: 55.45,
            energy: vec![1.0, 1.0e6, 1.0e7],
            reactions: vec![
                TableReaction {
                    kind: ReactionKind::Nuclear(NuclearReactionKind::Elastic),
                    threshold_idx: 0,
                    cross_section: vec![3.0, 3.0, 3.0],
                    q_value_ev: 0.0,
                    law: OutgoingLaw::ElasticIsotropic,
                },
                capture_with_photons(),
            ],
        }
    }

    fn photon_table(name: &str) -> ScatteringCenterTable {
        ScatteringCenterTable {
            name: name.to_string(),
            family: ParticleType::Photon,
            atomic_number: 26,
            mass_number: None,
            atomic_weight_ratio: 55.45,
            energy: vec![1.0e3, 1.0e7],
            reactions: vec![TableReaction {
                kind: ReactionKind::Photoatomic(PhotoatomicReactionKind::IncoherentScattering),
                threshold_idx: 0,
                cross_section: vec![0.6, 0.1],
                q_value_ev: 0.0,
                law: OutgoingLaw::ComptonScattering,
            }],
        }
    }

    #[test]
    fn test_threshold_slicing() {
        let mut table = neutron_table("Fe56");
        table.reactions.push(TableReaction {
            kind: ReactionKind::Nuclear(NuclearReactionKind::N2n),
            threshold_idx: 1,
            cross_section: vec![0.0, 0.4],
            q_value_ev: -1.1e7,
            law: OutgoingLaw::MultiplicityEmission {
                product: ParticleType::Neutron,
                multiplicity: 2.0,
                spectrum: EnergySpectrum::Maxwellian { theta_ev: 1.5e6 },
            },
        });
        let center = table.build(&LibraryOptions::default()).unwrap();
        let n2n = ReactionKind::Nuclear(NuclearReactionKind::N2n);
        assert_eq!(center.reaction_cross_section(0.5e6, n2n), 0.0);
        assert!((center.reaction_cross_section(1.0e7, n2n) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_energy_grid_rejected() {
        let mut table = neutron_table("Fe56");
        table.energy = vec![1.0e7, 1.0, 5.0e6];
        let err = table.build(&LibraryOptions::default()).unwrap_err();
        match err {
            CollisionError::MalformedDataTable { reason, .. } => {
                assert!(reason.contains("ascending"), "reason: {}", reason);
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_duplicate_grid_point_rejected() {
        let mut table = neutron_table("Fe56");
        table.energy = vec![1.0, 1.0, 1.0e7];
        let err = table.build(&LibraryOptions::default()).unwrap_err();
        assert!(matches!(err, CollisionError::MalformedDataTable { .. }));
    }

    #[test]
    fn test_nonpositive_photon_grid_rejected() {
        let mut table = photon_table("Fe.04p");
        table.energy = vec![0.0, 1.0e7];
        table.reactions[0].cross_section = vec![0.6, 0.1];
        let err = table.build(&LibraryOptions::default()).unwrap_err();
        match err {
            CollisionError::MalformedDataTable { reason, .. } => {
                assert!(reason.contains("non-positive"), "reason: {}", reason);
            }
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_cross_section_length_mismatch_rejected() {
        let mut table = neutron_table("Fe56");
        table.reactions[0].cross_section.pop();
        let err = table.build(&LibraryOptions::default()).unwrap_err();
        assert!(matches!(err, CollisionError::MalformedDataTable { .. }));
    }

    #[test]
    fn test_threshold_outside_grid_rejected() {
        let mut table = neutron_table("Fe56");
        table.reactions[1].threshold_idx = 3;
        table.reactions[1].cross_section = vec![];
        let err = table.build(&LibraryOptions::default()).unwrap_err();
        assert!(matches!(err, CollisionError::MalformedDataTable { .. }));
    }

    #[test]
    fn test_photon_production_disabled_reverts_capture() {
        let table = neutron_table("Fe56");
        let options = LibraryOptions {
            photon_production: false,
            ..LibraryOptions::default()
        };
        let center = table.build(&options).unwrap();
        let capture = center
            .reactions()
            .iter()
            .find(|r| r.kind == ReactionKind::Nuclear(NuclearReactionKind::RadiativeCapture))
            .unwrap();
        assert_eq!(capture.law, OutgoingLaw::Disappearance);
    }

    #[test]
    fn test_atomic_relaxation_disabled_strips_fluorescence() {
        let table = ScatteringCenterTable {
            name: "Pb".to_string(),
            family: ParticleType::Photon,
            atomic_number: 82,
            mass_number: None,
            atomic_weight_ratio: 205.4,
            energy: vec![1.0e3, 1.0e7],
            reactions: vec![TableReaction {
                kind: ReactionKind::Photoatomic(PhotoatomicReactionKind::PhotoelectricAbsorption),
                threshold_idx: 0,
                cross_section: vec![10.0, 0.01],
                q_value_ev: 0.0,
                law: OutgoingLaw::PhotoelectricAbsorption {
                    fluorescence_ev: Some(8.8e4),
                },
            }],
        };
        let options = LibraryOptions {
            atomic_relaxation: false,
            ..LibraryOptions::default()
        };
        let center = table.build(&options).unwrap();
        assert_eq!(
            center.reactions()[0].law,
            OutgoingLaw::PhotoelectricAbsorption {
                fluorescence_ev: None
            }
        );
    }

    #[test]
    fn test_in_memory_provider_resolves_aliases_and_shares() {
        let mut lib = InMemoryLibrary::new();
        lib.insert(neutron_table("Fe56.70c"));
        lib.insert_alias("Fe-56", "Fe56.70c");

        assert_eq!(lib.resolve_alias("Fe-56").unwrap(), "Fe56.70c");
        let options = LibraryOptions::default();
        let a = lib.load("Fe-56", ParticleType::Neutron, &options).unwrap();
        let b = lib.load("Fe56.70c", ParticleType::Neutron, &options).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_one_species_serves_both_families() {
        let mut lib = InMemoryLibrary::new();
        lib.insert_for("Fe", neutron_table("Fe56.70c"));
        lib.insert_for("Fe", photon_table("Fe.04p"));

        let options = LibraryOptions::default();
        let n = lib.load("Fe", ParticleType::Neutron, &options).unwrap();
        let p = lib.load("Fe", ParticleType::Photon, &options).unwrap();
        assert_eq!(n.family(), ParticleType::Neutron);
        assert_eq!(p.family(), ParticleType::Photon);
        assert_eq!(n.name(), "Fe56.70c");
        assert_eq!(p.name(), "Fe.04p");
    }

    #[test]
    fn test_unknown_alias_is_error() {
        let lib = InMemoryLibrary::new();
        let err = lib.resolve_alias("Zz-999").unwrap_err();
        assert!(matches!(err, CollisionError::UnknownScatteringCenter { .. }));
    }

    #[test]
    fn test_missing_family_table_rejected() {
        let mut lib = InMemoryLibrary::new();
        lib.insert(neutron_table("Fe56.70c"));
        let err = lib
            .load("Fe56.70c", ParticleType::Photon, &LibraryOptions::default())
            .unwrap_err();
        assert!(matches!(err, CollisionError::MalformedDataTable { .. }));
    }

    #[test]
    fn test_photonuclear_request_is_unsupported() {
        let mut lib = InMemoryLibrary::new();
        lib.insert(neutron_table("Fe56.70c"));
        let options = LibraryOptions {
            photonuclear_data: true,
            ..LibraryOptions::default()
        };
        let err = lib
            .load("Fe56.70c", ParticleType::Neutron, &options)
            .unwrap_err();
        assert!(matches!(err, CollisionError::Unsupported(_)));
    }

    #[test]
    fn test_index_alias_resolution_is_single_hop() {
        let mut index = DataTableIndex::default();
        index.entries.insert(
            "U235".to_string(),
            TableEntry {
                neutron: Some(TableLocation {
                    file_path: PathBuf::from("u235.json"),
                    table_name: "U235.70c".to_string(),
                }),
                ..TableEntry::default()
            },
        );
        index
            .aliases
            .insert("U-235".to_string(), "U235".to_string());
        index
            .aliases
            .insert("uranium".to_string(), "U-235".to_string());

        assert_eq!(index.resolve_alias("U235").unwrap(), "U235");
        assert_eq!(index.resolve_alias("U-235").unwrap(), "U235");
        // Chained aliases do not resolve
        assert!(index.resolve_alias("uranium").is_err());
    }
}
