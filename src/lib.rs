//! Collision physics engine for coupled neutron/photon/electron Monte Carlo
//! transport.
//!
//! The crate owns everything between "a particle is at a collision site" and
//! "the post-collision state plus banked secondaries": cross-section data
//! tables, scattering centers, filled materials, the cell-to-material
//! registry, and the reaction sampling walk. Geometry tracking and tallying
//! live with the caller; the interface is the cell id carried on each
//! [`ParticleState`].
//!
//! Typical setup goes through the factory:
//!
//! ```no_run
//! use collisions_for_mc::{
//!     CellAssignment, CollisionHandlerFactory, JsonLibrary, MaterialDefinition, ParticleMode,
//! };
//!
//! # fn run() -> collisions_for_mc::Result<()> {
//! let library = JsonLibrary::from_index_file("tables/index.json")?;
//! let factory = CollisionHandlerFactory::new(library, ParticleMode::NeutronPhoton);
//! let handler = factory.initialize_handler(
//!     &[MaterialDefinition {
//!         id: Some(1),
//!         name: "water".to_string(),
//!         constituents: vec!["H-1".to_string(), "O-16".to_string()],
//!         fractions: vec![2.0, 1.0],
//!     }],
//!     &[CellAssignment { cell: 1, material_id: 1, density: -1.0 }],
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod bank;
pub mod collision_handler;
pub mod error;
pub mod factory;
pub mod interpolation;
pub mod library;
pub mod material;
pub mod particle;
pub mod physics;
pub mod reaction;
pub mod rng;
pub mod scattering_center;

pub use bank::{FissionBank, ParticleBank, SecondaryBank};
pub use collision_handler::CollisionHandler;
pub use error::{CollisionError, Result};
pub use factory::{
    CellAssignment, CellMapValidator, CollisionHandlerFactory, GeometryModelValidator,
    MaterialDefinition,
};
pub use library::{
    DataTableIndex, IncoherentModel, InMemoryLibrary, JsonLibrary, LibraryOptions,
    ScatteringCenterProvider, ScatteringCenterTable, TableReaction,
};
pub use material::{CollisionMode, Material};
pub use particle::{CellId, ParticleMode, ParticleState, ParticleType};
pub use reaction::{
    EnergySpectrum, NuclearReactionKind, OutgoingLaw, Reaction, ReactionKind,
};
pub use rng::FastRng;
pub use scattering_center::ScatteringCenter;
