#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

mod catalog;
mod catenary;
mod config;
mod errors;
mod geometry;
mod mesh;
mod shooting;
mod system;

#[cfg(test)]
mod test_fixtures;

pub use catalog::MaterialCatalog;
pub use catenary::{element_response, CatenaryIntegrator, CatenaryProfile, ElementResponse, PlanarNode};
pub use config::{Config, GeneralConfig, Line, LineType, Segment, Units};
pub use errors::{ConfigError, LineError, MeshError, SolveError, SystemError};
pub use geometry::{point, PlanarFrame, Point};
pub use mesh::{Element, LineMesh};
pub use shooting::{Equilibrium, ShootingIteration, ShootingSolver, SolverSettings};
pub use system::{LineSummary, MooringSystem, Node};
