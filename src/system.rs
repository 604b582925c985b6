//! Solving every line of a mooring system.

use std::path::Path;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, Line};
use crate::errors::{ConfigError, LineError, SystemError};
use crate::geometry::Point;
use crate::mesh::LineMesh;
use crate::shooting::{Equilibrium, ShootingSolver, SolverSettings};

/// A point of a solved line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Node {
    /// Position in global coordinates.
    pub coords: Point,
    /// Axial tension at the node.
    pub tension: f64,
}

/// Key figures of a solved line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSummary {
    /// Name of the line.
    pub name: String,
    /// Unstretched length of the line.
    pub length: f64,
    /// Tension at the anchor.
    pub bottom_tension: f64,
    /// Tension at the fairlead.
    pub top_tension: f64,
    /// Largest tension along the line.
    pub max_tension: f64,
    /// Horizontal force component, constant along the line.
    pub horizontal_force: f64,
    /// Number of Newton iterations that were needed.
    pub iterations: usize,
}

/// A set of mooring lines sharing one configuration.
///
/// Lines are independent of each other, so they are solved in parallel. The
/// system holds no state between solves.
#[derive(Clone, Debug)]
pub struct MooringSystem {
    /// Lines, line types and general parameters.
    config: Config,
    /// Settings used for every line.
    settings: SolverSettings,
}

impl MooringSystem {
    /// Wrap a configuration, using its solver settings.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let settings = *config.solver_settings();
        Self { config, settings }
    }

    /// Load the configuration from a TOML file and create a new instance.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] raised by [`Config::from_file`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Config::from_file(path).map(Self::new)
    }

    /// Replace the solver settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a setting is out of range.
    pub fn with_settings(mut self, settings: SolverSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    /// The configuration being solved.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Settings used for every line.
    #[must_use]
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Solve one line and return its planar equilibrium.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::UnknownLine`] when `name` is not a line of this system,
    /// otherwise the mesh or solver failure of the line.
    pub fn equilibrium(&self, name: &str) -> Result<Equilibrium, LineError> {
        let line = self
            .config
            .lines()
            .get(name)
            .ok_or_else(|| LineError::UnknownLine(name.to_string()))?;
        self.solve_equilibrium(name, line)
            .map(|(_, equilibrium)| equilibrium)
    }

    /// Solve one line and return its nodes, bottom first.
    ///
    /// # Errors
    ///
    /// See [`MooringSystem::equilibrium`].
    pub fn solve_line(&self, name: &str) -> Result<Vec<Node>, LineError> {
        let line = self
            .config
            .lines()
            .get(name)
            .ok_or_else(|| LineError::UnknownLine(name.to_string()))?;
        self.solve_nodes(name, line)
    }

    /// Solve every line, keeping each line's outcome.
    ///
    /// A failing line does not affect the others. Results are keyed by line name
    /// in configuration order.
    #[must_use]
    pub fn solve_all(&self) -> IndexMap<String, Result<Vec<Node>, LineError>> {
        self.solve_each(|name, line| self.solve_nodes(name, line))
    }

    /// Solve every line, failing if any line fails.
    ///
    /// Every line is attempted before reporting, so the error always names the
    /// first failing line in configuration order, together with the number of
    /// failing lines. Use [`MooringSystem::solve_all`] to keep partial results.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::LineFailed`] when at least one line has no solution.
    ///
    /// # Examples
    /// ```
    /// use rusty_mooring::{Config, MooringSystem};
    ///
    /// let config = Config::from_toml_str(
    ///     r#"
    ///     [general]
    ///     units = "metric"
    ///     gravity = 9.81
    ///     water_density = 1025.0
    ///
    ///     [line_types.chain]
    ///     diameter = 0.1
    ///     mass_per_length = 200.0
    ///     youngs_modulus = 1.0e11
    ///
    ///     [lines.bow]
    ///     bottom_position = [400, 0, -200]
    ///     top_position = [0, 0, -10]
    ///     segments = [{ line_type = "chain", length = 500, num_elements = 25 }]
    ///     "#,
    /// )
    /// .expect("valid configuration");
    ///
    /// let results = MooringSystem::new(config).solve_static().expect("line converges");
    /// let nodes = &results["bow"];
    /// assert_eq!(nodes.len(), 26);
    /// assert_eq!(nodes[0].coords.x, 400.0);
    /// assert!(nodes[25].tension > nodes[0].tension);
    /// ```
    pub fn solve_static(&self) -> Result<IndexMap<String, Vec<Node>>, SystemError> {
        let results = self.solve_all();
        let failures = results.values().filter(|result| result.is_err()).count();
        let mut solved = IndexMap::with_capacity(results.len());
        for (name, result) in results {
            match result {
                Ok(nodes) => {
                    solved.insert(name, nodes);
                }
                Err(source) => {
                    return Err(SystemError::LineFailed {
                        line: name,
                        failures,
                        source,
                    });
                }
            }
        }
        Ok(solved)
    }

    /// Solve every line and reduce each outcome to its key figures.
    #[must_use]
    pub fn summarize(&self) -> IndexMap<String, Result<LineSummary, LineError>> {
        self.solve_each(|name, line| {
            let (mesh, equilibrium) = self.solve_equilibrium(name, line)?;
            Ok(LineSummary {
                name: name.to_string(),
                length: mesh.total_length(),
                bottom_tension: equilibrium.bottom_tension(),
                top_tension: equilibrium.top_tension(),
                max_tension: equilibrium.max_tension(),
                horizontal_force: equilibrium.horizontal_force,
                iterations: equilibrium.iterations(),
            })
        })
    }

    /// Run `solve` on every line in parallel and log the lines that failed.
    ///
    /// Failures are logged on the calling thread, in configuration order.
    fn solve_each<T, F>(&self, solve: F) -> IndexMap<String, Result<T, LineError>>
    where
        T: Send,
        F: Fn(&str, &Line) -> Result<T, LineError> + Sync,
    {
        let lines: Vec<(&String, &Line)> = self.config.lines().iter().collect();
        let results: Vec<(String, Result<T, LineError>)> = lines
            .par_iter()
            .map(|(name, line)| ((*name).clone(), solve(name, line)))
            .collect();
        for (name, result) in &results {
            if let Err(error) = result {
                warn!(line = %name, %error, "line has no static equilibrium");
            }
        }
        results.into_iter().collect()
    }

    /// Mesh and solve one line.
    fn solve_equilibrium(
        &self,
        name: &str,
        line: &Line,
    ) -> Result<(LineMesh, Equilibrium), LineError> {
        let mesh = LineMesh::build(line, &self.config.catalog(), self.config.general())?;
        let equilibrium = ShootingSolver::new(&mesh, self.settings).solve()?;
        info!(
            line = name,
            iterations = equilibrium.iterations(),
            bottom_tension = equilibrium.bottom_tension(),
            top_tension = equilibrium.top_tension(),
            "line converged"
        );
        Ok((mesh, equilibrium))
    }

    /// Solve one line and place its nodes in global coordinates.
    fn solve_nodes(&self, name: &str, line: &Line) -> Result<Vec<Node>, LineError> {
        let (mesh, equilibrium) = self.solve_equilibrium(name, line)?;
        Ok(place_nodes(line, &mesh, &equilibrium))
    }
}

/// Map the planar profile into global coordinates.
///
/// The end nodes are pinned to the prescribed end points; the top node is
/// already within the solver tolerance of its position.
fn place_nodes(line: &Line, mesh: &LineMesh, equilibrium: &Equilibrium) -> Vec<Node> {
    let frame = mesh.frame();
    let last = equilibrium.profile.nodes.len().saturating_sub(1);
    equilibrium
        .profile
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let coords = if index == 0 {
                line.bottom_position
            } else if index == last {
                line.top_position
            } else {
                frame.embed(node.horizontal, node.vertical)
            };
            Node {
                coords,
                tension: node.tension,
            }
        })
        .collect()
}
