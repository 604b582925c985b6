//! Shooting method for the bottom force that closes a line on its top point.
//!
//! The unknowns are the horizontal and vertical force components `(H, V)`
//! applied at the bottom node. The residual is the difference between the
//! integrated top position and the prescribed span, both expressed in the
//! vertical plane of the line. A damped Newton iteration drives the residual
//! to zero.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catenary::{CatenaryIntegrator, CatenaryProfile};
use crate::config::require_positive;
use crate::errors::{ConfigError, SolveError};
use crate::mesh::LineMesh;

/// Relative perturbation used for finite-difference derivatives.
const DIFFERENCE_STEP: f64 = 1.0e-7;

/// Smallest fraction of a Newton step tried by the line search.
const MIN_STEP_SCALE: f64 = 1.0 / 1_048_576.0;

/// Numerical settings of the shooting solver.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Allowed end-point mismatch, relative to the unstretched line length.
    pub tolerance: f64,
    /// Maximum number of Newton iterations.
    pub max_iterations: usize,
    /// Weight-to-tension ratio below which an element is treated as straight.
    pub sag_threshold: f64,
    /// Allowed negative tension, relative to the submerged weight of the line.
    pub tension_tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-6,
            max_iterations: 100,
            sag_threshold: 1.0e-6,
            tension_tolerance: 1.0e-6,
        }
    }
}

impl SolverSettings {
    /// Check that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("solver.tolerance", self.tolerance)?;
        require_positive("solver.sag_threshold", self.sag_threshold)?;
        require_positive("solver.tension_tolerance", self.tension_tolerance)?;
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "solver.max_iterations".to_string(),
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// State of one Newton iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShootingIteration {
    /// Zero-based iteration number.
    pub iteration: usize,
    /// Bottom forces `(H, V)` at the start of the iteration.
    pub forces: Vector2<f64>,
    /// End-point mismatch for `forces`.
    pub residual: Vector2<f64>,
    /// Sensitivity of the end point to `forces`.
    pub jacobian: Matrix2<f64>,
    /// Fraction of the Newton step that was accepted.
    pub step_scale: f64,
}

/// A converged line.
#[derive(Clone, Debug, PartialEq)]
pub struct Equilibrium {
    /// Horizontal force, constant along the line.
    pub horizontal_force: f64,
    /// Vertical force at the bottom node.
    pub vertical_force: f64,
    /// Integrated profile in the plane of the line.
    pub profile: CatenaryProfile,
    /// End-point mismatch of `profile`.
    pub residual: Vector2<f64>,
    /// Every Newton iteration that was taken.
    pub history: Vec<ShootingIteration>,
}

impl Equilibrium {
    /// Number of Newton iterations that were needed.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    /// Tension at the bottom node.
    #[must_use]
    pub fn bottom_tension(&self) -> f64 {
        self.profile.nodes.first().map_or(0.0, |node| node.tension)
    }

    /// Tension at the top node.
    #[must_use]
    pub fn top_tension(&self) -> f64 {
        self.profile.nodes.last().map_or(0.0, |node| node.tension)
    }

    /// Largest tension anywhere along the line.
    #[must_use]
    pub fn max_tension(&self) -> f64 {
        self.profile
            .nodes
            .iter()
            .map(|node| node.tension)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Solves for the bottom forces of one meshed line.
#[derive(Clone, Copy, Debug)]
pub struct ShootingSolver<'a> {
    /// Line being solved.
    mesh: &'a LineMesh,
    /// Numerical settings.
    settings: SolverSettings,
    /// Integrator over the elements of `mesh`.
    integrator: CatenaryIntegrator<'a>,
    /// Prescribed top position in the plane of the line.
    target: Vector2<f64>,
    /// Absolute end-point tolerance.
    tolerance: f64,
}

impl<'a> ShootingSolver<'a> {
    /// Prepare a solver for `mesh`.
    #[must_use]
    pub fn new(mesh: &'a LineMesh, settings: SolverSettings) -> Self {
        let frame = mesh.frame();
        Self {
            mesh,
            settings,
            integrator: CatenaryIntegrator::new(mesh.elements(), settings.sag_threshold),
            target: Vector2::new(frame.horizontal_span(), frame.vertical_span()),
            tolerance: settings.tolerance * mesh.total_length(),
        }
    }

    /// Straight-chord estimate of the bottom forces.
    ///
    /// The tension is what a straight line along the chord would carry, but at
    /// least half the line weight; half the weight is taken off the bottom end.
    #[must_use]
    pub fn initial_guess(&self) -> Vector2<f64> {
        let weight = self.mesh.total_weight();
        let length = self.mesh.total_length();
        let stiffness = self.mesh.effective_stiffness();
        if self.is_vertical() {
            if self.target.y >= length {
                let mean_tension = stiffness * (self.target.y / length - 1.0);
                return Vector2::new(0.0, mean_tension - 0.5 * weight);
            }
            // Slack: the excess length folds below the bottom node.
            return Vector2::new(0.0, -0.5 * weight * (length - self.target.y) / length);
        }
        let chord = self.target.norm();
        let tension = (stiffness * (chord / length - 1.0))
            .max(0.5 * weight.abs())
            .max(1.0);
        let direction = self.target / chord;
        Vector2::new(
            tension * direction.x,
            tension * direction.y - 0.5 * weight,
        )
    }

    /// Find the bottom forces that put the top node on its prescribed position.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::DidNotConverge`] when the iteration budget runs out or the
    /// line search stalls, [`SolveError::SingularJacobian`] when no Newton step exists,
    /// [`SolveError::NonFiniteState`] when integration breaks down and
    /// [`SolveError::NonPhysicalTension`] when a node tension comes out negative.
    pub fn solve(&self) -> Result<Equilibrium, SolveError> {
        if self.is_vertical() {
            self.solve_vertical()
        } else {
            self.solve_inclined()
        }
    }

    /// A span with no horizontal extent hangs straight with `H = 0`.
    fn is_vertical(&self) -> bool {
        self.target.x <= self.tolerance
    }

    /// End-point mismatch for bottom forces `forces`.
    fn residual(&self, forces: &Vector2<f64>) -> Vector2<f64> {
        self.integrator.end_point(forces.x, forces.y) - self.target
    }

    /// [`Self::residual`], failing when the integration is not finite.
    fn checked_residual(
        &self,
        forces: &Vector2<f64>,
        iteration: usize,
    ) -> Result<Vector2<f64>, SolveError> {
        let residual = self.residual(forces);
        if residual.iter().all(|value| value.is_finite()) {
            Ok(residual)
        } else {
            Err(SolveError::NonFiniteState { iteration })
        }
    }

    /// Forward-difference sensitivity of the end point to the bottom forces.
    fn jacobian(
        &self,
        forces: &Vector2<f64>,
        residual: &Vector2<f64>,
        iteration: usize,
    ) -> Result<Matrix2<f64>, SolveError> {
        let step_h = DIFFERENCE_STEP * forces.x.abs().max(1.0);
        let step_v = DIFFERENCE_STEP * forces.y.abs().max(forces.x.abs()).max(1.0);
        let column_h =
            (self.checked_residual(&(forces + Vector2::new(step_h, 0.0)), iteration)? - residual)
                / step_h;
        let column_v =
            (self.checked_residual(&(forces + Vector2::new(0.0, step_v)), iteration)? - residual)
                / step_v;
        Ok(Matrix2::from_columns(&[column_h, column_v]))
    }

    /// Halve the Newton step until the residual shrinks and `H` stays positive.
    ///
    /// Vertical lines keep `H` at zero and only need the residual to shrink.
    fn line_search(
        &self,
        forces: &Vector2<f64>,
        residual: &Vector2<f64>,
        step: &Vector2<f64>,
    ) -> Option<(Vector2<f64>, Vector2<f64>, f64)> {
        let current = residual.norm();
        let mut scale = 1.0;
        while scale >= MIN_STEP_SCALE {
            let trial = forces + step * scale;
            if trial.x > 0.0 || self.is_vertical() {
                let trial_residual = self.residual(&trial);
                if trial_residual.iter().all(|value| value.is_finite())
                    && trial_residual.norm() < current
                {
                    return Some((trial, trial_residual, scale));
                }
            }
            scale *= 0.5;
        }
        None
    }

    /// Two-unknown Newton iteration on `(H, V)`.
    fn solve_inclined(&self) -> Result<Equilibrium, SolveError> {
        let mut forces = self.initial_guess();
        let mut residual = self.checked_residual(&forces, 0)?;
        let mut history = Vec::new();

        for iteration in 0..self.settings.max_iterations {
            if residual.amax() < self.tolerance {
                return self.finish(forces, residual, history);
            }
            let jacobian = self.jacobian(&forces, &residual, iteration)?;
            let step = jacobian
                .lu()
                .solve(&(-residual))
                .filter(|step| step.iter().all(|value| value.is_finite()))
                .ok_or(SolveError::SingularJacobian { iteration })?;
            let (next, next_residual, step_scale) = self
                .line_search(&forces, &residual, &step)
                .ok_or(SolveError::DidNotConverge {
                    iterations: iteration + 1,
                    residual: residual.amax(),
                })?;
            debug!(
                iteration,
                residual = residual.amax(),
                horizontal_force = forces.x,
                vertical_force = forces.y,
                step_scale,
                "shooting iteration"
            );
            history.push(ShootingIteration {
                iteration,
                forces,
                residual,
                jacobian,
                step_scale,
            });
            forces = next;
            residual = next_residual;
        }

        if residual.amax() < self.tolerance {
            return self.finish(forces, residual, history);
        }
        Err(SolveError::DidNotConverge {
            iterations: self.settings.max_iterations,
            residual: residual.amax(),
        })
    }

    /// One-unknown Newton iteration on `V` with `H` held at zero.
    fn solve_vertical(&self) -> Result<Equilibrium, SolveError> {
        let mut forces = self.initial_guess();
        let mut residual = self.checked_residual(&forces, 0)?;
        let mut history = Vec::new();

        for iteration in 0..self.settings.max_iterations {
            if residual.y.abs() < self.tolerance {
                return self.finish(forces, residual, history);
            }
            let step_v = DIFFERENCE_STEP * forces.y.abs().max(1.0);
            let perturbed = self.checked_residual(&(forces + Vector2::new(0.0, step_v)), iteration)?;
            let slope = (perturbed.y - residual.y) / step_v;
            if slope == 0.0 || !slope.is_finite() {
                return Err(SolveError::SingularJacobian { iteration });
            }
            let step = Vector2::new(0.0, -residual.y / slope);
            let (next, next_residual, step_scale) = self
                .line_search(&forces, &residual, &step)
                .ok_or(SolveError::DidNotConverge {
                    iterations: iteration + 1,
                    residual: residual.y.abs(),
                })?;
            debug!(
                iteration,
                residual = residual.y.abs(),
                vertical_force = forces.y,
                step_scale,
                "vertical shooting iteration"
            );
            history.push(ShootingIteration {
                iteration,
                forces,
                residual,
                jacobian: Matrix2::new(0.0, 0.0, 0.0, slope),
                step_scale,
            });
            forces = next;
            residual = next_residual;
        }

        if residual.y.abs() < self.tolerance {
            return self.finish(forces, residual, history);
        }
        Err(SolveError::DidNotConverge {
            iterations: self.settings.max_iterations,
            residual: residual.y.abs(),
        })
    }

    /// Integrate the converged profile and reject negative node tensions.
    fn finish(
        &self,
        forces: Vector2<f64>,
        residual: Vector2<f64>,
        history: Vec<ShootingIteration>,
    ) -> Result<Equilibrium, SolveError> {
        let profile = self.integrator.integrate(forces.x, forces.y);
        let allowed = self.settings.tension_tolerance * self.mesh.total_weight().abs().max(1.0);
        if let Some((node, tension)) = profile
            .nodes
            .iter()
            .map(|node| node.tension)
            .enumerate()
            .find(|(_, tension)| *tension < -allowed)
        {
            return Err(SolveError::NonPhysicalTension { node, tension });
        }
        Ok(Equilibrium {
            horizontal_force: forces.x,
            vertical_force: forces.y,
            profile,
            residual,
            history,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use indexmap::IndexMap;

    use super::*;
    use crate::catalog::MaterialCatalog;
    use crate::config::{Line, LineType, Segment};
    use crate::geometry::{point, Point};
    use crate::test_fixtures::{chain, general, polyester};

    fn mesh(bottom: Point, top: Point, segments: Vec<Segment>) -> LineMesh {
        let types: IndexMap<String, LineType> = IndexMap::from([
            ("chain".to_string(), chain()),
            ("polyester".to_string(), polyester()),
        ]);
        let line = Line::new(bottom, top, segments);
        LineMesh::build(&line, &MaterialCatalog::new(&types), &general()).expect("mesh builds")
    }

    fn mooring_leg() -> LineMesh {
        mesh(
            point(1700.0, 10.0, -2000.0),
            point(30.0, 30.0, -25.0),
            vec![
                Segment::new("chain", 100.0, 10),
                Segment::new("polyester", 2600.0, 20),
                Segment::new("chain", 100.0, 10),
            ],
        )
    }

    #[test]
    fn converges_onto_the_top_point() {
        let mesh = mooring_leg();
        let solver = ShootingSolver::new(&mesh, SolverSettings::default());
        let equilibrium = solver.solve().expect("mooring leg converges");

        let tolerance = 1.0e-6 * mesh.total_length();
        let end = equilibrium.profile.end();
        assert!((end.x - mesh.frame().horizontal_span()).abs() < tolerance);
        assert!((end.y - mesh.frame().vertical_span()).abs() < tolerance);
        assert!(equilibrium.residual.amax() < tolerance);
        assert!(equilibrium.horizontal_force > 0.0);
        assert_eq!(equilibrium.profile.nodes.len(), 41);
        assert!(equilibrium.iterations() < 20);
    }

    #[test]
    fn mooring_leg_tensions_match_reference_values() {
        let mesh = mooring_leg();
        let equilibrium = ShootingSolver::new(&mesh, SolverSettings::default())
            .solve()
            .expect("mooring leg converges");

        assert_relative_eq!(equilibrium.horizontal_force, 101_486.56, max_relative = 1.0e-4);
        assert_relative_eq!(equilibrium.vertical_force, -254_717.8, max_relative = 1.0e-4);
        assert_relative_eq!(equilibrium.bottom_tension(), 274_190.9, max_relative = 1.0e-4);
        assert_relative_eq!(equilibrium.top_tension(), 559_817.0, max_relative = 1.0e-4);
        assert_relative_eq!(equilibrium.max_tension(), equilibrium.top_tension());
    }

    #[test]
    fn residual_history_decreases() {
        let mesh = mooring_leg();
        let equilibrium = ShootingSolver::new(&mesh, SolverSettings::default())
            .solve()
            .expect("mooring leg converges");

        let norms: Vec<f64> = equilibrium
            .history
            .iter()
            .map(|iteration| iteration.residual.norm())
            .collect();
        assert!(!norms.is_empty());
        for pair in norms.windows(2) {
            assert!(pair[1] < pair[0]);
        }
        for (index, iteration) in equilibrium.history.iter().enumerate() {
            assert_eq!(iteration.iteration, index);
            assert!(iteration.step_scale > 0.0 && iteration.step_scale <= 1.0);
        }
    }

    #[test]
    fn weightless_straight_line_is_solved_by_the_initial_guess() {
        let types: IndexMap<String, LineType> =
            IndexMap::from([("rod".to_string(), LineType::new(0.1, 8.05, 2.0e9))]);
        let general = crate::config::GeneralConfig::new(crate::config::Units::Metric, 9.81, 1025.0, 0.0);
        let rod = &types["rod"];
        assert!(rod.submerged_weight(&general).abs() < 1.0);

        let line = Line::new(
            point(0.0, 0.0, 0.0),
            point(6.0, 0.0, 8.1),
            vec![Segment::new("rod", 10.0, 4)],
        );
        let mesh = LineMesh::build(&line, &MaterialCatalog::new(&types), &general)
            .expect("mesh builds");
        let equilibrium = ShootingSolver::new(&mesh, SolverSettings::default())
            .solve()
            .expect("taut rod converges");

        // Hooke's law along the chord: T = EA (chord / L - 1).
        let chord = 6.0_f64.hypot(8.1);
        let expected = rod.axial_stiffness() * (chord / 10.0 - 1.0);
        assert_relative_eq!(equilibrium.bottom_tension(), expected, max_relative = 1.0e-3);
    }

    #[test]
    fn vertical_line_carries_its_own_weight() {
        let mesh = mesh(
            point(0.0, 0.0, -100.05),
            point(0.0, 0.0, 0.0),
            vec![Segment::new("chain", 100.0, 10)],
        );
        let equilibrium = ShootingSolver::new(&mesh, SolverSettings::default())
            .solve()
            .expect("vertical chain converges");

        assert_eq!(equilibrium.horizontal_force, 0.0);
        let bottom = equilibrium.bottom_tension();
        assert!(bottom > 0.0);
        let weight = mesh.elements()[0].weight();
        for (index, node) in equilibrium.profile.nodes.iter().enumerate() {
            assert_eq!(node.horizontal, 0.0);
            assert_relative_eq!(
                node.tension,
                bottom + weight * index as f64,
                max_relative = 1.0e-9
            );
        }
    }

    #[test]
    fn slack_vertical_line_folds_below_its_bottom_node() {
        let mesh = mesh(
            point(0.0, 0.0, -90.0),
            point(0.0, 0.0, 0.0),
            vec![Segment::new("chain", 100.0, 10)],
        );
        let equilibrium = ShootingSolver::new(&mesh, SolverSettings::default())
            .solve()
            .expect("a slack vertical chain hangs in tension");

        assert_eq!(equilibrium.horizontal_force, 0.0);
        assert!(equilibrium.vertical_force < 0.0);
        // The excess length hangs as a loop half of it deep below the bottom node.
        let weight_per_length = mesh.elements()[0].submerged_weight;
        assert_relative_eq!(
            equilibrium.bottom_tension(),
            0.5 * weight_per_length * (100.0 - 90.0),
            max_relative = 5.0e-3
        );
        assert_relative_eq!(equilibrium.bottom_tension(), 13_799.66, max_relative = 1.0e-4);
        assert!(equilibrium.profile.nodes[1].vertical < 0.0);
        assert!(equilibrium.profile.nodes.iter().all(|node| node.tension >= 0.0));
        assert!(equilibrium.residual.amax() < 1.0e-6 * mesh.total_length());
    }

    #[test]
    fn vertical_limit_matches_a_nearly_vertical_line() {
        let segments = || vec![Segment::new("chain", 100.0, 10)];
        let vertical = mesh(point(0.0, 0.0, -90.0), point(0.0, 0.0, 0.0), segments());
        let offset = mesh(point(0.01, 0.0, -90.0), point(0.0, 0.0, 0.0), segments());

        let vertical = ShootingSolver::new(&vertical, SolverSettings::default())
            .solve()
            .expect("vertical chain converges");
        let offset = ShootingSolver::new(&offset, SolverSettings::default())
            .solve()
            .expect("offset chain converges");
        assert_relative_eq!(
            vertical.bottom_tension(),
            offset.bottom_tension(),
            max_relative = 1.0e-4
        );
    }

    #[test]
    fn iteration_budget_is_enforced() {
        let mesh = mooring_leg();
        let settings = SolverSettings {
            max_iterations: 1,
            ..SolverSettings::default()
        };
        let error = ShootingSolver::new(&mesh, settings)
            .solve()
            .expect_err("one iteration is not enough");
        assert!(matches!(
            error,
            SolveError::DidNotConverge { iterations: 1, .. }
        ));
    }

    #[test]
    fn refining_the_mesh_keeps_the_equilibrium() {
        let coarse = mesh(
            point(1700.0, 10.0, -2000.0),
            point(30.0, 30.0, -25.0),
            vec![
                Segment::new("chain", 100.0, 1),
                Segment::new("polyester", 2600.0, 3),
                Segment::new("chain", 100.0, 2),
            ],
        );
        let settings = SolverSettings {
            tolerance: 1.0e-9,
            ..SolverSettings::default()
        };
        let coarse = ShootingSolver::new(&coarse, settings).solve().expect("converges");
        let fine = ShootingSolver::new(&mooring_leg(), settings).solve().expect("converges");
        assert_relative_eq!(
            coarse.bottom_tension(),
            fine.bottom_tension(),
            max_relative = 1.0e-7
        );
    }

    #[test]
    fn settings_are_validated() {
        assert!(SolverSettings::default().validate().is_ok());
        let zero_iterations = SolverSettings {
            max_iterations: 0,
            ..SolverSettings::default()
        };
        assert!(zero_iterations.validate().is_err());
        let bad_tolerance = SolverSettings {
            tolerance: f64::NAN,
            ..SolverSettings::default()
        };
        assert!(bad_tolerance.validate().is_err());
    }
}
