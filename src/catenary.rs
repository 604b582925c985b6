//! Forward integration of an elastic catenary along a chain of elements.
//!
//! Each element is an extensible, perfectly flexible span loaded by its own
//! submerged weight. For an element of unstretched length `L`, stiffness `EA`
//! and weight `w`, with bottom force components `(H, V₀)`, the top vertical
//! force is `V₁ = V₀ + wL` and the end displacement is
//!
//! ```text
//! dx = H·L/EA + (H/w)·(asinh(V₁/H) − asinh(V₀/H))
//! dz = (V₀·L + w·L²/2)/EA + L·(V₀ + V₁)/(T₀ + T₁)
//! ```
//!
//! where `T = √(H² + V²)`. The second `dz` term equals `(T₁ − T₀)/w` but does
//! not lose precision when `w` is small. Nearly straight elements fall back to a
//! chord approximation under the mid-element force.

use nalgebra::Vector2;

use crate::mesh::Element;

/// A node of the integrated profile, in the plane of the line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanarNode {
    /// Horizontal distance from the bottom node.
    pub horizontal: f64,
    /// Rise above the bottom node.
    pub vertical: f64,
    /// Axial tension. For a vertical line this is the magnitude of the
    /// vertical force.
    pub tension: f64,
}

/// End displacement and top force of a single element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementResponse {
    /// Horizontal displacement between the element ends.
    pub horizontal: f64,
    /// Vertical displacement between the element ends.
    pub vertical: f64,
    /// Vertical force component at the top end.
    pub top_vertical_force: f64,
}

/// Nodes of an integrated line, bottom first.
#[derive(Clone, Debug, PartialEq)]
pub struct CatenaryProfile {
    /// Nodes from the bottom end to the top end.
    pub nodes: Vec<PlanarNode>,
}

impl CatenaryProfile {
    /// Position of the top node relative to the bottom node.
    #[must_use]
    pub fn end(&self) -> Vector2<f64> {
        self.nodes
            .last()
            .map_or_else(Vector2::zeros, |node| {
                Vector2::new(node.horizontal, node.vertical)
            })
    }
}

/// Tension reported at a node carrying the given force components.
///
/// A vertical line hanging below its bottom node pulls down on it, so the
/// tension there is `|V|` even though `V` is negative.
fn node_tension(horizontal_force: f64, vertical_force: f64) -> f64 {
    horizontal_force.max(0.0).hypot(vertical_force)
}

/// Displacement across one element under bottom forces `(H, V)`.
///
/// `sag_threshold` bounds the ratio of element weight to bottom tension below
/// which the element is treated as straight.
#[must_use]
pub fn element_response(
    element: &Element,
    horizontal_force: f64,
    vertical_force: f64,
    sag_threshold: f64,
) -> ElementResponse {
    let length = element.length;
    let stiffness = element.axial_stiffness;
    let weight = element.submerged_weight;
    let h = horizontal_force.max(0.0);
    let v0 = vertical_force;
    let v1 = v0 + weight * length;
    let t0 = h.hypot(v0);
    let t1 = h.hypot(v1);

    let stretch_vertical = (v0 * length + 0.5 * weight * length * length) / stiffness;
    let (horizontal, vertical) = if h == 0.0 {
        let denominator = t0 + t1;
        let sagging = if denominator > 0.0 {
            length * (v0 + v1) / denominator
        } else {
            length
        };
        (0.0, sagging + stretch_vertical)
    } else if weight.abs() * length <= sag_threshold * t0 {
        let vm = v0 + 0.5 * weight * length;
        let tm = h.hypot(vm);
        (
            h * length / tm + h * length / stiffness,
            vm * length / tm + vm * length / stiffness,
        )
    } else {
        (
            h * length / stiffness + h / weight * ((v1 / h).asinh() - (v0 / h).asinh()),
            length * (v0 + v1) / (t0 + t1) + stretch_vertical,
        )
    };

    ElementResponse {
        horizontal,
        vertical,
        top_vertical_force: v1,
    }
}

/// Walks an element chain from its bottom end.
#[derive(Clone, Copy, Debug)]
pub struct CatenaryIntegrator<'a> {
    /// Elements from the bottom end to the top end.
    elements: &'a [Element],
    /// Weight-to-tension ratio below which elements are straight.
    sag_threshold: f64,
}

impl<'a> CatenaryIntegrator<'a> {
    /// Create an integrator over `elements`, ordered bottom first.
    #[must_use]
    pub fn new(elements: &'a [Element], sag_threshold: f64) -> Self {
        Self {
            elements,
            sag_threshold,
        }
    }

    /// Integrate the full profile for bottom forces `(H, V)`.
    #[must_use]
    pub fn integrate(&self, horizontal_force: f64, vertical_force: f64) -> CatenaryProfile {
        let mut nodes = Vec::with_capacity(self.elements.len() + 1);
        nodes.push(PlanarNode {
            horizontal: 0.0,
            vertical: 0.0,
            tension: node_tension(horizontal_force, vertical_force),
        });
        let mut position = Vector2::zeros();
        let mut vertical_force = vertical_force;
        for element in self.elements {
            let response =
                element_response(element, horizontal_force, vertical_force, self.sag_threshold);
            position += Vector2::new(response.horizontal, response.vertical);
            vertical_force = response.top_vertical_force;
            nodes.push(PlanarNode {
                horizontal: position.x,
                vertical: position.y,
                tension: node_tension(horizontal_force, vertical_force),
            });
        }
        CatenaryProfile { nodes }
    }

    /// Position of the top end relative to the bottom end for bottom forces `(H, V)`.
    ///
    /// Equivalent to `integrate(h, v).end()` without storing the nodes.
    #[must_use]
    pub fn end_point(&self, horizontal_force: f64, vertical_force: f64) -> Vector2<f64> {
        let mut position = Vector2::zeros();
        let mut vertical_force = vertical_force;
        for element in self.elements {
            let response =
                element_response(element, horizontal_force, vertical_force, self.sag_threshold);
            position += Vector2::new(response.horizontal, response.vertical);
            vertical_force = response.top_vertical_force;
        }
        position
    }
}
