//! Discretization of a line into a chain of elastic elements.

use crate::catalog::MaterialCatalog;
use crate::config::{GeneralConfig, Line};
use crate::errors::MeshError;
use crate::geometry::PlanarFrame;

/// One uniform span of a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Element {
    /// Index of the parent segment, counted from the bottom.
    pub segment: usize,
    /// Unstretched length.
    pub length: f64,
    /// Axial stiffness `EA`.
    pub axial_stiffness: f64,
    /// Weight per unit unstretched length in water.
    pub submerged_weight: f64,
}

impl Element {
    /// Total submerged weight carried by the element.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.submerged_weight * self.length
    }
}

/// The discretized form of a [`Line`], ordered from bottom to top.
#[derive(Clone, Debug, PartialEq)]
pub struct LineMesh {
    /// Elements from the bottom end to the top end.
    elements: Vec<Element>,
    /// Vertical plane through both end points.
    frame: PlanarFrame,
}

impl LineMesh {
    /// Expand the segments of `line` into elements.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidDiscretization`] for segments with a non-positive
    /// element count, [`MeshError::ZeroLengthSegment`] for segments without length,
    /// [`MeshError::UnknownLineType`] when `catalog` lacks a referenced line type and
    /// [`MeshError::NonPositiveStiffness`] when a line type cannot stretch elastically.
    pub fn build(
        line: &Line,
        catalog: &MaterialCatalog<'_>,
        general: &GeneralConfig,
    ) -> Result<Self, MeshError> {
        if line.segments.is_empty() {
            return Err(MeshError::EmptyLine);
        }
        let mut elements = Vec::new();
        for (index, segment) in line.segments.iter().enumerate() {
            if segment.num_elements <= 0 {
                return Err(MeshError::InvalidDiscretization {
                    segment: index,
                    num_elements: segment.num_elements,
                });
            }
            if !(segment.length.is_finite() && segment.length > 0.0) {
                return Err(MeshError::ZeroLengthSegment {
                    segment: index,
                    length: segment.length,
                });
            }
            let line_type = catalog.lookup(&segment.line_type)?;
            let axial_stiffness = line_type.axial_stiffness();
            if !(axial_stiffness.is_finite() && axial_stiffness > 0.0) {
                return Err(MeshError::NonPositiveStiffness {
                    line_type: segment.line_type.clone(),
                    axial_stiffness,
                });
            }
            let element = Element {
                segment: index,
                length: segment.length / f64::from(segment.num_elements),
                axial_stiffness,
                submerged_weight: line_type.submerged_weight(general),
            };
            elements.extend(std::iter::repeat(element).take(segment.num_elements as usize));
        }
        Ok(Self {
            elements,
            frame: PlanarFrame::between(line.bottom_position, line.top_position),
        })
    }

    /// Elements from the bottom end to the top end.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of nodes, one more than the number of elements.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.elements.len() + 1
    }

    /// Vertical plane through both end points.
    #[must_use]
    pub fn frame(&self) -> &PlanarFrame {
        &self.frame
    }

    /// Unstretched length of the whole line.
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.elements.iter().map(|element| element.length).sum()
    }

    /// Submerged weight of the whole line.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.elements.iter().map(Element::weight).sum()
    }

    /// Axial stiffness of a uniform line with the same length and end-to-end compliance.
    #[must_use]
    pub fn effective_stiffness(&self) -> f64 {
        let compliance: f64 = self
            .elements
            .iter()
            .map(|element| element.length / element.axial_stiffness)
            .sum();
        self.total_length() / compliance
    }
}
