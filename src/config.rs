//! Mooring system description: general parameters, line types and lines.
//!
//! A configuration is usually read from a TOML document:
//!
//! ```toml
//! [general]
//! units = "metric"
//! gravity = 9.81
//! water_density = 1025.9
//! water_depth = 2000.0
//!
//! [line_types.chain]
//! diameter = 0.127
//! mass_per_length = 293.98
//! youngs_modulus = 7.76e10
//!
//! [lines.Line1]
//! top_position = [30, 30, -25]
//! bottom_position = [1700, 10, -2000]
//! segments = [{ line_type = "chain", length = 2800, num_elements = 40 }]
//! ```
//!
//! Keys that are not part of the schema are ignored. An optional `[solver]`
//! table overrides the [`SolverSettings`] defaults.

use std::f64::consts::FRAC_PI_4;
use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::MaterialCatalog;
use crate::errors::ConfigError;
use crate::geometry::Point;
use crate::shooting::SolverSettings;

/// Unit system the configuration values are expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    /// Metres, kilograms and newtons.
    #[serde(rename = "metric", alias = "METRIC", alias = "Metric")]
    Metric,
    /// Feet, slugs and pounds-force.
    #[serde(rename = "english", alias = "ENGLISH", alias = "English")]
    English,
}

impl Units {
    /// Symbol used for lengths.
    #[must_use]
    pub fn length_symbol(self) -> &'static str {
        match self {
            Units::Metric => "m",
            Units::English => "ft",
        }
    }

    /// Symbol used for forces.
    #[must_use]
    pub fn force_symbol(self) -> &'static str {
        match self {
            Units::Metric => "N",
            Units::English => "lbf",
        }
    }
}

/// Data from the `[general]` section.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GeneralConfig {
    /// Unit system of every other value.
    pub units: Units,
    /// Gravitational acceleration.
    pub gravity: f64,
    /// Density of the surrounding water.
    pub water_density: f64,
    /// Depth of the seabed below the free surface.
    #[serde(default)]
    pub water_depth: f64,
}

impl GeneralConfig {
    /// Create the general parameters explicitly.
    #[must_use]
    pub fn new(units: Units, gravity: f64, water_density: f64, water_depth: f64) -> Self {
        Self {
            units,
            gravity,
            water_density,
            water_depth,
        }
    }

    /// Check the environment constants.
    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("general.gravity", self.gravity)?;
        require_non_negative("general.water_density", self.water_density)?;
        require_non_negative("general.water_depth", self.water_depth)
    }
}

/// Material properties of one kind of line, e.g. chain or polyester rope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LineType {
    /// Outer (volumetric) diameter.
    pub diameter: f64,
    /// Dry mass per unit length.
    pub mass_per_length: f64,
    /// Young's modulus of the load-bearing material.
    pub youngs_modulus: f64,
    /// Diameter of the internal bore, zero for solid lines.
    #[serde(default)]
    pub internal_diameter: f64,
    /// Density of the fluid filling the bore.
    #[serde(default)]
    pub internal_contents_density: f64,
}

impl LineType {
    /// Create a solid line type with no internal bore.
    #[must_use]
    pub fn new(diameter: f64, mass_per_length: f64, youngs_modulus: f64) -> Self {
        Self {
            diameter,
            mass_per_length,
            youngs_modulus,
            internal_diameter: 0.0,
            internal_contents_density: 0.0,
        }
    }

    /// Add an internal bore filled with a fluid of the given density.
    #[must_use]
    pub fn with_internal_contents(mut self, internal_diameter: f64, density: f64) -> Self {
        self.internal_diameter = internal_diameter;
        self.internal_contents_density = density;
        self
    }

    /// Load-bearing cross-sectional area, net of the internal bore.
    #[must_use]
    pub fn area(&self) -> f64 {
        FRAC_PI_4 * (self.diameter.powi(2) - self.internal_diameter.powi(2))
    }

    /// Axial stiffness `EA`.
    #[must_use]
    pub fn axial_stiffness(&self) -> f64 {
        self.youngs_modulus * self.area()
    }

    /// Weight per unit length in water, including the internal contents.
    #[must_use]
    pub fn submerged_weight(&self, general: &GeneralConfig) -> f64 {
        let displaced = general.water_density * FRAC_PI_4 * self.diameter.powi(2);
        let contents = self.internal_contents_density * FRAC_PI_4 * self.internal_diameter.powi(2);
        general.gravity * (self.mass_per_length - displaced + contents)
    }

    /// Check the properties of the line type registered as `name`.
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let field = |key: &str| format!("line_types.{name}.{key}");
        require_positive(&field("diameter"), self.diameter)?;
        require_positive(&field("mass_per_length"), self.mass_per_length)?;
        require_positive(&field("youngs_modulus"), self.youngs_modulus)?;
        require_non_negative(&field("internal_diameter"), self.internal_diameter)?;
        if self.internal_diameter >= self.diameter {
            return Err(ConfigError::InvalidValue {
                field: field("internal_diameter"),
                value: self.internal_diameter,
            });
        }
        require_non_negative(
            &field("internal_contents_density"),
            self.internal_contents_density,
        )
    }
}

/// A uniform stretch of a line made of a single line type.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Segment {
    /// Name of the [`LineType`] the segment is made of.
    pub line_type: String,
    /// Unstretched length.
    pub length: f64,
    /// Number of elements the segment is split into.
    pub num_elements: i32,
}

impl Segment {
    /// Create a segment.
    #[must_use]
    pub fn new(line_type: impl Into<String>, length: f64, num_elements: i32) -> Self {
        Self {
            line_type: line_type.into(),
            length,
            num_elements,
        }
    }
}

/// A mooring line between a fixed bottom point and a fixed top point.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Line {
    /// Attachment point at the floating structure (fairlead).
    pub top_position: Point,
    /// Anchor point.
    pub bottom_position: Point,
    /// Segments ordered from the bottom to the top.
    pub segments: Vec<Segment>,
}

impl Line {
    /// Create a line from its end points and segments, listed bottom first.
    #[must_use]
    pub fn new(bottom_position: Point, top_position: Point, segments: Vec<Segment>) -> Self {
        Self {
            top_position,
            bottom_position,
            segments,
        }
    }

    /// Total unstretched length of the line.
    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(|segment| segment.length).sum()
    }
}

/// Top level struct to hold the config data.
///
/// Every segment is guaranteed to reference a line type defined in the same
/// configuration. Lines keep the order in which they were declared.
#[derive(Clone, Debug)]
pub struct Config {
    /// Data from the `[general]` section.
    general: GeneralConfig,
    /// Line types keyed by name.
    line_types: IndexMap<String, LineType>,
    /// Lines keyed by name, in declaration order.
    lines: IndexMap<String, Line>,
    /// Settings from the optional `[solver]` section.
    solver: SolverSettings,
}

/// Document layout as it appears on disk.
#[derive(Deserialize)]
struct RawConfig {
    /// The `[general]` table.
    general: GeneralConfig,
    /// The `[line_types]` tables.
    #[serde(default)]
    line_types: IndexMap<String, LineType>,
    /// The `[lines]` tables.
    #[serde(default)]
    lines: IndexMap<String, Line>,
    /// The optional `[solver]` table.
    #[serde(default)]
    solver: SolverSettings,
}

impl Config {
    /// Build and validate a configuration held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLineType`] when a segment references a line type
    /// missing from `line_types` and [`ConfigError::InvalidValue`] when a numeric value
    /// is not physically meaningful.
    ///
    /// # Examples
    /// ```
    /// use indexmap::IndexMap;
    /// use rusty_mooring::{point, Config, GeneralConfig, Line, LineType, Segment, Units};
    ///
    /// let general = GeneralConfig::new(Units::Metric, 9.81, 1025.9, 100.0);
    /// let line_types = IndexMap::from([("chain".to_string(), LineType::new(0.127, 293.98, 7.76e10))]);
    /// let line = Line::new(
    ///     point(90.0, 0.0, -100.0),
    ///     point(0.0, 0.0, -5.0),
    ///     vec![Segment::new("chain", 150.0, 15)],
    /// );
    /// let lines = IndexMap::from([("bow".to_string(), line)]);
    ///
    /// let config = Config::new(general, line_types, lines).expect("valid configuration");
    /// assert_eq!(config.lines().len(), 1);
    /// ```
    pub fn new(
        general: GeneralConfig,
        line_types: IndexMap<String, LineType>,
        lines: IndexMap<String, Line>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            general,
            line_types,
            lines,
            solver: SolverSettings::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] when `path` does not exist,
    /// [`ConfigError::Parse`] when the document is malformed, and the validation
    /// errors described on [`Config::new`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Load the configuration from a TOML document held in memory.
    ///
    /// # Errors
    ///
    /// See [`Config::from_file`].
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Self::parse(contents, "<memory>")
    }

    /// Deserialize `contents`, naming `origin` in parse errors.
    fn parse(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source: Box::new(source),
        })?;
        Self::new(raw.general, raw.line_types, raw.lines)?.with_solver_settings(raw.solver)
    }

    /// Replace the solver settings carried by this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a setting is out of range.
    pub fn with_solver_settings(mut self, settings: SolverSettings) -> Result<Self, ConfigError> {
        settings.validate()?;
        self.solver = settings;
        Ok(self)
    }

    /// Data from the `[general]` section.
    #[must_use]
    pub fn general(&self) -> &GeneralConfig {
        &self.general
    }

    /// Line types keyed by name.
    #[must_use]
    pub fn line_types(&self) -> &IndexMap<String, LineType> {
        &self.line_types
    }

    /// Lines keyed by name, in declaration order.
    #[must_use]
    pub fn lines(&self) -> &IndexMap<String, Line> {
        &self.lines
    }

    /// Solver settings from the `[solver]` section, or the defaults.
    #[must_use]
    pub fn solver_settings(&self) -> &SolverSettings {
        &self.solver
    }

    /// Read-only view of the line types for name lookups.
    #[must_use]
    pub fn catalog(&self) -> MaterialCatalog<'_> {
        MaterialCatalog::new(&self.line_types)
    }

    /// Check every section and the line type references of every segment.
    fn validate(&self) -> Result<(), ConfigError> {
        self.general.validate()?;
        for (name, line_type) in &self.line_types {
            line_type.validate(name)?;
        }
        let catalog = self.catalog();
        for (name, line) in &self.lines {
            for (field, position) in [
                ("bottom_position", line.bottom_position),
                ("top_position", line.top_position),
            ] {
                if !position.is_finite() {
                    return Err(ConfigError::InvalidValue {
                        field: format!("lines.{name}.{field}"),
                        value: f64::NAN,
                    });
                }
            }
            if line.segments.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("lines.{name}.segments"),
                    value: 0.0,
                });
            }
            for (index, segment) in line.segments.iter().enumerate() {
                if !catalog.contains(&segment.line_type) {
                    return Err(ConfigError::UnknownLineType {
                        line: name.clone(),
                        segment: index,
                        line_type: segment.line_type.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Reject values that are not finite and strictly positive.
pub(crate) fn require_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        })
    }
}

/// Reject values that are not finite or negative.
fn require_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value,
        })
    }
}
