//! Shared inputs for unit tests.

use crate::config::{GeneralConfig, LineType, Units};

/// Two mirrored chain-polyester-chain legs in 2000 m of water.
pub(crate) const TWO_LINE_SYSTEM: &str = r#"
[general]
units = "metric"
gravity = 9.81
water_density = 1025.9
water_depth = 2000.0
extra_value = 10.0

[line_types.polyester]
diameter        = 0.233
mass_per_length = 53.7
youngs_modulus = 9.15e9
internal_diameter = 0.0
internal_contents_density = 0.0

[line_types.chain]
diameter        = 0.127
mass_per_length = 293.98
youngs_modulus = 7.76e10
internal_diameter = 0.0
internal_contents_density = 0.0

[lines.Line1]
top_position    = [   30, 30, -25 ]
bottom_position = [ 1700, 10, -2000 ]
segments = [
    {line_type="chain", length=100, num_elements=10},
    {line_type="polyester", length=2600, num_elements=20},
    {line_type="chain", length=100, num_elements=10},
]

[lines.Line2]
top_position    = [   -30, -30, -25 ]
bottom_position = [ -1700, -10, -2000 ]
segments = [
    {line_type="chain", length=100, num_elements=10},
    {line_type="polyester", length=2600, num_elements=20},
    {line_type="chain", length=100, num_elements=10},
]
"#;

/// Metric units in 2000 m of seawater.
pub(crate) fn general() -> GeneralConfig {
    GeneralConfig::new(Units::Metric, 9.81, 1025.9, 2000.0)
}

/// Studless chain of the fixture system.
pub(crate) fn chain() -> LineType {
    LineType::new(0.127, 293.98, 7.76e10)
}

/// Polyester rope of the fixture system.
pub(crate) fn polyester() -> LineType {
    LineType::new(0.233, 53.7, 9.15e9)
}
