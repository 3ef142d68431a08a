//! Motion script (G-code) emitter and parser
//!
//! The emitter writes point-burn programs: travel up, move, plunge, dwell,
//! retract for every point. A few comment markers (`Bed Size:`,
//! `Resolution:`, `Engraving Z:`) carry the parameters needed to re-import
//! a script, so their syntax must stay stable.

mod emit;
mod parse;
mod test_grid;
mod tokens;

use crate::types::BedDimensions;

pub use emit::{EmitOptions, SAFE_Z, estimate_seconds, generate_engraving_gcode};
pub use parse::{ParsedScript, parse_script, strip_script_extension, suggest_step_size};
pub use test_grid::{TestGrid, TestGridOptions, generate_test_grid_gcode};
pub use tokens::{LineTokens, Word, parse_word, tokenize};

/// File extension of emitted scripts
pub const SCRIPT_EXTENSION: &str = "gcode";

/// Preheat target some machine profiles issue before the real temperature.
/// Only meaningful for those profiles; see `parse_script`.
pub const PREHEAT_TEMPERATURE: u32 = 170;

/// Machine settings embedded in, and recovered from, a script
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptParameters {
    pub bed: BedDimensions,
    /// Nozzle temperature in degrees C
    pub temperature: u32,
    /// Dwell per point in seconds
    pub dwell_time: f64,
    /// Z height of the burn plunge
    pub depth_z: f64,
    /// Nominal point spacing
    pub step_size: f64,
}

impl Default for ScriptParameters {
    fn default() -> Self {
        Self {
            bed: BedDimensions::default(),
            temperature: 300,
            dwell_time: 10.0,
            depth_z: -0.5,
            step_size: 2.0,
        }
    }
}

/// Format a number the short way: `10`, `-0.5`, `2.25`
pub fn fmt_num(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{}", rounded)
}

/// Fixed two-decimal coordinate formatting
pub fn fmt_coord(value: f64) -> String {
    let value = if value.abs() < 0.005 { 0.0 } else { value };
    format!("{:.2}", value)
}

/// `<name>.gcode`
pub fn output_file_name(name: &str) -> String {
    format!("{}.{}", name, SCRIPT_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(10.0), "10");
        assert_eq!(fmt_num(-0.5), "-0.5");
        assert_eq!(fmt_num(0.1 + 0.2), "0.3");
        assert_eq!(fmt_num(-0.0), "0");
    }

    #[test]
    fn test_fmt_coord() {
        assert_eq!(fmt_coord(12.3), "12.30");
        assert_eq!(fmt_coord(-0.001), "0.00");
        assert_eq!(fmt_coord(-1.5), "-1.50");
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("engraving"), "engraving.gcode");
    }
}
