//! Best-effort script import
//!
//! Nothing here fails: unknown or malformed lines are skipped and any value
//! that cannot be found falls back to the caller's defaults.

use super::tokens::{LineTokens, tokenize};
use super::{PREHEAT_TEMPERATURE, SCRIPT_EXTENSION, ScriptParameters};
use crate::error::EngraveError;
use crate::types::{BedDimensions, Point, round_tenth};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

const DEFAULT_FILE_NAME: &str = "engraving";

/// Only the first points are sampled when guessing the step size
const STEP_SAMPLE_POINTS: usize = 100;
/// Neighbours considered per sampled point
const STEP_SAMPLE_WINDOW: usize = 10;
const STEP_MIN_DISTANCE: f64 = 0.1;
const STEP_MAX_DISTANCE: f64 = 50.0;

/// Tolerance when matching a Z move against the configured plunge depth
const DEPTH_TOLERANCE: f64 = 0.1;

/// Everything recovered from a script
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScript {
    /// Unique burn points, in script order
    pub points: Vec<Point>,
    /// Bed, step and depth from the comment markers; temperature and dwell
    /// from commands; defaults where nothing was found
    pub params: ScriptParameters,
    /// Most common spacing between nearby points, or `params.step_size`
    pub suggested_step_size: f64,
    /// Output name with the script extension removed
    pub file_name: String,
    /// Lines containing tokens that could not be read
    pub skipped_lines: usize,
}

/// Split a leading decimal number (optionally signed) off `s`
fn leading_number(s: &str) -> Option<(f64, &str)> {
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
        .map_or(s.len(), |(i, _)| i);
    let value = s[..end].parse::<f64>().ok()?;
    Some((value, &s[end..]))
}

/// Text following `marker`, with leading whitespace removed
fn after_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker)
        .map(|pos| line[pos + marker.len()..].trim_start())
}

/// `<number>mm` right after the marker
fn marker_millimetres(line: &str, marker: &str) -> Option<f64> {
    let (value, rest) = leading_number(after_marker(line, marker)?)?;
    rest.starts_with("mm").then_some(value)
}

/// `<w>x<h>mm` (also accepts `×`) after `Bed Size:`
fn bed_size(line: &str) -> Option<BedDimensions> {
    let (width, rest) = leading_number(after_marker(line, "Bed Size:")?)?;
    let rest = rest
        .strip_prefix('x')
        .or_else(|| rest.strip_prefix('X'))
        .or_else(|| rest.strip_prefix('×'))?;
    let (height, rest) = leading_number(rest)?;
    rest.starts_with("mm")
        .then_some(BedDimensions::new(width, height))
}

/// Strip the script extension: `job.gcode` -> `job`
pub fn strip_script_extension(file_name: &str) -> Option<String> {
    let suffix = format!(".{}", SCRIPT_EXTENSION);
    match file_name.rfind(&suffix) {
        Some(pos) if pos > 0 => Some(file_name[..pos].to_string()),
        _ => None,
    }
}

/// Most frequent 0.1-rounded distance between nearby points.
///
/// Looks at the first 100 points and, for each, the next 9 points in
/// order. Ties go to the smallest distance.
pub fn suggest_step_size(points: &[Point]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }

    let mut distances = Vec::new();
    for i in 0..STEP_SAMPLE_POINTS.min(points.len() - 1) {
        for j in i + 1..(i + STEP_SAMPLE_WINDOW).min(points.len()) {
            let dist = points[i].distance(&points[j]);
            if dist > STEP_MIN_DISTANCE && dist < STEP_MAX_DISTANCE {
                distances.push(dist);
            }
        }
    }

    distances.sort_by(f64::total_cmp);

    let mut counts: HashMap<i64, usize> = HashMap::new();
    let mut best: Option<(i64, usize)> = None;
    for d in distances {
        let key = (d * 10.0).round() as i64;
        let count = counts.entry(key).or_insert(0);
        *count += 1;
        if best.is_none_or(|(_, max)| *count > max) {
            best = Some((key, *count));
        }
    }

    best.map(|(key, _)| key as f64 / 10.0)
}

/// Temperature heuristic state.
///
/// Some machine profiles preheat to 170 before heating to the real target;
/// the first value above 170 after such a preheat wins. Otherwise the
/// first non-zero value is used.
#[derive(Default)]
struct TemperatureScan {
    preheat_seen: bool,
    first_nonzero: Option<u32>,
    after_preheat: Option<u32>,
}

impl TemperatureScan {
    fn observe(&mut self, temp: u32) {
        if self.after_preheat.is_some() {
            return;
        }
        if temp == PREHEAT_TEMPERATURE {
            self.preheat_seen = true;
        } else if self.preheat_seen && temp > PREHEAT_TEMPERATURE {
            self.after_preheat = Some(temp);
        } else if !self.preheat_seen && temp > 0 && self.first_nonzero.is_none() {
            self.first_nonzero = Some(temp);
        }
    }

    fn result(&self) -> Option<u32> {
        self.after_preheat.or(self.first_nonzero)
    }
}

fn is_move(tokens: &LineTokens) -> bool {
    tokens.is_command('G', 0.0) || tokens.is_command('G', 1.0)
}

fn is_heat(tokens: &LineTokens) -> bool {
    tokens.is_command('M', 104.0) || tokens.is_command('M', 109.0)
}

/// Recover points and parameters from script text
pub fn parse_script(
    text: &str,
    file_name: Option<&str>,
    defaults: &ScriptParameters,
) -> ParsedScript {
    let mut params = *defaults;

    for line in text.lines() {
        if let Some(bed) = bed_size(line) {
            params.bed = bed;
        }
        if let Some(step) = marker_millimetres(line, "Resolution:") {
            params.step_size = step;
        }
        if let Some(depth) = marker_millimetres(line, "Engraving Z:") {
            params.depth_z = depth;
        }
    }

    let mut temperature = TemperatureScan::default();
    let mut dwell: Option<f64> = None;
    let mut current_x: Option<f64> = None;
    let mut current_y: Option<f64> = None;
    let mut seen = HashSet::new();
    let mut points = Vec::new();
    let mut skipped_lines = 0;

    for (line_no, line) in text.lines().enumerate() {
        let tokens = tokenize(line);
        if tokens.rejected > 0 {
            skipped_lines += 1;
            let err =
                EngraveError::MalformedScript(format!("line {}: {}", line_no + 1, line.trim()));
            debug!("{}", err);
        }
        if tokens.is_empty() {
            continue;
        }

        if is_heat(&tokens) {
            if let Some(s) = tokens.value('S').filter(|s| *s >= 0.0) {
                temperature.observe(s as u32);
            }
        } else if tokens.is_command('G', 4.0) {
            if dwell.is_none() {
                dwell = tokens.value('S');
            }
        } else if is_move(&tokens) {
            if let Some(x) = tokens.value('X') {
                current_x = Some(x);
            }
            if let Some(y) = tokens.value('Y') {
                current_y = Some(y);
            }

            let (Some(x), Some(y), Some(z)) = (current_x, current_y, tokens.value('Z')) else {
                continue;
            };
            let is_plunge = z < 0.0 || (z - params.depth_z).abs() < DEPTH_TOLERANCE;
            if is_plunge {
                let point = Point::manual(round_tenth(x), round_tenth(y));
                if seen.insert(point.key()) {
                    points.push(point);
                }
            }
        }
    }

    params.temperature = temperature.result().unwrap_or(defaults.temperature);
    params.dwell_time = dwell.unwrap_or(defaults.dwell_time);

    let suggested_step_size = suggest_step_size(&points).unwrap_or(params.step_size);
    let file_name = file_name
        .and_then(strip_script_extension)
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

    info!(
        points = points.len(),
        skipped_lines,
        file_name = %file_name,
        "imported script"
    );

    ParsedScript {
        points,
        params,
        suggested_step_size,
        file_name,
        skipped_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ScriptParameters {
        ScriptParameters {
            bed: BedDimensions::new(100.0, 100.0),
            temperature: 250,
            dwell_time: 5.0,
            depth_z: -0.3,
            step_size: 1.0,
        }
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("-0.5mm"), Some((-0.5, "mm")));
        assert_eq!(leading_number("256x256mm"), Some((256.0, "x256mm")));
        assert_eq!(leading_number("mm"), None);
        assert_eq!(leading_number("1-2"), Some((1.0, "-2")));
    }

    #[test]
    fn test_comment_markers() {
        assert_eq!(
            bed_size(";===== Bed Size: 220x180mm ====="),
            Some(BedDimensions::new(220.0, 180.0))
        );
        assert_eq!(
            bed_size("; Bed Size: 220×180.5mm"),
            Some(BedDimensions::new(220.0, 180.5))
        );
        assert_eq!(bed_size("; Bed Size: 220 by 180"), None);
        assert_eq!(marker_millimetres("; Resolution: 1.5mm", "Resolution:"), Some(1.5));
        assert_eq!(
            marker_millimetres(
                ";===== Safe Z: 5mm | Engraving Z: -0.7mm (relative) =====",
                "Engraving Z:"
            ),
            Some(-0.7)
        );
        assert_eq!(marker_millimetres("; Resolution: fine", "Resolution:"), None);
    }

    #[test]
    fn test_strip_script_extension() {
        assert_eq!(strip_script_extension("job.gcode"), Some("job".to_string()));
        assert_eq!(strip_script_extension("my.job.gcode"), Some("my.job".to_string()));
        assert_eq!(strip_script_extension(".gcode"), None);
        assert_eq!(strip_script_extension("job.nc"), None);
    }

    #[test]
    fn test_temperature_preheat_heuristic() {
        let script = "M104 S150\nM109 S170\nM104 S290\nM104 S0\n";
        let parsed = parse_script(script, None, &defaults());
        assert_eq!(parsed.params.temperature, 290);

        let script = "M104 S0\nM104 S260\nM109 S275\n";
        let parsed = parse_script(script, None, &defaults());
        assert_eq!(parsed.params.temperature, 260);

        let parsed = parse_script("M104 S0\n", None, &defaults());
        assert_eq!(parsed.params.temperature, 250);
    }

    #[test]
    fn test_sticky_coordinates_and_plunge() {
        let script = "\
G0 X10 Y20 F3000
G0 Z-0.30 F300
G0 Z5 F1000
G0 X11
G1 Z-0.3
G0 Y21 Z5
G0 X12 Y22 Z-1
";
        let parsed = parse_script(script, None, &defaults());
        let coords: Vec<(f64, f64)> = parsed.points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(10.0, 20.0), (11.0, 20.0), (12.0, 22.0)]);
    }

    #[test]
    fn test_positive_depth_matches_configured() {
        let mut params = defaults();
        params.depth_z = 0.2;
        let script = "G0 X1 Y1\nG0 Z0.25\nG0 X2 Y2\nG0 Z0.5\n";
        let parsed = parse_script(script, None, &params);
        assert_eq!(parsed.points, vec![Point::manual(1.0, 1.0)]);
    }

    #[test]
    fn test_duplicates_removed() {
        let script = "G0 X1.04 Y1\nG0 Z-1\nG0 X1.0 Y1\nG0 Z-1\n";
        let parsed = parse_script(script, None, &defaults());
        assert_eq!(parsed.points.len(), 1);
    }

    #[test]
    fn test_malformed_lines_fall_back() {
        let script = "garbage here\nG0 X1..2 Y3\nG4 Sx\n";
        let parsed = parse_script(script, Some("broken.gcode"), &defaults());
        assert!(parsed.points.is_empty());
        assert_eq!(parsed.params, defaults());
        assert_eq!(parsed.suggested_step_size, 1.0);
        assert_eq!(parsed.file_name, "broken");
        assert_eq!(parsed.skipped_lines, 3);
    }

    #[test]
    fn test_first_dwell_wins() {
        let parsed = parse_script("G4 S7\nG4 S9\n", None, &defaults());
        assert_eq!(parsed.params.dwell_time, 7.0);
    }

    #[test]
    fn test_suggest_step_size() {
        let points: Vec<Point> = (0..20).map(|i| Point::manual(i as f64 * 2.5, 0.0)).collect();
        assert_eq!(suggest_step_size(&points), Some(2.5));
        assert_eq!(suggest_step_size(&points[..1]), None);

        // Equal counts: smallest distance wins
        let points = vec![
            Point::manual(0.0, 0.0),
            Point::manual(1.0, 0.0),
            Point::manual(3.0, 0.0),
        ];
        assert_eq!(suggest_step_size(&points), Some(1.0));
    }
}
