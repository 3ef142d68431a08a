use super::{ScriptParameters, fmt_coord, fmt_num};
use crate::bounds::Bounds;
use crate::points::optimize_tour;
use crate::types::Point;
use tracing::info;

/// Travel height between burns
pub const SAFE_Z: f64 = 5.0;

/// Seconds of travel and plunge overhead per point on top of the dwell
const MOVE_OVERHEAD_SECONDS: f64 = 2.0;
const SETTLE_SECONDS: f64 = 0.5;

const GENERATOR_NAME: &str = "Wood Engraving Generator";

/// Everything the emitter needs besides the points
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub params: ScriptParameters,
    /// Acceleration limit in mm/s^2 applied before engraving
    pub y_acceleration: u32,
    /// User preamble, emitted verbatim
    pub start_gcode: String,
    /// Probe only the area covered by the points before heating
    pub use_bed_leveling: bool,
    /// Pattern name recorded in the header
    pub pattern_label: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            params: ScriptParameters::default(),
            y_acceleration: 1000,
            start_gcode: String::new(),
            use_bed_leveling: true,
            pattern_label: "square".to_string(),
        }
    }
}

/// Estimated job duration in seconds for `count` points
pub fn estimate_seconds(count: usize, dwell_time: f64) -> f64 {
    let n = count as f64;
    n * (dwell_time + MOVE_OVERHEAD_SECONDS) + n * SETTLE_SECONDS
}

/// Leveling restricted to the bounding box of the points
pub(super) fn leveling_block(bounds: &Bounds) -> String {
    format!(
        "\n;===== BED LEVELLING (minimal area) =====\n\
         G90\n\
         G21\n\
         G1 Z5 F1200\n\
         G29.2 S1\n\
         G29 A1 X{} Y{} I{} J{}\n\
         M400\n\
         M500\n",
        fmt_coord(bounds.min_x),
        fmt_coord(bounds.min_y),
        fmt_coord(bounds.width()),
        fmt_coord(bounds.height())
    )
}

/// Heating and acceleration limiting
pub(super) fn heating_block(temperature: u32, y_acceleration: u32) -> String {
    format!(
        "\n;===== HEAT TO {t}C =====\n\
         M104 S{t}\n\
         M109 S{t}\n\
         G0 Z10 F1000\n\
         \n\
         ;===== LIMIT Y ACCELERATION =====\n\
         M204 S{a} T{a}\n\
         M204 P{a}",
        t = temperature,
        a = y_acceleration
    )
}

/// Cool down, lift, home X/Y and release motors
pub(super) fn trailer(complete_label: &str) -> String {
    format!(
        ";===== {} =====\n\
         ;===== END =====\n\
         M104 S0\n\
         G0 Z30 F1000\n\
         G28 X Y\n\
         M84\n",
        complete_label
    )
}

/// Travel up, move, plunge, dwell, retract
pub(super) fn burn_block(x: f64, y: f64, depth_z: f64, dwell: f64) -> String {
    format!(
        "G0 Z{safe} F1000\n\
         G0 X{x} Y{y} F3000\n\
         G0 Z{depth} F300\n\
         G4 S{dwell}\n\
         G0 Z{safe} F1000\n\
         \n",
        safe = fmt_num(SAFE_Z),
        x = fmt_coord(x),
        y = fmt_coord(y),
        depth = fmt_coord(depth_z),
        dwell = fmt_num(dwell)
    )
}

/// Serialize bed-space points into a complete engraving script.
///
/// Points are reordered with the nearest-neighbour tour first; callers are
/// expected to have dropped points outside the bed already.
pub fn generate_engraving_gcode(points: &[Point], options: &EmitOptions) -> String {
    let params = &options.params;
    let ordered = optimize_tour(points);
    let total = ordered.len();
    let per_point = params.dwell_time + MOVE_OVERHEAD_SECONDS + SETTLE_SECONDS;
    let estimated = estimate_seconds(total, params.dwell_time);

    let leveling = match Bounds::from_points(&ordered) {
        Some(bounds) if options.use_bed_leveling => leveling_block(&bounds),
        _ => String::new(),
    };

    let mut gcode = format!(
        ";===== {name} v{version} =====\n\
         ;===== Point-burn toolpath for heated nozzle engraving =====\n\
         \n\
         \n\
         {preamble}\n\
         {leveling}{heating}\n\
         \n\
         ;===== ENGRAVING {total} POINTS =====\n\
         ;===== Estimated time: {hours}h {minutes}m =====\n\
         ;===== Bed Size: {bed_w}x{bed_h}mm =====\n\
         ;===== Resolution: {step}mm =====\n\
         ;===== Safe Z: {safe}mm | Engraving Z: {depth}mm (relative to bed surface) =====\n\
         ;===== Y Acceleration: {accel}mm/s^2 =====\n\
         ;===== Point Pattern: {pattern} =====\n\
         \n",
        name = GENERATOR_NAME,
        version = env!("CARGO_PKG_VERSION"),
        preamble = options.start_gcode,
        heating = heating_block(params.temperature, options.y_acceleration),
        hours = (estimated / 3600.0).floor(),
        minutes = ((estimated % 3600.0) / 60.0).floor(),
        bed_w = fmt_num(params.bed.width),
        bed_h = fmt_num(params.bed.height),
        step = fmt_num(params.step_size),
        safe = fmt_num(SAFE_Z),
        depth = fmt_num(params.depth_z),
        accel = options.y_acceleration,
        pattern = options.pattern_label,
    );

    for (index, point) in ordered.iter().enumerate() {
        let progress = (index as f64 / total as f64 * 100.0).round() as u32;
        let remaining = (total - index) as f64;
        let remaining_minutes = (remaining * per_point / 60.0).ceil() as u64;

        gcode.push_str(&format!("M73 P{} R{}\n", progress, remaining_minutes));

        let previous = if index == 0 {
            None
        } else {
            Some(((index - 1) as f64 / total as f64 * 100.0).floor() as u32)
        };
        if index == 0 || (progress % 10 == 0 && previous != Some(progress)) {
            gcode.push_str(&format!(
                ";===== Progress: {}% | {}/{} points | ~{}min remaining =====\n",
                progress, index, total, remaining_minutes
            ));
        }

        gcode.push_str(&burn_block(point.x, point.y, params.depth_z, params.dwell_time));
    }

    gcode.push_str(&trailer("Progress: 100% | COMPLETE"));

    info!(
        points = total,
        estimated_minutes = (estimated / 60.0).ceil(),
        "generated engraving script"
    );
    gcode
}
