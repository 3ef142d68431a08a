//! Calibration grid: dwell time varies along X, plunge depth along Y
//!
//! Burning one grid shows which time/depth combination gives the wanted
//! dot on a given wood.

use super::emit::{burn_block, heating_block, leveling_block, trailer};
use super::{fmt_coord, fmt_num};
use crate::bounds::Bounds;
use crate::types::{BedDimensions, Point};
use tracing::info;

/// Assumed travel and plunge overhead per test point, in seconds
const CELL_OVERHEAD_SECONDS: f64 = 3.0;

/// Grid parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestGrid {
    pub time_start: f64,
    pub time_step: f64,
    /// Number of columns
    pub time_count: u32,
    pub depth_start: f64,
    pub depth_step: f64,
    /// Number of rows
    pub depth_count: u32,
    pub spacing: f64,
    pub temperature: u32,
}

impl Default for TestGrid {
    fn default() -> Self {
        Self {
            time_start: 2.0,
            time_step: 2.0,
            time_count: 10,
            depth_start: 0.0,
            depth_step: -0.1,
            depth_count: 10,
            spacing: 15.0,
            temperature: 300,
        }
    }
}

/// Machine-side settings for a test grid script
#[derive(Debug, Clone)]
pub struct TestGridOptions {
    pub bed: BedDimensions,
    pub offset_x: f64,
    pub offset_y: f64,
    pub y_acceleration: u32,
    pub start_gcode: String,
    pub use_bed_leveling: bool,
}

impl Default for TestGridOptions {
    fn default() -> Self {
        Self {
            bed: BedDimensions::default(),
            offset_x: 0.0,
            offset_y: 0.0,
            y_acceleration: 1000,
            start_gcode: String::new(),
            use_bed_leveling: true,
        }
    }
}

/// One burn of the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestCell {
    pub row: u32,
    pub col: u32,
    pub x: f64,
    pub y: f64,
    pub depth: f64,
    pub time: f64,
}

impl TestGrid {
    pub fn total_points(&self) -> u32 {
        self.time_count * self.depth_count
    }

    pub fn width(&self) -> f64 {
        self.time_count.saturating_sub(1) as f64 * self.spacing
    }

    pub fn height(&self) -> f64 {
        self.depth_count.saturating_sub(1) as f64 * self.spacing
    }

    pub fn time_at(&self, col: u32) -> f64 {
        self.time_start + col as f64 * self.time_step
    }

    pub fn depth_at(&self, row: u32) -> f64 {
        self.depth_start + row as f64 * self.depth_step
    }

    /// Grid footprint centred on the bed plus offset
    pub fn bounds(&self, options: &TestGridOptions) -> Bounds {
        let start_x = (options.bed.width - self.width()) / 2.0 + options.offset_x;
        let start_y = (options.bed.height - self.height()) / 2.0 + options.offset_y;
        Bounds::new(
            start_x,
            start_y,
            start_x + self.width(),
            start_y + self.height(),
        )
    }

    /// Cells in burn order: row by row, columns left to right
    pub fn cells(&self, options: &TestGridOptions) -> Vec<TestCell> {
        let bounds = self.bounds(options);
        let mut cells = Vec::with_capacity(self.total_points() as usize);
        for row in 0..self.depth_count {
            for col in 0..self.time_count {
                cells.push(TestCell {
                    row,
                    col,
                    x: bounds.min_x + col as f64 * self.spacing,
                    y: bounds.min_y + row as f64 * self.spacing,
                    depth: self.depth_at(row),
                    time: self.time_at(col),
                });
            }
        }
        cells
    }

    /// Cell positions as manual points, for previews
    pub fn points(&self, options: &TestGridOptions) -> Vec<Point> {
        self.cells(options)
            .iter()
            .map(|c| Point::manual(c.x, c.y))
            .collect()
    }
}

/// Serialize a calibration grid script
pub fn generate_test_grid_gcode(grid: &TestGrid, options: &TestGridOptions) -> String {
    let total = grid.total_points();
    let cells = grid.cells(options);

    let leveling = if options.use_bed_leveling && total > 0 {
        leveling_block(&grid.bounds(options))
    } else {
        String::new()
    };

    let last_time = grid.time_at(grid.time_count.saturating_sub(1));
    let last_depth = grid.depth_at(grid.depth_count.saturating_sub(1));

    let mut gcode = format!(
        ";===== Wood Engraving Test Grid Generator v{version} =====\n\
         ;\n\
         ;===== TEST GRID PARAMETERS =====\n\
         ;===== Time Range: {t0}s to {t1}s (step: {ts}s) =====\n\
         ;===== Depth Range: {d0}mm to {d1}mm (step: {ds}mm) =====\n\
         ;===== Grid Size: {cols} x {rows} = {total} points =====\n\
         ;===== Spacing: {spacing}mm =====\n\
         ;===== Y Acceleration: {accel}mm/s^2 =====\n\
         \n\
         \n\
         {preamble}\n\
         {leveling}{heating}\n\
         \n\
         ;===== TEST GRID START =====\n\
         ;===== X-axis: Time (columns) =====\n\
         ;===== Y-axis: Depth (rows) =====\n\
         \n",
        version = env!("CARGO_PKG_VERSION"),
        t0 = fmt_num(grid.time_start),
        t1 = fmt_num(last_time),
        ts = fmt_num(grid.time_step),
        d0 = fmt_num(grid.depth_start),
        d1 = fmt_coord(last_depth),
        ds = fmt_num(grid.depth_step),
        cols = grid.time_count,
        rows = grid.depth_count,
        spacing = fmt_num(grid.spacing),
        accel = options.y_acceleration,
        preamble = options.start_gcode,
        heating = heating_block(grid.temperature, options.y_acceleration),
    );

    let total_time: f64 = cells.iter().map(|c| c.time + CELL_OVERHEAD_SECONDS).sum();
    let mut elapsed = 0.0;

    for (i, cell) in cells.iter().enumerate() {
        let index = i as u32 + 1;
        let progress = (index as f64 / total as f64 * 100.0).round() as u32;
        let remaining_minutes = ((total_time - elapsed) / 60.0).ceil() as u64;
        elapsed += cell.time + CELL_OVERHEAD_SECONDS;

        gcode.push_str(&format!("M73 P{} R{}\n", progress, remaining_minutes));

        let previous = if index >= 2 {
            Some(((index - 2) as f64 / total as f64 * 100.0).floor() as u32)
        } else {
            None
        };
        if index == 1 || (progress % 10 == 0 && previous != Some(progress)) {
            gcode.push_str(&format!(
                ";===== Progress: {}% | {}/{} points | ~{}min remaining =====\n",
                progress, index, total, remaining_minutes
            ));
        }

        gcode.push_str(&format!(
            ";----- Point {index}/{total} -----\n\
             ;----- Row {row}/{rows}, Col {col}/{cols} -----\n\
             ;----- Depth: {depth}mm, Time: {time}s -----\n",
            row = cell.row + 1,
            rows = grid.depth_count,
            col = cell.col + 1,
            cols = grid.time_count,
            depth = fmt_coord(cell.depth),
            time = fmt_num(cell.time),
        ));
        gcode.push_str(&burn_block(cell.x, cell.y, cell.depth, cell.time));
    }

    gcode.push_str(&trailer("TEST GRID COMPLETE"));

    info!(points = total, "generated test grid script");
    gcode
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> TestGrid {
        TestGrid {
            time_start: 2.0,
            time_step: 1.5,
            time_count: 3,
            depth_start: 0.0,
            depth_step: -0.1,
            depth_count: 2,
            spacing: 10.0,
            temperature: 310,
        }
    }

    fn options() -> TestGridOptions {
        TestGridOptions {
            bed: BedDimensions::new(100.0, 100.0),
            offset_x: 5.0,
            offset_y: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_grid() {
        let grid = TestGrid::default();
        assert_eq!(grid.total_points(), 100);
        assert_eq!(grid.width(), 135.0);
        assert_eq!(grid.time_at(9), 20.0);
    }

    #[test]
    fn test_cells_layout() {
        let cells = small_grid().cells(&options());
        assert_eq!(cells.len(), 6);
        assert_eq!((cells[0].x, cells[0].y), (45.0, 45.0));
        assert_eq!((cells[2].x, cells[2].y), (65.0, 45.0));
        assert_eq!((cells[3].x, cells[3].y), (45.0, 55.0));
        assert_eq!(cells[2].time, 5.0);
        assert!((cells[3].depth + 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_script_contents() {
        let gcode = generate_test_grid_gcode(&small_grid(), &options());

        assert!(gcode.contains(";===== Time Range: 2s to 5s (step: 1.5s) =====\n"));
        assert!(gcode.contains(";===== Depth Range: 0mm to -0.10mm (step: -0.1mm) =====\n"));
        assert!(gcode.contains(";===== Grid Size: 3 x 2 = 6 points =====\n"));
        assert!(gcode.contains("G29 A1 X45.00 Y45.00 I20.00 J10.00\n"));
        assert!(gcode.contains("M104 S310\nM109 S310\n"));
        assert!(gcode.contains(
            ";----- Row 2/2, Col 3/3 -----\n\
             ;----- Depth: -0.10mm, Time: 5s -----\n\
             G0 Z5 F1000\n\
             G0 X65.00 Y55.00 F3000\n\
             G0 Z-0.10 F300\n\
             G4 S5\n"
        ));
        assert_eq!(gcode.matches("M73 P").count(), 6);
        assert!(gcode.ends_with("M84\n"));
    }

    #[test]
    fn test_remaining_time_counts_down() {
        let gcode = generate_test_grid_gcode(&small_grid(), &options());
        // Total: (2 + 3.5 + 5) * 2 + 6 * 3 = 39s
        assert!(gcode.contains("M73 P17 R1\n"));
        assert!(gcode.contains("M73 P100 R1\n"));
    }
}
