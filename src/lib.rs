//! # wood-engraver
//!
//! A Rust library that turns raster images and text into point-burn
//! G-code for a heated nozzle engraving wood.
//!
//! ## Features
//!
//! - **Point extraction**: square, hexagonal or skeleton-traced points from an image
//! - **QR clusters**: scannable codes burned as dot clusters
//! - **Script emission**: nearest-neighbour ordered G-code with progress reporting
//! - **Script import**: recover points and machine parameters from a script
//!
//! ## Example - Image to G-code
//!
//! ```rust,ignore
//! use wood_engraver::{EmitOptions, ImagePlacement, ProcessingOptions, BedDimensions, GridTransform};
//! use wood_engraver::{generate_engraving_gcode, load_image, process_image, to_bed_within};
//!
//! let img = load_image("portrait.png").unwrap();
//! let bed = BedDimensions::default();
//! let grid = process_image(&img, &ImagePlacement::default(), &ProcessingOptions::default(), bed).unwrap();
//! let points = to_bed_within(&grid, &GridTransform::default(), bed);
//! let gcode = generate_engraving_gcode(&points, &EmitOptions::default());
//! std::fs::write("engraving.gcode", gcode).unwrap();
//! ```
//!
//! ## Example - Import
//!
//! ```rust,ignore
//! use wood_engraver::{ScriptParameters, parse_script};
//!
//! let text = std::fs::read_to_string("engraving.gcode").unwrap();
//! let parsed = parse_script(&text, Some("engraving.gcode"), &ScriptParameters::default());
//! println!("{} points at {}mm", parsed.points.len(), parsed.params.step_size);
//! ```

pub mod bounds;
pub mod error;
pub mod gcode;
pub mod pipeline;
pub mod points;
pub mod preview;
pub mod raster;
pub mod types;

// Re-export commonly used items
pub use error::{EngraveError, Result};
pub use gcode::{
    EmitOptions, ParsedScript, ScriptParameters, TestGrid, TestGridOptions,
    generate_engraving_gcode, generate_test_grid_gcode, parse_script,
};
pub use pipeline::{ProcessingOptions, load_image, load_image_bytes, process_image};
pub use points::{
    FastQrEncoder, PointPattern, QrOptions, QrPattern, generate_qr_points, optimize_tour,
    to_bed_within,
};
pub use preview::points_to_svg;
pub use raster::{ImagePlacement, ProcessingMode};
pub use types::{BedDimensions, GridTransform, Point, PointSource};
