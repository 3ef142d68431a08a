use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use wood_engraver::gcode::{
    EmitOptions, ScriptParameters, TestGrid, TestGridOptions, generate_engraving_gcode,
    generate_test_grid_gcode, output_file_name, parse_script,
};
use wood_engraver::pipeline::{ProcessingOptions, load_image, process_image};
use wood_engraver::points::{
    FastQrEncoder, PointPattern, QrOptions, count_by_source, generate_qr_points, to_bed_within,
};
use wood_engraver::preview::points_to_svg;
use wood_engraver::raster::{ImagePlacement, ProcessingMode};
use wood_engraver::types::{BedDimensions, GridTransform, Point};

/// Point-burn G-code generator for heated nozzle wood engraving
#[derive(Parser)]
#[command(name = "wood-engraver", version)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image into an engraving script
    Engrave {
        /// Input image (PNG or JPEG)
        image: PathBuf,

        #[command(flatten)]
        processing: ProcessingArgs,

        /// Image scale on top of fit-to-bed
        #[arg(long, default_value_t = 1.0, help_heading = "Image Placement")]
        image_scale: f64,
        #[arg(
            long,
            default_value_t = 0.0,
            allow_negative_numbers = true,
            help_heading = "Image Placement"
        )]
        image_offset_x: f64,
        #[arg(
            long,
            default_value_t = 0.0,
            allow_negative_numbers = true,
            help_heading = "Image Placement"
        )]
        image_offset_y: f64,
        /// Clockwise image rotation in degrees
        #[arg(
            long,
            default_value_t = 0.0,
            allow_negative_numbers = true,
            help_heading = "Image Placement"
        )]
        image_rotation: f64,

        /// Also burn a QR code with this text
        #[arg(long, help_heading = "QR Code")]
        qr: Option<String>,
        /// Dots per QR module edge (1-10)
        #[arg(long, help_heading = "QR Code")]
        qr_density: Option<u32>,
        #[arg(
            long,
            default_value_t = 0.0,
            allow_negative_numbers = true,
            help_heading = "QR Code"
        )]
        qr_offset_x: f64,
        #[arg(
            long,
            default_value_t = 0.0,
            allow_negative_numbers = true,
            help_heading = "QR Code"
        )]
        qr_offset_y: f64,

        #[command(flatten)]
        grid: GridArgs,

        #[command(flatten)]
        machine: MachineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Read a script back and report what it contains
    Import {
        /// Script to parse
        script: PathBuf,

        /// Write an SVG preview of the recovered points
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// Generate a script that burns only a QR code
    Qr {
        /// Text to encode
        text: String,

        /// Spacing between dots in mm
        #[arg(long, default_value_t = 2.0)]
        step: f64,
        /// Dots per module edge (1-10)
        #[arg(long)]
        density: Option<u32>,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        qr_offset_x: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        qr_offset_y: f64,

        #[command(flatten)]
        grid: GridArgs,

        #[command(flatten)]
        machine: MachineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Generate a dwell time / depth calibration grid
    TestGrid {
        #[arg(long, default_value_t = 2.0)]
        time_start: f64,
        #[arg(long, default_value_t = 2.0)]
        time_step: f64,
        #[arg(long, default_value_t = 10)]
        time_count: u32,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        depth_start: f64,
        #[arg(long, default_value_t = -0.1, allow_negative_numbers = true)]
        depth_step: f64,
        #[arg(long, default_value_t = 10)]
        depth_count: u32,
        /// Distance between test points in mm
        #[arg(long, default_value_t = 15.0)]
        spacing: f64,
        /// Grid shift from the bed centre in mm
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset_x: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        offset_y: f64,

        #[command(flatten)]
        machine: MachineArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternArg {
    Square,
    Triangle,
    Contour,
}

impl From<PatternArg> for PointPattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Square => PointPattern::Square,
            PatternArg::Triangle => PointPattern::Triangle,
            PatternArg::Contour => PointPattern::Contour,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Standard,
    Edge,
    Dither,
}

impl From<ModeArg> for ProcessingMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Standard => ProcessingMode::Standard,
            ModeArg::Edge => ProcessingMode::Edge,
            ModeArg::Dither => ProcessingMode::Dither,
        }
    }
}

#[derive(Args)]
#[command(next_help_heading = "Processing")]
struct ProcessingArgs {
    /// Spacing between burn points in mm
    #[arg(long, default_value_t = 2.0)]
    step: f64,
    /// Intensities below this are burned
    #[arg(long, default_value_t = 128)]
    threshold: u8,
    #[arg(long, value_enum, default_value = "square")]
    pattern: PatternArg,
    #[arg(long, value_enum, default_value = "standard")]
    mode: ModeArg,
    /// Burn light areas instead of dark ones
    #[arg(long)]
    invert: bool,
    /// Added to every RGB channel (-255..255)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    brightness: i16,
    #[arg(long)]
    blur: bool,
    #[arg(long)]
    sharpen: bool,
}

impl ProcessingArgs {
    fn options(&self) -> ProcessingOptions {
        ProcessingOptions {
            pattern: self.pattern.into(),
            mode: self.mode.into(),
            threshold: self.threshold,
            invert: self.invert,
            step: self.step,
            brightness: self.brightness,
            blur: self.blur,
            sharpen: self.sharpen,
        }
    }
}

/// Placement of generated points on the bed
#[derive(Args)]
#[command(next_help_heading = "Grid Placement")]
struct GridArgs {
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset_x: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    offset_y: f64,
    /// Counter-clockwise rotation around the bed centre in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rotation: f64,
}

impl GridArgs {
    fn transform(&self) -> GridTransform {
        GridTransform::new(self.offset_x, self.offset_y, self.rotation)
    }
}

#[derive(Args)]
#[command(next_help_heading = "Machine")]
struct MachineArgs {
    #[arg(long, default_value_t = 256.0)]
    bed_width: f64,
    #[arg(long, default_value_t = 256.0)]
    bed_height: f64,
    /// Nozzle temperature in degrees C
    #[arg(long, default_value_t = 300)]
    temperature: u32,
    /// Dwell per point in seconds
    #[arg(long, default_value_t = 10.0)]
    dwell: f64,
    /// Plunge height relative to the bed surface
    #[arg(long, default_value_t = -0.5, allow_negative_numbers = true)]
    depth: f64,
    /// Y acceleration limit in mm/s^2
    #[arg(long, default_value_t = 1000)]
    acceleration: u32,
    /// Skip minimal-area bed leveling
    #[arg(long)]
    no_leveling: bool,
    /// File whose contents are emitted verbatim before the job
    #[arg(long)]
    preamble: Option<PathBuf>,
}

impl MachineArgs {
    fn bed(&self) -> Result<BedDimensions> {
        if !(self.bed_width > 0.0 && self.bed_height > 0.0) {
            bail!(
                "bed size must be positive, got {}x{}",
                self.bed_width,
                self.bed_height
            );
        }
        Ok(BedDimensions::new(self.bed_width, self.bed_height))
    }

    fn preamble(&self) -> Result<String> {
        match &self.preamble {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("Failed to read preamble '{}'", path.display())),
            None => Ok(String::new()),
        }
    }

    fn emit_options(&self, step_size: f64, pattern_label: &str) -> Result<EmitOptions> {
        Ok(EmitOptions {
            params: ScriptParameters {
                bed: self.bed()?,
                temperature: self.temperature,
                dwell_time: self.dwell,
                depth_z: self.depth,
                step_size,
            },
            y_acceleration: self.acceleration,
            start_gcode: self.preamble()?,
            use_bed_leveling: !self.no_leveling,
            pattern_label: pattern_label.to_string(),
        })
    }
}

#[derive(Args)]
#[command(next_help_heading = "Output")]
struct OutputArgs {
    /// Output path; defaults to <NAME>.gcode
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Base name of the output file
    #[arg(long, default_value = "engraving")]
    name: String,
    /// Write an SVG preview of the burned points
    #[arg(long)]
    preview: Option<PathBuf>,
}

impl OutputArgs {
    fn path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(output_file_name(&self.name)))
    }

    fn write(&self, gcode: &str, points: &[Point], bed: BedDimensions) -> Result<()> {
        let path = self.path();
        fs::write(&path, gcode)
            .with_context(|| format!("Failed to write script '{}'", path.display()))?;
        info!(path = %path.display(), "wrote script");

        if let Some(preview) = &self.preview {
            write_preview(preview, points, bed)?;
        }
        Ok(())
    }
}

fn write_preview(path: &Path, points: &[Point], bed: BedDimensions) -> Result<()> {
    fs::write(path, points_to_svg(points, bed))
        .with_context(|| format!("Failed to write preview '{}'", path.display()))?;
    info!(path = %path.display(), "wrote preview");
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Engrave {
            image,
            processing,
            image_scale,
            image_offset_x,
            image_offset_y,
            image_rotation,
            qr,
            qr_density,
            qr_offset_x,
            qr_offset_y,
            grid,
            machine,
            output,
        } => {
            let placement = ImagePlacement {
                scale: image_scale,
                offset_x: image_offset_x,
                offset_y: image_offset_y,
                rotation: image_rotation,
            };
            let qr = qr.map(|text| QrOptions {
                offset_x: qr_offset_x,
                offset_y: qr_offset_y,
                density: qr_density,
                ..QrOptions::new(text, processing.step)
            });
            run_engrave(&image, &processing, &placement, qr, &grid, &machine, &output)
        }
        Commands::Import { script, preview } => run_import(&script, preview.as_deref()),
        Commands::Qr {
            text,
            step,
            density,
            qr_offset_x,
            qr_offset_y,
            grid,
            machine,
            output,
        } => {
            let options = QrOptions {
                offset_x: qr_offset_x,
                offset_y: qr_offset_y,
                density,
                ..QrOptions::new(text, step)
            };
            run_qr(&options, &grid, &machine, &output)
        }
        Commands::TestGrid {
            time_start,
            time_step,
            time_count,
            depth_start,
            depth_step,
            depth_count,
            spacing,
            offset_x,
            offset_y,
            machine,
            output,
        } => {
            let test_grid = TestGrid {
                time_start,
                time_step,
                time_count,
                depth_start,
                depth_step,
                depth_count,
                spacing,
                temperature: machine.temperature,
            };
            run_test_grid(&test_grid, (offset_x, offset_y), &machine, &output)
        }
    }
}

fn run_engrave(
    image: &Path,
    processing: &ProcessingArgs,
    placement: &ImagePlacement,
    qr: Option<QrOptions>,
    grid: &GridArgs,
    machine: &MachineArgs,
    output: &OutputArgs,
) -> Result<()> {
    let bed = machine.bed()?;
    let options = processing.options();

    let img = load_image(image)
        .with_context(|| format!("Failed to load image '{}'", image.display()))?;
    let mut points = process_image(&img, placement, &options, bed)?;

    if let Some(qr) = qr {
        let pattern = generate_qr_points(&FastQrEncoder, &qr, bed)?;
        info!(
            modules = pattern.module_count,
            size_mm = pattern.physical_size,
            "added QR code"
        );
        points.extend(pattern.points);
    }

    let on_bed = to_bed_within(&points, &grid.transform(), bed);
    let dropped = points.len() - on_bed.len();
    if dropped > 0 {
        warn!(dropped, "points outside the bed were dropped");
    }
    if on_bed.is_empty() {
        warn!("no points to engrave; check threshold, invert and placement");
    }

    let emit = machine.emit_options(options.step, options.pattern.label())?;
    let gcode = generate_engraving_gcode(&on_bed, &emit);
    output.write(&gcode, &on_bed, bed)
}

fn run_import(script: &Path, preview: Option<&Path>) -> Result<()> {
    let text = fs::read_to_string(script)
        .with_context(|| format!("Failed to read script '{}'", script.display()))?;
    let file_name = script.file_name().and_then(|n| n.to_str());
    let parsed = parse_script(&text, file_name, &ScriptParameters::default());
    let params = &parsed.params;
    let [image, manual, qr] = count_by_source(&parsed.points);

    println!("Name:         {}", parsed.file_name);
    println!(
        "Points:       {} ({} image, {} manual, {} qr)",
        parsed.points.len(),
        image,
        manual,
        qr
    );
    println!("Bed:          {}x{}mm", params.bed.width, params.bed.height);
    println!(
        "Step:         {}mm (suggested {}mm)",
        params.step_size, parsed.suggested_step_size
    );
    println!("Depth:        {}mm", params.depth_z);
    println!("Temperature:  {}C", params.temperature);
    println!("Dwell:        {}s", params.dwell_time);
    if parsed.skipped_lines > 0 {
        println!("Skipped:      {} unreadable lines", parsed.skipped_lines);
    }

    if let Some(path) = preview {
        write_preview(path, &parsed.points, params.bed)?;
    }
    Ok(())
}

fn run_qr(
    options: &QrOptions,
    grid: &GridArgs,
    machine: &MachineArgs,
    output: &OutputArgs,
) -> Result<()> {
    let bed = machine.bed()?;
    let pattern = generate_qr_points(&FastQrEncoder, options, bed)?;
    info!(
        modules = pattern.module_count,
        density = pattern.density,
        size_mm = pattern.physical_size,
        "generated QR code"
    );

    let on_bed = to_bed_within(&pattern.points, &grid.transform(), bed);
    if on_bed.len() < pattern.points.len() {
        warn!(
            dropped = pattern.points.len() - on_bed.len(),
            "QR code does not fit on the bed"
        );
    }

    let emit = machine.emit_options(options.step, "qr")?;
    let gcode = generate_engraving_gcode(&on_bed, &emit);
    output.write(&gcode, &on_bed, bed)
}

fn run_test_grid(
    test_grid: &TestGrid,
    (offset_x, offset_y): (f64, f64),
    machine: &MachineArgs,
    output: &OutputArgs,
) -> Result<()> {
    if test_grid.total_points() == 0 {
        bail!("test grid needs at least one time and one depth value");
    }

    let options = TestGridOptions {
        bed: machine.bed()?,
        offset_x,
        offset_y,
        y_acceleration: machine.acceleration,
        start_gcode: machine.preamble()?,
        use_bed_leveling: !machine.no_leveling,
    };
    let gcode = generate_test_grid_gcode(test_grid, &options);
    output.write(&gcode, &test_grid.points(&options), options.bed)
}
