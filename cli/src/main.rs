use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One line per glyph: "x y onCurve, x y onCurve, ..."
    Plain,
    /// Formatted output with glyph headers and one contour per line
    Pretty,
    /// Debug output showing per-glyph bounds and point counts
    Debug,
}

#[derive(Parser)]
#[command(name = "glyph-points")]
#[command(about = "Print glyph outline points from TrueType font files", long_about = None)]
struct Args {
    /// Font file to extract outlines from
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Maximum depth of nested composite glyph references
    #[arg(short, long)]
    depth_limit: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
    format: OutputFormat,
}

fn main() {
    let args = Args::parse();

    // Build extractor with optional depth limit
    let extractor = if let Some(depth_limit) = args.depth_limit {
        glyph_points::FontExtractor::builder()
            .composite_depth_limit(depth_limit)
            .build()
    } else {
        glyph_points::FontExtractor::default()
    };

    // Extract outlines
    let output = match extractor.from_path(&args.file) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error extracting outlines from {:?}: {}", args.file, e);
            std::process::exit(1);
        }
    };

    // Print in requested format
    match args.format {
        OutputFormat::Plain => {
            print!("{}", output);
        }
        OutputFormat::Pretty => {
            print!("{}", output.to_string_pretty());
        }
        OutputFormat::Debug => {
            for (index, glyph) in output.glyphs().iter().enumerate() {
                if glyph.is_empty() {
                    println!("Glyph {}: (no outline)", index);
                    continue;
                }

                println!("Glyph {}:", index);
                println!("  Bounds: {:?}", glyph.bounds());
                for (contour_idx, contour) in glyph.contours().iter().enumerate() {
                    println!("  Contour {}: {} points", contour_idx, contour.len());
                }
            }
        }
    }
}
