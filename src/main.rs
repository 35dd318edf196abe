//! slicer – command-line tall image → paginated PDF converter.
//!
//! Usage:
//!   slicer <input.png> [output.pdf] --page-height <px> [flags]
//!
//! If `output.pdf` is omitted the PDF is written next to the input file with
//! the same stem (e.g. `report.png` → `report.pdf`).

use std::{env, fs, path::PathBuf, process};

use pdf_slicer::pipeline::{generate_pdf, plan_pdf, PipelineOptions};
use pdf_slicer::probe::CanvasLimits;
use pdf_slicer::raster::BitmapNode;
use pdf_slicer::{GeneratorConfig, ImageType, PageOrientation, Unit};

#[derive(Default)]
struct Args {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    title: Option<String>,
    page_width: Option<u32>,
    page_height: Option<u32>,
    pdf_width: Option<f32>,
    pdf_height: Option<f32>,
    landscape: bool,
    unit: Option<Unit>,
    image_type: Option<ImageType>,
    quality: Option<f32>,
    scale: Option<f32>,
    limits: Option<CanvasLimits>,
    dry_run: bool,
}

fn main() {
    env_logger::init();

    let argv: Vec<String> = env::args().collect();
    let args = parse_args(&argv);

    let input = match &args.input {
        Some(p) => p.clone(),
        None => fail(&argv[0], "no input image specified."),
    };

    let node = match BitmapNode::open(&input) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let config = match build_config(&args, &node) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    // Default title: stem of the input filename.
    let default_title = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pdf-slicer output")
        .to_string();

    let options = PipelineOptions {
        title: args.title.clone().unwrap_or(default_title),
        limits: args.limits.unwrap_or(CanvasLimits::CHROME),
    };

    if args.dry_run {
        match plan_pdf(&node, &config, &options).and_then(|(log, _)| log.to_json()) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error planning PDF: {e}");
                process::exit(1);
            }
        }
        return;
    }

    // Default output: same directory + same stem as input, but with .pdf
    let output = args.output.clone().unwrap_or_else(|| {
        let mut o = input.clone();
        o.set_extension("pdf");
        o
    });

    match generate_pdf(&node, &config, &options) {
        Ok((bytes, report)) => {
            // Create output directory if necessary.
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        eprintln!("Error creating output directory: {e}");
                        process::exit(1);
                    }
                }
            }
            if let Err(e) = fs::write(&output, &bytes) {
                eprintln!("Error writing '{}': {e}", output.display());
                process::exit(1);
            }
            if report.probe.exhausted {
                eprintln!(
                    "Warning: no slice height passed the canvas probe; used {} px",
                    report.probe.height
                );
            }
            eprintln!(
                "Wrote '{}' ({} bytes, {} page{}, {} slice{})",
                output.display(),
                bytes.len(),
                report.pages,
                if report.pages == 1 { "" } else { "s" },
                report.slices.len(),
                if report.slices.len() == 1 { "" } else { "s" }
            );
        }
        Err(e) => {
            eprintln!("Error generating PDF: {e}");
            process::exit(1);
        }
    }
}

fn parse_args(argv: &[String]) -> Args {
    let prog = &argv[0];
    let mut args = Args::default();
    let mut positional = 0usize;

    let mut iter = argv.iter().skip(1);
    while let Some(arg) = iter.next() {
        let arg = arg.as_str();
        let mut value = |flag: &str| -> String {
            match iter.next() {
                Some(v) => v.clone(),
                None => fail(prog, &format!("{flag} needs a value.")),
            }
        };
        match arg {
            "--config" | "-c" => args.config = Some(PathBuf::from(value(arg))),
            "--title" | "-t" => args.title = Some(value(arg)),
            "--page-width" | "-w" => args.page_width = Some(number(prog, arg, &value(arg))),
            "--page-height" | "-p" => args.page_height = Some(number(prog, arg, &value(arg))),
            "--pdf-width" => args.pdf_width = Some(number(prog, arg, &value(arg))),
            "--pdf-height" => args.pdf_height = Some(number(prog, arg, &value(arg))),
            "--quality" | "-q" => args.quality = Some(number(prog, arg, &value(arg))),
            "--scale" | "-s" => args.scale = Some(number(prog, arg, &value(arg))),
            "--landscape" | "-l" => args.landscape = true,
            "--unit" | "-u" => {
                let v = value(arg);
                match Unit::parse(&v) {
                    Some(u) => args.unit = Some(u),
                    None => fail(prog, &format!("unknown unit '{v}' (pt, mm, cm, in, px).")),
                }
            }
            "--image-type" | "-i" => {
                let v = value(arg);
                match ImageType::parse(&v) {
                    Some(t) => args.image_type = Some(t),
                    None => fail(prog, &format!("unknown image type '{v}' (jpeg, png).")),
                }
            }
            "--device" | "-d" => {
                let v = value(arg);
                match CanvasLimits::preset(&v) {
                    Some(l) => args.limits = Some(l),
                    None => fail(prog, &format!("unknown device '{v}'.")),
                }
            }
            "--max-canvas-height" => {
                args.limits = Some(CanvasLimits::max_height(number(prog, arg, &value(arg))))
            }
            "--dry-run" | "-n" => args.dry_run = true,
            "--help" | "-h" => {
                print_usage(prog);
                process::exit(0);
            }
            other if other.starts_with('-') => fail(prog, &format!("unknown flag: {other}")),
            path => {
                if positional == 0 {
                    args.input = Some(PathBuf::from(path));
                } else if positional == 1 {
                    args.output = Some(PathBuf::from(path));
                } else {
                    fail(prog, &format!("unexpected argument: {path}"));
                }
                positional += 1;
            }
        }
    }
    args
}

/// Start from `--config` (or the input's width and the given page height) and
/// apply every flag on top.
fn build_config(args: &Args, node: &BitmapNode) -> pdf_slicer::Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_json(&fs::read_to_string(path)?)?,
        None => {
            let page_width = args.page_width.unwrap_or(node.width());
            let page_height = args.page_height.ok_or_else(|| {
                pdf_slicer::Error::Config("--page-height is required without --config".to_string())
            })?;
            GeneratorConfig::new(page_width, page_height)
        }
    };

    if let Some(v) = args.page_width {
        config.page_width = v;
    }
    if let Some(v) = args.page_height {
        config.page_height = v;
    }
    if let Some(v) = args.pdf_width {
        config.pdf_width = v;
    }
    if let Some(v) = args.pdf_height {
        config.pdf_height = v;
    }
    if args.landscape {
        config.orientation = PageOrientation::Landscape;
    }
    if let Some(v) = args.unit {
        config.unit = v;
    }
    if let Some(v) = args.image_type {
        config.image_type = v;
    }
    if let Some(v) = args.quality {
        config.quality = v;
    }
    if let Some(v) = args.scale {
        config.scale = v;
    }

    config.validate()?;
    Ok(config)
}

fn number<T: std::str::FromStr>(prog: &str, flag: &str, raw: &str) -> T {
    match raw.parse() {
        Ok(v) => v,
        Err(_) => fail(prog, &format!("{flag} expects a number, got '{raw}'.")),
    }
}

fn fail(prog: &str, msg: &str) -> ! {
    eprintln!("Error: {msg}");
    print_usage(prog);
    process::exit(1);
}

fn print_usage(prog: &str) {
    eprintln!("slicer – tall image to paginated PDF (pdf-slicer)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <input.png> [output.pdf] --page-height <px> [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <input.png>    PNG or JPEG rendering of the content to paginate");
    eprintln!("  [output.pdf]   Output path  (default: same stem as input with .pdf)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --config, -c         JSON generator config; flags below override it");
    eprintln!("  --page-width, -w     Content pixels per page row (default: input width)");
    eprintln!("  --page-height, -p    Content pixels per page");
    eprintln!("  --pdf-width          Page width in --unit (default: 210)");
    eprintln!("  --pdf-height         Page height in --unit (default: 297)");
    eprintln!("  --landscape, -l      Landscape page orientation");
    eprintln!("  --unit, -u           pt, mm, cm, in or px (default: mm)");
    eprintln!("  --image-type, -i     jpeg or png (default: jpeg)");
    eprintln!("  --quality, -q        JPEG quality in (0, 1] (default: 1)");
    eprintln!("  --scale, -s          Raster oversampling factor (default: 1)");
    eprintln!("  --device, -d         Canvas limits: chrome, firefox, safari, ios, unbounded");
    eprintln!("  --max-canvas-height  Canvas height limit in px (overrides --device)");
    eprintln!("  --title, -t          Document title in PDF metadata (default: input stem)");
    eprintln!("  --dry-run, -n        Print the page plan as JSON instead of writing a PDF");
    eprintln!("  --help               Print this message");
}
