use circlr::{
    config::{ConfigStore, FileConfigStore, OutputFormat},
    geometry::Point,
    replay::{self, draw_command, ReplayReport, SampleStatus},
    stroke_generator::{StrokeGenConfig, StrokeGenerator},
};
use clap::{Parser, Subcommand};
use std::{
    error::Error,
    fs::File,
    io::{self, BufReader, Write},
    path::PathBuf,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// score freehand circle strokes
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = concat!(
        "Replays timed stroke samples through the circle scoring core: samples are gated ",
        "on spacing and pace, a circle is fitted to the stroke, and the result is ",
        "classified as green, orange or red."
    )
)]
pub struct Cli {
    /// config file to use instead of the platform default
    #[clap(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// log debug output to stderr
    #[clap(short = 'v', long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// score a recorded stroke (CSV with an x,y,t_ms header, "-" for stdin)
    Score {
        file: PathBuf,

        /// how to print the result
        #[clap(short = 'f', long, value_enum)]
        format: Option<OutputFormat>,

        /// minimum distance between accepted samples
        #[clap(long)]
        min_spacing: Option<f64>,

        /// longest allowed pause between accepted samples
        #[clap(long)]
        max_gap_ms: Option<u64>,
    },
    /// print a synthetic circle stroke as CSV
    Generate {
        #[clap(long, default_value_t = 400.0)]
        cx: f64,

        #[clap(long, default_value_t = 300.0)]
        cy: f64,

        #[clap(short = 'r', long, default_value_t = 150.0)]
        radius: f64,

        /// number of samples in the lap
        #[clap(short = 'n', long, default_value_t = 48)]
        points: usize,

        #[clap(long, default_value_t = 16.0)]
        interval_ms: f64,

        /// maximum radial wobble per sample
        #[clap(short = 'j', long, default_value_t = 0.0)]
        jitter: f64,

        #[clap(long)]
        seed: Option<u64>,

        /// write to a file instead of stdout
        #[clap(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// print the effective configuration
    Config {
        /// write the configuration to the config file
        #[clap(long)]
        save: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = store.load();

    match cli.command {
        Command::Score {
            file,
            format,
            min_spacing,
            max_gap_ms,
        } => {
            let mut session_config = config.session.clone();
            if let Some(spacing) = min_spacing {
                session_config.min_spacing = spacing;
            }
            if let Some(gap) = max_gap_ms {
                session_config.max_gap_ms = gap;
            }

            let samples = if file.as_os_str() == "-" {
                replay::read_samples(io::stdin().lock())?
            } else {
                replay::read_samples(BufReader::new(File::open(&file)?))?
            };
            info!(path = %file.display(), samples = samples.len(), "loaded stroke");

            let report = replay::replay(&samples, session_config);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            match format.unwrap_or(config.format) {
                OutputFormat::Text => render_text(&mut out, &report)?,
                OutputFormat::Json => {
                    serde_json::to_writer_pretty(&mut out, &report)?;
                    writeln!(out)?;
                }
                OutputFormat::Script => render_script(&mut out, &report)?,
            }
        }
        Command::Generate {
            cx,
            cy,
            radius,
            points,
            interval_ms,
            jitter,
            seed,
            output,
        } => {
            let generator = StrokeGenerator::new(StrokeGenConfig {
                center: Point::new(cx, cy),
                radius,
                points,
                interval_ms,
                jitter,
                seed,
            });
            let samples = generator.generate();
            match output {
                Some(path) => replay::write_samples(File::create(path)?, &samples)?,
                None => replay::write_samples(io::stdout().lock(), &samples)?,
            }
        }
        Command::Config { save } => {
            if save {
                store.save(&config)?;
                eprintln!("saved {}", store.path().display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn render_text<W: Write>(out: &mut W, report: &ReplayReport) -> io::Result<()> {
    for (i, outcome) in report.outcomes.iter().enumerate() {
        let s = &outcome.sample;
        let status = match &outcome.status {
            SampleStatus::Rejected { message, .. } => format!("rejected: {message}"),
            SampleStatus::Accepted { points } => format!("accepted ({points} points)"),
            SampleStatus::Fitted(fit) => format!(
                "circle at ({:.1}, {:.1}) r={:.1} {:.1}% {}",
                fit.center.x, fit.center.y, fit.radius, fit.quality_percent, fit.class
            ),
            SampleStatus::Hidden(fit) => {
                format!("hidden ({:.1}% containment)", fit.fit_quality)
            }
            SampleStatus::Unfit { reason, .. } => format!("no circle: {reason}"),
        };
        writeln!(out, "{:>4} {:>8.1} {:>8.1} {:>8.1}ms  {}", i, s.x, s.y, s.t_ms, status)?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{} samples, {} accepted, {} too close, {} too slow, {} invalid",
        report.samples, report.accepted, report.too_close, report.too_slow, report.invalid
    )?;
    if let (Some(avg), Some(sd)) = (report.mean_interval_ms, report.interval_std_dev_ms) {
        writeln!(out, "pace: {avg:.1}ms between samples (sd {sd:.1}ms)")?;
    }
    match &report.final_fit {
        Some(fit) => writeln!(
            out,
            "result: {}{} ({:.2}%) center ({:.2}, {:.2}) radius {:.2}",
            if report.final_shown { "" } else { "hidden, " },
            fit.class,
            fit.quality_percent,
            fit.center.x,
            fit.center.y,
            fit.radius
        ),
        None => writeln!(out, "result: no circle"),
    }
}

fn render_script<W: Write>(out: &mut W, report: &ReplayReport) -> io::Result<()> {
    for outcome in &report.outcomes {
        if let SampleStatus::Fitted(fit) = &outcome.status {
            writeln!(out, "<script>{}</script>", draw_command(fit))?;
        }
    }
    Ok(())
}
