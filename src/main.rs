mod app;
mod braille;
mod cluster;
mod config;
mod error;
mod export;
mod fractal;
mod grid;
mod settings;
mod simulation;
mod ui;
mod walker;

use app::App;
use clap::{ArgAction, Parser, Subcommand};
use cluster::Cluster;
use config::AppConfig;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use error::DlaError;
use fractal::EstimationMethod;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ratatui::{backend::CrosstermBackend, Terminal};
use settings::{NeighborhoodType, SimulationSettings, SpawnMode};
use simulation::AggregationEngine;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dla-fractal")]
#[command(about = "Diffusion-Limited Aggregation on a lattice and its fractal dimension")]
struct Args {
    /// JSON config file (default: <config dir>/dla-fractal/config.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grow a cluster and write it as `x y` lines
    Run {
        /// Side length of the square grid
        #[arg(allow_negative_numbers = true)]
        grid_size: i64,

        /// Particles to attach in addition to the seed
        #[arg(allow_negative_numbers = true)]
        particle_count: i64,

        /// RNG seed for a reproducible cluster
        #[arg(long)]
        seed: Option<u64>,

        /// Output cluster file (default: cluster.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Neighborhood for steps and sticking (vonneumann, moore)
        #[arg(long, value_parser = parse_neighborhood)]
        neighborhood: Option<NeighborhoodType>,

        /// Spawn mode (circle, edges)
        #[arg(long = "spawn-mode", value_parser = parse_spawn_mode)]
        spawn_mode: Option<SpawnMode>,

        /// Give up after this many released particles
        #[arg(long = "max-attempts")]
        max_attempts: Option<usize>,

        /// Disable the kill circle; walkers are only discarded at the grid edge
        #[arg(long = "no-kill-circle")]
        no_kill_circle: bool,

        /// Also write a PNG image of the cluster
        #[arg(long)]
        png: Option<PathBuf>,

        /// Also write an animated GIF of the growth
        #[arg(long)]
        gif: Option<PathBuf>,

        /// Pixels per lattice cell for image output (1-16)
        #[arg(long, default_value = "4")]
        scale: u32,

        /// Write the effective configuration to this JSON file
        #[arg(long = "save-config")]
        save_config: Option<PathBuf>,
    },

    /// Estimate the fractal dimension of a cluster file
    Estimate {
        /// Cluster file with one `x y` pair per line
        cluster_file: PathBuf,

        /// Estimator (box, mass-radius)
        #[arg(long, default_value = "box", value_parser = parse_method)]
        method: EstimationMethod,

        /// Box sizes, comma separated (default: powers of two up to the cluster span)
        #[arg(long = "box-sizes", value_delimiter = ',')]
        box_sizes: Vec<usize>,

        /// Radii for the mass-radius estimator, comma separated
        #[arg(long, value_delimiter = ',')]
        radii: Vec<usize>,

        /// Skip the interactive viewer
        #[arg(long = "no-display")]
        no_display: bool,

        /// Print the full fit as JSON instead of a single line
        #[arg(long)]
        json: bool,

        /// Also write a PNG image of the cluster
        #[arg(long)]
        png: Option<PathBuf>,
    },
}

fn parse_neighborhood(s: &str) -> Result<NeighborhoodType, String> {
    match s.to_lowercase().as_str() {
        "vonneumann" | "von-neumann" | "4" => Ok(NeighborhoodType::VonNeumann),
        "moore" | "8" => Ok(NeighborhoodType::Moore),
        other => Err(format!("unknown neighborhood '{}' (expected vonneumann or moore)", other)),
    }
}

fn parse_spawn_mode(s: &str) -> Result<SpawnMode, String> {
    match s.to_lowercase().as_str() {
        "circle" => Ok(SpawnMode::Circle),
        "edges" | "edge" => Ok(SpawnMode::Edges),
        other => Err(format!("unknown spawn mode '{}' (expected circle or edges)", other)),
    }
}

fn parse_method(s: &str) -> Result<EstimationMethod, String> {
    match s.to_lowercase().as_str() {
        "box" | "box-counting" => Ok(EstimationMethod::BoxCounting),
        "mass-radius" | "mass" | "sandbox" => Ok(EstimationMethod::MassRadius),
        other => Err(format!("unknown method '{}' (expected box or mass-radius)", other)),
    }
}

/// Convert a CLI integer into a positive count
fn positive(value: i64, what: &str) -> Result<usize, DlaError> {
    usize::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| DlaError::InvalidArgument(format!("{} must be positive, got {}", what, value)))
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "dla_fractal=info",
        1 => "dla_fractal=debug",
        _ => "dla_fractal=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match dispatch(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load_or_default(args.config.as_deref())?;

    match args.command {
        Command::Run {
            grid_size,
            particle_count,
            seed,
            output,
            neighborhood,
            spawn_mode,
            max_attempts,
            no_kill_circle,
            png,
            gif,
            scale,
            save_config,
        } => {
            let grid_size = positive(grid_size, "grid size")?;
            let particle_count = positive(particle_count, "particle count")?;
            simulation::validate_run_args(grid_size, particle_count)?;

            // Apply CLI overrides on top of the config file
            if let Some(n) = neighborhood {
                config.settings.neighborhood = n;
            }
            if let Some(m) = spawn_mode {
                config.settings.spawn_mode = m;
            }
            if max_attempts.is_some() {
                config.settings.max_attempts = max_attempts;
            }
            if no_kill_circle {
                config.settings.escape_multiplier = None;
            }
            if let Some(path) = output {
                config.output = path;
            }

            let cluster = match seed {
                Some(s) => simulate(config.settings.clone(), StdRng::seed_from_u64(s), grid_size, particle_count)?,
                None => simulate(config.settings.clone(), rand::thread_rng(), grid_size, particle_count)?,
            };

            cluster.save_to_file(&config.output)?;
            tracing::info!(path = %config.output.display(), points = cluster.len(), "Wrote cluster file");

            let scale = scale.clamp(1, 16);
            if let Some(path) = png {
                export::write_png(&cluster, &path, scale)?;
            }
            if let Some(path) = gif {
                export::write_growth_gif(&cluster, &path, scale)?;
            }
            if let Some(path) = save_config {
                config.save_to_file(&path)?;
                tracing::info!(path = %path.display(), "Saved config");
            }
            Ok(())
        }

        Command::Estimate {
            cluster_file,
            method,
            box_sizes,
            radii,
            no_display,
            json,
            png,
        } => {
            let cluster = Cluster::load_from_file(&cluster_file)?;
            tracing::info!(
                path = %cluster_file.display(),
                points = cluster.len(),
                radius = cluster.radius(),
                "Loaded cluster"
            );

            let box_sizes = pick_scales(box_sizes, &config.box_sizes, "box sizes", || fractal::default_box_sizes(&cluster))?;
            // The viewer can switch to mass-radius, so it needs radii too
            let radii = if method == EstimationMethod::MassRadius || !no_display {
                pick_scales(radii, &config.radii, "radii", || fractal::default_radii(&cluster))?
            } else {
                Vec::new()
            };

            let source = cluster_file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| cluster_file.display().to_string());
            let mut app = App::new(cluster, source, method, box_sizes, radii);

            if !no_display {
                run_viewer(&mut app)?;
            }

            if let Some(path) = png {
                export::write_png(&app.cluster, &path, 4)?;
            }

            match app.fit {
                Ok(fit) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&fit)?);
                    } else {
                        println!("Estimated fractal dimension: {:.4}", fit.dimension);
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(method = app.method.name(), "No fractal dimension produced");
                    Err(e.into())
                }
            }
        }
    }
}

/// CLI scales win over config scales, which win over the derived default
fn pick_scales(
    cli: Vec<usize>,
    configured: &[usize],
    what: &str,
    default: impl FnOnce() -> Vec<usize>,
) -> Result<Vec<usize>, DlaError> {
    let scales = if !cli.is_empty() {
        cli
    } else if !configured.is_empty() {
        configured.to_vec()
    } else {
        default()
    };
    if scales.contains(&0) {
        return Err(DlaError::InvalidArgument(format!("{} must be positive", what)));
    }
    Ok(scales)
}

fn simulate<R: Rng>(
    settings: SimulationSettings,
    rng: R,
    grid_size: usize,
    particle_count: usize,
) -> Result<Cluster, DlaError> {
    let mut engine = AggregationEngine::new(settings, rng);
    let cluster = engine.run(grid_size, particle_count)?;
    let stats = engine.stats();
    tracing::debug!(attempts = stats.attempts, escapes = stats.escapes, steps = stats.steps, "Run statistics");
    Ok(cluster)
}

/// Interactive cluster + fit viewer; returns when the user quits
fn run_viewer(app: &mut App) -> io::Result<()> {
    enable_raw_mode()?;
    with_cleanup(|| viewer_session(app), restore_terminal)
}

/// Run `session`, then `cleanup` whether or not the session failed.
/// The session error wins over a cleanup error.
fn with_cleanup<T>(
    session: impl FnOnce() -> io::Result<T>,
    cleanup: impl FnOnce() -> io::Result<()>,
) -> io::Result<T> {
    let res = session();
    let restored = cleanup();
    let value = res?;
    restored?;
    Ok(value)
}

fn viewer_session(app: &mut App) -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    viewer_loop(&mut terminal, app)
}

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen, cursor::Show)
}

fn viewer_loop<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    const POLL_INTERVAL: Duration = Duration::from_millis(50);

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            // Only process Press events
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(());
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                KeyCode::Esc => {
                    if app.show_help {
                        app.toggle_help();
                    } else {
                        return Ok(());
                    }
                }
                KeyCode::Char('m') | KeyCode::Char('M') => app.toggle_method(),
                KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
                KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => app.toggle_help(),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run() {
        let args = Args::try_parse_from(["dla-fractal", "run", "50", "10", "--seed", "7"]).unwrap();
        match args.command {
            Command::Run { grid_size, particle_count, seed, .. } => {
                assert_eq!((grid_size, particle_count, seed), (50, 10, Some(7)));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cli_parses_estimate_box_sizes() {
        let args = Args::try_parse_from([
            "dla-fractal",
            "estimate",
            "cluster.txt",
            "--box-sizes",
            "1,2,4",
            "--no-display",
        ])
        .unwrap();
        match args.command {
            Command::Estimate { box_sizes, no_display, .. } => {
                assert_eq!(box_sizes, vec![1, 2, 4]);
                assert!(no_display);
            }
            _ => panic!("expected estimate"),
        }
    }

    #[test]
    fn test_negative_counts_are_invalid_arguments() {
        let args = Args::try_parse_from(["dla-fractal", "run", "-5", "10"]).unwrap();
        match args.command {
            Command::Run { grid_size, .. } => {
                assert!(matches!(positive(grid_size, "grid size"), Err(DlaError::InvalidArgument(_))));
            }
            _ => panic!("expected run"),
        }
        assert!(positive(0, "particle count").is_err());
        assert_eq!(positive(3, "particle count").unwrap(), 3);
    }

    #[test]
    fn test_pick_scales_precedence() {
        let derived = || vec![1, 2, 4, 8];
        assert_eq!(pick_scales(vec![3, 6], &[2, 4], "box sizes", derived).unwrap(), vec![3, 6]);
        assert_eq!(pick_scales(vec![], &[2, 4], "box sizes", derived).unwrap(), vec![2, 4]);
        assert_eq!(pick_scales(vec![], &[], "box sizes", derived).unwrap(), vec![1, 2, 4, 8]);
        assert!(pick_scales(vec![0, 2], &[], "box sizes", derived).is_err());
    }

    #[test]
    fn test_parsers_accept_known_names() {
        assert_eq!(parse_neighborhood("Moore"), Ok(NeighborhoodType::Moore));
        assert_eq!(parse_neighborhood("vonneumann"), Ok(NeighborhoodType::VonNeumann));
        assert_eq!(parse_spawn_mode("EDGES"), Ok(SpawnMode::Edges));
        assert_eq!(parse_method("mass-radius"), Ok(EstimationMethod::MassRadius));
        assert_eq!(parse_method("box"), Ok(EstimationMethod::BoxCounting));
    }

    #[test]
    fn test_unknown_enum_values_are_rejected() {
        assert!(parse_neighborhood("bogus").is_err());
        assert!(parse_spawn_mode("spiral").is_err());
        assert!(parse_method("mass_radius").is_err());

        let result = Args::try_parse_from(["dla-fractal", "estimate", "cluster.txt", "--method", "mass_radius"]);
        assert!(result.is_err());
        let result = Args::try_parse_from(["dla-fractal", "run", "50", "10", "--neighborhood", "hex"]);
        assert!(result.is_err());
    }

    /// Default config written to `dir` so tests do not pick up the user's config
    fn isolated_config(dir: &std::path::Path) -> String {
        let path = dir.join("config.json");
        AppConfig::default().save_to_file(&path).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_run_command_writes_seed_first_cluster_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = isolated_config(dir.path());
        let output = dir.path().join("cluster.txt");
        let output_arg = output.display().to_string();

        let args = Args::try_parse_from([
            "dla-fractal", "--config", config.as_str(), "run", "30", "20", "--seed", "5", "--output", output_arg.as_str(),
        ])
        .unwrap();
        dispatch(args).unwrap();

        let text = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 21);
        assert_eq!(lines[0], "15 15");

        let loaded = Cluster::load_from_file(&output).unwrap();
        assert_eq!(loaded.len(), 21);
    }

    #[test]
    fn test_estimate_command_on_single_point_is_insufficient_data() {
        let dir = tempfile::tempdir().unwrap();
        let config = isolated_config(dir.path());
        let cluster_file = dir.path().join("dot.txt");
        std::fs::write(&cluster_file, "3 3\n").unwrap();
        let cluster_arg = cluster_file.display().to_string();

        let args = Args::try_parse_from([
            "dla-fractal", "--config", config.as_str(), "estimate", cluster_arg.as_str(), "--no-display",
        ])
        .unwrap();
        let err = dispatch(args).unwrap_err();
        assert!(matches!(err.downcast_ref::<DlaError>(), Some(DlaError::InsufficientData(_))));
    }

    #[test]
    fn test_cleanup_runs_when_session_fails() {
        let cleaned = std::cell::Cell::new(false);
        let result: io::Result<()> = with_cleanup(
            || Err(io::Error::new(io::ErrorKind::Other, "no terminal")),
            || {
                cleaned.set(true);
                Ok(())
            },
        );
        assert!(cleaned.get());
        assert_eq!(result.unwrap_err().to_string(), "no terminal");

        let result = with_cleanup(|| Ok(7), || Err(io::Error::new(io::ErrorKind::Other, "restore failed")));
        assert!(result.is_err());
    }

    #[test]
    fn test_seeded_simulation_writes_reloadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cluster.txt");
        let cluster = simulate(SimulationSettings::default(), StdRng::seed_from_u64(3), 40, 25).unwrap();
        cluster.save_to_file(&path).unwrap();

        let loaded = Cluster::load_from_file(&path).unwrap();
        assert_eq!(loaded.points(), cluster.points());
    }
}
