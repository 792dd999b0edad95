use std::{error::Error, fs, io, path::PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use dilemma::{
    BimatrixGame, Equilibrium, EquilibriumRecord, enumerate_equilibria, lemke_howson,
    payoff::{
        GapDistribution, LabeledRecord, PdPayoffs, SamplerConfig, action_probabilities,
        build_pd_lists, labeled_records, sample_pd,
    },
    store::{DEFAULT_SNAPSHOT_LOG, HubCache, download_and_log, read_json, repo_root, write_json},
};
use indicatif::{ProgressBar, ProgressStyle};
use log::{LevelFilter, info, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Show debug messages, including every pivot and support checked.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Samples Prisoner's Dilemma payoffs.
    Sample {
        /// Seed of the random generator. Without it every run gives different payoffs.
        #[arg(short, long)]
        seed: Option<u64>,

        /// JSON file with the sampler configuration. Flags override its values.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Lognormal gaps with the given mean and deviation of the logarithm, separated by a
        /// colon. For example, -1:0.5.
        #[arg(short, long, value_parser = parse_pair, allow_hyphen_values = true)]
        lognormal: Option<(f64, f64)>,

        /// Draw the sucker payoff from the gap distribution instead of fixing it to zero.
        #[arg(long)]
        sampled_s: bool,

        /// File where payoffs, matrices and labels are written.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Computes Nash equilibria of a bimatrix game.
    Solve {
        /// JSON file with the matrices {"A": [[...]], "B": [[...]]}. Without it the classic
        /// dilemma with payoffs 3, 0, 5, 1 is solved.
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Method::Support)]
        method: Method,

        /// Label dropped by Lemke-Howson. Row actions go first, then column actions.
        #[arg(short, long, default_value_t = 0)]
        label: usize,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Samples many games and checks both solvers on each one.
    Batch {
        /// Number of games.
        #[arg(short = 'n', long)]
        count: u64,

        /// Seed of the first game; the following games use the next seeds.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        #[arg(short, long)]
        config: Option<PathBuf>,

        /// CSV file with one row per game. Without it rows go to standard output.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Logs a model snapshot found in a local hub cache.
    Snapshot {
        /// Repository identifier, for example org/model.
        repo_id: String,

        /// Folder of the hub cache.
        #[arg(long)]
        cache: PathBuf,

        /// Glob of the files to log, for example "*.json". May be repeated; without it every
        /// file is logged.
        #[arg(long)]
        allow_pattern: Vec<String>,

        /// JSON lines log. Defaults to var/models/snapshots.jsonl under the repository root.
        #[arg(long)]
        log_path: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Method {
    /// Every equilibrium, by support enumeration.
    Support,
    /// One equilibrium, by Lemke-Howson.
    Lemke,
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let t: Vec<&str> = s.split(':').collect();
    if t.len() != 2 {
        return Err(format!(
            "Wrong format ({s}). Both numbers must be separated by a colon, for example -1:0.5."
        ));
    }
    let first: f64 = t[0]
        .parse()
        .map_err(|_| format!("{} is not a number.", t[0]))?;
    let second: f64 = t[1]
        .parse()
        .map_err(|_| format!("{} is not a number.", t[1]))?;
    Ok((first, second))
}

#[derive(Debug, Serialize, Deserialize)]
struct GameFile {
    #[serde(rename = "A")]
    a: Vec<Vec<f64>>,
    #[serde(rename = "B")]
    b: Vec<Vec<f64>>,
}

#[derive(Debug, Serialize)]
struct SampleOutput {
    config: SamplerConfig,
    payoffs: PdPayoffs,
    #[serde(rename = "A")]
    a: Vec<Vec<f64>>,
    #[serde(rename = "B")]
    b: Vec<Vec<f64>>,
    labels: Vec<LabeledRecord>,
}

#[derive(Debug, Serialize)]
struct SolveOutput {
    method: String,
    equilibria: Vec<EquilibriumRecord>,
}

#[derive(Debug, Serialize)]
struct BatchRow {
    seed: u64,
    #[serde(rename = "R")]
    r: f64,
    #[serde(rename = "S")]
    s: f64,
    #[serde(rename = "T")]
    t: f64,
    #[serde(rename = "P")]
    p: f64,
    equilibria: usize,
    lemke_howson_agrees: bool,
}

fn load_config(path: Option<PathBuf>) -> Result<SamplerConfig, Box<dyn Error>> {
    Ok(match path {
        Some(path) => read_json(path, SamplerConfig::default())?,
        None => SamplerConfig::default(),
    })
}

fn sample(
    seed: Option<u64>,
    config: Option<PathBuf>,
    lognormal: Option<(f64, f64)>,
    sampled_s: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let mut config = load_config(config)?;
    if seed.is_some() {
        config.seed = seed;
    }
    if let Some((mu, sigma)) = lognormal {
        config.gap = GapDistribution::LogNormal { mu, sigma };
    }
    if sampled_s {
        config.s_zero = false;
    }

    let payoffs = config.sample()?;
    let (a, b) = build_pd_lists(&payoffs);
    let labels = labeled_records(&payoffs);

    println!(
        "R = {:.4}, S = {:.4}, T = {:.4}, P = {:.4}",
        payoffs.r, payoffs.s, payoffs.t, payoffs.p
    );
    for l in &labels {
        println!(
            "{}{}: {:?} ({:.4}, {:.4})",
            l.row_action, l.col_action, l.role, l.payoff.0, l.payoff.1
        );
    }
    let game = payoffs.game()?;
    println!("Payoff for player 1:");
    println!("{}", game.payoff_matrix(0));
    println!("Payoff for player 2:");
    println!("{}", game.payoff_matrix(1));

    if let Some(path) = output {
        write_json(
            path,
            &SampleOutput {
                config,
                payoffs,
                a,
                b,
                labels,
            },
        )?;
    }
    Ok(())
}

fn solve(
    input: Option<PathBuf>,
    method: Method,
    label: usize,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let game_file = match input {
        Some(path) => read_json::<Option<GameFile>>(&path, None)?
            .ok_or_else(|| format!("Game file not found: {}", path.display()))?,
        None => GameFile {
            a: vec![vec![3., 0.], vec![5., 1.]],
            b: vec![vec![3., 5.], vec![0., 1.]],
        },
    };
    let game = BimatrixGame::from_lists(&game_file.a, &game_file.b)?;

    let equilibria: Vec<Equilibrium> = match method {
        Method::Support => enumerate_equilibria(&game)?,
        Method::Lemke => vec![lemke_howson(&game, label)?],
    };

    let dilemma_shaped = game.num_strategies() == (2, 2);
    println!("Equilibrium strategies");
    for eq in &equilibria {
        let payoff = game.strategy_payoff(eq);
        println!("Player 1: {}", strategy_text(&eq.0, dilemma_shaped));
        println!("Player 2: {}", strategy_text(&eq.1, dilemma_shaped));
        println!("Payoff: {:.4}, {:.4}", payoff.0, payoff.1);
    }

    if let Some(path) = output {
        write_json(
            path,
            &SolveOutput {
                method: format!("{method:?}").to_lowercase(),
                equilibria: equilibria.iter().map(|eq| eq.to_record(&game)).collect(),
            },
        )?;
    }
    Ok(())
}

/// Strategies of 2x2 games are shown by action, for example `C: 0.0000, D: 1.0000`.
fn strategy_text(strategy: &Array1<f64>, by_action: bool) -> String {
    match action_probabilities(strategy.view()).filter(|_| by_action) {
        Some(probabilities) => probabilities
            .iter()
            .map(|(action, p)| format!("{action}: {p:.4}"))
            .collect::<Vec<_>>()
            .join(", "),
        None => strategy.to_string(),
    }
}

fn batch(
    count: u64,
    seed: u64,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let config = load_config(config)?;
    let gap = config.gap.sampler()?;

    let writer: Box<dyn io::Write> = match &output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            Box::new(fs::File::create(path)?)
        }
        None => Box::new(io::stdout()),
    };
    let mut writer = csv::Writer::from_writer(writer);

    let pb = ProgressBar::new(count);
    pb.set_style(
        ProgressStyle::with_template("{wide_bar:40.cyan/blue} {human_pos}/{human_len} {msg} ")?
            .progress_chars("##-"),
    );
    let mut disagreements = 0;
    for game_seed in (0..count).map(|i| seed.wrapping_add(i)) {
        let payoffs = sample_pd(Some(game_seed), &gap, config.s_zero)?;
        let game = payoffs.game()?;
        let equilibria = enumerate_equilibria(&game)?;
        let lemke_howson_agrees = match lemke_howson(&game, 0) {
            Ok(eq) => equilibria.contains(&eq),
            Err(err) => {
                warn!("seed {game_seed}: {err}");
                false
            }
        };
        if !lemke_howson_agrees {
            disagreements += 1;
        }
        writer.serialize(BatchRow {
            seed: game_seed,
            r: payoffs.r,
            s: payoffs.s,
            t: payoffs.t,
            p: payoffs.p,
            equilibria: equilibria.len(),
            lemke_howson_agrees,
        })?;
        pb.inc(1);
        pb.set_message(format!("Disagreements: {disagreements}"));
    }
    writer.flush()?;
    pb.finish();
    info!("{count} games solved, {disagreements} disagreements");
    Ok(())
}

fn snapshot(
    repo_id: String,
    cache: PathBuf,
    allow_pattern: Vec<String>,
    log_path: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let log_path = match log_path {
        Some(path) => path,
        None => repo_root(std::env::current_dir()?).join(DEFAULT_SNAPSHOT_LOG),
    };
    let patterns = (!allow_pattern.is_empty()).then_some(allow_pattern.as_slice());
    let record = download_and_log(&HubCache::new(cache), &repo_id, patterns, log_path)?;
    println!("Snapshot directory: {}", record.snapshot_path);
    Ok(())
}

fn log(verbose: bool) -> Result<(), log::SetLoggerError> {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    simplelog::TermLogger::init(
        level,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    log(args.verbose)?;

    match args.command {
        Command::Sample {
            seed,
            config,
            lognormal,
            sampled_s,
            output,
        } => sample(seed, config, lognormal, sampled_s, output),
        Command::Solve {
            input,
            method,
            label,
            output,
        } => solve(input, method, label, output),
        Command::Batch {
            count,
            seed,
            config,
            output,
        } => batch(count, seed, config, output),
        Command::Snapshot {
            repo_id,
            cache,
            allow_pattern,
            log_path,
        } => snapshot(repo_id, cache, allow_pattern, log_path),
    }
}
