// highway_cli/src/main.rs
#![forbid(unsafe_code)]

mod config;
mod fit;
mod logging;
mod rollout;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::config::RunConfig;
use crate::fit::{FitConfig, run_fit};
use crate::rollout::{NoopSink, RolloutSink, Runner, RunnerConfig, TableSink};
use highway_engine::AgentKind;
use highway_engine::policy::{BeamConfig, IdlePolicy, LookaheadPolicy, Policy, RandomPolicy};

#[derive(Parser, Debug)]
#[command(name = "highway_cli", about = "Highway driving MDP rollouts and model fitting")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level: off | error | warn | info | debug | trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    /// Also write the log to this file.
    #[arg(long, global = true, value_name = "path")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drive the ego vehicle with a policy over many episodes and report statistics.
    Rollout(RolloutArgs),
    /// Learn the linear driver model online from a simulated vehicle.
    Fit(FitArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyKind {
    Random,
    Idle,
    Lookahead,
}

#[derive(Args, Debug)]
struct RolloutArgs {
    // ---------------- rollout sizing ----------------
    /// Total MDP actions to execute across episodes.
    #[arg(long, default_value_t = 200)]
    steps: u64,

    /// Base RNG seed (episodes use base_seed + episode_id). If omitted, a fixed default is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Episode length cap in actions (0 = until crash).
    #[arg(long, default_value_t = 40)]
    horizon: u64,

    // ---------------- policy ----------------
    #[arg(long, value_enum, default_value = "random")]
    policy: PolicyKind,

    /// For --policy lookahead: number of plies (>= 1).
    #[arg(long, default_value_t = 2)]
    depth: u8,

    /// For --policy lookahead: discount factor.
    #[arg(long, default_value_t = 0.9)]
    gamma: f64,

    /// Beam width (top-N). If omitted, no pruning is applied.
    #[arg(long)]
    beam_width: Option<usize>,

    /**
     * Start pruning from this decision depth onward (0=current, 1=next, 2=deeper...).
     * Only used if --beam-width is provided.
     */
    #[arg(long, default_value_t = 0)]
    beam_from_depth: u8,

    /// For --policy lookahead: model the other drivers as controlled | idm | linear while planning.
    #[arg(long)]
    agent_model: Option<AgentKind>,

    // ---------------- scenario ----------------
    /// JSON file with `scenario` and `mdp` sections; flags below override it.
    #[arg(long, value_name = "json")]
    config: Option<PathBuf>,

    #[arg(long)]
    lanes: Option<usize>,

    /// Other vehicles per episode (the ego excluded).
    #[arg(long)]
    vehicles: Option<usize>,

    /// Traffic model: controlled | idm | linear
    #[arg(long)]
    vehicles_type: Option<AgentKind>,

    // ---------------- visualization ----------------
    /**
     * Render the road as ASCII every step; value is sleep in ms (e.g. 100). Omit to disable rendering.
     * Examples:
     *   --render 0    (render as fast as possible)
     *   --render 100  (sleep 100ms between frames)
     */
    #[arg(long, value_name = "ms")]
    render: Option<u64>,

    // ---------------- output / reporting ----------------
    /// Verbosity: 0=silent (final summary only), 1=progress bar, 2=progress bar + periodic table.
    #[arg(long, default_value_t = 1)]
    verbosity: u8,

    /// Print a table row every N steps (only used with --verbosity 2).
    #[arg(long, default_value_t = 50)]
    report_every: u64,
}

#[derive(Args, Debug)]
struct FitArgs {
    /// Simulation ticks to run.
    #[arg(long, default_value_t = 30_000)]
    steps: u64,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Lanes of the fitting road; one lane keeps the platoon together.
    #[arg(long, default_value_t = 1)]
    lanes: usize,

    #[arg(long, default_value_t = 5)]
    vehicles: usize,

    /// Tick duration [s].
    #[arg(long, default_value_t = 1.0 / 30.0)]
    dt: f64,

    /// Estimator learning rate.
    #[arg(long, default_value_t = 0.1)]
    rate: f64,

    /// Target velocity re-draw period [s].
    #[arg(long, default_value_t = 5.0)]
    retarget: f64,

    /// Log the weights every N ticks at info level (0 disables).
    #[arg(long, default_value_t = 1000)]
    log_every: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize_logging(cli.log_level, cli.log_file.as_deref())?;

    match cli.command {
        Command::Rollout(args) => cmd_rollout(args),
        Command::Fit(args) => cmd_fit(args),
    }
}

fn cmd_rollout(args: RolloutArgs) -> Result<()> {
    // Episode seeds are derived from this base seed.
    let base_seed = args.seed.unwrap_or(12345);

    let mut run_cfg = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if let Some(lanes) = args.lanes {
        run_cfg.scenario.lanes_count = lanes;
    }
    if let Some(vehicles) = args.vehicles {
        run_cfg.scenario.vehicles_count = vehicles;
    }
    if let Some(kind) = args.vehicles_type {
        run_cfg.scenario.vehicles_type = kind;
    }

    let beam: Option<BeamConfig> = args
        .beam_width
        .map(|w| BeamConfig::new(args.beam_from_depth, w));

    // Policy instance (boxed so the CLI can switch implementations at runtime).
    let (mut policy, policy_name): (Box<dyn Policy>, String) = match args.policy {
        PolicyKind::Random => (
            Box::new(RandomPolicy::new(base_seed.wrapping_add(999))),
            "random".to_string(),
        ),
        PolicyKind::Idle => (Box::new(IdlePolicy), "idle".to_string()),
        PolicyKind::Lookahead => {
            let p = LookaheadPolicy::new(args.depth, args.gamma)
                .with_beam(beam)
                .with_agent_model(args.agent_model);
            let name = format!(
                "lookahead(depth={},gamma={},beam={},model={})",
                p.depth(),
                p.gamma(),
                beam.map_or("none".to_string(), |b| format!(
                    "{}@{}",
                    b.beam_width, b.beam_from_depth
                )),
                args.agent_model.map_or("none", |k| k.name())
            );
            (Box::new(p), name)
        }
    };

    // Rollout configuration (data only; no logic).
    let cfg = RunnerConfig {
        steps: args.steps,
        base_seed,
        horizon: args.horizon,

        scenario: run_cfg.scenario,
        mdp: run_cfg.mdp,

        policy_name,

        verbosity: args.verbosity,
        report_every: args.report_every,

        render_ms: args.render,
    };

    // Reporting sink:
    // - verbosity 2 => periodic table (unless report_every == 0)
    // - otherwise   => no-op
    let sink: Box<dyn RolloutSink> = if cfg.verbosity >= 2 && cfg.report_every > 0 {
        Box::new(TableSink::new(20))
    } else {
        Box::new(NoopSink)
    };

    let mut runner = Runner::new(cfg, sink);
    let report = runner.run(&mut *policy)?;

    // Final one-line summary (useful for logs / grep).
    println!(
        "DONE: policy={} steps_done={} elapsed={:.3}s steps/s={:.1} episodes_finished={} crashes={} crash_rate={:.3} avg_ep_len={:.2} max_ep_len={} avg_return={:.2} best_return={:.2} reward/step={:.3} avg_v={:.2} avg_lane={:.2} lane_changes={} (last_ep_len={} last_crashed={})",
        report.policy,
        report.steps_done,
        report.elapsed_s,
        report.steps_per_s,
        report.episodes_finished,
        report.crashes,
        report.crash_rate,
        report.avg_ep_len,
        report.max_ep_len,
        report.avg_return,
        report.best_return,
        report.reward_per_step,
        report.avg_velocity,
        report.avg_lane,
        report.lane_changes,
        report.last_ep_len,
        report.last_crashed,
    );
    Ok(())
}

fn cmd_fit(args: FitArgs) -> Result<()> {
    let cfg = FitConfig {
        steps: args.steps,
        seed: args.seed,
        lanes: args.lanes,
        vehicles: args.vehicles,
        dt: args.dt,
        rate: args.rate,
        retarget_s: args.retarget,
        log_every: args.log_every,
    };
    let report = run_fit(&cfg)?;

    println!(
        "DONE: fit steps_done={} samples={} elapsed={:.3}s weights=[{:.4}, {:.4}, {:.4}] truth=[{:.4}, {:.4}, {:.4}] weight_error={:.4} tail_abs_error={:.4}",
        report.steps_done,
        report.samples,
        report.elapsed_s,
        report.weights[0],
        report.weights[1],
        report.weights[2],
        report.truth[0],
        report.truth[1],
        report.truth[2],
        report.weight_error(),
        report.tail_abs_error,
    );
    Ok(())
}
