// highway_cli/src/rollout/runner.rs
#![forbid(unsafe_code)]

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use highway_engine::policy::Policy;
use highway_engine::{MdpConfig, RoadMdp, ScenarioConfig};

use super::sinks::{ReportRow, RolloutSink};
use super::stats::{FinalReport, RolloutStats};

/// Fixed internal cadence for progress-bar live message updates.
/// (No CLI knob on purpose.)
const LIVE_EVERY: u64 = 20;

#[derive(Clone, Debug)]
pub struct RunnerConfig {
    // ---------------- core rollout ----------------
    /// Total MDP actions to execute across episodes.
    pub steps: u64,
    /// Base seed; each episode uses base_seed + episode_id.
    pub base_seed: u64,
    /// Episode length cap in actions; an episode also ends when the ego crashes.
    pub horizon: u64,

    pub scenario: ScenarioConfig,
    pub mdp: MdpConfig,

    /// Used only for the final report string.
    pub policy_name: String,

    // ---------------- output ----------------
    /// 0 = final summary only
    /// 1 = progress bar
    /// 2 = progress bar + periodic table (via sink)
    pub verbosity: u8,

    /// Print a table row every N steps (only used when verbosity == 2).
    /// 0 disables table reporting.
    pub report_every: u64,

    // ---------------- rendering ----------------
    /// If Some(ms): render every step; sleep ms between frames (0 = no sleep).
    pub render_ms: Option<u64>,
}

pub struct Runner {
    cfg: RunnerConfig,
    sink: Box<dyn RolloutSink>,
}

impl Runner {
    pub fn new(cfg: RunnerConfig, sink: Box<dyn RolloutSink>) -> Self {
        Self { cfg, sink }
    }

    fn new_episode(&self, episode_id: u64) -> Result<RoadMdp> {
        let seed = self.cfg.base_seed.wrapping_add(episode_id);
        let (road, ego) = self.cfg.scenario.build(seed);
        RoadMdp::from_config(road, ego, self.cfg.mdp)
            .with_context(|| format!("Failed to build episode {episode_id} (seed {seed})"))
    }

    pub fn run(&mut self, policy: &mut dyn Policy) -> Result<FinalReport> {
        let cfg = self.cfg.clone();

        // Progress bar is UI only; runner logic does not depend on it.
        let pb = if cfg.verbosity >= 1 {
            let pb = ProgressBar::new(cfg.steps);
            pb.set_style(
                ProgressStyle::with_template(
                    "{bar:40.cyan/blue} {pos:>9}/{len:<9}  {percent:>3}%  {elapsed_precise}  {msg}",
                )
                .context("Invalid progress bar template")?
                .progress_chars("=>-"),
            );
            Some(pb)
        } else {
            None
        };

        let mut stats = RolloutStats::new();

        // Episode state.
        let mut episode_id: u64 = 0;
        let mut mdp = self.new_episode(episode_id)?;
        log::info!(
            "rollout: policy={} steps={} horizon={} lanes={} vehicles={} type={} ticks/action={}",
            cfg.policy_name,
            cfg.steps,
            cfg.horizon,
            mdp.road().lanes_count(),
            mdp.road().vehicles.len(),
            cfg.scenario.vehicles_type,
            mdp.tick_count()
        );

        // Rendering is a separate axis from verbosity.
        if cfg.render_ms.is_some() {
            print!("{}", mdp.road().render_ascii(Some(mdp.ego_id())));
        }

        while stats.steps_done < cfg.steps {
            // ------------------------------------------------------------
            // Episode boundary: finalize counters, then reset.
            // ------------------------------------------------------------
            let horizon_reached = cfg.horizon > 0 && stats.ep_len >= cfg.horizon;
            if mdp.is_terminal() || horizon_reached {
                let crashed = mdp.is_terminal();
                log::debug!(
                    "episode {} ended after {} steps: return={:.2} crashed={}",
                    episode_id,
                    stats.ep_len,
                    stats.ep_return,
                    crashed
                );
                stats.on_episode_end(crashed);

                episode_id += 1;
                mdp = self.new_episode(episode_id)?;

                if cfg.render_ms.is_some() {
                    println!(
                        "=== reset: episodes_finished={} crashes={} avg_return={:.2} ===",
                        stats.episodes_finished,
                        stats.crashes,
                        stats.avg_return()
                    );
                    print!("{}", mdp.road().render_ascii(Some(mdp.ego_id())));
                }
                continue;
            }

            // ------------------------------------------------------------
            // One decision: policy chooses action_id.
            // ------------------------------------------------------------
            let Some(aid) = policy.choose_action(&mdp) else {
                log::warn!("policy {} returned no action; ending episode", cfg.policy_name);
                stats.on_episode_end(mdp.is_terminal());
                episode_id += 1;
                mdp = self.new_episode(episode_id)?;
                continue;
            };

            let reward = mdp
                .step(aid)
                .with_context(|| format!("Policy {} chose action {aid}", cfg.policy_name))?;
            stats.on_step(reward, mdp.ego());

            if let Some(ref pb) = pb {
                pb.inc(1);
            }

            // Rendering (ASCII) every step when enabled.
            if let Some(ms) = cfg.render_ms {
                println!(
                    "step={} action={} reward={:.2} v={:.1}",
                    stats.steps_done,
                    aid,
                    reward,
                    mdp.ego().velocity
                );
                print!("{}", mdp.road().render_ascii(Some(mdp.ego_id())));
                if ms > 0 {
                    std::thread::sleep(Duration::from_millis(ms));
                }
            }

            // ------------------------------------------------------------
            // Periodic table report (verbosity == 2 only).
            // ------------------------------------------------------------
            if cfg.verbosity == 2
                && cfg.report_every > 0
                && (stats.steps_done % cfg.report_every == 0)
            {
                let row = ReportRow {
                    step: stats.steps_done,
                    steps_total: cfg.steps,
                    sps: stats.steps_per_sec(),

                    episodes_finished: stats.episodes_finished,
                    crashes: stats.crashes,
                    avg_ep_len: stats.avg_ep_len(),
                    max_ep_len: stats.episode_len_max,

                    avg_return: stats.avg_return(),
                    reward_per_step: stats.reward_per_step(),

                    avg_velocity: stats.avg_velocity(),
                    avg_lane: stats.avg_lane(),
                    lane_change_rate: stats.lane_change_rate(),
                };

                self.sink.on_report_row(&row, pb.as_ref());
            }

            // ------------------------------------------------------------
            // Live progress message cadence (fixed internal cadence).
            // ------------------------------------------------------------
            if cfg.verbosity >= 1 && (stats.steps_done % LIVE_EVERY == 0) {
                if let Some(ref pb) = pb {
                    pb.set_message(stats.live_msg());
                }
            }
        }

        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }

        Ok(stats.final_report(&cfg.policy_name, mdp.is_terminal()))
    }
}
