// highway_cli/src/rollout/stats.rs
#![forbid(unsafe_code)]

use std::time::Instant;

use highway_engine::Vehicle;

#[derive(Clone, Debug)]
pub struct RolloutStats {
    pub episodes_finished: u64,
    pub crashes: u64,
    pub ep_len: u64,
    pub episode_len_sum: u64,
    pub episode_len_max: u64,

    pub steps_done: u64,

    // reward aggregates
    pub ep_return: f64,
    pub sum_reward: f64,
    pub sum_return_finished: f64,
    pub best_return: f64,

    // ego aggregates (across ALL steps)
    pub sum_velocity: f64,
    pub sum_lane: f64,
    pub lane_changes: u64,

    // internal
    prev_lane: Option<usize>,
    t0: Instant,
}

impl RolloutStats {
    pub fn new() -> Self {
        Self {
            episodes_finished: 0,
            crashes: 0,
            ep_len: 0,
            episode_len_sum: 0,
            episode_len_max: 0,
            steps_done: 0,
            ep_return: 0.0,
            sum_reward: 0.0,
            sum_return_finished: 0.0,
            best_return: f64::NEG_INFINITY,
            sum_velocity: 0.0,
            sum_lane: 0.0,
            lane_changes: 0,
            prev_lane: None,
            t0: Instant::now(),
        }
    }

    /// Call once per MDP action with the reward and the ego state it led to.
    pub fn on_step(&mut self, reward: f64, ego: &Vehicle) {
        self.steps_done += 1;
        self.ep_len += 1;

        self.ep_return += reward;
        self.sum_reward += reward;

        self.sum_velocity += ego.velocity;
        self.sum_lane += ego.lane_index as f64;

        // lane changes completed (within episode)
        if self.prev_lane.is_some_and(|l| l != ego.lane_index) {
            self.lane_changes += 1;
        }
        self.prev_lane = Some(ego.lane_index);
    }

    /// Call when an episode ends (crash or horizon), before building the next one.
    pub fn on_episode_end(&mut self, crashed: bool) {
        self.episodes_finished += 1;
        if crashed {
            self.crashes += 1;
        }
        self.episode_len_sum += self.ep_len;
        self.episode_len_max = self.episode_len_max.max(self.ep_len);
        self.sum_return_finished += self.ep_return;
        self.best_return = self.best_return.max(self.ep_return);

        self.ep_len = 0;
        self.ep_return = 0.0;
        self.prev_lane = None; // don't count lane changes across episodes
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.t0.elapsed().as_secs_f64()
    }

    pub fn steps_per_sec(&self) -> f64 {
        let dt = self.elapsed_secs();
        if dt > 0.0 {
            self.steps_done as f64 / dt
        } else {
            0.0
        }
    }

    fn per_episode(&self, total: f64) -> f64 {
        if self.episodes_finished > 0 {
            total / self.episodes_finished as f64
        } else {
            0.0
        }
    }

    fn per_step(&self, total: f64) -> f64 {
        if self.steps_done > 0 {
            total / self.steps_done as f64
        } else {
            0.0
        }
    }

    pub fn avg_ep_len(&self) -> f64 {
        self.per_episode(self.episode_len_sum as f64)
    }

    pub fn avg_return(&self) -> f64 {
        self.per_episode(self.sum_return_finished)
    }

    pub fn crash_rate(&self) -> f64 {
        self.per_episode(self.crashes as f64)
    }

    pub fn reward_per_step(&self) -> f64 {
        self.per_step(self.sum_reward)
    }

    pub fn avg_velocity(&self) -> f64 {
        self.per_step(self.sum_velocity)
    }

    pub fn avg_lane(&self) -> f64 {
        self.per_step(self.sum_lane)
    }

    pub fn lane_change_rate(&self) -> f64 {
        self.per_step(self.lane_changes as f64)
    }

    pub fn live_msg(&self) -> String {
        format!(
            "sps={:.1} eps={} crashes={} avg_ep={:.1} avg_ret={:.2} r/step={:.3} avgV={:.2} avgLane={:.2}",
            self.steps_per_sec(),
            self.episodes_finished,
            self.crashes,
            self.avg_ep_len(),
            self.avg_return(),
            self.reward_per_step(),
            self.avg_velocity(),
            self.avg_lane(),
        )
    }

    pub fn final_report(&self, policy_name: &str, last_crashed: bool) -> FinalReport {
        FinalReport {
            policy: policy_name.to_string(),

            steps_done: self.steps_done,
            elapsed_s: self.elapsed_secs(),
            steps_per_s: self.steps_per_sec(),
            episodes_finished: self.episodes_finished,
            crashes: self.crashes,
            crash_rate: self.crash_rate(),
            avg_ep_len: self.avg_ep_len(),
            max_ep_len: self.episode_len_max,
            avg_return: self.avg_return(),
            best_return: if self.episodes_finished > 0 {
                self.best_return
            } else {
                0.0
            },
            reward_per_step: self.reward_per_step(),
            avg_velocity: self.avg_velocity(),
            avg_lane: self.avg_lane(),
            lane_changes: self.lane_changes,
            last_ep_len: self.ep_len,
            last_crashed,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FinalReport {
    pub policy: String,

    pub steps_done: u64,
    pub elapsed_s: f64,
    pub steps_per_s: f64,

    pub episodes_finished: u64,
    pub crashes: u64,
    pub crash_rate: f64,
    pub avg_ep_len: f64,
    pub max_ep_len: u64,

    pub avg_return: f64,
    pub best_return: f64,
    pub reward_per_step: f64,

    pub avg_velocity: f64,
    pub avg_lane: f64,
    pub lane_changes: u64,

    pub last_ep_len: u64,
    pub last_crashed: bool,
}
