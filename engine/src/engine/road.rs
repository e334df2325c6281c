// engine/src/engine/road.rs
#![forbid(unsafe_code)]

use crate::engine::behavior::{Behavior, IdmParams, SpeedLadder, steering_control, velocity_control};
use crate::engine::constants::DEFAULT_LANE_WIDTH;
use crate::engine::features::linear_features_at;
use crate::engine::lane::{Lane, closest_lane_index};
use crate::engine::vehicle::{Control, Vehicle, VehicleId};
use crate::mdp::{Action, MdpError};

/// Per-tick decision for one vehicle, computed against a frozen snapshot of the road.
#[derive(Clone, Copy, Debug)]
struct Decision {
    control: Control,
    target_lane_index: usize,
    reset_lane_change_timer: bool,
}

/**
 * The simulation arena: lanes plus an ordered collection of vehicles.
 *
 * Vehicles hold no references to the road or to each other; everything is
 * addressed by position in `vehicles` or by stable `VehicleId`. A plain `clone()`
 * is therefore a complete, independent copy of the whole traffic state.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct Road {
    pub lanes: Vec<Lane>,
    pub vehicles: Vec<Vehicle>,

    /// Simulated time [s].
    pub time: f64,
    /// Number of `step(dt)` calls so far.
    pub timesteps: u64,

    next_id: u32,
}

impl Road {
    pub fn new(lanes: Vec<Lane>) -> Self {
        let lanes = if lanes.is_empty() {
            Lane::straight_road(1, DEFAULT_LANE_WIDTH)
        } else {
            lanes
        };
        Self {
            lanes,
            vehicles: Vec::new(),
            time: 0.0,
            timesteps: 0,
            next_id: 0,
        }
    }

    pub fn straight(lanes_count: usize, lane_width: f64) -> Self {
        Self::new(Lane::straight_road(lanes_count, lane_width))
    }

    // -------------------------------------------------------------------------
    // Arena access
    // -------------------------------------------------------------------------

    #[inline]
    pub fn lanes_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn index_of(&self, id: VehicleId) -> Option<usize> {
        self.vehicles.iter().position(|v| v.id == id)
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn vehicle_mut(&mut self, id: VehicleId) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    /// Reserve a fresh id for a vehicle about to be pushed.
    pub fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    /// Append a vehicle; later ids never collide with it.
    pub fn push(&mut self, vehicle: Vehicle) -> VehicleId {
        self.next_id = self.next_id.max(vehicle.id.0.saturating_add(1));
        let id = vehicle.id;
        self.vehicles.push(vehicle);
        id
    }

    fn clamp_lane(&self, lane_index: usize) -> usize {
        lane_index.min(self.lanes.len() - 1)
    }

    pub fn spawn_controlled(
        &mut self,
        lane_index: usize,
        longitudinal: f64,
        velocity: f64,
        ladder: SpeedLadder,
    ) -> VehicleId {
        let id = self.next_vehicle_id();
        let lane = &self.lanes[self.clamp_lane(lane_index)];
        let v = Vehicle::controlled(id, lane, longitudinal, velocity, ladder);
        self.push(v)
    }

    pub fn spawn_idm(&mut self, lane_index: usize, longitudinal: f64, velocity: f64) -> VehicleId {
        let id = self.next_vehicle_id();
        let lane = &self.lanes[self.clamp_lane(lane_index)];
        let v = Vehicle::idm(id, lane, longitudinal, velocity);
        self.push(v)
    }

    pub fn spawn_linear(&mut self, lane_index: usize, longitudinal: f64, velocity: f64) -> VehicleId {
        let id = self.next_vehicle_id();
        let lane = &self.lanes[self.clamp_lane(lane_index)];
        let v = Vehicle::linear(id, lane, longitudinal, velocity);
        self.push(v)
    }

    pub fn spawn_obstacle(&mut self, lane_index: usize, longitudinal: f64) -> VehicleId {
        let id = self.next_vehicle_id();
        let lane = &self.lanes[self.clamp_lane(lane_index)];
        let v = Vehicle::obstacle(id, lane, longitudinal);
        self.push(v)
    }

    // -------------------------------------------------------------------------
    // Neighbourhood queries
    // -------------------------------------------------------------------------

    /// Closest vehicles (front, rear) in `lane` relative to vehicle `i`, excluding `i`.
    ///
    /// A vehicle level with `i` counts as front.
    pub(crate) fn neighbour_indices(&self, i: usize, lane: usize) -> (Option<usize>, Option<usize>) {
        let x = self.vehicles[i].position[0];
        let mut front: Option<(usize, f64)> = None;
        let mut rear: Option<(usize, f64)> = None;

        for (j, v) in self.vehicles.iter().enumerate() {
            if j == i || v.lane_index != lane {
                continue;
            }
            let s = v.position[0] - x;
            if s >= 0.0 {
                if front.is_none_or(|(_, best)| s < best) {
                    front = Some((j, s));
                }
            } else if rear.is_none_or(|(_, best)| s > best) {
                rear = Some((j, s));
            }
        }

        (front.map(|(j, _)| j), rear.map(|(j, _)| j))
    }

    /// Closest vehicles (front, rear) of `id` in `lane` (its current lane if `None`).
    pub fn neighbour_vehicles(
        &self,
        id: VehicleId,
        lane: Option<usize>,
    ) -> Result<(Option<&Vehicle>, Option<&Vehicle>), MdpError> {
        let i = self.index_of(id).ok_or(MdpError::UnknownVehicle(id))?;
        let lane = lane.unwrap_or(self.vehicles[i].lane_index);
        let (front, rear) = self.neighbour_indices(i, lane);
        Ok((
            front.map(|j| &self.vehicles[j]),
            rear.map(|j| &self.vehicles[j]),
        ))
    }

    // -------------------------------------------------------------------------
    // High-level actuation
    // -------------------------------------------------------------------------

    /// Forward a discrete action to vehicle `id`'s actuation interface.
    pub fn act_vehicle(&mut self, id: VehicleId, action: Action) -> Result<(), MdpError> {
        let Road {
            lanes, vehicles, ..
        } = self;
        let v = vehicles
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(MdpError::UnknownVehicle(id))?;
        v.act(action, lanes.as_slice());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Tick: act + step
    // -------------------------------------------------------------------------

    /// Let every vehicle choose its control inputs for the coming tick.
    ///
    /// All decisions read the same snapshot; none sees another's update.
    pub fn act(&mut self) {
        let decisions: Vec<Decision> = (0..self.vehicles.len()).map(|i| self.decide(i)).collect();
        for (v, d) in self.vehicles.iter_mut().zip(decisions) {
            if d.target_lane_index != v.target_lane_index {
                log::debug!(
                    "t={:.2} vehicle {} changes lane {} -> {}",
                    self.time,
                    v.id,
                    v.lane_index,
                    d.target_lane_index
                );
            }
            v.control = d.control;
            v.target_lane_index = d.target_lane_index;
            if d.reset_lane_change_timer {
                v.lane_change_timer = 0.0;
            }
        }
    }

    fn decide(&self, i: usize) -> Decision {
        let v = &self.vehicles[i];
        let mut d = Decision {
            control: Control::default(),
            target_lane_index: v.target_lane_index,
            reset_lane_change_timer: false,
        };
        if v.crashed || v.is_obstacle() {
            return d;
        }

        if v.enable_lane_change {
            if let Some(p) = v.behavior.idm_params() {
                self.change_lane_policy(i, p, &mut d);
            }
        }

        let acceleration = match &v.behavior {
            Behavior::Controlled(_) => velocity_control(v),
            Behavior::Idm(p) => {
                let (front, _) = self.neighbour_indices(i, v.lane_index);
                p.acceleration(v, front.map(|j| &self.vehicles[j]))
            }
            Behavior::Linear(p) => p.acceleration(&linear_features_at(self, i)),
            Behavior::Obstacle => 0.0,
        };
        let target_lane = &self.lanes[self.clamp_lane(d.target_lane_index)];

        d.control = Control {
            acceleration,
            steering: steering_control(v, target_lane),
        };
        d
    }

    /// MOBIL lane-change decision, rate limited by `lane_change_delay`.
    fn change_lane_policy(&self, i: usize, p: &IdmParams, d: &mut Decision) {
        let v = &self.vehicles[i];

        // A change is in progress: abort if someone else is merging into the same gap.
        if v.lane_index != v.target_lane_index {
            for (j, other) in self.vehicles.iter().enumerate() {
                if j == i
                    || other.lane_index == v.target_lane_index
                    || other.target_lane_index != v.target_lane_index
                {
                    continue;
                }
                let gap = v.lane_distance_to(other).abs();
                if gap < p.desired_gap(v, other) {
                    d.target_lane_index = v.lane_index;
                    break;
                }
            }
            return;
        }

        if v.lane_change_timer < p.lane_change_delay {
            return;
        }
        d.reset_lane_change_timer = true;

        let candidates = [v.lane_index.checked_sub(1), Some(v.lane_index + 1)];
        for lane in candidates.into_iter().flatten() {
            let reachable = self
                .lanes
                .get(lane)
                .is_some_and(|l| l.is_reachable_from(v.position));
            if reachable && self.mobil(i, lane, p) {
                d.target_lane_index = lane;
            }
        }
    }

    /**
     * MOBIL incentive + safety criterion for moving vehicle `i` into `lane`.
     *
     * - Safety: the new follower must not brake harder than `lane_change_max_braking_imposed`.
     * - Incentive: own gain plus politeness-weighted gains of both followers
     *   must exceed `lane_change_min_acc_gain`.
     */
    fn mobil(&self, i: usize, lane: usize, p: &IdmParams) -> bool {
        let vs = &self.vehicles;
        let acc = |ego: Option<usize>, front: Option<usize>| -> f64 {
            match ego {
                Some(e) => p.acceleration(&vs[e], front.map(|f| &vs[f])),
                None => 0.0,
            }
        };

        let (new_preceding, new_following) = self.neighbour_indices(i, lane);
        let new_following_a = acc(new_following, new_preceding);
        let new_following_pred_a = acc(new_following, Some(i));
        if new_following_pred_a < -p.lane_change_max_braking_imposed {
            return false;
        }

        let (old_preceding, old_following) = self.neighbour_indices(i, vs[i].lane_index);
        let self_a = acc(Some(i), old_preceding);
        let self_pred_a = acc(Some(i), new_preceding);
        let old_following_a = acc(old_following, Some(i));
        let old_following_pred_a = acc(old_following, old_preceding);

        let jerk = self_pred_a - self_a
            + p.politeness
                * (new_following_pred_a - new_following_a + old_following_pred_a
                    - old_following_a);
        jerk >= p.lane_change_min_acc_gain
    }

    /// Integrate every vehicle by `dt`, refresh lane membership, then resolve collisions.
    pub fn step(&mut self, dt: f64) {
        for v in &mut self.vehicles {
            v.step(dt);
            v.lane_index = closest_lane_index(&self.lanes, v.position);
        }
        self.check_collisions();
        self.time += dt;
        self.timesteps += 1;
    }

    fn check_collisions(&mut self) {
        let n = self.vehicles.len();
        let mut hits: Vec<(usize, usize)> = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let (a, b) = (&self.vehicles[i], &self.vehicles[j]);
                if a.crashed && b.crashed {
                    continue;
                }
                if a.overlaps(b) {
                    hits.push((i, j));
                }
            }
        }

        for (i, j) in hits {
            let v = self.vehicles[i].velocity.min(self.vehicles[j].velocity);
            log::debug!(
                "t={:.2} collision between {} and {}",
                self.time,
                self.vehicles[i].id,
                self.vehicles[j].id
            );
            for k in [i, j] {
                self.vehicles[k].velocity = v;
                self.vehicles[k].crashed = true;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    /// ASCII strip of the road around `center` (or x=0), 5 m per column.
    ///
    /// `E` = center vehicle, `>` = traffic, `#` = obstacle, `X` = crashed.
    pub fn render_ascii(&self, center: Option<VehicleId>) -> String {
        const COLS: usize = 60;
        const METERS_PER_COL: f64 = 5.0;
        const BEHIND_COLS: f64 = 15.0;

        let cx = center
            .and_then(|id| self.vehicle(id))
            .map_or(0.0, |v| v.position[0]);
        let x0 = cx - BEHIND_COLS * METERS_PER_COL;

        let mut rows = vec![vec![' '; COLS]; self.lanes.len()];
        for v in &self.vehicles {
            let col = ((v.position[0] - x0) / METERS_PER_COL).floor();
            if col < 0.0 || col >= COLS as f64 {
                continue;
            }
            let glyph = if v.crashed {
                'X'
            } else if Some(v.id) == center {
                'E'
            } else if v.is_obstacle() {
                '#'
            } else {
                '>'
            };
            let lane = v.lane_index.min(self.lanes.len() - 1);
            let cell = &mut rows[lane][col as usize];
            // Keep the most informative glyph when vehicles share a cell.
            if *cell == ' ' || *cell == '>' {
                *cell = glyph;
            }
        }

        let border = format!("+{}+\n", "-".repeat(COLS));
        let mut s = String::new();
        s.push_str(&border);
        for row in rows {
            s.push('|');
            s.extend(row);
            s.push_str("|\n");
        }
        s.push_str(&border);
        s.push_str(&format!(
            "t={:.2}s steps={} vehicles={} crashed={}\n",
            self.time,
            self.timesteps,
            self.vehicles.len(),
            self.vehicles.iter().filter(|v| v.crashed).count()
        ));
        s
    }
}
