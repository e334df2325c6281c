// engine/benches/mdp_core_bench.rs
#![forbid(unsafe_code)]

/**
 * Core MDP micro-benchmarks.
 *
 * Focus:
 * - Transition kernel (`RoadMdp::step`, one action = 30 ticks)
 * - State abstraction (`simplified`, `change_agents_to`)
 * - Policy decision latency on fixed traffic states
 */
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use highway_engine::engine::{AgentKind, ScenarioConfig};
use highway_engine::policy::{BeamConfig, LookaheadPolicy, Policy};
use highway_engine::{Action, RoadMdp};

fn build_mdp(seed: u64, vehicles: usize) -> RoadMdp {
    let cfg = ScenarioConfig {
        vehicles_count: vehicles,
        ..ScenarioConfig::default()
    };
    let (road, ego) = cfg.build(seed);
    let mut mdp = RoadMdp::with_default_timing(road, ego).expect("valid scenario");
    for _ in 0..3 {
        if mdp.is_terminal() {
            break;
        }
        let _ = mdp.step(Action::Idle.id());
    }
    mdp
}

fn bench_step(c: &mut Criterion) {
    c.bench_function("mdp.step.idle", |b| {
        b.iter_batched(
            || build_mdp(20260228, 20),
            |mut mdp| {
                black_box(mdp.step(Action::Idle.id()).ok());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_abstraction(c: &mut Criterion) {
    let mdp = build_mdp(777, 50);

    c.bench_function("mdp.simplified", |b| {
        b.iter(|| black_box(mdp.simplified()));
    });

    c.bench_function("mdp.change_agents_to.linear", |b| {
        b.iter(|| black_box(mdp.change_agents_to(&AgentKind::Linear)));
    });
}

fn bench_policy_choose_action(c: &mut Criterion) {
    c.bench_function("policy.lookahead.depth2.choose_action", |b| {
        b.iter_batched(
            || (build_mdp(1234, 20), LookaheadPolicy::new(2, 0.9)),
            |(mdp, mut p)| {
                black_box(p.choose_action(&mdp));
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("policy.lookahead.depth3.beam2.choose_action", |b| {
        b.iter_batched(
            || {
                let p = LookaheadPolicy::new(3, 0.9).with_beam(Some(BeamConfig::new(1, 2)));
                (build_mdp(5678, 20), p)
            },
            |(mdp, mut p)| {
                black_box(p.choose_action(&mdp));
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    mdp_core_benches,
    bench_step,
    bench_abstraction,
    bench_policy_choose_action
);
criterion_main!(mdp_core_benches);
