use std::{cell::RefCell, rc::Rc, time::Duration};

use corridor_defence_core::{
    wire::GameSnapshot, CellCoord, Command, EnemyId, Event, Health, LayoutError, Speed,
    Timestamp, WavePhase,
};
use corridor_defence_engine::{
    HaltReason, ManualClock, Simulation, SimulationConfig, SimulationError, StarterTower, Status,
    TickOutcome,
};
use corridor_defence_world::query;

const TICK: Duration = Duration::from_millis(500);

fn started(config: SimulationConfig) -> (Simulation<ManualClock>, ManualClock) {
    let clock = ManualClock::new(Timestamp::from_millis(1_000));
    let mut simulation = Simulation::new(config, clock.clone()).expect("simulation");
    simulation.start().expect("start");
    (simulation, clock)
}

fn step(simulation: &mut Simulation<ManualClock>, clock: &ManualClock) -> Option<TickOutcome> {
    clock.advance(TICK);
    simulation.pump()
}

fn recorder() -> (Rc<RefCell<Vec<GameSnapshot>>>, impl FnMut(&GameSnapshot)) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |snapshot: &GameSnapshot| {
        sink.borrow_mut().push(snapshot.clone())
    })
}

#[test]
fn unreachable_layout_fails_construction() {
    let mut config = SimulationConfig::default();
    config.layout.grid[5][4] = 1;

    let error = Simulation::new(config, ManualClock::default()).unwrap_err();

    assert_eq!(
        error,
        SimulationError::Layout(LayoutError::Unreachable {
            start: CellCoord::new(0, 4),
            end: CellCoord::new(9, 4),
        })
    );
}

#[test]
fn first_wave_starts_after_the_initial_delay() {
    let (mut simulation, clock) = started(SimulationConfig::default());

    for _ in 0..3 {
        assert_eq!(step(&mut simulation, &clock), Some(TickOutcome::Advanced));
        assert_eq!(simulation.wave_status().phase, WavePhase::Waiting);
    }

    let _ = step(&mut simulation, &clock);

    let status = simulation.wave_status();
    assert_eq!(status.current_wave, 1);
    assert_eq!(status.phase, WavePhase::Spawning);
    assert_eq!(status.enemies_to_spawn, 6);
    assert_eq!(status.enemies_spawned, 1);
    assert_eq!(status.phase_started_at, Timestamp::from_millis(3_000));
    assert_eq!(status.next_spawn_at, Timestamp::from_millis(4_000));
}

#[test]
fn waiting_timer_starts_with_the_simulation_not_its_construction() {
    let clock = ManualClock::new(Timestamp::from_millis(1_000));
    let mut simulation =
        Simulation::new(SimulationConfig::default(), clock.clone()).expect("simulation");
    clock.advance(Duration::from_secs(10));
    simulation.start().expect("start");

    assert_eq!(
        simulation.wave_status().phase_started_at,
        Timestamp::from_millis(11_000)
    );
    for _ in 0..3 {
        assert_eq!(step(&mut simulation, &clock), Some(TickOutcome::Advanced));
        assert_eq!(simulation.wave_status().current_wave, 0);
        assert_eq!(simulation.wave_status().phase, WavePhase::Waiting);
    }

    let _ = step(&mut simulation, &clock);

    let status = simulation.wave_status();
    assert_eq!(status.current_wave, 1);
    assert_eq!(status.phase_started_at, Timestamp::from_millis(13_000));
}

#[test]
fn long_gap_runs_a_single_tick() {
    let (mut simulation, clock) = started(SimulationConfig::default());
    let (seen, observer) = recorder();
    simulation.subscribe(observer);

    clock.advance(Duration::from_secs(3_600));
    let outcome = simulation.pump();

    assert_eq!(outcome, Some(TickOutcome::Advanced));
    assert_eq!(simulation.tick_count(), 1);
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(simulation.wave_status().current_wave, 1);
    assert_eq!(
        simulation.next_deadline(),
        Some(Timestamp::from_millis(3_601_500))
    );
}

#[test]
fn starter_tower_kills_the_first_enemy_in_three_hits() {
    let (mut simulation, clock) = started(SimulationConfig::default());
    let first = EnemyId::new(0);
    let mut firing_ticks = Vec::new();
    let mut killed_at = None;

    for _ in 0..12 {
        let _ = step(&mut simulation, &clock);
        let events = simulation.last_events();
        if events.contains(&Event::TowerFired {
            tower: corridor_defence_core::TowerId::new(0),
            enemy: first,
        }) {
            firing_ticks.push(simulation.tick_count());
        }
        if events.contains(&Event::EnemyKilled { enemy: first }) {
            killed_at = Some(simulation.tick_count());
            break;
        }
    }

    assert_eq!(firing_ticks, vec![4, 6, 8]);
    assert_eq!(killed_at, Some(8));
    let snapshot = simulation.latest_snapshot();
    assert!(snapshot.enemies.iter().all(|enemy| enemy.id != "enemy-0"));
    assert_eq!(snapshot.towers[0].cooldown, 1_000);
}

#[test]
fn enemies_carry_wave_scaled_stats_on_the_wire() {
    let (mut simulation, clock) = started(SimulationConfig::default());
    for _ in 0..4 {
        let _ = step(&mut simulation, &clock);
    }

    let snapshot = simulation.latest_snapshot();
    assert_eq!(snapshot.enemies.len(), 1);
    let enemy = &snapshot.enemies[0];
    assert_eq!(enemy.id, "enemy-0");
    assert_eq!(enemy.name, "Enemy 0");
    assert_eq!(enemy.location, 1);
    assert_eq!(enemy.health, 70);
    assert_eq!(enemy.speed, 11);
}

#[test]
fn unguarded_path_ends_the_game() {
    let config = SimulationConfig {
        tower: StarterTower {
            cell: CellCoord::new(0, 0),
            range: 0,
            ..StarterTower::default()
        },
        ..SimulationConfig::default()
    };
    let (mut simulation, clock) = started(config);
    let (seen, observer) = recorder();
    simulation.subscribe(observer);

    let mut steps = 0;
    while simulation.status() == Status::Running {
        let _ = step(&mut simulation, &clock);
        steps += 1;
        assert!(steps < 200, "game never ended");
    }

    assert_eq!(simulation.status(), Status::Halted(HaltReason::GameOver));
    assert_eq!(simulation.next_deadline(), None);
    let final_snapshot = simulation.latest_snapshot().clone();
    assert_eq!(final_snapshot.user_health, -20);
    assert_eq!(
        seen.borrow().last().map(|snapshot| snapshot.user_health),
        Some(-20)
    );

    let ticks = simulation.tick_count();
    let wave = simulation.wave_status();
    let published = seen.borrow().len();
    for _ in 0..20 {
        let _ = step(&mut simulation, &clock);
    }

    assert_eq!(simulation.tick(), TickOutcome::GameOver);
    assert_eq!(simulation.tick_count(), ticks);
    assert_eq!(simulation.wave_status(), wave);
    assert_eq!(seen.borrow().len(), published);

    simulation.stop();
    assert_eq!(simulation.status(), Status::Halted(HaltReason::GameOver));
    assert_eq!(seen.borrow().len(), published);
}

#[test]
fn stop_is_idempotent_and_final() {
    let (mut simulation, clock) = started(SimulationConfig::default());
    let (seen, observer) = recorder();
    simulation.subscribe(observer);
    let _ = step(&mut simulation, &clock);

    simulation.stop();
    simulation.stop();

    assert_eq!(simulation.status(), Status::Halted(HaltReason::Stopped));
    assert_eq!(seen.borrow().len(), 3);
    assert_eq!(simulation.next_deadline(), None);
    assert_eq!(step(&mut simulation, &clock), None);
    assert_eq!(simulation.tick(), TickOutcome::Stopped);
    assert_eq!(simulation.start(), Err(SimulationError::AlreadyStarted));
    assert_eq!(simulation.tick_count(), 1);
}

#[test]
fn stop_cancels_the_pending_first_wave() {
    let (mut simulation, clock) = started(SimulationConfig::default());

    simulation.stop();
    clock.advance(Duration::from_secs(10));
    let _ = simulation.pump();

    assert_eq!(simulation.wave_status().current_wave, 0);
}

#[test]
fn observers_are_notified_in_registration_order() {
    let clock = ManualClock::new(Timestamp::from_millis(0));
    let mut simulation =
        Simulation::new(SimulationConfig::default(), clock.clone()).expect("simulation");
    let log = Rc::new(RefCell::new(Vec::new()));

    for name in ["first", "second"] {
        let log = Rc::clone(&log);
        simulation.subscribe(move |snapshot: &GameSnapshot| {
            log.borrow_mut().push((name, snapshot.server_time_ms));
        });
    }
    simulation.start().expect("start");
    clock.advance(TICK);
    let _ = simulation.pump();

    assert_eq!(
        *log.borrow(),
        vec![
            ("first", 0),
            ("second", 0),
            ("first", 0),
            ("second", 0),
            ("first", 500),
            ("second", 500),
        ]
    );
}

#[test]
fn late_subscribers_receive_the_latest_snapshot_immediately() {
    let (mut simulation, clock) = started(SimulationConfig::default());
    for _ in 0..5 {
        let _ = step(&mut simulation, &clock);
    }

    let (seen, observer) = recorder();
    simulation.subscribe(observer);

    assert_eq!(seen.borrow().as_slice(), &[simulation.latest_snapshot().clone()]);
}

#[test]
fn snapshot_mutation_does_not_leak_into_the_simulation() {
    let (mut tampered, tampered_clock) = started(SimulationConfig::default());
    let (mut pristine, pristine_clock) = started(SimulationConfig::default());
    tampered.subscribe(|snapshot: &GameSnapshot| {
        let mut copy = snapshot.clone();
        copy.enemies.clear();
        copy.grid[0][4] = 1;
        copy.user_health = -1;
    });

    for _ in 0..8 {
        let mut taken = tampered.snapshot();
        taken.towers.clear();
        taken.path.reverse();
        taken.wave.current_wave = 99;

        let _ = step(&mut tampered, &tampered_clock);
        let _ = step(&mut pristine, &pristine_clock);
    }

    assert_eq!(tampered.latest_snapshot(), pristine.latest_snapshot());
    assert_eq!(tampered.snapshot(), pristine.snapshot());
}

#[test]
fn direct_ticks_apply_movement_without_elapsed_time() {
    let clock = ManualClock::new(Timestamp::from_millis(0));
    let mut simulation =
        Simulation::new(SimulationConfig::default(), clock).expect("simulation");
    simulation.apply(Command::SpawnEnemy {
        enemy: EnemyId::new(40),
        health: Health::new(1_000),
        speed: Speed::new(10),
    });

    assert_eq!(simulation.tick(), TickOutcome::Advanced);
    assert_eq!(simulation.tick(), TickOutcome::Advanced);

    let enemies = query::enemy_view(simulation.world()).into_vec();
    assert_eq!(enemies[0].path_index, 2);
    assert_eq!(enemies[0].health, Health::new(950));
    assert_eq!(simulation.latest_snapshot().towers[0].cooldown, 500);
}

#[test]
fn identical_inputs_replay_identically() {
    fn run() -> Vec<(GameSnapshot, Vec<Event>)> {
        let (mut simulation, clock) = started(SimulationConfig::default());
        let mut trace = Vec::new();
        while simulation.status() == Status::Running && trace.len() < 120 {
            let _ = step(&mut simulation, &clock);
            trace.push((
                simulation.latest_snapshot().clone(),
                simulation.last_events().to_vec(),
            ));
        }
        trace
    }

    let first = run();
    let second = run();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn snapshot_serialises_with_the_client_field_names() {
    let (mut simulation, clock) = started(SimulationConfig::default());
    for _ in 0..4 {
        let _ = step(&mut simulation, &clock);
    }

    let value = serde_json::to_value(simulation.latest_snapshot()).expect("json");

    assert_eq!(value["userHealth"], 100);
    assert_eq!(value["wave"]["state"], "spawning");
    assert_eq!(value["wave"]["currentWave"], 1);
    assert_eq!(value["wave"]["config"]["timeBetweenWaves"], 5_000);
    assert_eq!(value["towers"][0]["baseCooldownMs"], 1_000);
    assert_eq!(value["towers"][0]["location"]["x"], 3);
    assert_eq!(value["enemies"][0]["location"], 1);
    assert_eq!(value["path"][9]["x"], 9);
}
