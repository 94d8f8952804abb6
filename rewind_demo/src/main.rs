use std::{cell::RefCell, path::Path, process, rc::Rc};

use clap::{App, Arg, ArgMatches};
use rewind_timeline::{
    CurveHandle, EntityId, RewindConfig, RewindEngine, RewindEvent, RewindSettings,
};
use rewind_types::Vec3;
use tracing::Level;

use crate::world::DemoWorld;

mod logging;
mod world;

type Error = Box<dyn std::error::Error>;
type Result<T> = std::result::Result<T, Error>;

/// Upper bound on reverse ticks, in case the threshold is set too low to ever end the rewind.
const MAX_REVERSE_TICKS: usize = 100_000;

pub fn main() {
    let matches = App::new("rewind_demo")
        .about("Records a small physics scene and then rewinds it")
        .arg(
            Arg::with_name("bodies")
                .long("bodies")
                .value_name("N")
                .default_value("3")
                .help("number of rigid bodies to simulate (plus one skeletal body)"),
        )
        .arg(
            Arg::with_name("record")
                .long("record")
                .value_name("SECONDS")
                .default_value("5")
                .help("simulated seconds to record before rewinding"),
        )
        .arg(
            Arg::with_name("step")
                .long("step")
                .value_name("SECONDS")
                .default_value("0.1")
                .help("duration of each simulation step"),
        )
        .arg(
            Arg::with_name("settings")
                .long("settings")
                .value_name("FILE")
                .help("JSON rewind settings to start from"),
        )
        .arg(
            Arg::with_name("window")
                .long("window")
                .value_name("SECONDS")
                .help("override the recorded window length"),
        )
        .arg(
            Arg::with_name("speed")
                .long("speed")
                .value_name("X")
                .help("override the rewind speed"),
        )
        .arg(
            Arg::with_name("threshold")
                .long("threshold")
                .value_name("FRAMES")
                .help("override the average frames left at which the rewind ends"),
        )
        .arg(
            Arg::with_name("curve")
                .long("curve")
                .value_name("FILE")
                .help("JSON speed curve, loaded in the background"),
        )
        .arg(
            Arg::with_name("despawn")
                .long("despawn")
                .help("destroy the first body halfway through recording"),
        )
        .arg(
            Arg::with_name("log")
                .long("log")
                .value_name("FILE")
                .help("also append log output to this file"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("log debug output"),
        )
        .get_matches();

    run(&matches).unwrap_or_else(|error| {
        eprintln!("Error: {}", error);
        process::exit(1);
    });
}

fn run(matches: &ArgMatches<'_>) -> Result<()> {
    let max_level = if matches.is_present("verbose") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    logging::init(matches.value_of("log").map(Path::new), max_level)?;

    let config = load_config(matches)?;
    let body_count: u32 = parse_arg(matches, "bodies")?;
    let record_seconds: f32 = parse_arg(matches, "record")?;
    let step: f32 = parse_arg(matches, "step")?;
    if !(step > 0.0) {
        return Err(format!("--step must be positive, got {}", step).into());
    }

    let mut engine = RewindEngine::new(DemoWorld::new(), config)?;
    let entities = spawn_scene(&mut engine, body_count);

    let ended = Rc::new(RefCell::new(0usize));
    let ended_sink = Rc::clone(&ended);
    engine.add_listener(move |event| {
        if let RewindEvent::EntityReverseEnded(_) = event {
            *ended_sink.borrow_mut() += 1;
        }
    });

    let record_ticks = (record_seconds / step).round() as usize;
    tracing::info!("recording {} ticks of {} s", record_ticks, step);
    for tick in 0..record_ticks {
        if matches.is_present("despawn") && tick == record_ticks / 2 {
            tracing::info!("despawning {}", entities[0]);
            engine.accessor_mut().despawn(entities[0]);
        }
        engine.accessor_mut().step(step);
        engine.tick(step);
    }

    println!("Recorded:");
    let before = report(&engine, &entities);

    engine.start_reverse();
    let mut reverse_ticks = 0;
    while engine.is_reversing() && reverse_ticks < MAX_REVERSE_TICKS {
        engine.tick(step);
        reverse_ticks += 1;
    }
    if engine.is_reversing() {
        tracing::warn!("rewind still running after {} ticks; ending it", reverse_ticks);
        engine.end_reverse();
    }

    println!("Rewound in {} ticks:", reverse_ticks);
    let after = report(&engine, &entities);
    for (entity, (from, to)) in entities.iter().zip(before.iter().zip(after.iter())) {
        if let (Some(from), Some(to)) = (from, to) {
            println!("  {}: moved back {:.3}", entity, (*from - *to).mag());
        }
    }

    let stats = engine.stats();
    println!(
        "Frames recorded: {}, evicted: {}, consumed: {}; {} end notifications",
        stats.frames_recorded,
        stats.frames_evicted,
        stats.frames_consumed,
        ended.borrow()
    );
    Ok(())
}

fn parse_arg<T>(matches: &ArgMatches<'_>, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + 'static,
{
    let value = matches
        .value_of(name)
        .ok_or_else(|| format!("missing --{}", name))?;
    Ok(value.parse()?)
}

fn load_config(matches: &ArgMatches<'_>) -> Result<RewindConfig> {
    let mut settings = match matches.value_of("settings") {
        Some(path) => RewindSettings::load(Path::new(path))?,
        None => RewindSettings::default(),
    };
    if matches.is_present("window") {
        settings.record_seconds = parse_arg(matches, "window")?;
    }
    if matches.is_present("speed") {
        settings.rewind_speed = parse_arg(matches, "speed")?;
    }
    if matches.is_present("threshold") {
        settings.min_average_frames = parse_arg(matches, "threshold")?;
    }

    let mut config = settings.into_config()?;
    if let Some(path) = matches.value_of("curve") {
        config.speed_curve = Some(CurveHandle::load_in_background(path));
    }
    Ok(config)
}

fn spawn_scene(engine: &mut RewindEngine<DemoWorld>, body_count: u32) -> Vec<EntityId> {
    let mut entities = Vec::new();
    for i in 0..=body_count {
        let skeletal = i == body_count;
        let offset = i as f32;
        let (entity, controller) = engine.accessor_mut().spawn(
            Vec3::new(offset * 2.0, 3.0 + offset, 0.0),
            Vec3::new(1.0, 2.0 * offset, -0.5 * offset),
            0.5 + offset,
            skeletal,
        );
        engine.register(entity, controller);
        entities.push(entity);
    }
    entities
}

fn report(engine: &RewindEngine<DemoWorld>, entities: &[EntityId]) -> Vec<Option<Vec3>> {
    entities
        .iter()
        .map(|&entity| {
            let position = engine.accessor().position(entity);
            let (frames, seconds) = engine
                .history(entity)
                .map_or((0, 0.0), |history| (history.len(), history.recorded_seconds()));
            match position {
                Some(p) => println!(
                    "  {}: ({:.3}, {:.3}, {:.3}), {} frames / {:.2} s",
                    entity, p.x, p.y, p.z, frames, seconds
                ),
                None => println!("  {}: despawned", entity),
            }
            if let Some(pose) = engine.accessor().applied_pose(entity) {
                println!("    pose with {} bones applied", pose.len());
            }
            position
        })
        .collect()
}
