use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use worldsync_common::{Direction, Directions, EntityId, Position, PrivilegeLevel};
use worldsync_kernel::{Npc, Player, SynchronizationBlock, World};
use worldsync_sync::{ChannelSink, ClientSynchronizer, SyncConfig};

/// Tile the simulated crowd is centred on.
const CENTRE: (i32, i32) = (3222, 3218);

#[derive(Parser)]
#[command(name = "worldsync-cli", about = "CLI tool for view synchronization")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML synchronization config; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and effective configuration
    Info,
    /// Simulate a wandering crowd and report each synchronization tick
    Simulate {
        /// Number of players to spawn
        #[arg(short, long, default_value = "300")]
        players: usize,
        /// Number of npcs to spawn
        #[arg(short, long, default_value = "50")]
        npcs: usize,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "10")]
        ticks: u64,
        /// RNG seed for a reproducible crowd
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Half-width, in tiles, of the square the crowd spawns in
        #[arg(long, default_value = "12")]
        spread: i32,
        /// Print the last message sent to this player index as JSON
        #[arg(long)]
        dump: Option<u16>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SyncConfig::default(),
    };

    match cli.command {
        Commands::Info => {
            println!("worldsync-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("sync: {}", worldsync_sync::crate_info());
            println!(
                "config: max_local_mobs={} new_mobs_per_tick={} default_viewing_distance={} tick_budget_ms={}",
                config.max_local_mobs,
                config.new_mobs_per_tick,
                config.default_viewing_distance,
                config.tick_budget_ms
            );
        }
        Commands::Simulate {
            players,
            npcs,
            ticks,
            seed,
            spread,
            dump,
        } => simulate(config, players, npcs, ticks, seed, spread, dump.map(EntityId))?,
    }

    Ok(())
}

fn simulate(
    config: SyncConfig,
    players: usize,
    npcs: usize,
    ticks: u64,
    seed: u64,
    spread: i32,
    dump: Option<EntityId>,
) -> anyhow::Result<()> {
    let spread = spread.max(0);
    println!("Simulating {players} players and {npcs} npcs for {ticks} ticks (seed={seed})");

    let mut world = World::with_seed(seed);
    populate(&mut world, players, npcs, spread)?;

    let mut sync = ClientSynchronizer::new(config);
    let (sink, rx) = ChannelSink::new();
    let mut last_dump = None;

    for _ in 0..ticks {
        wander(&mut world, spread);
        let report = sync.synchronize(&mut world, &sink);
        for (observer, message) in rx.try_iter() {
            if Some(observer) == dump {
                last_dump = Some(message);
            }
        }
        println!("{report}");
        world.step();
    }

    let timer = sync.timer();
    println!(
        "sync time: avg={:?} min={:?} max={:?} over {} ticks, {} over the {:?} budget",
        timer.average(),
        timer.min(),
        timer.max(),
        timer.count(),
        timer.overruns(),
        timer.budget()
    );

    if let Some(observer) = dump {
        match last_dump {
            Some(message) => println!("{}", serde_json::to_string_pretty(&message)?),
            None => println!("no message was sent to {observer}"),
        }
    }
    Ok(())
}

fn offset(world: &World, salt: u64, spread: i32) -> i32 {
    let span = (2 * spread + 1).max(1) as u64;
    (world.random(salt) % span) as i32 - spread
}

fn populate(world: &mut World, players: usize, npcs: usize, spread: i32) -> anyhow::Result<()> {
    for i in 0..players {
        let salt = i as u64 * 2;
        let pos = Position::new(
            CENTRE.0 + offset(world, salt, spread),
            CENTRE.1 + offset(world, salt + 1, spread),
        );
        let mut player = Player::new(format!("player{i}"));
        if i % 50 == 0 {
            player.privilege = PrivilegeLevel::Moderator;
        }
        // everyone knows a couple of their neighbours in spawn order
        player.friends.insert(format!("player{}", i + 1));
        player.ignores.insert(format!("player{}", i + 2));
        world
            .spawn_player(player, pos)
            .context("spawning simulated player")?;
    }
    for i in 0..npcs {
        let salt = 1_000_000 + i as u64 * 2;
        let pos = Position::new(
            CENTRE.0 + offset(world, salt, spread),
            CENTRE.1 + offset(world, salt + 1, spread),
        );
        world
            .spawn_npc(Npc { type_id: (i % 100) as u16 }, pos)
            .context("spawning simulated npc")?;
    }
    Ok(())
}

/// Random-walk every mob, with the occasional run, teleport or chat line.
fn wander(world: &mut World, spread: i32) {
    let rolls: Vec<(EntityId, u64, u64)> = world
        .active_mobs()
        .map(|m| {
            let salt = m.id.0 as u64;
            (m.id, world.random(salt), world.random(salt ^ 0xffff))
        })
        .collect();

    for (id, roll, extra) in rolls {
        let Some(mob) = world.get_mut(id) else {
            continue;
        };
        let step = Direction::STEPS[(extra % 8) as usize];
        match roll % 100 {
            0..=54 => mob.walk_one(step),
            55..=59 => mob.walk(Directions::running(step, step)),
            60..=61 => {
                let dx = (extra % (2 * spread as u64 + 1)) as i32 - spread;
                let dy = ((extra >> 16) % (2 * spread as u64 + 1)) as i32 - spread;
                mob.teleport(Position::new(CENTRE.0 + dx, CENTRE.1 + dy));
            }
            62..=64 => {
                if let Some(player) = mob.as_player() {
                    let chat = SynchronizationBlock::chat(player, "hello");
                    mob.add_block(chat);
                }
            }
            _ => {}
        }
    }
}
