// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Echo heartbeat daemon (echo-tickd)
//!
//! Drives an [`echo_sched::Scheduler`] from a fixed wall-clock interval: one
//! `advance` per interval, with a monotonically increasing tick. A handful of
//! demo actors get one repeating task each through [`ActorTaskBinding`]; half
//! of them are unbound midway so the reaping path shows up in the logs.
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::time;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use echo_config_fs::FsConfigStore;
use echo_sched::{ActorTaskBinding, ConfigService, Scheduler, TaskContext, Tick};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Milliseconds between heartbeats
    #[clap(short, long, default_value_t = 50)]
    tick_interval: u64,

    /// Stop after this many ticks (0 runs until Ctrl-C)
    #[clap(short = 'n', long, default_value_t = 200)]
    ticks: u64,

    /// Number of demo actors to bind
    #[clap(short, long, default_value_t = 4)]
    actors: usize,

    /// Actor task period in ticks (overrides the stored config)
    #[clap(short, long)]
    period: Option<i64>,

    /// Directory holding scheduler.json (defaults to the platform config dir)
    #[clap(long)]
    config_dir: Option<PathBuf>,

    /// Maximum log level
    #[clap(long, default_value_t = Level::INFO)]
    log_level: Level,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = match &args.config_dir {
        Some(dir) => FsConfigStore::at(dir)?,
        None => FsConfigStore::new()?,
    };
    info!(dir = %store.base_dir().display(), "loading scheduler config");
    let mut config = ConfigService::new(store).scheduler_config()?;
    if let Some(period) = args.period {
        config.actor_period_ticks = period;
    }

    let mut sched = Scheduler::with_config(&config);
    if !sched.is_enabled() {
        info!("scheduler configured to start paused; resuming for the heartbeat loop");
        sched.set_enabled(true)?;
    }

    let mut bindings = ActorTaskBinding::<Uuid>::from_config(&config);
    let pulses = Rc::new(Cell::new(0_u64));
    let actors: Vec<Uuid> = (0..args.actors).map(|_| Uuid::new_v4()).collect();
    for actor in &actors {
        let pulses = Rc::clone(&pulses);
        let key = *actor;
        bindings.bind(&mut sched, actor, move |ctx: &mut TaskContext| -> Result<()> {
            pulses.set(pulses.get() + 1);
            debug!(actor = %key, tick = ctx.tick(), "actor pulse");
            Ok(())
        })?;
    }
    info!(
        actors = actors.len(),
        period = bindings.default_period(),
        interval_ms = args.tick_interval,
        "heartbeat starting"
    );

    let mut interval = time::interval(Duration::from_millis(args.tick_interval));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let midpoint = args.ticks / 2;
    let mut tick: Tick = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            res = &mut ctrl_c => {
                if let Err(err) = res {
                    warn!("failed to listen for Ctrl-C: {err}");
                }
                info!("interrupt received");
                break;
            }
        }

        let report = sched.advance(tick)?;
        for failure in &report.failures {
            warn!(%failure, "task failure");
        }
        if !report.is_idle() {
            debug!(
                tick,
                executed = report.executed,
                rescheduled = report.rescheduled,
                reaped = report.reaped,
                pending = sched.pending_len(),
                "drained"
            );
        }

        if tick == midpoint && midpoint > 0 {
            let dropped = actors
                .iter()
                .step_by(2)
                .filter(|actor| bindings.unbind(*actor))
                .count();
            info!(tick, dropped, remaining = bindings.len(), "unbound half of the actors");
        }

        if args.ticks != 0 && tick + 1 >= args.ticks {
            break;
        }
        tick += 1;
    }

    sched.shutdown();
    info!(tick, pulses = pulses.get(), "heartbeat stopped");
    Ok(())
}
