use anyhow::Context;
use clap::Parser;
use plinko_execution::rtp;
use plinko_simulator::{Api, Config, Simulator};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::{info, warn};

/// How often the driver catches the session clock up with wall-clock time.
const DRIVER_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file (defaults to the standard board)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(long)]
    log_level: Option<String>,

    /// Play this many drops headless and exit
    #[arg(long, conflicts_with = "rtp")]
    autoplay: Option<u64>,

    /// Report the board's return to player over this many simulated balls and exit
    #[arg(long)]
    rtp: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Load config
    let mut config = match &args.config {
        Some(path) => {
            let file = std::fs::read_to_string(path)
                .with_context(|| format!("could not read config file {}", path.display()))?;
            serde_yaml::from_str::<Config>(&file).context("could not parse config file")?
        }
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(log_level) = args.log_level {
        config.log_level = log_level;
    }
    let config = config.validate().context("invalid configuration")?;

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let board = Arc::new(config.board);
    let seed = config.seed.unwrap_or_else(rand::random);
    info!(
        rows = board.rows(),
        bet_cost = board.bet_cost(),
        balls_per_drop = board.balls_per_drop(),
        seed,
        "loaded board"
    );

    if let Some(rounds) = args.rtp {
        let estimate = rtp::simulate(&board, rounds, seed);
        println!("rows:            {}", board.rows());
        println!("expected return: {:.6}", rtp::expected_multiplier(&board));
        println!("house edge:      {:.6}", rtp::house_edge(&board));
        println!("simulated:       {:.6} over {} balls", estimate.rtp(), estimate.rounds);
        println!("wins / losses:   {} / {}", estimate.wins, estimate.losses);
        for (slot, hits) in estimate.slot_hits.iter().enumerate() {
            println!(
                "slot {:>2} {:>8}: {}",
                slot,
                board.multipliers()[slot].to_string(),
                hits
            );
        }
        return Ok(());
    }

    let simulator = Arc::new(Simulator::new(
        board.clone(),
        config.start_balance,
        ChaCha8Rng::seed_from_u64(seed),
    ));

    if let Some(drops) = args.autoplay {
        let mut played = 0;
        for _ in 0..drops {
            if !simulator.request_drop() {
                warn!(played, "balance exhausted");
                break;
            }
            played += 1;
            simulator.advance_by(board.timing().tick_interval);
        }
        simulator.run_until_idle();
        let snapshot = simulator
            .snapshot()
            .context("session unavailable after autoplay")?;
        info!(
            played,
            balance = snapshot.account.balance,
            total_wagered = snapshot.account.total_wagered,
            total_won = snapshot.account.total_won,
            wins = snapshot.account.wins,
            losses = snapshot.account.losses,
            "autoplay finished"
        );
        return Ok(());
    }

    // Drive ball timers in wall-clock time
    let driver = simulator.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(DRIVER_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            driver.tick();
        }
    });

    let api = Api::new(simulator);
    let app = api.router();

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);
    axum::serve(listener, app)
        .await
        .context("axum server error")?;

    Ok(())
}
