#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use std::path::PathBuf;
#[cfg(feature = "std")]
use std::sync::Arc;

#[cfg(feature = "std")]
use battleship_agent::{
    init_logging, ledger::InMemoryLedger, Agent, AgentConfig, Collaborators, GameOutcome,
    HeuristicOracle, HousePlayer, LedgerClient, OllamaConfig, OllamaOracle, OracleClient,
    PlayerId,
};
#[cfg(feature = "std")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "std")]
use rand::rngs::SmallRng;
#[cfg(feature = "std")]
use rand::SeedableRng;
#[cfg(feature = "std")]
use serde_json::json;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Debug)]
#[cfg(feature = "std")]
enum OracleKind {
    Heuristic,
    Ollama,
}

#[derive(Parser)]
#[cfg(feature = "std")]
enum Commands {
    /// Play the agent against house opponents on an in-process ledger.
    Local {
        #[arg(long, default_value_t = 1)]
        games: usize,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value_t = OracleKind::Heuristic)]
        oracle: OracleKind,
        #[arg(long, default_value = "http://127.0.0.1:11434/api/generate")]
        ollama_endpoint: String,
        #[arg(long, help = "Model requested by the house when opening games")]
        model: Option<String>,
        #[arg(long, help = "JSON file with agent settings")]
        config: Option<PathBuf>,
        #[arg(long, help = "Poll interval in milliseconds")]
        poll_ms: Option<u64>,
    },
}

#[cfg(feature = "std")]
fn rng_for(seed: Option<u64>, offset: u64) -> SmallRng {
    match seed {
        Some(s) => SmallRng::seed_from_u64(s.wrapping_add(offset)),
        None => {
            let mut seed_rng = rand::rng();
            SmallRng::from_rng(&mut seed_rng)
        }
    }
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Local {
            games,
            seed,
            oracle,
            ollama_endpoint,
            model,
            config,
            poll_ms,
        } => {
            let mut config = match config {
                Some(path) => AgentConfig::from_json_file(&path)?,
                None => AgentConfig::default(),
            };
            if let Some(ms) = poll_ms {
                config.poll_interval_ms = ms;
            }
            if let Some(m) = &model {
                config.model = m.clone();
            }
            if let Some(s) = seed {
                log::info!("Using fixed seed: {} (placements will be reproducible)", s);
            }

            let ledger = Arc::new(InMemoryLedger::new());
            let agent_client: Arc<dyn LedgerClient> =
                Arc::new(ledger.connect(PlayerId::new("agent")));
            let oracle: Arc<dyn OracleClient> = match oracle {
                OracleKind::Heuristic => Arc::new(HeuristicOracle::default()),
                OracleKind::Ollama => Arc::new(OllamaOracle::new(OllamaConfig {
                    endpoint: ollama_endpoint,
                })),
            };
            let deps = Collaborators::new(agent_client, oracle, None);
            let mut agent = Agent::new(deps, config.clone()).with_seed(seed);
            agent.preflight().await?;
            let feed = agent.listen();

            let mut houses = Vec::with_capacity(games);
            for i in 0..games {
                let client: Arc<dyn LedgerClient> =
                    Arc::new(ledger.connect(PlayerId::new(format!("house-{}", i))));
                let mut house = HousePlayer::new(
                    client,
                    rng_for(seed, 1_000 + i as u64),
                    config.poll_interval(),
                );
                let model = config.model.clone();
                houses.push(tokio::spawn(async move {
                    let game = house.open_game(&model).await?;
                    house.play(game).await
                }));
            }

            let reports = agent.serve(feed, games).await;
            for house in houses {
                match house.await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => log::warn!("house player stopped: {:#}", e),
                    Err(e) => log::warn!("house task failed: {}", e),
                }
            }
            agent.collaborators().detach();

            let count = |want: GameOutcome| {
                reports
                    .iter()
                    .filter(|r| matches!(&r.result, Ok(o) if *o == want))
                    .count()
            };
            let calls = ledger.calls();
            let summary = json!({
                "games": reports.len(),
                "won": count(GameOutcome::Won),
                "lost": count(GameOutcome::Lost),
                "no_contest": count(GameOutcome::NoContest),
                "failed": reports.iter().filter(|r| r.result.is_err()).count(),
                "reports": reports.iter().map(|r| match &r.result {
                    Ok(outcome) => json!({ "game": r.game.0, "outcome": format!("{:?}", outcome) }),
                    Err(cause) => json!({ "game": r.game.0, "error": cause }),
                }).collect::<Vec<_>>(),
                "ledger_calls": {
                    "fleet_placements": calls.fleet_placements,
                    "shot_attempts": calls.shot_attempts,
                    "odds_attempts": calls.odds_attempts,
                },
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
