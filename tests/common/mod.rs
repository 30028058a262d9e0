#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use battleship_agent::correlator::{CorrelationId, OracleResponse};
use battleship_agent::encryption::SealedFleet;
use battleship_agent::events::{EventRegistry, GameEnded, LedgerEvents, ShotFired};
use battleship_agent::ledger::{
    GameId, GameRecord, GameStatus, LedgerCall, LedgerClient, PlayerId, ReceiptEvent,
    ResourceEstimate, ShotReceipt, TxFees,
};
use battleship_agent::oracle::OracleClient;
use battleship_agent::{AgentConfig, Collaborators, GameSession, BOARD_CELLS};
use rand::rngs::SmallRng;
use rand::SeedableRng;

pub const GAME: GameId = GameId(7);

pub fn agent_id() -> PlayerId {
    PlayerId::new("agent")
}

pub fn house_id() -> PlayerId {
    PlayerId::new("house")
}

/// Active game with both fleets placed, the agent seated as player 1.
pub fn active_record() -> GameRecord {
    GameRecord {
        id: GAME,
        player1: agent_id(),
        player2: Some(house_id()),
        player1s_turn: true,
        model: String::new(),
        fleets_placed: [true, true],
        status: GameStatus::Active,
    }
}

#[derive(Default)]
struct LedgerScript {
    record: Option<GameRecord>,
    /// Shots landed on each player's board.
    agent_board: Vec<u8>,
    house_board: Vec<u8>,
    /// Cells of the house fleet.
    house_fleet: Vec<u8>,
    shots: Vec<u8>,
    shot_attempts: u32,
    odds: Vec<u32>,
    odds_attempts: u32,
    fail_shots: u32,
    fail_odds: u32,
    healthy: bool,
    /// Receipts carry no shot events.
    bare_receipts: bool,
}

/// Ledger fake for one game. The turn never passes to the house, so every
/// `step` is an agent turn unless a test flips it.
pub struct ScriptedLedger {
    account: PlayerId,
    events: LedgerEvents,
    script: Mutex<LedgerScript>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self {
            account: agent_id(),
            events: LedgerEvents::new(),
            script: Mutex::new(LedgerScript {
                record: Some(active_record()),
                agent_board: vec![0; BOARD_CELLS],
                house_board: vec![0; BOARD_CELLS],
                house_fleet: vec![12, 13, 14, 15],
                healthy: true,
                ..LedgerScript::default()
            }),
        }
    }

    pub fn with_agent_board(self, board: &[u8]) -> Self {
        self.script.lock().unwrap().agent_board = board.to_vec();
        self
    }

    pub fn with_house_fleet(self, cells: &[u8]) -> Self {
        self.script.lock().unwrap().house_fleet = cells.to_vec();
        self
    }

    pub fn with_bare_receipts(self) -> Self {
        self.script.lock().unwrap().bare_receipts = true;
        self
    }

    pub fn set_record(&self, record: GameRecord) {
        self.script.lock().unwrap().record = Some(record);
    }

    pub fn record(&self) -> GameRecord {
        self.script.lock().unwrap().record.clone().unwrap()
    }

    pub fn end_externally(&self, winner: Option<PlayerId>) {
        let mut script = self.script.lock().unwrap();
        if let Some(record) = script.record.as_mut() {
            record.status = GameStatus::Ended { winner };
        }
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.script.lock().unwrap().healthy = healthy;
    }

    pub fn fail_next_shots(&self, n: u32) {
        self.script.lock().unwrap().fail_shots = n;
    }

    pub fn fail_next_odds(&self, n: u32) {
        self.script.lock().unwrap().fail_odds = n;
    }

    pub fn shots(&self) -> Vec<u8> {
        self.script.lock().unwrap().shots.clone()
    }

    pub fn shot_attempts(&self) -> u32 {
        self.script.lock().unwrap().shot_attempts
    }

    pub fn odds(&self) -> Vec<u32> {
        self.script.lock().unwrap().odds.clone()
    }

    pub fn odds_attempts(&self) -> u32 {
        self.script.lock().unwrap().odds_attempts
    }
}

#[async_trait::async_trait]
impl LedgerClient for ScriptedLedger {
    fn account(&self) -> &PlayerId {
        &self.account
    }

    fn events(&self) -> &LedgerEvents {
        &self.events
    }

    async fn health(&self) -> anyhow::Result<()> {
        if self.script.lock().unwrap().healthy {
            Ok(())
        } else {
            anyhow::bail!("connection refused")
        }
    }

    async fn create_game(&self, _model: &str) -> anyhow::Result<GameId> {
        anyhow::bail!("scripted ledger holds a single game")
    }

    async fn join_game(&self, _game: GameId) -> anyhow::Result<()> {
        Ok(())
    }

    async fn game(&self, game: GameId) -> anyhow::Result<GameRecord> {
        let script = self.script.lock().unwrap();
        match &script.record {
            Some(record) if record.id == game => Ok(record.clone()),
            _ => anyhow::bail!("unknown game {}", game),
        }
    }

    async fn cell_status(&self, _game: GameId, player: &PlayerId) -> anyhow::Result<Vec<u8>> {
        let script = self.script.lock().unwrap();
        if *player == agent_id() {
            Ok(script.agent_board.clone())
        } else {
            Ok(script.house_board.clone())
        }
    }

    async fn estimate(&self, _game: GameId, _call: LedgerCall) -> anyhow::Result<ResourceEstimate> {
        Ok(ResourceEstimate {
            units: 1_000,
            unit_price: 10,
        })
    }

    async fn place_fleet(
        &self,
        _game: GameId,
        _fleet: &SealedFleet,
        _fees: TxFees,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn fire_shot(
        &self,
        game: GameId,
        position: u8,
        fees: TxFees,
    ) -> anyhow::Result<ShotReceipt> {
        assert_eq!(fees.limit, 1_500, "limit padded by half");
        assert_eq!(fees.price, 12, "price padded by a fifth");
        let mut script = self.script.lock().unwrap();
        script.shot_attempts += 1;
        if script.fail_shots > 0 {
            script.fail_shots -= 1;
            anyhow::bail!("transaction dropped");
        }
        let hit = script.house_fleet.contains(&position);
        script.house_board[position as usize] = if hit { 2 } else { 1 };
        script.shots.push(position);

        let mut events = Vec::new();
        if !script.bare_receipts {
            events.push(ReceiptEvent::ShotFired(ShotFired {
                game_id: game,
                shooter: agent_id(),
                position,
                hit,
            }));
        }
        let sunk = script
            .house_fleet
            .iter()
            .all(|&p| script.house_board[p as usize] == 2);
        if sunk {
            if let Some(record) = script.record.as_mut() {
                record.status = GameStatus::Ended {
                    winner: Some(agent_id()),
                };
            }
            events.push(ReceiptEvent::GameEnded(GameEnded {
                game_id: game,
                winner: Some(agent_id()),
            }));
        }
        Ok(ShotReceipt { events })
    }

    async fn update_odds(&self, _game: GameId, odds: u32, _fees: TxFees) -> anyhow::Result<()> {
        let mut script = self.script.lock().unwrap();
        script.odds_attempts += 1;
        if script.fail_odds > 0 {
            script.fail_odds -= 1;
            anyhow::bail!("odds transaction dropped");
        }
        script.odds.push(odds);
        Ok(())
    }
}

/// How the scripted oracle answers one request.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    /// Answer under a different correlation id.
    Stray(String),
    Silent,
    /// Reject the request outright.
    Refuse,
    /// Accept the request, then notify that it failed.
    Fail(String),
}

pub fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
}

/// Oracle fake that answers synchronously from a queue. An empty queue is
/// silent.
pub struct ScriptedOracle {
    responses: EventRegistry<OracleResponse>,
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<(CorrelationId, String, String)>>,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            responses: EventRegistry::new(),
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Every request seen: (id, prompt, model).
    pub fn requests(&self) -> Vec<(CorrelationId, String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl OracleClient for ScriptedOracle {
    async fn start_request(
        &self,
        id: CorrelationId,
        prompt: &str,
        model: &str,
    ) -> anyhow::Result<()> {
        self.prompts
            .lock()
            .unwrap()
            .push((id, prompt.to_string(), model.to_string()));
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Silent);
        let response = match reply {
            Reply::Text(content) => OracleResponse::reply(id, content, "scripted"),
            Reply::Stray(content) => {
                OracleResponse::reply(CorrelationId(id.0 + 1_000), content, "scripted")
            }
            Reply::Silent => return Ok(()),
            Reply::Refuse => anyhow::bail!("oracle rejected the request"),
            Reply::Fail(cause) => OracleResponse::failed(id, cause, "scripted"),
        };
        self.responses.emit(&response);
        Ok(())
    }

    fn responses(&self) -> &EventRegistry<OracleResponse> {
        &self.responses
    }
}

pub fn collaborators(ledger: &Arc<ScriptedLedger>, oracle: &Arc<ScriptedOracle>) -> Collaborators {
    Collaborators::new(ledger.clone(), oracle.clone(), None)
}

pub fn session(deps: &Collaborators, config: AgentConfig) -> GameSession {
    GameSession::new(GAME, deps, config, SmallRng::seed_from_u64(42))
}
