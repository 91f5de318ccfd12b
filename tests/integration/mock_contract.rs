//! In-memory scratcher contract for integration testing.
//!
//! Tracks games, mirrors the contract's offer/accept/play transitions,
//! and records every transaction the relay submits.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use scratcher_house::chain::{ScratcherContract, TxOutcome};
use scratcher_house::types::{GameState, GameView};

/// A submitted house transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentTx {
    SetOffer { game_id: u64, amount: u128 },
    Accept { game_id: u64 },
    Play { game_id: u64, cells: [u8; 3] },
}

pub struct MockContract {
    games: Mutex<HashMap<u64, GameView>>,
    sent: Mutex<Vec<SentTx>>,
    /// If set, every call fails with this RPC error.
    force_error: Mutex<Option<String>>,
    /// If set, transactions are mined but reverted.
    revert: Mutex<bool>,
    nonce: AtomicU64,
}

impl MockContract {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            force_error: Mutex::new(None),
            revert: Mutex::new(false),
            nonce: AtomicU64::new(1),
        }
    }

    /// Insert a game with the given state and per-round payouts (micro-USDC).
    pub fn with_game(self, game_id: u64, state: GameState, revealed: [u128; 3]) -> Self {
        self.games.lock().unwrap().insert(
            game_id,
            GameView {
                game_id,
                player: "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".to_string(),
                state,
                chosen_cells: [0, 1, 2, 3, 4, 5, 6, 7, 8],
                revealed_payouts: revealed,
                offered_payouts: [0; 3],
                hole_found: false,
                cell_payouts: [0; 9],
            },
        );
        self
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn set_revert(&self, revert: bool) {
        *self.revert.lock().unwrap() = revert;
    }

    /// Move a game to another state, as the VRF callback would.
    pub fn set_state(&self, game_id: u64, state: GameState) {
        if let Some(game) = self.games.lock().unwrap().get_mut(&game_id) {
            game.state = state;
        }
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.sent.lock().unwrap().clone()
    }

    pub fn game(&self, game_id: u64) -> Option<GameView> {
        self.games.lock().unwrap().get(&game_id).cloned()
    }

    fn check_error(&self) -> Result<()> {
        match self.force_error.lock().unwrap().as_ref() {
            Some(msg) => Err(anyhow!("{msg}")),
            None => Ok(()),
        }
    }

    /// Mint a receipt; only successful transactions are recorded.
    fn mine(&self, tx: SentTx) -> TxOutcome {
        let n = self.nonce.fetch_add(1, Ordering::SeqCst);
        let success = !*self.revert.lock().unwrap();
        if success {
            self.sent.lock().unwrap().push(tx);
        }
        TxOutcome {
            hash: format!("0x{n:064x}"),
            success,
            block: Some(1_000 + n),
        }
    }
}

#[async_trait]
impl ScratcherContract for MockContract {
    async fn get_game(&self, game_id: u64) -> Result<GameView> {
        self.check_error()?;
        self.game(game_id)
            .ok_or_else(|| anyhow!("execution reverted: game {game_id} does not exist"))
    }

    async fn set_house_offer(&self, game_id: u64, amount: u128) -> Result<TxOutcome> {
        self.check_error()?;
        let outcome = self.mine(SentTx::SetOffer { game_id, amount });
        if outcome.success {
            let mut games = self.games.lock().unwrap();
            let game = games
                .get_mut(&game_id)
                .ok_or_else(|| anyhow!("execution reverted: game {game_id} does not exist"))?;
            let Some(round) = game.state.current_round() else {
                bail!("execution reverted: game {game_id} is finished");
            };
            game.offered_payouts[round as usize - 1] = amount;
        }
        Ok(outcome)
    }

    async fn accept_offer(&self, game_id: u64) -> Result<TxOutcome> {
        self.check_error()?;
        let outcome = self.mine(SentTx::Accept { game_id });
        if outcome.success {
            if let Some(game) = self.games.lock().unwrap().get_mut(&game_id) {
                game.state = GameState::Finished;
            }
        }
        Ok(outcome)
    }

    async fn play_round(&self, game_id: u64, cells: [u8; 3]) -> Result<TxOutcome> {
        self.check_error()?;
        let outcome = self.mine(SentTx::Play { game_id, cells });
        if outcome.success {
            if let Some(game) = self.games.lock().unwrap().get_mut(&game_id) {
                game.state = match game.state {
                    GameState::Round1Negotiation => GameState::AwaitingRandomnessRound2,
                    GameState::Round2Negotiation => GameState::AwaitingRandomnessRound3,
                    other => other,
                };
            }
        }
        Ok(outcome)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
