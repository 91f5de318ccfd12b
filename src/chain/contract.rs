//! Scratcher contract access.
//!
//! `ScratcherContract` is the seam the relay talks to. `EthersScratcher`
//! implements it over JSON-RPC with a locally held house wallet; tests use
//! an in-memory implementation instead.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ethers::contract::{abigen, ContractCall};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::LocalWallet;
use ethers::types::{Address, U256, U64};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::key::HouseKey;
use crate::config::ChainConfig;
use crate::types::{GameState, GameView};

abigen!(
    TurnScratcher,
    r#"[
        struct Game { address player; uint8 state; uint256 vrfRequestId; uint8[9] chosenCells; bool[9] isCellChosen; uint256[3] revealedPayouts; uint256[3] offeredPayouts; bool holeFound; uint256[9] cellPayouts; uint256[9] cellRandomValues; }
        function getGame(uint256 gameId) external view returns (Game)
        function estimateVRFFee() external view returns (uint256)
        function startGame(uint8[3] cellIndexes) external payable returns (uint256)
        function playRound(uint256 gameId, uint8[3] cellIndexes) external payable
        function setHouseOffer(uint256 gameId, uint256 amount) external
        function acceptOffer(uint256 gameId) external
        event GameStarted(uint256 indexed gameId, address indexed player)
        event RoundRevealed(uint256 indexed gameId, uint8 round, uint256 payout)
        event OfferSet(uint256 indexed gameId, uint8 round, uint256 offer)
        event GameFinished(uint256 indexed gameId, uint256 totalPayout)
        event GameFinishedByHole(uint256 indexed gameId)
    ]"#
);

/// Result of a mined house transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOutcome {
    /// 0x-prefixed transaction hash.
    pub hash: String,
    /// Receipt status was 1.
    pub success: bool,
    pub block: Option<u64>,
}

/// Read/write access to the scratcher contract.
///
/// Amounts are 6-decimal fixed-point integers, exactly as the contract
/// stores them.
#[async_trait]
pub trait ScratcherContract: Send + Sync {
    /// Current on-chain state of a game.
    async fn get_game(&self, game_id: u64) -> Result<GameView>;

    /// Record the house buy-out offer for the game's current round.
    async fn set_house_offer(&self, game_id: u64, amount: u128) -> Result<TxOutcome>;

    /// Accept the standing offer on the player's behalf.
    async fn accept_offer(&self, game_id: u64) -> Result<TxOutcome>;

    /// Scratch three cells, paying the VRF fee.
    async fn play_round(&self, game_id: u64, cells: [u8; 3]) -> Result<TxOutcome>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// ethers implementation
// ---------------------------------------------------------------------------

type HouseClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// JSON-RPC backed contract client signing with the house key.
pub struct EthersScratcher {
    contract: TurnScratcher<HouseClient>,
    gas_limit: U256,
    explorer_url: String,
}

impl EthersScratcher {
    pub fn new(cfg: &ChainConfig, key: &HouseKey) -> Result<Self> {
        let provider = Provider::<Http>::try_from(cfg.rpc_url.as_str())
            .with_context(|| format!("Invalid RPC URL '{}'", cfg.rpc_url))?;
        let wallet = key.wallet(cfg.chain_id)?;
        let client = Arc::new(SignerMiddleware::new(provider, wallet));

        let address: Address = cfg
            .contract_address
            .parse()
            .with_context(|| format!("Invalid contract address '{}'", cfg.contract_address))?;

        info!(
            chain_id = cfg.chain_id,
            contract = %cfg.contract_address,
            house = ?client.address(),
            "Scratcher contract client ready"
        );

        Ok(Self {
            contract: TurnScratcher::new(address, client),
            gas_limit: U256::from(cfg.gas_limit),
            explorer_url: cfg.explorer_url.trim_end_matches('/').to_string(),
        })
    }

    /// Simulate, send with the fixed gas limit, and wait for the receipt.
    async fn submit(&self, call: ContractCall<HouseClient, ()>, label: &str, game_id: u64) -> Result<TxOutcome> {
        let call = call.gas(self.gas_limit);

        // A revert here never reaches the mempool.
        call.call()
            .await
            .with_context(|| format!("{label} simulation failed for game {game_id}"))?;

        let pending = call
            .send()
            .await
            .with_context(|| format!("Failed to submit {label} transaction"))?;
        let hash = format!("{:#x}", pending.tx_hash());
        info!(game_id, tx = %hash, explorer = %format!("{}/tx/{}", self.explorer_url, hash), "{label} sent, waiting for receipt");

        let receipt = pending
            .await
            .with_context(|| format!("{label} transaction dropped before confirmation"))?;

        let success = receipt
            .as_ref()
            .and_then(|r| r.status)
            .map(|s| s == U64::from(1))
            .unwrap_or(false);
        let block = receipt
            .as_ref()
            .and_then(|r| r.block_number)
            .map(|b| b.as_u64());

        if success {
            info!(game_id, tx = %hash, block = ?block, "{label} confirmed");
        } else {
            warn!(game_id, tx = %hash, "{label} reverted");
        }

        Ok(TxOutcome { hash, success, block })
    }
}

#[async_trait]
impl ScratcherContract for EthersScratcher {
    async fn get_game(&self, game_id: u64) -> Result<GameView> {
        let raw = self
            .contract
            .get_game(U256::from(game_id))
            .call()
            .await
            .with_context(|| format!("getGame failed for game {game_id}"))?;
        debug!(game_id, state = raw.1, "getGame");
        game_view(game_id, raw)
    }

    async fn set_house_offer(&self, game_id: u64, amount: u128) -> Result<TxOutcome> {
        let call = self
            .contract
            .set_house_offer(U256::from(game_id), U256::from(amount));
        self.submit(call, "setHouseOffer", game_id).await
    }

    async fn accept_offer(&self, game_id: u64) -> Result<TxOutcome> {
        let call = self.contract.accept_offer(U256::from(game_id));
        self.submit(call, "acceptOffer", game_id).await
    }

    async fn play_round(&self, game_id: u64, cells: [u8; 3]) -> Result<TxOutcome> {
        let fee = self
            .contract
            .estimate_vrf_fee()
            .call()
            .await
            .context("estimateVRFFee failed")?;
        debug!(game_id, vrf_fee = %fee, "VRF fee estimated");

        let call = self
            .contract
            .play_round(U256::from(game_id), cells.map(Into::into))
            .value(fee);
        self.submit(call, "playRound", game_id).await
    }

    fn name(&self) -> &str {
        "ethers"
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn amounts<const N: usize>(raw: [U256; N], field: &str) -> Result<[u128; N]> {
    let mut out = [0u128; N];
    for (slot, value) in out.iter_mut().zip(raw) {
        *slot = u128::try_from(value).map_err(|_| anyhow!("{field} amount overflows u128: {value}"))?;
    }
    Ok(out)
}

/// `getGame` output as the bindings decode it: the `Game` struct's fields in
/// declaration order. `C` is the element type of `uint8[9]`.
type RawGame<C> = (
    Address,
    u8,
    U256,
    [C; 9],
    [bool; 9],
    [U256; 3],
    [U256; 3],
    bool,
    [U256; 9],
    [U256; 9],
);

fn game_view<C: Into<u8>>(game_id: u64, raw: RawGame<C>) -> Result<GameView> {
    let (
        player,
        state,
        _vrf_request_id,
        chosen_cells,
        _is_cell_chosen,
        revealed_payouts,
        offered_payouts,
        hole_found,
        cell_payouts,
        _cell_random_values,
    ) = raw;

    Ok(GameView {
        game_id,
        player: format!("{player:#x}"),
        state: GameState::try_from(state)?,
        chosen_cells: chosen_cells.map(Into::into),
        revealed_payouts: amounts(revealed_payouts, "revealedPayouts")?,
        offered_payouts: amounts(offered_payouts, "offeredPayouts")?,
        hole_found,
        cell_payouts: amounts(cell_payouts, "cellPayouts")?,
    })
}
