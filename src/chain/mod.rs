//! Chain boundary: fixed-point units, the house signing key, and the
//! scratcher contract client.

pub mod contract;
pub mod key;
pub mod units;

pub use contract::{EthersScratcher, ScratcherContract, TxOutcome};
pub use key::HouseKey;
