//! Trade execution: Jupiter routing, signing, submission, simulation and the trade ledger

pub mod execution_engine;
pub mod jupiter_client;
pub mod ledger;
pub mod simulator;

pub use execution_engine::{ExecutionMode, ExecutorDeps, SwapExecutor};
pub use jupiter_client::{sign_swap_transaction, JupiterClient, QuoteRequest, SwapGateway, SwapQuote};
pub use ledger::{LedgerConfig, TradeLedger};
pub use simulator::{SimulationConfig, TradeSimulator};
