pub mod chain;
pub mod state;
pub mod validation;

pub use chain::{
    chain_work, genesis_block, leading_zero_digits, Block, Blockchain, BLOCK_REWARD,
    DIFFICULTY_ADJUSTMENT_INTERVAL, GENESIS_DATE, MAX_DIFFICULTY, MIN_DIFFICULTY,
    TARGET_BLOCK_TIME_SECS,
};
pub use state::BalanceSheet;
pub use validation::validate_block_transactions;
