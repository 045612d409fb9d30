pub mod engine;
pub mod generator;
pub mod hint_contract;
pub mod invocation;
pub mod ledger;
pub mod mock;
pub mod prompts;
pub mod providers;
