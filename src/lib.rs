pub mod config;
pub mod contracts;
pub mod deploy;
pub mod lottery;
pub mod marketplace;
pub mod reads;
pub mod staking;
pub mod uploads;
pub mod wallet;
pub mod workflow;
