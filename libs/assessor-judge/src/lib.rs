//! Code-submission judging pipeline: result cache, judge backend client,
//! outcome classifier, fallback simulator and the case runner on top.

pub mod cache;
pub mod classifier;
pub mod evaluator;
pub mod executor;
pub mod judge_client;
pub mod metrics;
pub mod questions;
pub mod runner;
pub mod simulator;

#[cfg(test)]
mod test_support;

pub use cache::{ResultCache, SweepTask};
pub use executor::{Executor, FallbackExecutor};
pub use judge_client::JudgeClient;
pub use questions::{QuestionBank, QuestionSource};
pub use runner::{CaseRunner, Judgement};
pub use simulator::Simulator;
