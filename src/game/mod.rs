//! Game logic: players and scoring, reaction measurement and the state
//! machine that sequences rounds.

pub mod machine;
pub mod measure;
pub mod player;
pub mod report;
pub mod rng;

pub use machine::GameController;
pub use report::ConsoleReporter;
