pub mod aggregate;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use aggregate::{StrategyAggregate, aggregate_runs};
pub use policy::GameplayStrategy;
pub use seeds::resolve_seed_inputs;
pub use simulation::SimulationSummary;
pub use tester::PlaythroughRunner;
