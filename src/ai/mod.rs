mod agent;
mod negamax;
mod random;
pub mod td_agent;
pub mod value_store;

pub use agent::Agent;
pub use negamax::NegamaxAgent;
pub use random::RandomAgent;
pub use td_agent::{apply, AgentConfig, RewardConfig, TdAgent, TdUpdate};
pub use value_store::{StateKey, ValueStore};
