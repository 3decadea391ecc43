//! Next-agent scheduling over the fixed agent sequence.

mod scheduler;

pub use scheduler::{
    AGENT_SEQUENCE, LOOP_END_AGENT, LOOP_START_AGENT, LoopDecision, NextAgent, ProjectSnapshot,
    Scheduler, next_in_sequence,
};
