//! Pipeline execution engine.

pub mod ally;
pub mod conditional;
pub mod context;
pub mod guards;
pub mod loop_step;
pub mod pipeline;
pub mod step;

#[cfg(test)]
pub(crate) mod test_steps;
