pub mod batch;
pub mod cleanup;
pub mod coordinates;
pub mod solve_command;
pub mod solver;
pub mod telescope_config;

#[cfg(test)]
mod test_logging;
