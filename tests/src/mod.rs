#[cfg(test)]
pub mod concurrency_tests;
#[cfg(test)]
pub mod player_flow_tests;
#[cfg(test)]
pub mod utils;
