pub mod rate_match;
pub mod scramble;
pub mod turbo;
