pub mod audit;
pub mod clock;
pub mod config;
pub mod learnings;
pub mod locator;
pub mod rate_limit;
pub mod scanner;
pub mod transcript;
pub mod util;
pub mod warn;
