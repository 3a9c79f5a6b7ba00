// ipcheck: IP address intelligence aggregation
//
// This is the library root. Each module corresponds to one stage of the
// analysis pipeline: validation, providers, history storage, aggregation,
// and report output.

pub mod config;
pub mod db;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod providers;
pub mod validate;
