// Internal shared infrastructure for the Fulmen node model

pub mod error;
