pub mod health;
pub mod series;
pub mod stats;
