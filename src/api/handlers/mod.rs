pub mod control;
pub mod dashboard;
pub mod health;
pub mod ws;
