//! Integration tests for poly-hourly

mod common;
mod config_test;
mod exit_test;
mod strategy_test;
