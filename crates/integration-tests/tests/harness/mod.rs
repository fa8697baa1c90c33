#![allow(dead_code)]

pub mod config;
pub mod fake_model;
pub mod server;
