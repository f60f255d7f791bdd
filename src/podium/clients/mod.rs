// src/podium/clients/mod.rs

pub mod xai;

pub use xai::XaiClient;
