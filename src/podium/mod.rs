// src/podium/mod.rs

pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod debate_session;
pub mod gateway;
pub mod hot_takes;
pub mod persona;
pub mod perspective;
pub mod research;
pub mod session_state;
pub mod speaker;
pub mod tools;
pub mod transcript;
pub mod turn;

// Explicitly export the conductor so callers reach it as podium::DebateSession
// instead of podium::debate_session::DebateSession.
pub use debate_session::DebateSession;
