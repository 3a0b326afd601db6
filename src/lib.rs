//! Lectern: a chat service over a Neo4j course graph.
//!
//! Each utterance is routed to exactly one capability (general chat,
//! paragraph similarity search, or a structured Cypher lookup) and every
//! completed exchange is persisted per session.

pub mod agent;
pub mod api;
pub mod config;
pub mod db;
pub mod graph;
pub mod llm;
pub mod models;
pub mod session;
