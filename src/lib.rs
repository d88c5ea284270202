//! Estate Marketplace API Library
//!
//! HTTP access layer for the real-estate marketplace REST API: bearer-token
//! injection, a TTL response cache for GETs and exponential backoff on HTTP
//! 429, plus typed models for the marketplace resources.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod storage;
