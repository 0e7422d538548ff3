//! Bybit module - REST client for the v5 unified trading API

pub mod auth;
pub mod messages;
pub mod rest;

pub use rest::BybitRestClient;
