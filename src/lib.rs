pub mod aggregate;
pub mod app;
pub mod auth;
pub mod config;
pub mod dltkcat;
pub mod domain;
pub mod enzyme_api;
pub mod error;
pub mod http;
pub mod output;
pub mod persist;
pub mod predict;
pub mod pubchem;
pub mod query;
pub mod session;
pub mod unikp;
