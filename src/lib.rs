//! Cinematch: "more like this" movie recommendations from a precomputed
//! similarity matrix, served over HTTP with TMDB posters.

pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
