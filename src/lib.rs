pub mod app_config;
pub mod credentials;
pub mod db;
pub mod error;
pub mod forum;
pub mod middleware;
pub mod orm;
pub mod session;
pub mod storage;
pub mod web;
