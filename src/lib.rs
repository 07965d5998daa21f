//! # HR-Assist Telegram Bot
//!
//! A Telegram bot that collects a job-search query (role and city) through
//! a short dialogue or a single `/parse` command, runs a vacancy lookup and
//! delivers a persisted text report.

pub mod bot;
pub mod config;
pub mod engine;
pub mod errors;
pub mod query;
pub mod report;
pub mod report_store;
pub mod search;
pub mod session;
