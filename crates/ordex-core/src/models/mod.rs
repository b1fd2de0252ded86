//! Data models for documents, customers, configuration and order records.

pub mod config;
pub mod customer;
pub mod document;
pub mod order;
