//! SeaORM entities backing the relational store

pub mod ban;
pub mod identity;
pub mod key;
