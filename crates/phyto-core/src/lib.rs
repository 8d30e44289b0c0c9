//! # phyto-core
//!
//! Core types and ID prefixes for Phyto.
//!
//! This crate provides the foundational types shared across all Phyto crates:
//! - Entity structs for reference data (plant types, symptoms, diseases)
//!   and for the diagnosis cache
//! - Transient match projections produced by the knowledge-base and cache tiers
//! - The provenance enum reported with every resolved diagnosis
//! - ID prefix constants

pub mod entities;
pub mod enums;
pub mod ids;
pub mod matches;
