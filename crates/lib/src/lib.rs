//! # Container image catalog tool
//!
//! This crate lists, filters and renders the images in a local container
//! image store, and acquires new images either from local archives of
//! unknown format or from a registry.
//!
//! The store itself is abstracted behind [`store::ImageStore`]; the
//! [`podman::PodmanStore`] backend drives the `podman` binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod humanize;
pub mod image;
pub mod images;
pub mod load;
pub mod podman;
pub mod pull;
pub mod query;
pub mod render;
pub mod store;
pub mod template;
pub mod transport;

#[cfg(test)]
mod testutils;
