//! Site Manager client for UniFi.
//!
//! This crate provides parameter models and an asynchronous client for the
//! UniFi Site Manager API: hosts, sites, devices, ISP metrics and SD-WAN
//! configurations. Every call goes through the shared request executor in
//! `unifi-core`, which owns session rotation and the authentication retry.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::{SiteManagerClient, SiteManagerClientBuilder};
pub use models::{DeviceListParams, IspMetricsQuery, MetricInterval, MetricsWindow, PageParams};

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = unifi_core::Result<T>;
