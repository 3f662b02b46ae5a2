//! A reactive mesh-routing stack for constrained radio nodes.
//!
//! Nodes discover paths to each other on demand (flooding a `RouteRequest`,
//! replying with a `RouteAnnounce`) rather than maintaining full topology
//! state, and cache the results in a bounded routing table with a
//! newest-sequence-wins, smaller-metric-as-tiebreaker update rule. A node
//! marked as a gateway may also periodically broadcast an unsolicited
//! `RouteAnnounce` so the rest of the mesh can discover a route to it
//! without first sending a request.
//!
//! This crate is `no_std` and allocation-free; every buffer is a fixed-
//! capacity `heapless` collection. The only part that interacts directly
//! with platform-specific interfaces is [`engine::Engine`], which you
//! parameterize over a [`config::Config`] supplying a [`time::Timer`] and a
//! [`radio::Transmitter`] for your hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod log;
#[macro_use]
mod utils;

pub mod addr;
pub mod codec;
pub mod concurrency;
pub mod config;
pub mod config_store;
pub mod engine;
mod error;
pub mod gateway_framing;
pub mod packet;
pub mod queue;
pub mod radio;
pub mod regdomain;
pub mod route;
pub mod seq;
pub mod time;
pub mod worker;

pub use self::error::Error;
