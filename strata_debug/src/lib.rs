// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing, statistics and Chrome trace export for strata
//! diagnostics.
//!
//! This crate provides [`TraceSink`](strata_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`stats::StatsSink`]: counts and phase timings aggregated over frames.
//! - [`chrome::ChromeTraceSink`]: Chrome Trace Event Format JSON.
//!
//! [`export`] snapshots the node tree, the layer tree and pending
//! diagnostics as JSON.

pub mod chrome;
pub mod export;
pub mod pretty;
pub mod stats;
