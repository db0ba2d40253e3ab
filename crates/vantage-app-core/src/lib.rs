// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for Vantage tools (config, stream settings).
//! Keeps CLI and viewer adapters thin and storage-agnostic.

pub mod config;
pub mod config_port;
pub mod settings;
