// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod builder;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod manager;
pub mod reconcilers;
pub mod runtime;
pub mod scheme;
pub mod types;
pub mod watch;
pub mod webhook;

#[cfg(test)]
pub mod test_utils;

pub use builder::{controller_managed_by, Builder, ControllerBuilder};
pub use error::{ReconcileError, Result, RiggerError};
