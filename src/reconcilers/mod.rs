// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reconcilers of the demo operator.

pub mod widget;

pub use widget::WidgetReconciler;
