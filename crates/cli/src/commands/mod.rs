// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod backup;
pub mod compat;
pub mod shapes;
pub mod upgrade;
pub mod verify;
