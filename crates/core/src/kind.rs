// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed set of configuration kinds the engine manages.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A kind of managed configuration file.
///
/// Every stored document is classified into exactly one kind at the system
/// boundary; schemas, shapes, and transforms are all keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigKind {
    /// A per-agent config under `agents/<name>.json`
    Agent,
    /// The global `preferences.json`
    Preferences,
}

crate::simple_display! {
    ConfigKind {
        Agent => "agent",
        Preferences => "preferences",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown config kind '{0}'")]
pub struct UnknownKind(pub String);

impl ConfigKind {
    pub const ALL: [ConfigKind; 2] = [ConfigKind::Agent, ConfigKind::Preferences];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::Agent => "agent",
            ConfigKind::Preferences => "preferences",
        }
    }
}

impl FromStr for ConfigKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(ConfigKind::Agent),
            "preferences" => Ok(ConfigKind::Preferences),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}
