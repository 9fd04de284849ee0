// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `filter` uses `EnvFilter` syntax (eg. `info` or
/// `adm_ledger=debug,info`) and must parse even when `RUST_LOG`, which takes precedence, is set.
/// Returns `false` when another subscriber was already installed.
pub fn init_tracing(filter: &str) -> Result<bool> {
    let configured =
        EnvFilter::try_new(filter).with_context(|| format!("Invalid log filter '{filter}'"))?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(configured);

    Ok(tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok())
}
