/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Process-wide debug diagnostics toggle.
//!
//! Diagnostics are off by default. When off, the reloadable level filter discards
//! every event; when on, everything at `DEBUG` and above reaches the configured
//! writer. Toggling never changes broker or peer behavior.

use crate::observability::events;
use thiserror::Error;
use tracing::{info, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{reload, Registry};

/// Environment variable that enables diagnostics at startup when non-empty.
pub const DEBUG_ENV_VAR: &str = "DEBUG";

const COMPONENT: &str = "diagnostics";

#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("unable to update diagnostics level: {0}")]
    Reload(#[from] reload::Error),
    #[error("unable to install diagnostics subscriber: {0}")]
    Install(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Runtime switch for the installed diagnostics filter.
#[derive(Clone)]
pub struct DiagnosticsHandle {
    filter: reload::Handle<LevelFilter, Registry>,
}

impl DiagnosticsHandle {
    /// Turns debug diagnostics on.
    pub fn debug(&self) -> Result<(), DiagnosticsError> {
        self.filter.modify(|filter| *filter = level_for(true))?;
        info!(
            event = events::DIAGNOSTICS_TOGGLED,
            component = COMPONENT,
            enabled = true,
            "debug diagnostics enabled"
        );
        Ok(())
    }

    /// Turns debug diagnostics off.
    pub fn debug_off(&self) -> Result<(), DiagnosticsError> {
        info!(
            event = events::DIAGNOSTICS_TOGGLED,
            component = COMPONENT,
            enabled = false,
            "debug diagnostics disabled"
        );
        self.filter.modify(|filter| *filter = level_for(false))?;
        Ok(())
    }

    /// Reports `false` once the subscriber this handle controls has been dropped.
    pub fn is_enabled(&self) -> bool {
        self.filter
            .clone_current()
            .is_some_and(|filter| filter != LevelFilter::OFF)
    }
}

fn level_for(enabled: bool) -> LevelFilter {
    if enabled {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    }
}

/// Returns `true` when [`DEBUG_ENV_VAR`] is set to a non-empty value.
pub fn env_requests_debug() -> bool {
    std::env::var_os(DEBUG_ENV_VAR).is_some_and(|value| !value.is_empty())
}

/// Builds a diagnostics subscriber writing to `make_writer` without installing it.
pub fn build_subscriber<W>(
    make_writer: W,
    enabled: bool,
) -> (impl Subscriber + Send + Sync + 'static, DiagnosticsHandle)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let (filter, handle) = reload::Layer::<LevelFilter, Registry>::new(level_for(enabled));
    let subscriber = Registry::default().with(filter).with(
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(make_writer),
    );

    (subscriber, DiagnosticsHandle { filter: handle })
}

/// Installs a diagnostics subscriber writing to `make_writer` as the global default.
pub fn install_with_writer<W>(
    make_writer: W,
    enabled: bool,
) -> Result<DiagnosticsHandle, DiagnosticsError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let (subscriber, handle) = build_subscriber(make_writer, enabled);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(handle)
}

/// Installs stderr diagnostics, enabled when `enabled` is set or [`DEBUG_ENV_VAR`] asks for it.
pub fn install(enabled: bool) -> Result<DiagnosticsHandle, DiagnosticsError> {
    install_with_writer(std::io::stderr, enabled || env_requests_debug())
}
