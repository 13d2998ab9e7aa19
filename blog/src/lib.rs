// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Blogging service built on III-IV.
//!
//! Authenticated users publish posts, edit and delete the ones they own, and vote on any of them.
//! Accounts and access tokens are handled by the `iii-iv-authn` module, whose endpoints are served
//! next to the ones of this crate.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use iii_iv_core::env::get_optional_var;
use std::net::{Ipv4Addr, SocketAddr};
#[cfg(feature = "postgres")]
use {
    axum::Router,
    driver::Driver,
    iii_iv_authn::driver::{AuthnDriver, AuthnOptions},
    iii_iv_core::clocks::SystemClock,
    iii_iv_core::db::Db,
    iii_iv_core::db::postgres::{PostgresDb, PostgresOptions},
    log::info,
    std::sync::Arc,
    tower_http::cors::CorsLayer,
};

pub(crate) mod db;
pub(crate) mod driver;
pub(crate) mod model;
mod rest;

/// Default port to listen on when not configured.
const DEFAULT_PORT: u16 = 3000;

/// Options to configure where the service listens for requests.
#[derive(Debug, PartialEq)]
pub struct ListenOptions {
    /// Port to listen on.
    pub port: u16,

    /// Whether to listen on all interfaces instead of just on localhost.
    pub bind_all: bool,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self { port: DEFAULT_PORT, bind_all: false }
    }
}

impl ListenOptions {
    /// Creates a new set of options from environment variables whose names are prefixed by
    /// `prefix`.  All variables are optional.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            port: get_optional_var::<u16>(prefix, "PORT")?.unwrap_or(defaults.port),
            bind_all: get_optional_var::<bool>(prefix, "BIND_ALL")?.unwrap_or(defaults.bind_all),
        })
    }

    /// Returns the socket address to bind to.
    pub fn addr(&self) -> SocketAddr {
        let ip = if self.bind_all { Ipv4Addr::UNSPECIFIED } else { Ipv4Addr::LOCALHOST };
        SocketAddr::from((ip, self.port))
    }
}

/// Instantiates all resources to serve the application as configured by `listen`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
#[cfg(feature = "postgres")]
pub async fn serve(
    listen: ListenOptions,
    db_opts: PostgresOptions,
    authn_opts: AuthnOptions,
) -> Result<(), String> {
    let db = Arc::from(PostgresDb::connect(db_opts).map_err(|e| e.to_string())?);
    {
        let mut ex = db.ex().await.map_err(|e| e.to_string())?;
        iii_iv_authn::db::init_schema(&mut ex).await.map_err(|e| e.to_string())?;
        db::init_schema(&mut ex).await.map_err(|e| e.to_string())?;
    }
    info!("Database schema initialized");

    let clock = Arc::from(SystemClock::default());
    let authn = AuthnDriver::new(db.clone(), clock.clone(), authn_opts);
    let driver = Driver::new(db.clone(), clock, authn.clone());
    let app = Router::new()
        .merge(iii_iv_authn::rest::app(authn))
        .merge(rest::app(driver))
        .layer(CorsLayer::permissive());

    let addr = listen.addr();
    let result = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            info!("Listening on {}", addr);
            axum::serve(listener, app).await.map_err(|e| e.to_string())
        }
        Err(e) => Err(format!("Cannot bind to {}: {}", addr, e)),
    };

    db.close().await;
    result
}
