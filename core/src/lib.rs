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

//! Rudimentary framework to build web services.
//!
//! Services built using this framework adhere to the following layered architecture, and they
//! should structure their code to have these modules as well:
//!
//! 1.  `model`: High-level data types that represent concepts in the domain of the application.
//!     Values are validated at construction time so that the rest of the layers can trust them.
//!
//! 1.  `db`: The persistence layer.  Services provide free functions that take an `Executor` and
//!     issue the queries for every supported database backend.
//!
//! 1.  `driver`: The business logic layer.  Services provide their own `Driver` type holding the
//!     database, the clock and any other shared state, and every operation runs inside a single
//!     transaction.
//!
//! 1.  `rest`: The HTTP layer.  Services provide an `app` function returning an `axum::Router`
//!     backed by their `Driver`.
//!
//! 1.  `main`: The launcher.  It gathers configuration from environment variables and calls into
//!     the service's `serve` function.
//!
//! Every layer has its own result and error types, such as `DbResult` and `DbError`, and errors
//! float to the top via the `?` operator until the REST layer turns them into HTTP responses.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod clocks;
pub mod db;
pub mod driver;
pub mod env;
pub mod model;
pub mod rest;
