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

//! The `User` data type and its identifier.

use crate::model::HashedPassword;
use derive_more::Display;
use iii_iv_core::model::EmailAddress;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Identifier of a user, as assigned by the database.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a new identifier from its raw numeric value.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value of the identifier.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// Representation of a user's information.
#[derive(Debug, PartialEq)]
pub struct User {
    /// Identifier of the user.
    id: UserId,

    /// Email of the user, which is also the name they log in with.
    email: EmailAddress,

    /// Hashed password.
    password: HashedPassword,

    /// Time at which the account was created.
    created_at: OffsetDateTime,
}

impl User {
    /// Creates a new user with the given fields.
    pub(crate) fn new(
        id: UserId,
        email: EmailAddress,
        password: HashedPassword,
        created_at: OffsetDateTime,
    ) -> Self {
        Self { id, email, password, created_at }
    }

    /// Gets the user's identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Gets the user's email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Gets the user's password as a hash.
    pub fn password(&self) -> &HashedPassword {
        &self.password
    }

    /// Gets the user's creation timestamp.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Returns the subset of the user's details that can be exposed to other users.
    pub fn public(&self) -> PublicUser {
        PublicUser { id: self.id, email: self.email.clone(), created_at: self.created_at }
    }
}

/// Details of a user that are safe to return to clients.  Notably, this lacks the password.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PublicUser {
    /// Identifier of the user.
    pub id: UserId,

    /// Email of the user.
    pub email: EmailAddress,

    /// Time at which the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
