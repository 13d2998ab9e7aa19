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

//! High-level data types for posts and votes.

use derive_getters::Getters;
use derive_more::Display;
use iii_iv_authn::model::{PublicUser, UserId};
use iii_iv_core::model::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Maximum length of a post title, in characters.
const MAX_TITLE_LENGTH: usize = 256;

/// Identifier of a post, assigned by the database.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(transparent)]
pub(crate) struct PostId(i64);

impl PostId {
    /// Creates a post identifier from its raw database representation.
    pub(crate) fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw database representation of the identifier.
    pub(crate) fn as_i64(&self) -> i64 {
        self.0
    }
}

/// The user-editable fields of a post.
#[derive(Clone, Debug, Getters, PartialEq)]
pub(crate) struct PostContent {
    /// Title of the post.
    title: String,

    /// Body of the post.
    content: String,

    /// Whether the post is visible to others.
    published: bool,
}

impl PostContent {
    /// Creates the contents of a post after validating them.
    pub(crate) fn new<S1, S2>(title: S1, content: S2, published: bool) -> ModelResult<Self>
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let title = title.into();
        let content = content.into();

        if title.trim().is_empty() {
            return Err(ModelError("Title cannot be empty".to_owned()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ModelError(format!(
                "Title cannot be longer than {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        if content.trim().is_empty() {
            return Err(ModelError("Content cannot be empty".to_owned()));
        }

        Ok(Self { title, content, published })
    }
}

/// A post as stored in the database, with the public details of its owner.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub(crate) struct Post {
    /// Identifier of the post.
    id: PostId,

    /// Title of the post.
    title: String,

    /// Body of the post.
    content: String,

    /// Whether the post is visible to others.
    published: bool,

    /// Time at which the post was created.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,

    /// Identifier of the user that created the post.
    owner_id: UserId,

    /// Public details of the user that created the post.
    owner: PublicUser,
}

impl Post {
    /// Assembles a post from its parts.
    pub(crate) fn new(
        id: PostId,
        content: PostContent,
        created_at: OffsetDateTime,
        owner: PublicUser,
    ) -> Self {
        Self {
            id,
            title: content.title,
            content: content.content,
            published: content.published,
            created_at,
            owner_id: owner.id,
            owner,
        }
    }

    /// Returns true if `user` is the owner of this post.
    pub(crate) fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }
}

/// A post along with the number of votes it has received.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct PostWithVotes {
    /// The post.
    #[serde(rename = "Post")]
    pub(crate) post: Post,

    /// Number of votes the post has received.
    pub(crate) votes: u64,
}

/// Direction of a vote request.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub(crate) enum VoteDir {
    /// Withdraw a previous vote.
    Remove,

    /// Cast a vote.
    Add,
}

impl TryFrom<u8> for VoteDir {
    type Error = ModelError;

    fn try_from(raw: u8) -> ModelResult<Self> {
        match raw {
            0 => Ok(VoteDir::Remove),
            1 => Ok(VoteDir::Add),
            _ => Err(ModelError(format!("Vote direction must be 0 or 1 but got {}", raw))),
        }
    }
}

impl From<VoteDir> for u8 {
    fn from(dir: VoteDir) -> Self {
        match dir {
            VoteDir::Remove => 0,
            VoteDir::Add => 1,
        }
    }
}
