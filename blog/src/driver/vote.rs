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

//! Operations on votes.

use crate::db;
use crate::driver::Driver;
use crate::model::{PostId, VoteDir};
use iii_iv_authn::model::AccessToken;
use iii_iv_core::db::DbError;
use iii_iv_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Casts or withdraws, depending on `dir`, the caller's vote on `post`.
    pub(crate) async fn vote(
        self,
        token: AccessToken,
        post: PostId,
        dir: VoteDir,
    ) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        let user = self.authenticate(&mut tx, token).await?;

        match db::get_post(tx.ex(), post).await {
            Ok(_) => (),
            Err(DbError::NotFound) => {
                return Err(DriverError::NotFound(format!(
                    "Post with id: {} does not exist",
                    post
                )));
            }
            Err(e) => return Err(e.into()),
        }

        match dir {
            VoteDir::Add => match db::create_vote(tx.ex(), post, user.id()).await {
                Ok(()) => (),
                Err(DbError::AlreadyExists) => {
                    return Err(DriverError::AlreadyExists(format!(
                        "User {} has already voted on post {}",
                        user.id(),
                        post
                    )));
                }
                Err(e) => return Err(e.into()),
            },

            VoteDir::Remove => match db::delete_vote(tx.ex(), post, user.id()).await {
                Ok(()) => (),
                Err(DbError::NotFound) => {
                    return Err(DriverError::NotFound("Vote does not exist".to_owned()));
                }
                Err(e) => return Err(e.into()),
            },
        }

        tx.commit().await?;
        Ok(())
    }
}
