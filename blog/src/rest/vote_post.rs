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

//! API to cast or withdraw a vote on a post.

use crate::driver::Driver;
use crate::model::{PostId, VoteDir};
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use http::{HeaderMap, StatusCode};
use iii_iv_authn::rest::get_bearer_auth;
use iii_iv_core::rest::RestError;
use serde::{Deserialize, Serialize};

/// Message sent to the server to vote on a post.
#[derive(Deserialize, Serialize)]
pub(crate) struct VoteRequest {
    /// Post to vote on.
    pub(crate) post_id: PostId,

    /// Whether to cast (1) or withdraw (0) the vote.
    pub(crate) dir: VoteDir,
}

/// Message returned by the server after a successful vote operation.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct VoteResponse {
    /// Description of the performed operation.
    pub(crate) message: String,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    Json(request): Json<VoteRequest>,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers)?;

    driver.vote(token, request.post_id, request.dir).await?;
    let message = match request.dir {
        VoteDir::Add => "Successfully added vote",
        VoteDir::Remove => "Successfully deleted vote",
    };
    Ok((StatusCode::CREATED, Json(VoteResponse { message: message.to_owned() })))
}
