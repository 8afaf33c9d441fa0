// Copyright 2022 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Inter-processor mailbox.
//!
//! A full endpoint (`Mailbox`) with bounded FIFOs talks to a thin endpoint
//! (`MailboxClient`) over a handful of wires. Either side may abort the
//! exchange; both then flush and return to idle together.

#![cfg_attr(not(test), no_std)]

pub mod abort;
pub mod client;
pub mod edge;
pub mod endpoint;
pub mod latch;
pub mod link;
pub mod mailbox;
pub mod registers;

pub use abort::AbortState;
pub use client::MailboxClient;
pub use endpoint::{Endpoint, EndpointStatus};
pub use link::{Link, Wires};
pub use mailbox::Mailbox;

use log::trace;
use mailbox_interface::*;
use serde::Serialize;

/// Applies a postcard-encoded `MailboxRequest` to `mailbox` and encodes the
/// reply, if any, into `reply_buffer`. Returns the reply length.
pub fn dispatch<M: MailboxInterface>(
    mailbox: &mut M,
    request_buffer: &[u8],
    reply_buffer: &mut [u8],
) -> Result<usize, MailboxError> {
    let request = match postcard::from_bytes::<MailboxRequest>(request_buffer) {
        Ok(request) => request,
        Err(_) => return Err(MailboxError::DeserializeFailed),
    };
    trace!("dispatch {:?}", request);
    match request {
        MailboxRequest::Write(word) => mailbox.write(word).map(|_| 0),
        MailboxRequest::Read => {
            let word = mailbox.consume()?;
            reply(&ReadResponse { word }, reply_buffer)
        }
        MailboxRequest::Done => {
            mailbox.mark_done();
            Ok(0)
        }
        MailboxRequest::Abort => {
            mailbox.abort();
            Ok(0)
        }
        MailboxRequest::Status => {
            let status = mailbox.read_status();
            reply(&StatusResponse { status }, reply_buffer)
        }
        MailboxRequest::ReadRegister(offset) => {
            let value = mailbox.read_register(offset)?;
            reply(&RegisterResponse { value }, reply_buffer)
        }
        MailboxRequest::WriteRegister(offset, value) => {
            mailbox.write_register(offset, value).map(|_| 0)
        }
    }
}

fn reply<T: Serialize>(response: &T, reply_buffer: &mut [u8]) -> Result<usize, MailboxError> {
    let reply_slice =
        postcard::to_slice(response, reply_buffer).or(Err(MailboxError::SerializeFailed))?;
    Ok(reply_slice.len())
}
