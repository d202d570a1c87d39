// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod bank;
mod cache;
mod client;
mod error;
mod session;
mod signer;

pub use bank::*;
pub use cache::*;
pub use client::*;
pub use error::*;
pub use session::*;
pub use signer::*;
