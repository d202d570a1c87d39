// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod error;
mod evm;
mod helpers;
mod in_mem;
mod listener;
mod traits;
mod types;

pub use error::*;
pub use evm::*;
pub use helpers::*;
pub use in_mem::*;
pub use listener::*;
pub use traits::*;
pub use types::*;
