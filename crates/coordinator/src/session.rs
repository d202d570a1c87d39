// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::Address;

/// The client operator's active identity and key material. Passed
/// explicitly into every coordinator call; there is no ambient identity
/// state.
#[derive(Clone)]
pub struct ClientSession {
    pub address: Address,
    pub signer: PrivateKeySigner,
}

impl ClientSession {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self {
            address: signer.address(),
            signer,
        }
    }
}

/// The bank operator's active identity. Banks never sign results, so no
/// key material beyond the wallet bound to the ledger handle is needed.
#[derive(Clone, Copy, Debug)]
pub struct BankSession {
    pub address: Address,
}

impl BankSession {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}
