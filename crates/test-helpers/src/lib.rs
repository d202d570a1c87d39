// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod stub_compute;

pub use stub_compute::*;

use alloy::signers::local::PrivateKeySigner;
use alloy_primitives::Address;
use rand::Rng;

/// A random address that looks like a wallet identity.
pub fn rand_eth_addr() -> Address {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill(&mut bytes);
    Address::from(bytes)
}

pub fn create_random_eth_addrs(count: u32) -> Vec<Address> {
    (0..count).map(|_| rand_eth_addr()).collect()
}

/// A fresh wallet signer for a test client session.
pub fn rand_signer() -> PrivateKeySigner {
    PrivateKeySigner::random()
}
