//! Substrate wire encoding helpers
//!
//! Storage-key hashing for the `System.Account` balance query, SCALE
//! compact integers, and the balances transfer call frame used when
//! building an extrinsic.

use std::hash::Hasher;

use blake2::digest::consts::{U16, U32};
use blake2::{Blake2b, Digest};
use twox_hash::XxHash64;

use crate::error::SessionError;

type Blake2b128 = Blake2b<U16>;
type Blake2b256 = Blake2b<U32>;

/// Pallet/call indices of `balances.transfer_keep_alive`
const BALANCES_PALLET: u8 = 5;
const TRANSFER_KEEP_ALIVE: u8 = 3;

/// Immortal era marker in the extrinsic payload
pub const ERA_IMMORTAL: u8 = 0x00;

/// Substrate's twox128 hasher: two seeded xxhash64 halves, concatenated
pub fn twox128(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for seed in 0..2u64 {
        let mut hasher = XxHash64::with_seed(seed);
        hasher.write(data);
        let half = hasher.finish().to_le_bytes();
        out[seed as usize * 8..(seed as usize + 1) * 8].copy_from_slice(&half);
    }
    out
}

/// blake2_128_concat: 16-byte blake2b of the key followed by the key
pub fn blake2_128_concat(data: &[u8]) -> Vec<u8> {
    let mut hasher = Blake2b128::new();
    hasher.update(data);
    let mut out = hasher.finalize().to_vec();
    out.extend_from_slice(data);
    out
}

/// blake2b-256 digest, used for oversized signing payloads
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Storage key of `System.Account(public)`
pub fn system_account_key(public: &[u8; 32]) -> Vec<u8> {
    let mut key = Vec::with_capacity(80);
    key.extend_from_slice(&twox128(b"System"));
    key.extend_from_slice(&twox128(b"Account"));
    key.extend_from_slice(&blake2_128_concat(public));
    key
}

/// Free balance out of a SCALE-encoded `AccountInfo`
///
/// Layout: nonce, consumers, providers, sufficients (u32 each), then
/// `AccountData` starting with the u128 free balance.
pub fn decode_account_free(bytes: &[u8]) -> Result<u128, SessionError> {
    if bytes.len() < 32 {
        return Err(SessionError::Parse(format!(
            "AccountInfo too short: {} bytes",
            bytes.len()
        )));
    }
    let mut free = [0u8; 16];
    free.copy_from_slice(&bytes[16..32]);
    Ok(u128::from_le_bytes(free))
}

/// SCALE compact integer encoding
pub fn compact(value: u128) -> Vec<u8> {
    if value < 1 << 6 {
        vec![(value as u8) << 2]
    } else if value < 1 << 14 {
        (((value as u16) << 2) | 0b01).to_le_bytes().to_vec()
    } else if value < 1 << 30 {
        (((value as u32) << 2) | 0b10).to_le_bytes().to_vec()
    } else {
        let bytes = value.to_le_bytes();
        let mut len = bytes.len();
        while len > 4 && bytes[len - 1] == 0 {
            len -= 1;
        }
        let mut out = Vec::with_capacity(len + 1);
        out.push(0b11 | (((len - 4) as u8) << 2));
        out.extend_from_slice(&bytes[..len]);
        out
    }
}

/// Call frame for `balances.transfer_keep_alive(dest, amount)`
pub fn transfer_keep_alive_call(dest: &[u8; 32], amount: u128) -> Vec<u8> {
    let mut call = Vec::with_capacity(2 + 1 + 32 + 17);
    call.push(BALANCES_PALLET);
    call.push(TRANSFER_KEEP_ALIVE);
    // MultiAddress::Id
    call.push(0x00);
    call.extend_from_slice(dest);
    call.extend_from_slice(&compact(amount));
    call
}
