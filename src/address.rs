//! SS58 address encoding
//!
//! Decode and re-encode account addresses with a chain's address-format
//! prefix. Display-only: no key material is handled here.

use blake2::{Blake2b512, Digest};

const CHECKSUM_PREAMBLE: &[u8] = b"SS58PRE";

/// Blake2b-512 checksum over the preamble plus payload, first two bytes
fn checksum(data: &[u8]) -> [u8; 2] {
    let mut hasher = Blake2b512::new();
    hasher.update(CHECKSUM_PREAMBLE);
    hasher.update(data);
    let hash = hasher.finalize();
    [hash[0], hash[1]]
}

/// Encode a 32-byte public key under the given SS58 prefix
pub fn encode(public: &[u8; 32], prefix: u16) -> String {
    let mut data = Vec::with_capacity(36);
    if prefix < 64 {
        data.push(prefix as u8);
    } else {
        // Two-byte ident encoding for registry prefixes 64..16384
        let ident = prefix & 0x3FFF;
        data.push(((ident & 0x00FC) >> 2) as u8 | 0x40);
        data.push((ident >> 8) as u8 | ((ident & 0x0003) << 6) as u8);
    }
    data.extend_from_slice(public);
    let check = checksum(&data);
    data.extend_from_slice(&check);
    bs58::encode(data).into_string()
}

/// Decode an SS58 address into its public key and prefix
///
/// Returns `None` for anything that is not a well-formed, checksummed
/// 32-byte account address.
pub fn decode(address: &str) -> Option<([u8; 32], u16)> {
    let data = bs58::decode(address).into_vec().ok()?;
    let (offset, prefix) = match data.len() {
        35 => {
            let prefix = data[0] as u16;
            if prefix >= 64 {
                return None;
            }
            (1usize, prefix)
        }
        36 => {
            let lower = (data[0] & 0x3F) as u16;
            let high = (data[1] & 0x3F) as u16;
            let low2 = (data[1] >> 6) as u16;
            (2usize, (high << 8) | (lower << 2) | low2)
        }
        _ => return None,
    };

    let body_end = data.len() - 2;
    let check = checksum(&data[..body_end]);
    if check != data[body_end..] {
        return None;
    }

    let mut public = [0u8; 32];
    public.copy_from_slice(&data[offset..body_end]);
    Some((public, prefix))
}

/// Re-encode an address under a different prefix
pub fn reencode(address: &str, prefix: u16) -> Option<String> {
    let (public, _) = decode(address)?;
    Some(encode(&public, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known Alice development account
    const ALICE_SUBSTRATE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const ALICE_POLKADOT: &str = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5";
    const ALICE_PUBLIC: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";

    #[test]
    fn test_decode_known_address() {
        let (public, prefix) = decode(ALICE_SUBSTRATE).unwrap();
        assert_eq!(prefix, 42);
        assert_eq!(hex::encode(public), ALICE_PUBLIC);
    }

    #[test]
    fn test_reencode_to_polkadot_prefix() {
        assert_eq!(reencode(ALICE_SUBSTRATE, 0).unwrap(), ALICE_POLKADOT);
    }

    #[test]
    fn test_roundtrip() {
        let (public, prefix) = decode(ALICE_SUBSTRATE).unwrap();
        assert_eq!(encode(&public, prefix), ALICE_SUBSTRATE);
    }

    #[test]
    fn test_two_byte_prefix_roundtrip() {
        let (public, _) = decode(ALICE_SUBSTRATE).unwrap();
        let encoded = encode(&public, 2007);
        let (decoded, prefix) = decode(&encoded).unwrap();
        assert_eq!(decoded, public);
        assert_eq!(prefix, 2007);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(decode("").is_none());
        assert!(decode("not an address").is_none());
        assert!(decode("0x1234").is_none());
    }

    #[test]
    fn test_rejects_bad_checksum() {
        // Same length, valid base58, corrupted payload
        let mut corrupted = String::from(ALICE_SUBSTRATE);
        corrupted.pop();
        corrupted.push('X');
        assert!(decode(&corrupted).is_none());
    }
}
