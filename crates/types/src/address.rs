use std::fmt;

use alloy_primitives::Address;

/// An address that failed the `^0x[0-9a-f]{40}$` shape check (case-insensitive
/// on input; the engine always normalizes to lowercase before comparing).
#[derive(Debug, thiserror::Error)]
#[error("invalid address: {0:?}")]
pub struct InvalidAddress(pub String);

/// Parses a hex address string and normalizes it to the canonical lowercase
/// form used throughout the Store. Accepts either case on input (mixed-case
/// checksummed addresses included) but never validates EIP-55 checksums —
/// the catalog is a trusted, offline-produced source, not user input.
pub fn parse_address(raw: &str) -> Result<Address, InvalidAddress> {
    let body = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| InvalidAddress(raw.to_string()))?;

    if body.len() != 40 || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(InvalidAddress(raw.to_string()));
    }

    let mut bytes = [0u8; 20];
    for (i, chunk) in body.as_bytes().chunks(2).enumerate() {
        let hi = (chunk[0] as char).to_digit(16).unwrap();
        let lo = (chunk[1] as char).to_digit(16).unwrap();
        bytes[i] = ((hi << 4) | lo) as u8;
    }
    Ok(Address::from(bytes))
}

/// Renders an address as `0x` followed by 40 lowercase hex digits, per the
/// data model's canonical representation.
pub fn to_lower_hex(addr: &Address) -> String {
    format!("0x{}", hex_lower(addr.as_slice()))
}

fn hex_lower(bytes: &[u8]) -> String {
    use fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(out, "{b:02x}").expect("writing to String never fails");
    }
    out
}
