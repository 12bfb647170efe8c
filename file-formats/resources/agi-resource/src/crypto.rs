//! XOR obfuscation used by OBJECT files and logic message text

/// Key applied cyclically to obfuscated AGI data
pub const AVIS_DURGAN: &[u8; 11] = b"Avis Durgan";

/// XOR `data` in place with `key`, starting at key position 0.
///
/// The transform is its own inverse.
pub fn xor_in_place(data: &mut [u8], key: &[u8]) {
    if key.is_empty() {
        return;
    }
    for (byte, k) in data.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}

/// Return a copy of `data` XORed with `key`
pub fn xor(data: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    xor_in_place(&mut out, key);
    out
}
