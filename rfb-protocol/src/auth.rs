//! VNC Authentication (security type 2) challenge/response.
//!
//! The server sends a 16-byte random challenge. The client proves it knows the
//! password by encrypting the challenge with DES and sending the result back.
//!
//! The key is the password truncated or zero-padded to 8 bytes, with the bit
//! order of every key byte reversed. That reversal is a historical quirk of
//! early VNC releases; servers expect it, so a "plain" DES key
//! fails authentication silently. The challenge is encrypted as two
//! independent 8-byte blocks (ECB).
//!
//! # Examples
//!
//! ```
//! use rfb_protocol::auth::encrypt_challenge;
//!
//! let response = encrypt_challenge(&[0u8; 16], b"pass");
//! assert_eq!(response[..8], [0x4au8, 0x17, 0xcc, 0x5b, 0x03, 0x55, 0x79, 0x12]);
//! assert_eq!(response[..8], response[8..]);
//! ```

use crate::messages::types::CHALLENGE_LEN;
use des::cipher::generic_array::GenericArray;
use des::cipher::{BlockEncrypt, KeyInit};
use des::Des;

/// Length of a DES key and block.
const KEY_LEN: usize = 8;

/// Build the DES key for a password: first 8 bytes, zero padded, bits reversed.
pub fn password_key(password: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    for (slot, &byte) in key.iter_mut().zip(password.iter()) {
        *slot = byte.reverse_bits();
    }
    key
}

/// Encrypt a VNC Authentication challenge with `password`.
///
/// Passwords longer than 8 bytes are truncated; the protocol cannot carry more.
pub fn encrypt_challenge(challenge: &[u8; CHALLENGE_LEN], password: &[u8]) -> [u8; CHALLENGE_LEN] {
    let key = password_key(password);
    let cipher = Des::new(GenericArray::from_slice(&key));

    let mut response = *challenge;
    for block in response.chunks_exact_mut(KEY_LEN) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    response
}
