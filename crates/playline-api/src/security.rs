//! Admin request authentication.
//!
//! Admin endpoints carry an HMAC-SHA256 signature of the raw request body,
//! hex-encoded, in the `s` query parameter. The key is a single line of
//! base64 text, loaded from a key file or generated on first start.

use std::fs;
use std::io;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Random bytes in a generated key, pre-encoding.
const KEY_STRENGTH: usize = 24;

/// Generate a fresh base64-encoded secret key.
pub fn generate_secret_key() -> String {
    let mut bytes = [0u8; KEY_STRENGTH];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    BASE64.encode(bytes)
}

/// Load the key from the first line of `path`, generating and storing a new
/// one when the file does not exist yet.
pub fn load_or_generate_secret_key(path: &Path) -> io::Result<String> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let key = contents.lines().next().unwrap_or("").trim().to_string();
        if key.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("secret key file {} is empty", path.display()),
            ));
        }
        Ok(key)
    } else {
        let key = generate_secret_key();
        fs::write(path, format!("{key}\n"))?;
        warn!("Stored new server secret key in {}", path.display());
        Ok(key)
    }
}

/// Hex-encoded HMAC-SHA256 of `message` under `key`.
pub fn compute_signature(key: &str, message: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time verification of a hex-encoded signature.
pub fn verify_signature(key: &str, message: &[u8], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message);
    mac.verify_slice(&signature).is_ok()
}
