use rand::RngCore;
use sha2::{Digest, Sha256};

/// Stored form is `salt$digest`, both hex. The plaintext never leaves this
/// module and is never written to the database or the log stream.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    hash_with_salt(&salt, password)
}

fn hash_with_salt(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    format!("{}${}", hex::encode(salt), hex::encode(hasher.finalize()))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, _)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    // Full-string comparison; both sides are fixed-length hex.
    hash_with_salt(&salt, password) == stored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_roundtrip() {
        let stored = hash_password("secret123");
        assert!(verify_password("secret123", &stored));
        assert!(!verify_password("secret124", &stored));
        assert!(!verify_password("", &stored));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same-password");
        let b = hash_password("same-password");
        assert_ne!(a, b);
        assert!(verify_password("same-password", &a));
        assert!(verify_password("same-password", &b));
    }

    #[test]
    fn malformed_stored_values_never_verify() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "no-separator"));
        assert!(!verify_password("anything", "zz$not-hex"));
    }
}
