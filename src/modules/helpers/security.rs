use rand::RngCore;
use sha2::{Digest, Sha256};

const PASSWORD_SCHEME: &str = "sha256";
const SALT_BYTES: usize = 16;
const TOKEN_BYTES: usize = 32;

pub struct Security {}

impl Security {
    /// # hash a password for storage
    /// the result has the form `sha256$<salt>$<digest>`, both hex encoded
    pub fn hash_password(password: &str) -> String {
        let mut salt = [0u8; SALT_BYTES];
        rand::thread_rng().fill_bytes(&mut salt);

        let digest = salted_digest(&salt, password);
        format!("{PASSWORD_SCHEME}${}${}", hex::encode(salt), hex::encode(digest))
    }

    /// # check a password against a stored hash
    /// unknown schemes and malformed hashes never verify
    pub fn verify_password(password: &str, stored: &str) -> bool {
        let mut parts = stored.split('$');
        let (Some(scheme), Some(salt), Some(digest), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };

        if scheme != PASSWORD_SCHEME {
            return false;
        }

        let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(digest)) else {
            return false;
        };

        constant_time_eq(&salted_digest(&salt, password), &expected)
    }

    /// a fresh bearer token, 32 random bytes hex encoded
    pub fn generate_token() -> String {
        let mut token = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut token);
        hex::encode(token)
    }

    pub fn hash_token(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    /// emails are only stored hashed. they are trimmed and lower cased first
    /// so `A@B.nl` and `a@b.nl ` are the same account.
    pub fn hash_email(email: &str) -> String {
        hex::encode(Sha256::digest(email.trim().to_lowercase().as_bytes()))
    }
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let stored = Security::hash_password("correct horse");
        assert!(stored.starts_with("sha256$"));
        assert!(Security::verify_password("correct horse", &stored));
        assert!(!Security::verify_password("wrong horse", &stored));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(Security::hash_password("same"), Security::hash_password("same"));
    }

    #[test]
    fn malformed_hashes_never_verify() {
        assert!(!Security::verify_password("x", ""));
        assert!(!Security::verify_password("x", "md5$00$00"));
        assert!(!Security::verify_password("x", "sha256$zz$00"));
        assert!(!Security::verify_password("x", "sha256$00$00$00"));
    }

    #[test]
    fn tokens_are_unique_hex() {
        let a = Security::generate_token();
        let b = Security::generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_eq!(Security::hash_token(&a), Security::hash_token(&a));
    }

    #[test]
    fn emails_are_normalised_before_hashing() {
        assert_eq!(Security::hash_email(" Driver@Example.com "), Security::hash_email("driver@example.com"));
    }
}
