use argon2::Config;
use rand::Rng;

/// Hash a plaintext password with argon2 and a fresh 16-byte salt.
///
/// The salt is embedded in the returned encoded digest, so two calls on the
/// same input produce different digests that both verify.
pub fn hash(plaintext: &str) -> String {
    let salt: [u8; 16] = rand::thread_rng().gen();
    argon2::hash_encoded(plaintext.as_bytes(), &salt, &Config::default())
        .expect("argon2 with default parameters accepts any input")
}

/// Check a plaintext password against an encoded digest.
///
/// Malformed digests verify as `false` rather than erroring; the comparison
/// itself is constant-time inside the argon2 crate.
pub fn verify(plaintext: &str, digest: &str) -> bool {
    argon2::verify_encoded(digest, plaintext.as_bytes()).unwrap_or(false)
}
