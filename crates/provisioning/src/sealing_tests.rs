use super::*;
use crate::KeyId;
use crypto_box::SecretKey;

fn recipient() -> (SecretKey, String) {
    let secret = SecretKey::generate(&mut OsRng);
    let public = STANDARD.encode(secret.public_key().as_bytes());
    (secret, public)
}

#[test]
fn test_sealed_value_opens_with_recipient_private_key() {
    let (secret, public) = recipient();

    let sealed = seal(b"okta-api-token", &public).expect("seal");
    let ciphertext = STANDARD.decode(sealed).expect("base64 output");
    let opened = secret.unseal(&ciphertext).expect("unseal");

    assert_eq!(opened, b"okta-api-token");
}

#[test]
fn test_sealed_value_does_not_open_with_another_key() {
    let (_, public) = recipient();
    let (other, _) = recipient();

    let sealed = seal(b"value", &public).expect("seal");
    let ciphertext = STANDARD.decode(sealed).expect("base64 output");

    assert!(other.unseal(&ciphertext).is_err());
}

#[test]
fn test_sealing_twice_yields_distinct_ciphertexts() {
    let (_, public) = recipient();
    let a = seal(b"value", &public).expect("seal");
    let b = seal(b"value", &public).expect("seal");
    assert_ne!(a, b);
}

#[test]
fn test_seal_rejects_non_base64_key() {
    assert_eq!(seal(b"value", "not base64!"), Err(SealError::KeyEncoding));
}

#[test]
fn test_seal_rejects_wrong_key_length() {
    let short = STANDARD.encode([7u8; 16]);
    assert_eq!(
        seal(b"value", &short),
        Err(SealError::KeyLength { actual: 16 })
    );
}

#[test]
fn test_seal_secret_carries_key_id() {
    let (secret, public) = recipient();
    let key = RecipientKey {
        key_id: KeyId::new("568250167242549743").expect("non-empty"),
        key: public,
    };

    let sealed = seal_secret(&SecretString::new("hunter2"), &key).expect("seal");

    assert_eq!(sealed.key_id, key.key_id);
    let ciphertext = STANDARD.decode(&sealed.encrypted_value).expect("base64");
    assert_eq!(secret.unseal(&ciphertext).expect("unseal"), b"hunter2");
}
