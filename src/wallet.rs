// Wallet Module
// Wallet address handling and the service key that signs outgoing transfers.

use alloy_signer_local::PrivateKeySigner;
use magic_crypt::MagicCryptTrait;
use rand::Rng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sha3::{Digest, Keccak256};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("invalid wallet address '{0}' (expected 0x followed by 40 hex characters)")]
    InvalidAddress(String),
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("failed to decrypt service key: {0}")]
    Decrypt(String),
}

// ==================== ADDRESSES ====================

/// Canonical form of an EVM address: trimmed, `0x`-prefixed, lower-case.
pub fn normalize_address(address: &str) -> Result<String, WalletError> {
    let trimmed = address.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| WalletError::InvalidAddress(trimmed.to_string()))?;

    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(WalletError::InvalidAddress(trimmed.to_string()));
    }
    Ok(format!("0x{}", hex_part.to_ascii_lowercase()))
}

/// EIP-55 mixed-case checksum encoding.
pub fn to_checksum_address(address: &str) -> Result<String, WalletError> {
    let normalized = normalize_address(address)?;
    let lower = &normalized[2..];
    let hash = Keccak256::digest(lower.as_bytes());

    let checksummed: String = lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect();
    Ok(format!("0x{}", checksummed))
}

pub fn public_key_to_address(public_key: &PublicKey) -> String {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = Keccak256::digest(&uncompressed[1..]);
    format!("0x{}", hex::encode(&hash[12..32]))
}

// ==================== SERVICE WALLET ====================

/// Signing key of the account that funds investment transfers.
#[derive(Clone)]
pub struct ServiceWallet {
    secret_key: SecretKey,
    address: String,
}

impl fmt::Debug for ServiceWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl ServiceWallet {
    pub fn from_hex(private_key: &str) -> Result<Self, WalletError> {
        let key_hex = private_key.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);
        let key_bytes =
            hex::decode(key_hex).map_err(|e| WalletError::InvalidKey(format!("invalid hex: {}", e)))?;
        if key_bytes.len() != 32 {
            return Err(WalletError::InvalidKey(
                "private key must be 32 bytes".to_string(),
            ));
        }
        let secret_key =
            SecretKey::from_slice(&key_bytes).map_err(|e| WalletError::InvalidKey(e.to_string()))?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Loads a key that was encrypted with [`encrypt_private_key`].
    pub fn from_encrypted(ciphertext: &str, master_key: &str) -> Result<Self, WalletError> {
        let private_key = decrypt_private_key(ciphertext, master_key)?;
        Self::from_hex(&private_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::signing_only();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            address: public_key_to_address(&public_key),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Signer for the provider that submits transfers from this account.
    pub fn signer(&self) -> Result<PrivateKeySigner, WalletError> {
        PrivateKeySigner::from_slice(&self.secret_key.secret_bytes())
            .map_err(|e| WalletError::InvalidKey(e.to_string()))
    }
}

// ==================== ENCRYPTION ====================
pub fn encrypt_private_key(private_key: &str, master_key: &str) -> String {
    let mc = magic_crypt::new_magic_crypt!(master_key, 256);
    mc.encrypt_str_to_base64(private_key)
}

pub fn decrypt_private_key(ciphertext: &str, master_key: &str) -> Result<String, WalletError> {
    let mc = magic_crypt::new_magic_crypt!(master_key, 256);
    mc.decrypt_base64_to_string(ciphertext.trim())
        .map_err(|e| WalletError::Decrypt(e.to_string()))
}

/// Fresh service key: returns the wallet and the hex private key.
pub fn generate_service_wallet() -> (ServiceWallet, String) {
    let mut rng = rand::thread_rng();
    loop {
        let mut entropy = [0u8; 32];
        rng.fill(&mut entropy);
        // Out-of-range scalars are astronomically rare; draw again if one comes up.
        if let Ok(secret_key) = SecretKey::from_slice(&entropy) {
            let private_key_hex = format!("0x{}", hex::encode(entropy));
            return (ServiceWallet::from_secret_key(secret_key), private_key_hex);
        }
    }
}
