// src/common/crypto.rs
//
// Criptografia simétrica das chaves de API do fornecedor em repouso.
// AES-256-GCM com nonce aleatório por chamada; o token gravado no banco
// é autodescritivo: `hex(nonce):hex(ciphertext)`. Trocar o segredo
// invalida todos os tokens existentes (sem rotação/versionamento).

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use thiserror::Error;

const NONCE_SIZE: usize = 12;
const TOKEN_SEPARATOR: char = ':';

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Segredo de criptografia inválido: {0}")]
    InvalidKey(String),

    #[error("Falha ao criptografar: {0}")]
    EncryptionFailed(String),

    #[error("Falha ao descriptografar: {0}")]
    DecryptionFailed(String),

    #[error("Token cifrado malformado")]
    MalformedToken,
}

#[derive(Clone)]
pub struct KeyCipher {
    cipher: Aes256Gcm,
}

impl KeyCipher {
    /// Monta o cifrador a partir do segredo em hex (64 caracteres = 32 bytes).
    pub fn from_hex(secret_hex: &str) -> Result<Self, CryptoError> {
        if secret_hex.len() != 64 {
            return Err(CryptoError::InvalidKey(
                "o segredo deve ter 64 caracteres hex (32 bytes)".to_string(),
            ));
        }

        let mut key_bytes = [0u8; 32];
        hex::decode_to_slice(secret_hex, &mut key_bytes)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

        Ok(Self {
            cipher: Aes256Gcm::new(&key_bytes.into()),
        })
    }

    /// Criptografa e devolve o token `hex(nonce):hex(ciphertext)`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok(format!(
            "{}{}{}",
            hex::encode(nonce_bytes),
            TOKEN_SEPARATOR,
            hex::encode(ciphertext)
        ))
    }

    /// Reverte um token produzido por `encrypt`.
    pub fn decrypt(&self, token: &str) -> Result<String, CryptoError> {
        let (nonce_hex, ciphertext_hex) = token
            .split_once(TOKEN_SEPARATOR)
            .ok_or(CryptoError::MalformedToken)?;

        if nonce_hex.len() != NONCE_SIZE * 2 {
            return Err(CryptoError::MalformedToken);
        }

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        hex::decode_to_slice(nonce_hex, &mut nonce_bytes)
            .map_err(|_| CryptoError::MalformedToken)?;
        let ciphertext = hex::decode(ciphertext_hex).map_err(|_| CryptoError::MalformedToken)?;

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::MalformedToken)
    }
}

/// Gera um segredo novo (64 hex). Útil para provisionar ambientes.
pub fn generate_secret() -> String {
    let mut key_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut key_bytes);
    hex::encode(key_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> KeyCipher {
        KeyCipher::from_hex(&generate_secret()).unwrap()
    }

    #[test]
    fn roundtrip_preserva_o_texto() {
        let c = cipher();
        let token = c.encrypt("bn-1a2b3c4d5e6f").unwrap();
        assert_eq!(c.decrypt(&token).unwrap(), "bn-1a2b3c4d5e6f");
    }

    #[test]
    fn tokens_diferentes_para_o_mesmo_texto() {
        // Nonce aleatório por chamada: nunca repete ciphertext.
        let c = cipher();
        let t1 = c.encrypt("same-key").unwrap();
        let t2 = c.encrypt("same-key").unwrap();
        assert_ne!(t1, t2);
        assert_eq!(c.decrypt(&t1).unwrap(), "same-key");
        assert_eq!(c.decrypt(&t2).unwrap(), "same-key");
    }

    #[test]
    fn formato_do_token() {
        let c = cipher();
        let token = c.encrypt("abc").unwrap();
        let (nonce_hex, ct_hex) = token.split_once(':').unwrap();
        assert_eq!(nonce_hex.len(), 24); // 12 bytes em hex
        assert!(!ct_hex.is_empty());
        assert!(token.chars().all(|ch| ch.is_ascii_hexdigit() || ch == ':'));
    }

    #[test]
    fn token_malformado_e_rejeitado() {
        let c = cipher();
        assert!(c.decrypt("sem-separador").is_err());
        assert!(c.decrypt("zz:1234").is_err());
        assert!(c.decrypt("0011223344556677889900aa:").is_err());
    }

    #[test]
    fn chave_errada_nao_descriptografa() {
        // GCM autentica: segredo diferente falha em vez de devolver lixo.
        let token = cipher().encrypt("segredo").unwrap();
        assert!(cipher().decrypt(&token).is_err());
    }

    #[test]
    fn segredo_com_tamanho_errado_e_rejeitado() {
        assert!(KeyCipher::from_hex("curto").is_err());
    }
}
