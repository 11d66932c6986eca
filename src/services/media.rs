//! Media service: signed display URLs for stored images
//!
//! The object store itself lives outside this server. Uploaded files are
//! addressed by key; rendering a key produces a time-limited signed URL the
//! store's edge validates. A missing or empty key degrades to the configured
//! placeholder, never to an error.

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::MediaConfig;

#[derive(Clone)]
pub struct MediaService {
    config: MediaConfig,
}

impl MediaService {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    fn sign(&self, key: &str, expires: i64) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.config.signing_secret.as_bytes());
        hasher.update(key.as_bytes());
        hasher.update(expires.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Signed display URL for an object key; None for absent keys
    pub fn resolve_image_url(&self, key: Option<&str>) -> Option<String> {
        let key = key.filter(|k| !k.is_empty())?;
        let expires = Utc::now().timestamp() + self.config.url_ttl_secs as i64;
        let sig = self.sign(key, expires);
        Some(format!(
            "{}/{}?expires={}&sig={}",
            self.config.base_url.trim_end_matches('/'),
            key,
            expires,
            sig
        ))
    }

    /// Display URL for a game image, falling back to the default artwork
    pub fn game_image_url(&self, key: Option<&str>) -> String {
        self.resolve_image_url(key)
            .unwrap_or_else(|| self.config.default_game_image.clone())
    }

    /// Display URL for a profile picture, falling back to the default avatar
    pub fn avatar_url(&self, key: Option<&str>) -> String {
        self.resolve_image_url(key)
            .unwrap_or_else(|| self.config.default_avatar.clone())
    }

    /// Persist uploaded bytes under the store volume at `key`
    pub async fn store(&self, key: &str, bytes: &[u8]) -> crate::error::AppResult<()> {
        let path = std::path::Path::new(&self.config.upload_dir).join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                crate::error::AppError::Internal(format!("Media store unavailable: {}", e))
            })?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            crate::error::AppError::Internal(format!("Failed to store media object: {}", e))
        })?;
        Ok(())
    }

    /// Mint a fresh object key for an upload, keeping the file extension
    pub fn mint_key(&self, prefix: &str, filename: &str) -> String {
        let ext = filename
            .rsplit('.')
            .next()
            .filter(|e| e.len() <= 5 && !e.contains('/'))
            .map(|e| e.to_lowercase());
        match ext {
            Some(ext) => format!("{}/{}.{}", prefix, Uuid::new_v4(), ext),
            None => format!("{}/{}", prefix, Uuid::new_v4()),
        }
    }

    /// Upload size cap in bytes
    pub fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> MediaService {
        MediaService::new(MediaConfig {
            base_url: "https://media.example.org/ludotheque".to_string(),
            upload_dir: "./media".to_string(),
            signing_secret: "test-secret".to_string(),
            url_ttl_secs: 3600,
            default_game_image: "/static/images/default-game.png".to_string(),
            default_avatar: "/static/images/default-avatar.jpg".to_string(),
            max_upload_bytes: 2 * 1024 * 1024,
        })
    }

    #[test]
    fn absent_key_resolves_to_none() {
        let svc = service();
        assert_eq!(svc.resolve_image_url(None), None);
        assert_eq!(svc.resolve_image_url(Some("")), None);
    }

    #[test]
    fn placeholder_fallbacks() {
        let svc = service();
        assert_eq!(svc.game_image_url(None), "/static/images/default-game.png");
        assert_eq!(svc.avatar_url(None), "/static/images/default-avatar.jpg");
    }

    #[test]
    fn signed_url_carries_key_expiry_and_signature() {
        let svc = service();
        let url = svc.resolve_image_url(Some("board_games/catan.jpg")).unwrap();
        assert!(url.starts_with("https://media.example.org/ludotheque/board_games/catan.jpg?expires="));
        assert!(url.contains("&sig="));
        // 32-byte SHA-256 digest in hex
        let sig = url.rsplit("&sig=").next().unwrap();
        assert_eq!(sig.len(), 64);
    }

    #[test]
    fn signature_depends_on_key() {
        let svc = service();
        assert_ne!(svc.sign("a.jpg", 100), svc.sign("b.jpg", 100));
        assert_ne!(svc.sign("a.jpg", 100), svc.sign("a.jpg", 101));
        assert_eq!(svc.sign("a.jpg", 100), svc.sign("a.jpg", 100));
    }

    #[test]
    fn minted_keys_keep_extension_and_differ() {
        let svc = service();
        let a = svc.mint_key("board_games", "catan.JPG");
        let b = svc.mint_key("board_games", "catan.JPG");
        assert!(a.starts_with("board_games/"));
        assert!(a.ends_with(".jpg"));
        assert_ne!(a, b);
    }
}
