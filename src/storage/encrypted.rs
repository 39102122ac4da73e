//! SQLite-backed store with AES-GCM encryption of the trained state and of
//! scored event payloads. Key derived from a device-bound secret.

use crate::error::{Result, ScoringError};
use crate::risk::ScoredEvent;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const MODEL_STATE_KEY: &str = "trained_state";

fn derive_key(seed: &[u8]) -> [u8; KEY_LEN] {
    use ring::digest;
    let mut out = [0u8; KEY_LEN];
    let h = digest::digest(&digest::SHA256, seed);
    out[..h.as_ref().len().min(KEY_LEN)].copy_from_slice(h.as_ref());
    out
}

fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| ScoringError::Crypto(e.to_string()))?;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt((&nonce).into(), plaintext)
        .map_err(|e| ScoringError::Crypto(e.to_string()))?;
    let mut out = nonce.to_vec();
    out.extend(ciphertext);
    Ok(BASE64.encode(&out))
}

fn decrypt(key: &[u8; KEY_LEN], encoded: &str) -> Result<Vec<u8>> {
    let raw = BASE64
        .decode(encoded)
        .map_err(|e| ScoringError::Crypto(e.to_string()))?;
    if raw.len() < NONCE_LEN {
        return Err(ScoringError::Crypto("payload too short".into()));
    }
    let (nonce, ct) = raw.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| ScoringError::Crypto(e.to_string()))?;
    cipher
        .decrypt(nonce.into(), ct)
        .map_err(|e| ScoringError::Crypto(e.to_string()))
}

pub struct SecureStore {
    conn: Mutex<Connection>,
    key: [u8; KEY_LEN],
}

impl SecureStore {
    /// Open or create DB at path. Key is derived from `secret` (in production: device-bound).
    pub fn open(path: &Path, secret: &[u8]) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS model_state (
                k TEXT PRIMARY KEY,
                v TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS scored_events (
                id TEXT PRIMARY KEY,
                ts INTEGER NOT NULL,
                username TEXT NOT NULL,
                action TEXT NOT NULL,
                risk_score REAL NOT NULL,
                risk_level TEXT NOT NULL,
                payload_enc TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_scored_ts ON scored_events(ts);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            key: derive_key(secret),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the stored trained-state blob.
    pub fn save_model_state(&self, blob: &str) -> Result<()> {
        let enc = encrypt(&self.key, blob.as_bytes())?;
        self.conn().execute(
            "INSERT OR REPLACE INTO model_state (k, v, updated_at) VALUES (?1, ?2, ?3)",
            params![MODEL_STATE_KEY, enc, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    pub fn load_model_state(&self) -> Result<Option<String>> {
        let enc: Option<String> = self
            .conn()
            .query_row(
                "SELECT v FROM model_state WHERE k = ?1",
                params![MODEL_STATE_KEY],
                |row| row.get(0),
            )
            .optional()?;
        match enc {
            Some(enc) => {
                let plain = decrypt(&self.key, &enc)?;
                let blob = String::from_utf8(plain)
                    .map_err(|e| ScoringError::Crypto(e.to_string()))?;
                Ok(Some(blob))
            }
            None => Ok(None),
        }
    }

    pub fn clear_model_state(&self) -> Result<()> {
        self.conn()
            .execute("DELETE FROM model_state WHERE k = ?1", params![MODEL_STATE_KEY])?;
        Ok(())
    }

    /// Insert a scored event; the raw record payload is stored encrypted.
    pub fn insert_scored(&self, scored: &ScoredEvent, payload_json: &str) -> Result<()> {
        let enc = encrypt(&self.key, payload_json.as_bytes())?;
        self.conn().execute(
            "INSERT OR REPLACE INTO scored_events (id, ts, username, action, risk_score, risk_level, payload_enc)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                scored.id,
                scored.ts,
                scored.username,
                scored.action,
                scored.score,
                scored.level.as_str(),
                enc
            ],
        )?;
        Ok(())
    }

    /// Read a scored event by id: (ts, risk_score, risk_level, decrypted payload).
    pub fn get_scored(&self, id: &str) -> Result<Option<(i64, f64, String, String)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT ts, risk_score, risk_level, payload_enc FROM scored_events WHERE id = ?1",
        )?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            let ts: i64 = row.get(0)?;
            let score: f64 = row.get(1)?;
            let level: String = row.get(2)?;
            let enc: String = row.get(3)?;
            let plain = decrypt(&self.key, &enc)?;
            let payload = String::from_utf8(plain).unwrap_or_default();
            return Ok(Some((ts, score, level, payload)));
        }
        Ok(None)
    }

    pub fn count_scored(&self) -> Result<u64> {
        let n: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM scored_events", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Retention: delete scored events older than given timestamp
    pub fn prune_before(&self, ts: i64) -> Result<u64> {
        let n = self
            .conn()
            .execute("DELETE FROM scored_events WHERE ts < ?1", params![ts])?;
        Ok(n as u64)
    }
}
