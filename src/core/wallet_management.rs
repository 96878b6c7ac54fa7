//! Custodial wallet store
//!
//! One Solana keypair per owner, kept in a single JSON file that maps the
//! lower-cased owner id to `{ "public": <base58>, "secret": [64 ints] }`. The
//! whole file is rewritten on every mutation; a missing or unreadable file
//! starts an empty store.

use serde::{Deserialize, Serialize};
use solana_sdk::signature::{Keypair, Signer};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

use super::error::{EngineError, EngineResult};

pub const NO_WALLET_FOUND: &str = "No wallet found";

/// On-disk representation of one wallet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct StoredWallet {
    public: String,
    secret: Vec<u8>,
}

/// A custodial wallet. The secret never appears in `Debug` output.
#[derive(Clone, PartialEq)]
pub struct Wallet {
    pub owner_id: String,
    pub public_key: String,
    secret: Vec<u8>,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("owner_id", &self.owner_id)
            .field("public_key", &self.public_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Wallet {
    fn from_stored(owner_id: &str, stored: &StoredWallet) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            public_key: stored.public.clone(),
            secret: stored.secret.clone(),
        }
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Rebuild the signing keypair, checking it still matches the stored public key
    pub fn keypair(&self) -> EngineResult<Keypair> {
        if self.secret.len() != 64 {
            return Err(EngineError::Signing(format!(
                "invalid secret key length: {}, needs 64 bytes",
                self.secret.len()
            )));
        }

        let keypair = Keypair::from_bytes(&self.secret)
            .map_err(|e| EngineError::Signing(format!("error creating keypair: {}", e)))?;

        if keypair.pubkey().to_string() != self.public_key {
            return Err(EngineError::Signing(
                "secret key does not match stored public key".to_string(),
            ));
        }

        Ok(keypair)
    }
}

/// Secret key in the two formats wallets import from
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WalletExport {
    pub public_key: String,
    pub base58: String,
    pub json_array: Vec<u8>,
}

pub fn normalize_owner(owner_id: &str) -> String {
    owner_id.trim().to_lowercase()
}

/// Wallet store backed by a whole-file JSON document
pub struct WalletStore {
    path: PathBuf,
    /// Writers hold this lock across the file write, serializing all persistence
    wallets: RwLock<HashMap<String, StoredWallet>>,
}

impl WalletStore {
    /// Open the store at `path`, loading whatever valid state is there
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let wallets = Self::load(&path);
        info!("👛 Loaded {} wallets from {}", wallets.len(), path.display());

        Self {
            path,
            wallets: RwLock::new(wallets),
        }
    }

    fn load(path: &Path) -> HashMap<String, StoredWallet> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No wallet file at {}, starting empty", path.display());
                return HashMap::new();
            }
            Err(e) => {
                warn!("⚠️ Could not read wallet file {}: {}", path.display(), e);
                return HashMap::new();
            }
        };

        match serde_json::from_str::<HashMap<String, StoredWallet>>(&data) {
            Ok(raw) => raw
                .into_iter()
                .map(|(owner, wallet)| (normalize_owner(&owner), wallet))
                .collect(),
            Err(e) => {
                error!(
                    "❌ Error loading {}: {}. Treating as an empty store.",
                    path.display(),
                    e
                );
                HashMap::new()
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, StoredWallet>> {
        self.wallets.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, StoredWallet>> {
        self.wallets.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, owner_id: &str) -> EngineResult<Wallet> {
        let owner = normalize_owner(owner_id);
        self.read()
            .get(&owner)
            .map(|stored| Wallet::from_stored(&owner, stored))
            .ok_or_else(|| EngineError::NotFound(owner.clone()))
    }

    pub fn get_public_key(&self, owner_id: &str) -> String {
        self.get(owner_id)
            .map(|wallet| wallet.public_key)
            .unwrap_or_else(|_| NO_WALLET_FOUND.to_string())
    }

    /// Return the owner's wallet, generating and persisting a fresh keypair on first access
    pub fn get_or_create(&self, owner_id: &str) -> EngineResult<Wallet> {
        let owner = normalize_owner(owner_id);
        if owner.is_empty() {
            return Err(EngineError::InvalidRequest("empty owner id".to_string()));
        }

        let mut wallets = self.write();
        if let Some(stored) = wallets.get(&owner) {
            return Ok(Wallet::from_stored(&owner, stored));
        }

        let keypair = Keypair::new();
        let stored = StoredWallet {
            public: keypair.pubkey().to_string(),
            secret: keypair.to_bytes().to_vec(),
        };
        wallets.insert(owner.clone(), stored.clone());

        if let Err(e) = self.persist(&wallets) {
            wallets.remove(&owner);
            return Err(e);
        }

        info!("🔑 Generated new wallet for {}: {}", owner, stored.public);
        Ok(Wallet::from_stored(&owner, &stored))
    }

    pub fn export(&self, owner_id: &str) -> EngineResult<WalletExport> {
        let wallet = self.get(owner_id)?;
        Ok(WalletExport {
            public_key: wallet.public_key.clone(),
            base58: bs58::encode(wallet.secret()).into_string(),
            json_array: wallet.secret().to_vec(),
        })
    }

    pub fn owners(&self) -> Vec<String> {
        let mut owners: Vec<String> = self.read().keys().cloned().collect();
        owners.sort();
        owners
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Replace the wallet file with the full in-memory set
    fn persist(&self, wallets: &HashMap<String, StoredWallet>) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(wallets)
            .map_err(|e| EngineError::Storage(format!("serialize wallets: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| EngineError::Storage(format!("create {}: {}", parent.display(), e)))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| EngineError::Storage(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| EngineError::Storage(format!("replace {}: {}", self.path.display(), e)))?;

        debug!("💾 Saved {} wallets to {}", wallets.len(), self.path.display());
        Ok(())
    }
}
