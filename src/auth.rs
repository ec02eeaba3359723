//! Identity seam. The progression core only needs a stable user id and an
//! email; where those come from is a provider concern, and provider errors
//! pass through uninterpreted.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// An authenticated principal as seen by the progression core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Pre-verified profile handed over by a federated provider (the provider
/// has already checked the credential; we only mint or match an account).
#[derive(Debug, Clone)]
pub struct FederatedProfile {
    pub provider: String,
    pub email: String,
    pub display_name: Option<String>,
}

pub trait IdentityProvider {
    fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;
    fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Identity>;
    fn sign_in_federated(&self, profile: &FederatedProfile) -> Result<Identity>;
    /// Invalidates any provider-side session state. The local directory
    /// keeps none, so the default is a no-op.
    fn sign_out(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccountRecord {
    user_id: String,
    email: String,
    display_name: Option<String>,
    #[serde(default)]
    credential: Option<StoredCredential>,
    #[serde(default)]
    federated_provider: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCredential {
    salt: String,
    digest: String,
}

impl StoredCredential {
    fn derive(password: &str) -> Self {
        let mut rng = rand::thread_rng();
        let salt: String = (0..16).map(|_| rng.sample(Alphanumeric) as char).collect();
        let digest = digest_password(&salt, password);
        Self { salt, digest }
    }

    fn verify(&self, password: &str) -> bool {
        self.digest == digest_password(&self.salt, password)
    }
}

fn digest_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// File-backed account directory: a development stand-in behind the
/// provider trait, not a production identity service.
pub struct LocalAccountDirectory {
    accounts_path: PathBuf,
}

impl LocalAccountDirectory {
    pub fn new(accounts_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&accounts_dir)
            .with_context(|| format!("Failed creating accounts dir {:?}", accounts_dir))?;
        Ok(Self {
            accounts_path: accounts_dir.join("accounts.json"),
        })
    }

    fn load_accounts(&self) -> Result<Vec<AccountRecord>> {
        if !self.accounts_path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read(&self.accounts_path)
            .with_context(|| format!("Failed reading accounts {:?}", self.accounts_path))?;
        let accounts = serde_json::from_slice(&data)
            .with_context(|| format!("Failed parsing accounts {:?}", self.accounts_path))?;
        Ok(accounts)
    }

    fn save_accounts(&self, accounts: &[AccountRecord]) -> Result<()> {
        if let Some(parent) = self.accounts_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.accounts_path, serde_json::to_vec_pretty(accounts)?)?;
        Ok(())
    }
}

fn identity_of(account: &AccountRecord) -> Identity {
    Identity {
        user_id: account.user_id.clone(),
        email: account.email.clone(),
        display_name: account.display_name.clone(),
    }
}

impl IdentityProvider for LocalAccountDirectory {
    fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let accounts = self.load_accounts()?;
        let account = accounts.iter().find(|a| a.email == email);
        match account {
            Some(account) => {
                let Some(credential) = &account.credential else {
                    bail!("Account {email} has no password credential; use its federated provider");
                };
                if !credential.verify(password) {
                    bail!("Invalid email or password");
                }
                Ok(identity_of(account))
            }
            None => bail!("Invalid email or password"),
        }
    }

    fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Identity> {
        if email.is_empty() || !email.contains('@') {
            bail!("Invalid email address {email:?}");
        }
        let mut accounts = self.load_accounts()?;
        if accounts.iter().any(|a| a.email == email) {
            bail!("An account already exists for {email}");
        }
        let account = AccountRecord {
            user_id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            display_name: Some(display_name.to_string()),
            credential: Some(StoredCredential::derive(password)),
            federated_provider: None,
            created_at: Utc::now(),
        };
        let identity = identity_of(&account);
        accounts.push(account);
        self.save_accounts(&accounts)?;
        Ok(identity)
    }

    fn sign_in_federated(&self, profile: &FederatedProfile) -> Result<Identity> {
        let mut accounts = self.load_accounts()?;
        if let Some(account) = accounts.iter().find(|a| a.email == profile.email) {
            return Ok(identity_of(account));
        }
        let account = AccountRecord {
            user_id: Uuid::new_v4().to_string(),
            email: profile.email.clone(),
            display_name: profile.display_name.clone(),
            credential: None,
            federated_provider: Some(profile.provider.clone()),
            created_at: Utc::now(),
        };
        let identity = identity_of(&account);
        accounts.push(account);
        self.save_accounts(&accounts)?;
        Ok(identity)
    }
}
