#![cfg(feature = "std")]

//! Optional encryption of fleet positions before they reach the ledger.
//!
//! When no service is available the fleet is still submitted, in cleartext,
//! and the downgrade is always logged.

use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::fleet::Fleet;

/// Plaintext integer width requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    Uint8,
    Uint16,
    Uint32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub tag: TypeTag,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SealedPosition {
    Encrypted(Ciphertext),
    Clear(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealMode {
    Encrypted,
    Cleartext,
}

/// Fleet positions ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedFleet {
    pub positions: Vec<SealedPosition>,
    pub mode: SealMode,
}

#[async_trait::async_trait]
pub trait EncryptionService: Send + Sync {
    async fn encrypt(&self, value: u8, tag: TypeTag) -> anyhow::Result<Ciphertext>;
}

/// Value encrypted by the start-up self test.
const PROBE_VALUE: u8 = 42;

/// Encrypt a throwaway value to confirm the service works.
pub async fn probe_encryption(service: &dyn EncryptionService) -> Result<(), AgentError> {
    service
        .encrypt(PROBE_VALUE, TypeTag::Uint8)
        .await
        .map(|_| ())
        .map_err(|e| AgentError::EncryptionUnavailable(format!("{:#}", e)))
}

fn clear_positions(positions: &[u8]) -> SealedFleet {
    SealedFleet {
        positions: positions.iter().map(|&p| SealedPosition::Clear(p)).collect(),
        mode: SealMode::Cleartext,
    }
}

/// Encrypt every fleet position, degrading to cleartext when the service is
/// missing or any single encryption fails.
pub async fn seal_fleet(
    service: Option<&dyn EncryptionService>,
    fleet: &Fleet,
) -> anyhow::Result<SealedFleet> {
    let positions = fleet
        .positions()
        .into_iter()
        .map(|p| u8::try_from(p).map_err(|_| anyhow::anyhow!("position {} exceeds u8", p)))
        .collect::<anyhow::Result<Vec<u8>>>()?;

    let Some(service) = service else {
        log::warn!("Warning: no encryption service, submitting ship positions unencrypted");
        return Ok(clear_positions(&positions));
    };

    let mut sealed = Vec::with_capacity(positions.len());
    for &p in &positions {
        match service.encrypt(p, TypeTag::Uint8).await {
            Ok(ct) => sealed.push(SealedPosition::Encrypted(ct)),
            Err(e) => {
                let cause = AgentError::EncryptionUnavailable(format!("{:#}", e));
                log::warn!("Warning: {}; submitting ship positions unencrypted", cause);
                return Ok(clear_positions(&positions));
            }
        }
    }
    Ok(SealedFleet {
        positions: sealed,
        mode: SealMode::Encrypted,
    })
}
