use std::fmt;

use crate::error::CoreError;

/// The stages of a registry transaction.
///
/// Stages are strictly ordered: `Built → Balanced → Proven → Submitted →
/// Confirmed`. `Failed` is reachable from every non-final stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum TxStage {
    /// Unproven call constructed against a circuit entry point.
    Built,
    /// Fee inputs contributed by the wallet.
    Balanced,
    /// Zero-knowledge proof attached.
    Proven,
    /// Sent to the registry network.
    Submitted,
    /// Result inspected; the attempt succeeded. Final state.
    Confirmed,
    /// The attempt terminated. Final state.
    Failed,
}

impl TxStage {
    /// Whether this is a final (terminal) stage.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }

    /// The stage that follows this one on the success path.
    pub fn next(&self) -> Option<TxStage> {
        match self {
            Self::Built => Some(Self::Balanced),
            Self::Balanced => Some(Self::Proven),
            Self::Proven => Some(Self::Submitted),
            Self::Submitted => Some(Self::Confirmed),
            Self::Confirmed | Self::Failed => None,
        }
    }

    /// The full success path, in order.
    pub const SUCCESS_PATH: [TxStage; 5] = [
        Self::Built,
        Self::Balanced,
        Self::Proven,
        Self::Submitted,
        Self::Confirmed,
    ];
}

impl fmt::Display for TxStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Built => write!(f, "Built"),
            Self::Balanced => write!(f, "Balanced"),
            Self::Proven => write!(f, "Proven"),
            Self::Submitted => write!(f, "Submitted"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Validates stage transitions: one step forward at a time, or to `Failed`.
///
/// Valid transitions:
/// - Built → Balanced
/// - Balanced → Proven
/// - Proven → Submitted
/// - Submitted → Confirmed
/// - any non-final stage → Failed
pub struct TxStageMachine;

impl TxStageMachine {
    /// Attempt a transition. Returns the target stage on success.
    pub fn transition(current: TxStage, target: TxStage) -> Result<TxStage, CoreError> {
        let allowed = match target {
            TxStage::Failed => !current.is_final(),
            _ => current.next() == Some(target),
        };

        if !allowed {
            return Err(CoreError::InvalidStageTransition {
                from: current,
                to: target,
            });
        }

        tracing::debug!(from = %current, to = %target, "transaction stage transition");
        Ok(target)
    }
}
