//! Item lifecycle status and condition enums.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The moderation/sale state machine of a listing.
///
/// ```text
/// PENDING ──approve──> APPROVED ──mark sold──> SOLD
///    └─────reject────> REJECTED
/// ```
///
/// `REJECTED` and `SOLD` are terminal. Approval is not a separate flag:
/// whether a listing is approved is derived from this status, so the two can
/// never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    /// Freshly created, awaiting moderation.
    #[default]
    Pending,
    /// Visible in public listings.
    Approved,
    /// Refused by a moderator; terminal.
    Rejected,
    /// Sale completed by the seller; terminal.
    Sold,
}

/// Error parsing an [`ItemStatus`] from its string form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown item status: {0}")]
pub struct ItemStatusError(pub String);

impl ItemStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Approved, Self::Rejected, Self::Sold];

    /// The stored/wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Sold => "SOLD",
        }
    }

    /// Whether the listing counts as approved.
    ///
    /// This is the single source of truth for the `isApproved` field in API
    /// payloads.
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Whether `to` is a legal direct transition from this state.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Approved | Self::Rejected) | (Self::Approved, Self::Sold)
        )
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = ItemStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "SOLD" => Ok(Self::Sold),
            other => Err(ItemStatusError(other.to_owned())),
        }
    }
}

/// Physical condition of a listed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    #[serde(rename = "New")]
    New,
    #[serde(rename = "Like New")]
    LikeNew,
    #[serde(rename = "Used - Good")]
    UsedGood,
    #[serde(rename = "Used - Fair")]
    UsedFair,
    #[serde(rename = "For Parts")]
    ForParts,
}

/// Error parsing a [`Condition`] from its label.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown condition: {0}")]
pub struct ConditionError(pub String);

impl Condition {
    /// The stored/wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::LikeNew => "Like New",
            Self::UsedGood => "Used - Good",
            Self::UsedFair => "Used - Fair",
            Self::ForParts => "For Parts",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Condition {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Like New" => Ok(Self::LikeNew),
            "Used - Good" => Ok(Self::UsedGood),
            "Used - Fair" => Ok(Self::UsedFair),
            "For Parts" => Ok(Self::ForParts),
            other => Err(ConditionError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            ItemStatus::Pending,
            ItemStatus::Approved,
            ItemStatus::Rejected,
            ItemStatus::Sold,
        ] {
            assert_eq!(status.as_str().parse::<ItemStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(ItemStatus::default(), ItemStatus::Pending);
    }

    #[test]
    fn test_is_approved_derivation() {
        assert!(ItemStatus::Approved.is_approved());
        assert!(!ItemStatus::Pending.is_approved());
        assert!(!ItemStatus::Rejected.is_approved());
        assert!(!ItemStatus::Sold.is_approved());
    }

    #[test]
    fn test_only_approved_can_be_sold() {
        assert!(ItemStatus::Approved.can_transition_to(ItemStatus::Sold));
        assert!(!ItemStatus::Pending.can_transition_to(ItemStatus::Sold));
        assert!(!ItemStatus::Rejected.can_transition_to(ItemStatus::Sold));
        assert!(!ItemStatus::Sold.can_transition_to(ItemStatus::Sold));
    }

    #[test]
    fn test_legal_transitions() {
        assert!(ItemStatus::Pending.can_transition_to(ItemStatus::Approved));
        assert!(ItemStatus::Pending.can_transition_to(ItemStatus::Rejected));
        assert!(ItemStatus::Approved.can_transition_to(ItemStatus::Sold));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for to in [
            ItemStatus::Pending,
            ItemStatus::Approved,
            ItemStatus::Rejected,
            ItemStatus::Sold,
        ] {
            assert!(!ItemStatus::Rejected.can_transition_to(to));
            assert!(!ItemStatus::Sold.can_transition_to(to));
        }
    }

    #[test]
    fn test_status_serde_screaming() {
        let json = serde_json::to_string(&ItemStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
    }

    #[test]
    fn test_condition_labels() {
        for condition in [
            Condition::New,
            Condition::LikeNew,
            Condition::UsedGood,
            Condition::UsedFair,
            Condition::ForParts,
        ] {
            assert_eq!(condition.as_str().parse::<Condition>().unwrap(), condition);
        }
        assert_eq!(Condition::UsedGood.as_str(), "Used - Good");
    }

    #[test]
    fn test_condition_serde_uses_labels() {
        let json = serde_json::to_string(&Condition::LikeNew).unwrap();
        assert_eq!(json, "\"Like New\"");
    }
}
