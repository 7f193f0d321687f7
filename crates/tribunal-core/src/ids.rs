//! # Identifier Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout Tribunal. Each
//! identifier is a distinct type, so a [`UserId`] can never be passed where
//! a [`BallotId`] is expected even though both wrap a UUID.
//!
//! All identifiers are UUID-based and always valid by construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declare a UUID-backed identifier newtype with the standard surface:
/// random construction, UUID round-trip, `Display`, and `FromStr`.
macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::from_str(s).map(Self)
            }
        }
    };
}

uuid_id! {
    /// A unique identifier for a registered user.
    UserId
}

uuid_id! {
    /// A unique identifier for a dispute between two users.
    DisputeId
}

uuid_id! {
    /// A unique identifier for one user's participation in one dispute.
    ParticipationId
}

uuid_id! {
    /// A unique identifier for an evidence submission.
    EvidenceId
}

uuid_id! {
    /// A unique identifier for a jury investigation.
    InvestigationId
}

uuid_id! {
    /// A unique identifier for a single juror's ballot.
    BallotId
}
