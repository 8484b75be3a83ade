//! Type-safe identifier wrappers for notification targets.
//!
//! A notification target is addressed in two levels: a group (a community,
//! e.g. a Discord guild) and a channel inside it. Both are opaque string
//! identifiers as far as the tracker is concerned; the wrappers exist so a
//! group id can never be passed where a channel id is expected.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Return the inner [`String`] value.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

define_id! {
    /// Identifier of a target group (a community that owns channels).
    GroupId
}

define_id! {
    /// Identifier of a target channel within a group.
    ChannelId
}

/// A fully qualified notification destination: a channel inside a group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Destination {
    /// The owning group.
    pub group: GroupId,
    /// The channel inside the group.
    pub channel: ChannelId,
}

impl Destination {
    /// Build a destination from anything convertible into the two ids.
    pub fn new(group: impl Into<GroupId>, channel: impl Into<ChannelId>) -> Self {
        Self {
            group: group.into(),
            channel: channel.into(),
        }
    }
}

impl core::fmt::Display for Destination {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.group, self.channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let group = GroupId::from(1_234_567_u64);
        let json = serde_json::to_string(&group).ok();
        assert_eq!(json.as_deref(), Some("\"1234567\""));

        let restored: Result<ChannelId, _> = serde_json::from_str("\"42\"");
        assert_eq!(restored.ok(), Some(ChannelId::new("42")));
    }

    #[test]
    fn destination_display_joins_both_levels() {
        let dest = Destination::new("100", "200");
        assert_eq!(dest.to_string(), "100/200");
        assert_eq!(dest.group.as_str(), "100");
        assert_eq!(dest.channel.clone().into_inner(), "200");
    }
}
