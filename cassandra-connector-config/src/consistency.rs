//! The module contains Rust representation of Cassandra consistency levels used by scanners.
use derive_more::Display;
use std::str::FromStr;

use crate::error;

/// `Consistency` is an enum which represents Cassandra's consistency levels.
/// To find more details about each consistency level please refer to the following documentation:
/// <https://docs.datastax.com/en/cql-oss/3.x/cql/cql_reference/cqlshConsistency.html>
#[derive(Debug, PartialEq, Clone, Copy, Display, Ord, PartialOrd, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Consistency {
    /// Closest replica, as determined by the snitch. Can only be used for writes.
    #[display("ANY")]
    Any,
    /// At least one replica node.
    #[display("ONE")]
    One,
    /// At least two replica nodes.
    #[display("TWO")]
    Two,
    /// At least three replica nodes.
    #[display("THREE")]
    Three,
    /// A quorum of replica nodes.
    #[display("QUORUM")]
    Quorum,
    /// All replica nodes in the cluster for that partition key.
    #[display("ALL")]
    All,
    /// A quorum of replica nodes in the same data center as the coordinator node.
    #[display("LOCAL_QUORUM")]
    LocalQuorum,
    /// A quorum of replica nodes in all data centers.
    #[display("EACH_QUORUM")]
    EachQuorum,
    /// Linearizable consistency for lightweight transactions.
    #[display("SERIAL")]
    Serial,
    /// Same as SERIAL but confined to the data center.
    #[display("LOCAL_SERIAL")]
    LocalSerial,
    /// At least one replica node in the local data center.
    #[default]
    #[display("LOCAL_ONE")]
    LocalOne,
}

impl FromStr for Consistency {
    type Err = error::Error;

    /// Accepts both `LOCAL_QUORUM` and `LocalQuorum` spellings, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "").to_ascii_lowercase();
        let consistency = match normalized.as_str() {
            "any" => Consistency::Any,
            "one" => Consistency::One,
            "two" => Consistency::Two,
            "three" => Consistency::Three,
            "quorum" => Consistency::Quorum,
            "all" => Consistency::All,
            "localquorum" => Consistency::LocalQuorum,
            "eachquorum" => Consistency::EachQuorum,
            "serial" => Consistency::Serial,
            "localserial" => Consistency::LocalSerial,
            "localone" => Consistency::LocalOne,
            _ => {
                return Err(error::Error::ConfigValidation(format!(
                    "Invalid consistency provided: {s}"
                )))
            }
        };

        Ok(consistency)
    }
}

impl Consistency {
    /// Does this consistency require local dc.
    #[inline]
    pub fn is_dc_local(self) -> bool {
        matches!(
            self,
            Consistency::LocalOne | Consistency::LocalQuorum | Consistency::LocalSerial
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistency_from_str() {
        assert_eq!(
            "LOCAL_QUORUM".parse::<Consistency>().unwrap(),
            Consistency::LocalQuorum
        );
        assert_eq!(
            "LocalQuorum".parse::<Consistency>().unwrap(),
            Consistency::LocalQuorum
        );
        assert_eq!("one".parse::<Consistency>().unwrap(), Consistency::One);
        assert!("TWO_AND_A_HALF".parse::<Consistency>().is_err());
    }

    #[test]
    fn test_consistency_display_round_trips_through_from_str() {
        let consistency = Consistency::EachQuorum;
        assert_eq!(consistency.to_string(), "EACH_QUORUM");
        assert_eq!(
            consistency.to_string().parse::<Consistency>().unwrap(),
            consistency
        );
    }

    #[test]
    fn test_is_dc_local() {
        assert!(Consistency::LocalOne.is_dc_local());
        assert!(Consistency::LocalSerial.is_dc_local());
        assert!(!Consistency::Quorum.is_dc_local());
    }
}
