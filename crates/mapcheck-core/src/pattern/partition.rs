use super::ErrorPatternMatcher;
use crate::{
    PARTITION_ERROR_CAP,
    cell::Cell,
    error::MapError,
    log::{ErrorCode, ErrorLog},
    oracle::{FragmentOracle, FragmentRef},
};
use derive_more::Display;

///
/// FragmentRelationship
///
/// Coarse classification of how two fragment queries relate, as decided by
/// the oracle. `Unknown` means the oracle proved none of the other four.
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum FragmentRelationship {
    #[display("disjoint")]
    Disjoint,

    #[display("equal")]
    Equal,

    #[display("contained in the other")]
    ContainedIn,

    #[display("containing the other")]
    Contains,

    #[display("in an unknown relationship")]
    Unknown,
}

pub(super) fn relationship<O: FragmentOracle>(
    oracle: &O,
    a: FragmentRef,
    b: FragmentRef,
) -> Result<FragmentRelationship, MapError> {
    let rel = if oracle.is_equivalent_to(a, b)? {
        FragmentRelationship::Equal
    } else if oracle.is_disjoint_from(a, b)? {
        FragmentRelationship::Disjoint
    } else if oracle.is_contained_in(a, b)? {
        FragmentRelationship::ContainedIn
    } else if oracle.is_contained_in(b, a)? {
        FragmentRelationship::Contains
    } else {
        FragmentRelationship::Unknown
    };

    Ok(rel)
}

/// Every pair of fragments of one extent must relate the same way on both
/// schema sides. A mismatch means the mapping partitions the data
/// differently above and below, so round trips can invent or lose rows.
/// `found` is the matcher-wide count of partition findings; detection stops
/// at the cap.
pub(super) fn check<O: FragmentOracle>(
    matcher: &ErrorPatternMatcher<'_, O>,
    group: &[&Cell],
    log: &mut ErrorLog,
    found: &mut usize,
) -> Result<(), MapError> {
    for i in 0..group.len() {
        for j in (i + 1)..group.len() {
            if *found >= PARTITION_ERROR_CAP {
                return Ok(());
            }

            let (a, b) = (group[i], group[j]);
            let s_rel = relationship(
                matcher.oracle,
                FragmentRef::storage(a.id),
                FragmentRef::storage(b.id),
            )?;
            let c_rel = relationship(
                matcher.oracle,
                FragmentRef::conceptual(a.id),
                FragmentRef::conceptual(b.id),
            )?;
            if s_rel == c_rel {
                continue;
            }

            // Disjoint conceptual fragments over one table with no storage
            // discriminator at all: the missing condition is the root cause,
            // not the partition shape.
            if c_rel == FragmentRelationship::Disjoint
                && a.s_query.extent == b.s_query.extent
                && a.s_query.discriminators().next().is_none()
                && b.s_query.discriminators().next().is_none()
            {
                log.add_error(
                    ErrorCode::ErrorPatternConditionError,
                    format!(
                        "fragments {} and {} map disjoint conceptual data to \
                         table '{}' without a discriminating condition",
                        a.id, b.id, a.s_query.extent
                    ),
                    vec![a.id, b.id],
                    String::new(),
                );
                continue;
            }

            log.add_error(
                ErrorCode::ErrorPatternInvalidPartitionError,
                describe_mismatch(matcher, a, b, s_rel, c_rel),
                vec![a.id, b.id],
                format!("storage: {s_rel}, conceptual: {c_rel}"),
            );
            *found += 1;
        }
    }

    Ok(())
}

// Pick the most useful phrasing for a mismatch. When the oracle cannot
// decide one side, look for the usual suspects: paths linked by a
// referential constraint, or a fragment with no discriminator on a shared
// table.
fn describe_mismatch<O: FragmentOracle>(
    matcher: &ErrorPatternMatcher<'_, O>,
    a: &Cell,
    b: &Cell,
    s_rel: FragmentRelationship,
    c_rel: FragmentRelationship,
) -> String {
    let decided = s_rel != FragmentRelationship::Unknown && c_rel != FragmentRelationship::Unknown;
    if decided {
        return format!(
            "fragments {} and {} are {s_rel} on the storage side but {c_rel} \
             on the conceptual side",
            a.id, b.id
        );
    }

    if linked_by_ref_constraint(matcher, a, b) {
        return format!(
            "fragments {} and {} overlap through a referential constraint: \
             {s_rel} on the storage side, {c_rel} on the conceptual side",
            a.id, b.id
        );
    }

    if a.s_query.extent == b.s_query.extent
        && (a.s_query.discriminators().next().is_none()
            || b.s_query.discriminators().next().is_none())
    {
        return format!(
            "fragments {} and {} share table '{}' but one of them carries no \
             discriminating condition",
            a.id, b.id, a.s_query.extent
        );
    }

    format!(
        "fragments {} and {} are {s_rel} on the storage side but {c_rel} on \
         the conceptual side",
        a.id, b.id
    )
}

fn linked_by_ref_constraint<O: FragmentOracle>(
    matcher: &ErrorPatternMatcher<'_, O>,
    a: &Cell,
    b: &Cell,
) -> bool {
    a.c_query.slots.iter().any(|a_slot| {
        b.c_query.slots.iter().any(|b_slot| {
            a_slot
                .path
                .equivalent_via_ref_constraint(&b_slot.path, matcher.c_schema)
        })
    })
}
