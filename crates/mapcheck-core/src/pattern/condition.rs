use super::ErrorPatternMatcher;
use crate::{
    cell::{Cell, Condition, ConditionValue},
    error::MapError,
    log::{ErrorCode, ErrorLog},
    oracle::{FragmentOracle, FragmentRef},
};
use mapcheck_schema::path::MemberPath;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

///
/// DiscriminatorValue
///
/// The constant a discriminating condition pins a member to.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum DiscriminatorValue {
    Type(String),
    Value(ConditionValue),
}

///
/// ConditionSignature
///
/// Canonical form of a fragment's storage-side discriminators: member paths
/// paired with their pinned constants, sorted. Two fragments with the same
/// signature select the same rows unless the oracle says otherwise.
///

#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
struct ConditionSignature(Vec<(MemberPath, DiscriminatorValue)>);

impl ConditionSignature {
    fn of(cell: &Cell) -> Self {
        let mut entries: Vec<_> = cell
            .s_query
            .conditions
            .iter()
            .filter_map(|condition| match condition {
                Condition::MemberIsType { path, type_name } => {
                    Some((path.clone(), DiscriminatorValue::Type(type_name.clone())))
                }
                Condition::MemberEquals { path, value } => {
                    Some((path.clone(), DiscriminatorValue::Value(value.clone())))
                }
                Condition::MemberIsNull { .. } | Condition::MemberIsNotNull { .. } => None,
            })
            .collect();
        entries.sort();

        Self(entries)
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Two rules over the fragments of one conceptual extent:
///
/// (i)  a member used as a discriminator by one fragment must not be
///      projected as data by a sibling fragment, unless both fragments carry
///      identical storage conditions or the projecting side pins the member
///      with a not-null guard;
/// (ii) two fragments must not pin identical discriminator constants unless
///      the oracle proves their storage fragments equivalent.
pub(super) fn check<O: FragmentOracle>(
    matcher: &ErrorPatternMatcher<'_, O>,
    group: &[&Cell],
    log: &mut ErrorLog,
) -> Result<(), MapError> {
    check_projected_discriminators(group, log);
    check_duplicate_signatures(matcher, group, log)?;

    Ok(())
}

fn check_projected_discriminators(group: &[&Cell], log: &mut ErrorLog) {
    for a in group {
        for condition in a.s_query.discriminators() {
            let path = condition.path();

            for b in group {
                if a.id == b.id || !b.s_query.projects(path) {
                    continue;
                }

                let mut a_conditions = a.s_query.conditions.clone();
                let mut b_conditions = b.s_query.conditions.clone();
                a_conditions.sort();
                b_conditions.sort();
                if a_conditions == b_conditions {
                    continue;
                }
                if a.s_query.has_not_null_on(path) || b.s_query.has_not_null_on(path) {
                    continue;
                }

                log.add_error(
                    ErrorCode::ErrorPatternConditionError,
                    format!(
                        "member '{path}' discriminates fragment {} but is \
                         projected as data by fragment {}",
                        a.id, b.id
                    ),
                    vec![a.id, b.id],
                    String::new(),
                );
            }
        }
    }
}

fn check_duplicate_signatures<O: FragmentOracle>(
    matcher: &ErrorPatternMatcher<'_, O>,
    group: &[&Cell],
    log: &mut ErrorLog,
) -> Result<(), MapError> {
    let mut first: BTreeMap<ConditionSignature, &Cell> = BTreeMap::new();

    for cell in group {
        let signature = ConditionSignature::of(cell);
        if signature.is_empty() {
            continue;
        }

        match first.entry(signature) {
            Entry::Vacant(entry) => {
                entry.insert(*cell);
            }
            Entry::Occupied(entry) => {
                let other = *entry.get();
                if matcher.oracle.is_equivalent_to(
                    FragmentRef::storage(other.id),
                    FragmentRef::storage(cell.id),
                )? {
                    continue;
                }

                log.add_error(
                    ErrorCode::ErrorPatternConditionError,
                    format!(
                        "fragments {} and {} pin identical discriminator \
                         values but select different rows",
                        other.id, cell.id
                    ),
                    vec![other.id, cell.id],
                    String::new(),
                );
            }
        }
    }

    Ok(())
}
