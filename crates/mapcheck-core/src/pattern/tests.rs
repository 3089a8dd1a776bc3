use super::*;
use crate::{
    cell::CellQuery,
    test_support::{FixtureOracle, fixtures},
};

fn run(c_schema: &Schema, cells: &[Cell], oracle: &FixtureOracle) -> ErrorLog {
    let mut log = ErrorLog::new();
    ErrorPatternMatcher::new(c_schema, cells, oracle)
        .run(&mut log)
        .unwrap();

    log
}

/// Employees(eid) <-> TPerson(pid): deliberately reuses the person table.
fn employee_over_person_table(id: u32) -> Cell {
    fixtures::cell(
        id,
        CellQuery::new("Employees", [MemberPath::new("Employees", ["eid"])], []),
        CellQuery::new("TPerson", [MemberPath::new("TPerson", ["pid"])], []),
    )
}

#[test]
fn table_shared_by_two_conceptual_sets_is_a_split() {
    let c_schema = fixtures::conceptual_schema();
    let cells = [fixtures::person_cell(0, &[]), employee_over_person_table(1)];

    let log = run(&c_schema, &cells, &FixtureOracle::new());
    assert_eq!(log.len(), 1);
    assert_eq!(log.count_of(ErrorCode::ErrorPatternSplittingError), 1);
}

#[test]
fn equivalent_conceptual_fragments_may_share_a_table() {
    let c_schema = fixtures::conceptual_schema();
    let cells = [fixtures::person_cell(0, &[]), employee_over_person_table(1)];
    let oracle = FixtureOracle::new().equivalent(
        FragmentRef::conceptual(CellId(0)),
        FragmentRef::conceptual(CellId(1)),
    );

    let log = run(&c_schema, &cells, &oracle);
    assert_eq!(log.count_of(ErrorCode::ErrorPatternSplittingError), 0);
}

#[test]
fn unreferenced_concrete_subtype_is_a_missing_mapping() {
    let c_schema = fixtures::conceptual_schema();
    let cells = [fixtures::person_cell(
        0,
        &[Condition::is_type(MemberPath::root("TPerson"), "Person")],
    )];

    let log = run(&c_schema, &cells, &FixtureOracle::new());
    assert_eq!(log.len(), 1);
    assert_eq!(log.count_of(ErrorCode::ErrorPatternMissingMappingError), 1);
    assert!(log[0].message.contains("Customer"));
}

#[test]
fn unconditional_fragment_covers_the_whole_extent() {
    let c_schema = fixtures::conceptual_schema();
    let cells = [
        fixtures::person_cell(0, &[Condition::is_type(MemberPath::root("TPerson"), "Person")]),
        fixtures::person_cell(1, &[]),
    ];

    let log = run(&c_schema, &cells, &FixtureOracle::new());
    assert!(log.is_empty(), "unexpected findings: {log:?}");
}

#[test]
fn discriminator_projected_as_data_by_a_sibling_is_reported() {
    let c_schema = fixtures::conceptual_schema();
    let discriminated = fixtures::person_cell(0, &[fixtures::text_condition("TPerson", "name", "A")]);

    // Sibling projects TPerson.name as plain data.
    let cells = [discriminated.clone(), fixtures::person_cell(1, &[])];
    let log = run(&c_schema, &cells, &FixtureOracle::new());
    assert_eq!(log.len(), 1);
    assert_eq!(log.count_of(ErrorCode::ErrorPatternConditionError), 1);

    // A not-null guard on the projecting side makes the overlap explicit.
    let guarded = fixtures::person_cell(
        1,
        &[Condition::MemberIsNotNull {
            path: MemberPath::new("TPerson", ["name"]),
        }],
    );
    let log = run(&c_schema, &[discriminated.clone(), guarded], &FixtureOracle::new());
    assert_eq!(log.count_of(ErrorCode::ErrorPatternConditionError), 0);

    // Identical conditions on both fragments are fine as well, provided the
    // duplicate selection is proved intentional.
    let twin = fixtures::person_cell(1, &[fixtures::text_condition("TPerson", "name", "A")]);
    let oracle = FixtureOracle::new()
        .equivalent(
            FragmentRef::storage(CellId(0)),
            FragmentRef::storage(CellId(1)),
        )
        .equivalent(
            FragmentRef::conceptual(CellId(0)),
            FragmentRef::conceptual(CellId(1)),
        );
    let log = run(&c_schema, &[discriminated, twin], &oracle);
    assert_eq!(log.count_of(ErrorCode::ErrorPatternConditionError), 0);
}

#[test]
fn duplicated_discriminator_values_need_an_equivalence_proof() {
    let c_schema = fixtures::conceptual_schema();
    let cells = [
        fixtures::person_pid_cell(0, &[fixtures::text_condition("TPerson", "name", "A")]),
        fixtures::person_pid_cell(1, &[fixtures::text_condition("TPerson", "name", "A")]),
    ];

    let log = run(&c_schema, &cells, &FixtureOracle::new());
    assert_eq!(log.len(), 1);
    assert_eq!(log.count_of(ErrorCode::ErrorPatternConditionError), 1);

    // Proved equivalent on both sides: the duplicate is intentional.
    let oracle = FixtureOracle::new()
        .equivalent(
            FragmentRef::storage(CellId(0)),
            FragmentRef::storage(CellId(1)),
        )
        .equivalent(
            FragmentRef::conceptual(CellId(0)),
            FragmentRef::conceptual(CellId(1)),
        );
    let log = run(&c_schema, &cells, &oracle);
    assert!(log.is_empty(), "unexpected findings: {log:?}");
}

#[test]
fn storage_split_of_equivalent_conceptual_data_is_a_partition_mismatch() {
    let c_schema = fixtures::conceptual_schema();
    let cells = [
        fixtures::person_pid_cell(0, &[fixtures::text_condition("TPerson", "name", "A")]),
        fixtures::person_pid_cell(1, &[fixtures::text_condition("TPerson", "name", "B")]),
    ];
    let oracle = FixtureOracle::new()
        .disjoint(
            FragmentRef::storage(CellId(0)),
            FragmentRef::storage(CellId(1)),
        )
        .equivalent(
            FragmentRef::conceptual(CellId(0)),
            FragmentRef::conceptual(CellId(1)),
        );

    let log = run(&c_schema, &cells, &oracle);
    assert_eq!(log.len(), 1);
    assert_eq!(
        log.count_of(ErrorCode::ErrorPatternInvalidPartitionError),
        1
    );
    assert!(log[0].debug_info.contains("disjoint"));
}

#[test]
fn disjoint_fragments_on_one_table_without_conditions_blame_the_condition() {
    let c_schema = fixtures::conceptual_schema();
    let cells = [
        fixtures::person_pid_cell(0, &[]),
        fixtures::person_cell(1, &[]),
    ];
    let oracle = FixtureOracle::new().disjoint(
        FragmentRef::conceptual(CellId(0)),
        FragmentRef::conceptual(CellId(1)),
    );

    let log = run(&c_schema, &cells, &oracle);
    assert_eq!(log.count_of(ErrorCode::ErrorPatternConditionError), 1);
    assert_eq!(
        log.count_of(ErrorCode::ErrorPatternInvalidPartitionError),
        0
    );
}

#[test]
fn undecided_overlap_through_a_referential_constraint_is_named() {
    let c_schema = fixtures::conceptual_schema();
    let cells = [
        fixtures::address_cell(0),
        // Projects the principal's pid instead of the dependent's.
        fixtures::cell(
            1,
            CellQuery::new(
                "Addresses",
                [
                    MemberPath::new("Addresses", ["aid"]),
                    MemberPath::new("Persons", ["pid"]),
                ],
                [],
            ),
            CellQuery::new(
                "TAddress",
                [
                    MemberPath::new("TAddress", ["aid"]),
                    MemberPath::new("TAddress", ["pid"]),
                ],
                [],
            ),
        ),
    ];
    let oracle = FixtureOracle::new().disjoint(
        FragmentRef::storage(CellId(0)),
        FragmentRef::storage(CellId(1)),
    );

    let log = run(&c_schema, &cells, &oracle);
    assert_eq!(
        log.count_of(ErrorCode::ErrorPatternInvalidPartitionError),
        1
    );
    assert!(log[0].message.contains("referential constraint"));
}

#[test]
fn partition_findings_are_capped() {
    let c_schema = fixtures::conceptual_schema();
    let cells: Vec<Cell> = (0..6)
        .map(|i| {
            fixtures::person_pid_cell(
                i,
                &[fixtures::text_condition("TPerson", "name", &i.to_string())],
            )
        })
        .collect();

    let mut oracle = FixtureOracle::new();
    for i in 0..6u32 {
        for j in (i + 1)..6 {
            oracle = oracle
                .disjoint(
                    FragmentRef::storage(CellId(i)),
                    FragmentRef::storage(CellId(j)),
                )
                .equivalent(
                    FragmentRef::conceptual(CellId(i)),
                    FragmentRef::conceptual(CellId(j)),
                );
        }
    }

    let log = run(&c_schema, &cells, &oracle);
    assert_eq!(
        log.count_of(ErrorCode::ErrorPatternInvalidPartitionError),
        crate::PARTITION_ERROR_CAP
    );
}

mod properties {
    use super::*;
    use crate::pattern::{FragmentRelationship, partition};
    use proptest::prelude::*;

    fn fragment() -> impl Strategy<Value = FragmentRef> {
        (0u32..4).prop_map(|i| FragmentRef::storage(CellId(i)))
    }

    fn pair_set() -> impl Strategy<Value = Vec<(FragmentRef, FragmentRef)>> {
        proptest::collection::vec((fragment(), fragment()), 0..8)
    }

    proptest! {
        // Containment pairs are kept one-directional; mutual containment
        // would be equivalence and is modelled as such.
        #[test]
        fn relationship_mirrors_across_argument_order(
            contained in pair_set(),
            disjoint in pair_set(),
            equivalent in pair_set(),
            a in fragment(),
            b in fragment(),
        ) {
            let mut oracle = FixtureOracle::new();
            for (x, y) in contained {
                if x < y {
                    oracle = oracle.contained(x, y);
                }
            }
            for (x, y) in disjoint {
                if x != y {
                    oracle = oracle.disjoint(x, y);
                }
            }
            for (x, y) in equivalent {
                oracle = oracle.equivalent(x, y);
            }

            let ab = partition::relationship(&oracle, a, b).unwrap();
            let ba = partition::relationship(&oracle, b, a).unwrap();
            let mirrored = match ab {
                FragmentRelationship::ContainedIn => FragmentRelationship::Contains,
                FragmentRelationship::Contains => FragmentRelationship::ContainedIn,
                other => other,
            };
            prop_assert_eq!(ba, mirrored);
        }
    }
}
