//! Properties of left-deep join planning over random query graphs.

use proptest::{prelude::*, sample::Index};
use spjql::{
    core::{ErrorKind, SQLError},
    sql::{
        planner::{binder::Binder, Plan},
        session::context::{Config, QueryContext},
        statement::{AttributeName, Comparison, SelectRequest},
        Session,
    },
    storage::MemoryStorage,
};

fn session_with_relations(n: usize) -> Session {
    let ctx =
        QueryContext::with_storage(Box::new(MemoryStorage::new()), Config::default()).unwrap();
    let mut session = Session::new(ctx);
    for i in 0..n {
        session
            .execute(&format!("CREATE TABLE r{} (k INT PRIMARY KEY, v INT)", i))
            .unwrap();
    }
    session
}

fn request(n: usize, edges: &[(usize, usize)]) -> SelectRequest {
    SelectRequest {
        from: (0..n).map(|i| format!("r{}", i)).collect(),
        predicates: edges
            .iter()
            .map(|(a, b)| {
                Comparison::attributes(
                    AttributeName::qualified(format!("r{}", a), "k"),
                    AttributeName::qualified(format!("r{}", b), "v"),
                )
            })
            .collect(),
        ..SelectRequest::default()
    }
}

fn bind(n: usize, edges: &[(usize, usize)]) -> Result<Plan, SQLError> {
    let session = session_with_relations(n);
    let result = Binder::new(session.context()).bind_select(&request(n, edges));
    result
}

fn is_left_deep(plan: &Plan) -> bool {
    match plan {
        Plan::Project { input, .. } => is_left_deep(input),
        Plan::Join { left, right, .. } => {
            matches!(right.as_ref(), Plan::Scan { .. }) && is_left_deep(left)
        }
        Plan::Scan { .. } => true,
        _ => false,
    }
}

/// A random spanning tree over `n` relations: edges in random order, each
/// with a random orientation.
fn tree() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2usize..8)
        .prop_flat_map(|n| {
            let parents = (1..n).map(|i| 0..i).collect::<Vec<_>>();
            (Just(n), parents, prop::collection::vec(any::<bool>(), n - 1))
        })
        .prop_flat_map(|(n, parents, flips)| {
            let edges = parents
                .iter()
                .enumerate()
                .map(|(i, parent)| {
                    let child = i + 1;
                    if flips[i] {
                        (child, *parent)
                    } else {
                        (*parent, child)
                    }
                })
                .collect::<Vec<_>>();
            (Just(n), Just(edges).prop_shuffle())
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn tree_shaped_queries_always_plan((n, edges) in tree()) {
        let plan = bind(n, &edges).unwrap();
        prop_assert!(is_left_deep(&plan));

        let mut relations = plan.relations();
        relations.sort_unstable();
        let mut expected = (0..n).map(|i| format!("r{}", i)).collect::<Vec<_>>();
        expected.sort_unstable();
        prop_assert_eq!(relations, expected);
    }

    #[test]
    fn an_extra_predicate_closes_a_cycle(
        (n, mut edges) in tree(),
        a in any::<Index>(),
        b in any::<Index>(),
        position in any::<Index>(),
    ) {
        let from = a.index(n);
        let mut to = b.index(n - 1);
        if to >= from {
            to += 1;
        }
        edges.insert(position.index(edges.len() + 1), (from, to));

        let err = bind(n, &edges).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::CycleDetected);
    }

    #[test]
    fn a_missing_predicate_needs_a_cartesian_product(
        (n, mut edges) in tree(),
        removed in any::<Index>(),
    ) {
        edges.remove(removed.index(edges.len()));

        let err = bind(n, &edges).unwrap_err();
        prop_assert_eq!(err.kind, ErrorKind::CartesianProduct);
    }
}
