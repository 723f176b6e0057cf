//! Left-deep join tree construction.
//!
//! Join predicates are consumed greedily: the first one seeds the tree with
//! a join of two scans, and each following step picks the first remaining
//! predicate that connects exactly one new relation to the tree. The tree
//! only grows on the left, so every right child is a scan that can be
//! restarted cheaply.

use std::sync::Arc;

use log::debug;

use super::{JoinStrategy, Plan};
use crate::{
    catalog::defs::BaseRelationSchema,
    core::{ErrorKind, SQLError},
    sql::{
        expression::{Predicate, PredicateKind},
        session::context::QueryContext,
    },
};

/// Build the join tree over `relations` (FROM order) from the bound WHERE
/// predicates. Scan predicates are pushed into the scan of their relation.
pub fn build_join_tree(
    ctx: &QueryContext,
    relations: &[Arc<BaseRelationSchema>],
    predicates: Vec<Predicate>,
) -> Result<Plan, SQLError> {
    let (mut join_predicates, scan_predicates): (Vec<_>, Vec<_>) = predicates
        .into_iter()
        .partition(Predicate::is_join_predicate);

    if let Some(p) = scan_predicates
        .iter()
        .find(|p| p.kind() == PredicateKind::Constant)
    {
        return Err(SQLError::new(
            ErrorKind::MalformedQuery,
            format!("predicate {} references no attribute", p),
        ));
    }

    let expected = match relations.len() {
        0 => {
            return Err(SQLError::new(
                ErrorKind::MalformedQuery,
                "query references no relation",
            ))
        }
        n => n - 1,
    };

    if join_predicates.len() < expected {
        return Err(SQLError::new(
            ErrorKind::CartesianProduct,
            format!(
                "{} relations need {} join predicates to be connected, found {}",
                relations.len(),
                expected,
                join_predicates.len()
            ),
        ));
    }
    if join_predicates.len() > expected {
        return Err(SQLError::new(
            ErrorKind::CycleDetected,
            format!(
                "{} join predicates over {} relations form a cycle",
                join_predicates.len(),
                relations.len()
            ),
        ));
    }

    let scan = |relation: &Arc<BaseRelationSchema>| Plan::Scan {
        relation: relation.clone(),
        predicates: scan_predicates
            .iter()
            .filter(|p| p.is_scan_predicate_for(relation))
            .cloned()
            .collect(),
    };

    if join_predicates.is_empty() {
        return Ok(scan(&relations[0]));
    }

    let first = join_predicates.remove(0);
    let (left, right) = join_relations(&first)?;
    let mut incorporated = vec![left.clone(), right.clone()];
    let mut plan = Plan::Join {
        strategy: choose_strategy(ctx, &first, &right)?,
        predicate: first,
        left: Box::new(scan(&left)),
        right: Box::new(scan(&right)),
    };

    while !join_predicates.is_empty() {
        let mut candidate = None;
        for (index, predicate) in join_predicates.iter().enumerate() {
            let (left, right) = join_relations(predicate)?;
            let left_in = incorporated.contains(&left);
            let right_in = incorporated.contains(&right);

            if left_in && right_in {
                return Err(SQLError::new(
                    ErrorKind::CycleDetected,
                    format!("join predicate {} closes a cycle", predicate),
                ));
            }
            if left_in || right_in {
                candidate = Some((index, left_in));
                break;
            }
        }

        let (index, left_in) = candidate.ok_or_else(|| {
            SQLError::new(
                ErrorKind::CartesianProduct,
                format!(
                    "no join predicate connects {} to the rest of the query",
                    join_predicates
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
        })?;

        let predicate = join_predicates.remove(index);
        // Left operand must read from the tree built so far.
        let predicate = if left_in {
            predicate
        } else {
            predicate.swapped()
        };

        let (_, new_relation) = join_relations(&predicate)?;
        incorporated.push(new_relation.clone());
        plan = Plan::Join {
            strategy: choose_strategy(ctx, &predicate, &new_relation)?,
            predicate,
            left: Box::new(plan),
            right: Box::new(scan(&new_relation)),
        };
    }

    Ok(plan)
}

fn join_relations(
    predicate: &Predicate,
) -> Result<(Arc<BaseRelationSchema>, Arc<BaseRelationSchema>), SQLError> {
    match predicate.kind() {
        PredicateKind::Join { left, right } => Ok((left.clone(), right.clone())),
        _ => Err(SQLError::new(
            ErrorKind::RuntimeError,
            format!("{} is not a join predicate", predicate),
        )),
    }
}

/// Hash join only when enabled and the right relation is small enough to
/// build on.
fn choose_strategy(
    ctx: &QueryContext,
    predicate: &Predicate,
    right: &BaseRelationSchema,
) -> Result<JoinStrategy, SQLError> {
    if !ctx.config.enable_hash_join {
        return Ok(JoinStrategy::NestedLoop);
    }

    let rows = ctx.storage.open_partition(right.name(), false)?.len()?;
    let strategy = if rows <= ctx.config.hash_join_max_build_rows {
        JoinStrategy::Hash
    } else {
        JoinStrategy::NestedLoop
    };
    debug!(
        "Join on {} uses {} ({} rows on the right)",
        predicate, strategy, rows
    );

    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::defs::Attribute,
        core::{Datum, Type},
        sql::{
            expression::{BoundAttribute, Variable},
            session::context::Config,
        },
        storage::MemoryStorage,
    };

    fn context(config: Config) -> QueryContext {
        QueryContext::with_storage(Box::new(MemoryStorage::new()), config).unwrap()
    }

    fn relation(name: &str) -> Arc<BaseRelationSchema> {
        Arc::new(
            BaseRelationSchema::new(
                name,
                vec![Attribute::new("k", Type::Int), Attribute::new("v", Type::Int)],
                Some(0),
            )
            .unwrap(),
        )
    }

    fn attr(relation: &Arc<BaseRelationSchema>, position: usize) -> Variable {
        Variable::Attribute(BoundAttribute::new(relation.clone(), position))
    }

    fn eq(left: &Arc<BaseRelationSchema>, right: &Arc<BaseRelationSchema>) -> Predicate {
        Predicate::new(attr(left, 0), attr(right, 1))
    }

    fn join_predicates(plan: &Plan) -> Vec<String> {
        match plan {
            Plan::Join {
                predicate, left, ..
            } => {
                let mut predicates = join_predicates(left);
                predicates.push(predicate.to_string());
                predicates
            }
            _ => vec![],
        }
    }

    #[test]
    fn single_relation_is_a_scan_with_its_predicates() {
        let ctx = context(Config::default());
        let r = relation("r");
        let filter = Predicate::new(attr(&r, 1), Variable::Constant(Datum::Int(3)));

        let plan = build_join_tree(&ctx, &[r.clone()], vec![filter.clone()]).unwrap();
        match plan {
            Plan::Scan {
                relation,
                predicates,
            } => {
                assert_eq!(relation, r);
                assert_eq!(predicates, vec![filter]);
            }
            other => panic!("unexpected plan {}", other),
        }
    }

    #[test]
    fn greedy_order_and_orientation() {
        let ctx = context(Config::default());
        let (r, s, t, u) = (relation("r"), relation("s"), relation("t"), relation("u"));

        // u = t is not connected until t joins, and t's predicate names s on
        // the right, so it has to be flipped.
        let plan = build_join_tree(
            &ctx,
            &[r.clone(), s.clone(), t.clone(), u.clone()],
            vec![eq(&r, &s), eq(&u, &t), eq(&t, &s)],
        )
        .unwrap();

        assert_eq!(plan.relations(), vec!["r", "s", "t", "u"]);
        assert_eq!(
            join_predicates(&plan),
            vec!["r.k = s.v", "s.v = t.k", "t.v = u.k"]
        );
    }

    #[test]
    fn first_eligible_predicate_wins() {
        let ctx = context(Config::default());
        let (r, s, t, u) = (relation("r"), relation("s"), relation("t"), relation("u"));

        let plan = build_join_tree(
            &ctx,
            &[r.clone(), s.clone(), t.clone(), u.clone()],
            vec![eq(&r, &s), eq(&s, &u), eq(&r, &t)],
        )
        .unwrap();
        assert_eq!(plan.relations(), vec!["r", "s", "u", "t"]);
    }

    #[test]
    fn scan_predicates_are_pushed_to_their_relation() {
        let ctx = context(Config::default());
        let (r, s) = (relation("r"), relation("s"));
        let filter = Predicate::new(attr(&s, 1), Variable::Constant(Datum::Int(3)));

        let plan = build_join_tree(&ctx, &[r.clone(), s.clone()], vec![filter, eq(&r, &s)]).unwrap();
        assert_eq!(
            plan.to_string(),
            "NestedLoopJoin: r.k = s.v\n    Scan: r\n    Scan: s filter: s.v = 3"
        );
    }

    #[test]
    fn cycles_are_rejected() {
        let ctx = context(Config::default());
        let (r, s, t, u) = (relation("r"), relation("s"), relation("t"), relation("u"));

        let err = build_join_tree(
            &ctx,
            &[r.clone(), s.clone(), t.clone()],
            vec![eq(&r, &s), eq(&s, &t), eq(&t, &r)],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::CycleDetected);

        // Right count, but u is left out because r, s, t close a cycle.
        let err = build_join_tree(
            &ctx,
            &[r.clone(), s.clone(), t.clone(), u],
            vec![eq(&r, &s), eq(&s, &t), eq(&t, &r)],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::CycleDetected);
    }

    #[test]
    fn disconnected_queries_are_rejected() {
        let ctx = context(Config::default());
        let (r, s, t, u) = (relation("r"), relation("s"), relation("t"), relation("u"));

        let err = build_join_tree(&ctx, &[r.clone(), s.clone()], vec![]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CartesianProduct);

        let err = build_join_tree(
            &ctx,
            &[r.clone(), s.clone(), t.clone(), u.clone()],
            vec![eq(&r, &s), eq(&t, &u), eq(&u, &t)],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::CartesianProduct);
    }

    #[test]
    fn constant_predicates_are_malformed() {
        let ctx = context(Config::default());
        let constant = Predicate::new(
            Variable::Constant(Datum::Int(1)),
            Variable::Constant(Datum::Int(2)),
        );
        let err = build_join_tree(&ctx, &[relation("r")], vec![constant]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedQuery);
    }

    #[test]
    fn hash_join_needs_config_and_a_small_build_side() {
        let (r, s) = (relation("r"), relation("s"));
        let config = Config {
            enable_hash_join: true,
            hash_join_max_build_rows: 2,
            ..Config::default()
        };
        let ctx = context(config);
        let partition = ctx.storage.open_partition("s", true).unwrap();
        partition.put(b"1", b"").unwrap();

        let strategy_of = |ctx: &QueryContext| {
            match build_join_tree(ctx, &[r.clone(), s.clone()], vec![eq(&r, &s)]).unwrap() {
                Plan::Join { strategy, .. } => strategy,
                other => panic!("unexpected plan {}", other),
            }
        };
        assert_eq!(strategy_of(&ctx), JoinStrategy::Hash);

        partition.put(b"2", b"").unwrap();
        partition.put(b"3", b"").unwrap();
        assert_eq!(strategy_of(&ctx), JoinStrategy::NestedLoop);

        let ctx = context(Config::default());
        ctx.storage.open_partition("s", true).unwrap();
        assert_eq!(strategy_of(&ctx), JoinStrategy::NestedLoop);
    }
}
