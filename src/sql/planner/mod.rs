use std::{fmt::Display, sync::Arc};

use super::{
    expression::{Predicate, Variable},
    runtime::{DDLJob, DMLJob},
};
use crate::catalog::defs::BaseRelationSchema;

pub mod binder;
pub mod join_order;
pub mod scope;

/// How a join operator pairs its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStrategy {
    /// Rescan the right input for every left row. Always available.
    NestedLoop,
    /// Build a hash table over the right input, probe with left rows.
    Hash,
}

impl Display for JoinStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinStrategy::NestedLoop => write!(f, "NestedLoopJoin"),
            JoinStrategy::Hash => write!(f, "HashJoin"),
        }
    }
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug)]
pub enum Plan {
    /// Full scan of a relation, keeping rows that satisfy every predicate.
    Scan {
        relation: Arc<BaseRelationSchema>,
        predicates: Vec<Predicate>,
    },
    /// The predicate's left operand refers to `left`, its right operand to
    /// `right`. Right children of a left-deep tree are always scans.
    Join {
        strategy: JoinStrategy,
        predicate: Predicate,
        left: Box<Plan>,
        right: Box<Plan>,
    },
    Project {
        outputs: Vec<Variable>,
        input: Box<Plan>,
    },

    /// Data definition language (DDL)
    DDL(DDLJob),
    DML(DMLJob),
    Explain(String),
}

impl Plan {
    /// Names of the scanned relations, left to right.
    pub fn relations(&self) -> Vec<&str> {
        match self {
            Plan::Scan { relation, .. } => vec![relation.name()],
            Plan::Join { left, right, .. } => {
                let mut relations = left.relations();
                relations.extend(right.relations());
                relations
            }
            Plan::Project { input, .. } => input.relations(),
            Plan::DDL(_) | Plan::DML(_) | Plan::Explain(_) => vec![],
        }
    }

    /// Does executing this plan produce rows?
    pub fn is_query(&self) -> bool {
        !matches!(
            self,
            Plan::DML(_) | Plan::DDL(DDLJob::CreateTable(_)) | Plan::DDL(DDLJob::DropTable(_))
        )
    }
}

impl Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        indent_format_plan(f, self, 0)
    }
}

const DEFAULT_FORMAT_INDENT_SIZE: usize = 4;

fn join_display<T: Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

fn indent_format_plan(f: &mut std::fmt::Formatter, plan: &Plan, indent: usize) -> std::fmt::Result {
    let indent_str = " ".repeat(indent);
    match plan {
        Plan::Scan {
            relation,
            predicates,
        } => {
            write!(f, "{}Scan: {}", indent_str, relation.name())?;
            if !predicates.is_empty() {
                write!(f, " filter: {}", join_display(predicates, " AND "))?;
            }
            Ok(())
        }

        Plan::Join {
            strategy,
            predicate,
            left,
            right,
        } => {
            write!(f, "{}{}: {}", indent_str, strategy, predicate)?;
            writeln!(f)?;

            indent_format_plan(f, left, indent + DEFAULT_FORMAT_INDENT_SIZE)?;
            writeln!(f)?;

            indent_format_plan(f, right, indent + DEFAULT_FORMAT_INDENT_SIZE)
        }

        Plan::Project { outputs, input } => {
            write!(f, "{}Project: {}", indent_str, join_display(outputs, ", "))?;
            writeln!(f)?;

            indent_format_plan(f, input, indent + DEFAULT_FORMAT_INDENT_SIZE)
        }

        Plan::DDL(job) => write!(
            f,
            "{}{}",
            indent_str,
            match job {
                DDLJob::CreateTable(_) => "CreateTable",
                DDLJob::DropTable(_) => "DropTable",
                DDLJob::ShowTables => "ShowTables",
            }
        ),
        Plan::DML(DMLJob::Insert(relation, tuples)) => write!(
            f,
            "{}Insert: {} ({} rows)",
            indent_str,
            relation.name(),
            tuples.len()
        ),
        Plan::Explain(_) => write!(f, "{}Explain", indent_str),
    }
}
