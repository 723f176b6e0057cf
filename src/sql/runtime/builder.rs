use super::executor::{
    Executor, HashJoinExecutor, NestedLoopJoinExecutor, ProjectExecutor, ScanExecutor,
};
use crate::{
    core::{ErrorKind, SQLError},
    sql::planner::{JoinStrategy, Plan},
};

/// Turns a query plan into an executor tree. Nothing is opened here.
#[derive(Default)]
pub struct ExecutorBuilder;

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, plan: &Plan) -> Result<Executor, SQLError> {
        match plan {
            Plan::Scan {
                relation,
                predicates,
            } => Ok(Executor::Scan(ScanExecutor::new(
                relation.clone(),
                predicates.clone(),
            ))),

            Plan::Join {
                strategy,
                predicate,
                left,
                right,
            } => {
                let left = Box::new(self.build(left)?);
                let right = Box::new(self.build(right)?);

                match strategy {
                    JoinStrategy::NestedLoop => {
                        if !right.supports_reinit() {
                            return Err(SQLError::new(
                                ErrorKind::RuntimeError,
                                format!(
                                    "right input of nested-loop join on {} cannot be restarted",
                                    predicate
                                ),
                            ));
                        }
                        Ok(Executor::NestedLoopJoin(NestedLoopJoinExecutor::new(
                            left,
                            right,
                            predicate.clone(),
                        )))
                    }
                    JoinStrategy::Hash => Ok(Executor::HashJoin(HashJoinExecutor::new(
                        left,
                        right,
                        predicate.clone(),
                    ))),
                }
            }

            Plan::Project { outputs, input } => Ok(Executor::Project(ProjectExecutor::new(
                Box::new(self.build(input)?),
                outputs.clone(),
            ))),

            Plan::DDL(_) | Plan::DML(_) | Plan::Explain(_) => Err(SQLError::new(
                ErrorKind::RuntimeError,
                format!("{} is not a query plan", plan),
            )),
        }
    }
}
