pub mod builder;
mod ddl;
mod dml;
pub mod executor;

pub use ddl::*;
pub use dml::*;

use log::error;

use self::{builder::ExecutorBuilder, executor::Executor};
use super::{planner::Plan, session::context::QueryContext};
use crate::core::{Datum, ErrorKind, ProjectedTuple, Row, SQLError};

#[derive(Debug, Default)]
pub struct ExecutionResult {
    pub columns: Vec<String>,
    pub rows: Vec<ProjectedTuple>,
    pub affected_rows: usize,
}

pub fn execute_plan(ctx: &mut QueryContext, plan: &Plan) -> Result<ExecutionResult, SQLError> {
    match plan {
        Plan::DDL(job) => Ok(ExecutionResult {
            columns: match job {
                DDLJob::ShowTables => vec!["relation".to_string()],
                DDLJob::CreateTable(_) | DDLJob::DropTable(_) => vec![],
            },
            rows: execute_ddl(ctx, job)?,
            affected_rows: 0,
        }),
        Plan::DML(job) => Ok(ExecutionResult {
            affected_rows: execute_dml(ctx, job)?,
            ..Default::default()
        }),
        Plan::Explain(text) => Ok(ExecutionResult {
            columns: vec!["plan".to_string()],
            rows: text
                .lines()
                .map(|line| ProjectedTuple::new(vec![Datum::String(line.to_string())]))
                .collect(),
            affected_rows: 0,
        }),
        Plan::Scan { .. } | Plan::Join { .. } | Plan::Project { .. } => run_query(ctx, plan),
    }
}

/// Run a query plan to exhaustion and collect its projected rows.
pub fn execute_query(ctx: &QueryContext, plan: &Plan) -> Result<Vec<ProjectedTuple>, SQLError> {
    Ok(run_query(ctx, plan)?.rows)
}

fn run_query(ctx: &QueryContext, plan: &Plan) -> Result<ExecutionResult, SQLError> {
    let executor = ExecutorBuilder::new().build(plan)?;
    let columns = match &executor {
        Executor::Project(project) => project
            .output_schema()
            .attributes()
            .iter()
            .map(|attr| attr.name.clone())
            .collect(),
        _ => {
            return Err(SQLError::new(
                ErrorKind::RuntimeError,
                format!("query plan does not end in a projection:\n{}", plan),
            ))
        }
    };
    let mut executor = OpenExecutor::open(executor, ctx)?;

    let mut rows = vec![];
    while let Some(row) = executor.next()? {
        match row {
            Row::Projected(tuple) => rows.push(tuple),
            other => {
                return Err(SQLError::new(
                    ErrorKind::RuntimeError,
                    format!("query produced unprojected row {}", other),
                ))
            }
        }
    }

    executor.close()?;

    Ok(ExecutionResult {
        columns,
        rows,
        affected_rows: 0,
    })
}

/// An opened executor tree. Dropping it without `close()` still releases
/// every resource the tree holds.
struct OpenExecutor {
    executor: Executor,
    closed: bool,
}

impl OpenExecutor {
    fn open(mut executor: Executor, ctx: &QueryContext) -> Result<Self, SQLError> {
        let opened = executor.open(ctx);
        let guard = Self {
            executor,
            closed: false,
        };
        opened?;
        Ok(guard)
    }

    fn next(&mut self) -> Result<Option<Row>, SQLError> {
        self.executor.next()
    }

    fn close(mut self) -> Result<(), SQLError> {
        self.closed = true;
        self.executor.close()
    }
}

impl Drop for OpenExecutor {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.executor.close() {
                error!("Failed to release executor resources: {}", e);
            }
        }
    }
}
