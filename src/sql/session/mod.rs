pub mod context;

use log::{debug, info};

use self::context::QueryContext;
use super::{
    parser::parse_sql,
    planner::{binder::Binder, Plan},
    runtime::execute_plan,
    statement::Statement,
};
use crate::core::{ProjectedTuple, SQLError};

/// Kind of SQL statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SQLKind {
    /// Produces rows.
    Query,
    /// Changes state, produces no rows.
    Execute,
}

#[derive(Debug)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<ProjectedTuple>,
    pub kind: SQLKind,
    pub affected_rows: usize,
}

pub struct Session {
    ctx: QueryContext,
}

impl Session {
    pub fn new(ctx: QueryContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &QueryContext {
        &self.ctx
    }

    /// Give the context back, e.g. to close it.
    pub fn into_context(self) -> QueryContext {
        self.ctx
    }

    pub fn execute(&mut self, sql_text: &str) -> Result<QueryResult, SQLError> {
        info!("Executing SQL: {}", sql_text);

        let statement = parse_sql(sql_text)?;
        self.execute_statement(&statement)
    }

    /// Bind and run a structured request.
    pub fn execute_statement(&mut self, statement: &Statement) -> Result<QueryResult, SQLError> {
        let plan = Binder::new(&self.ctx).bind_statement(statement)?;
        if matches!(plan, Plan::Project { .. }) {
            debug!("Plan:\n{}", plan);
        }

        let result = execute_plan(&mut self.ctx, &plan)?;

        Ok(QueryResult {
            columns: result.columns,
            rows: result.rows,
            kind: if plan.is_query() {
                SQLKind::Query
            } else {
                SQLKind::Execute
            },
            affected_rows: result.affected_rows,
        })
    }
}
