use std::sync::Arc;

use log::warn;

use super::{join_order::build_join_tree, scope::Scope, Plan};
use crate::{
    catalog::defs::BaseRelationSchema,
    core::{BaseTuple, ErrorKind, SQLError},
    sql::{
        expression::{Predicate, PredicateKind, Variable},
        runtime::{DDLJob, DMLJob},
        session::context::QueryContext,
        statement::{Comparison, Operand, SelectRequest, Statement},
    },
};

/// Turns structured requests into plans, resolving every name against the
/// catalog.
pub struct Binder<'a> {
    ctx: &'a QueryContext,
}

impl<'a> Binder<'a> {
    pub fn new(ctx: &'a QueryContext) -> Self {
        Self { ctx }
    }

    pub fn bind_statement(&self, stmt: &Statement) -> Result<Plan, SQLError> {
        match stmt {
            Statement::CreateTable(request) => {
                let schema = BaseRelationSchema::new(
                    request.name.clone(),
                    request.attributes.clone(),
                    request.primary_key,
                )?;
                Ok(Plan::DDL(DDLJob::CreateTable(schema)))
            }

            Statement::DropTable(name) => Ok(Plan::DDL(DDLJob::DropTable(name.clone()))),

            Statement::ShowTables => Ok(Plan::DDL(DDLJob::ShowTables)),

            Statement::Insert(request) => {
                let relation = self.lookup_relation(&request.relation)?;

                // Validate every row before anything is written.
                let tuples = request
                    .rows
                    .iter()
                    .map(|values| BaseTuple::new(relation.clone(), values.clone()))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Plan::DML(DMLJob::Insert(relation, tuples)))
            }

            Statement::Select(request) => self.bind_select(request),

            Statement::Explain(request) => {
                let plan = self.bind_select(request)?;
                Ok(Plan::Explain(plan.to_string()))
            }
        }
    }

    /// Bind a select-project-join request into a `Project` over a left-deep
    /// join tree.
    pub fn bind_select(&self, request: &SelectRequest) -> Result<Plan, SQLError> {
        let mut relations: Vec<Arc<BaseRelationSchema>> = vec![];
        for name in request.from.iter() {
            let relation = self.lookup_relation(name)?;
            if relations.contains(&relation) {
                return Err(SQLError::new(
                    ErrorKind::InvalidDefinition,
                    format!("relation {} appears more than once in FROM", name),
                ));
            }
            relations.push(relation);
        }
        let scope = Scope::new(relations);

        let predicates = request
            .predicates
            .iter()
            .map(|comparison| Self::bind_predicate(&scope, comparison))
            .collect::<Result<Vec<_>, _>>()?;

        let outputs = if request.select.is_empty() {
            scope
                .expand_all()
                .into_iter()
                .map(Variable::Attribute)
                .collect::<Vec<_>>()
        } else {
            request
                .select
                .iter()
                .map(|name| scope.resolve_attribute(name).map(Variable::Attribute))
                .collect::<Result<Vec<_>, _>>()?
        };

        if request.distinct {
            return Err(SQLError::new(ErrorKind::NotImplemented, "DISTINCT"));
        }
        if request.order_by.is_some() {
            return Err(SQLError::new(ErrorKind::NotImplemented, "ORDER BY"));
        }

        let input = build_join_tree(self.ctx, &scope.relations, predicates)?;

        Ok(Plan::Project {
            outputs,
            input: Box::new(input),
        })
    }

    fn bind_predicate(scope: &Scope, comparison: &Comparison) -> Result<Predicate, SQLError> {
        let predicate = Predicate::new(
            Self::bind_operand(scope, &comparison.left)?,
            Self::bind_operand(scope, &comparison.right)?,
        );

        if predicate.kind() == PredicateKind::Constant {
            return Err(SQLError::new(
                ErrorKind::MalformedQuery,
                format!("predicate {} references no attribute", predicate),
            ));
        }

        if predicate.left().data_type() != predicate.right().data_type() {
            warn!(
                "Predicate {} compares {} with {}, it can never hold",
                predicate,
                predicate.left().data_type(),
                predicate.right().data_type()
            );
        }

        Ok(predicate)
    }

    fn bind_operand(scope: &Scope, operand: &Operand) -> Result<Variable, SQLError> {
        match operand {
            Operand::Constant(datum) => Ok(Variable::Constant(datum.clone())),
            Operand::Attribute(name) => scope.resolve_attribute(name).map(Variable::Attribute),
        }
    }

    fn lookup_relation(&self, name: &str) -> Result<Arc<BaseRelationSchema>, SQLError> {
        self.ctx.catalog.lookup(name).ok_or_else(|| {
            SQLError::new(
                ErrorKind::RelationNotFound,
                format!("relation {} does not exist", name),
            )
        })
    }
}
