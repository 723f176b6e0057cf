use crate::{
    catalog::defs::BaseRelationSchema,
    core::{Datum, ProjectedTuple, SQLError},
    sql::session::context::QueryContext,
};

#[derive(Debug, Clone)]
pub enum DDLJob {
    /// Create a relation with the given schema.
    CreateTable(BaseRelationSchema),
    /// Drop the relation with the given name, rows included.
    DropTable(String),
    ShowTables,
}

pub fn execute_ddl(ctx: &mut QueryContext, job: &DDLJob) -> Result<Vec<ProjectedTuple>, SQLError> {
    match job {
        DDLJob::CreateTable(schema) => {
            ctx.catalog.create(ctx.storage.as_ref(), schema.clone())?;
            Ok(vec![])
        }
        DDLJob::DropTable(name) => {
            ctx.catalog.drop_relation(ctx.storage.as_ref(), name)?;
            Ok(vec![])
        }
        DDLJob::ShowTables => Ok(ctx
            .catalog
            .list_relations()
            .into_iter()
            .map(|name| ProjectedTuple::new(vec![Datum::String(name)]))
            .collect()),
    }
}
