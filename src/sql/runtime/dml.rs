use std::sync::Arc;

use log::debug;

use crate::{
    catalog::defs::BaseRelationSchema,
    core::{codec::encode_datum, BaseTuple, SQLError},
    sql::session::context::QueryContext,
};

#[derive(Debug, Clone)]
pub enum DMLJob {
    /// `INSERT INTO` statement, insert a series of validated rows into a
    /// relation.
    Insert(Arc<BaseRelationSchema>, Vec<BaseTuple>),
}

/// Returns the number of rows written.
pub fn execute_dml(ctx: &QueryContext, job: &DMLJob) -> Result<usize, SQLError> {
    match job {
        DMLJob::Insert(relation, tuples) => {
            let partition = ctx.storage.open_partition(relation.name(), false)?;
            for tuple in tuples {
                // Rows sharing a primary key overwrite each other, keyless
                // relations get a fresh id per row.
                let key = match tuple.primary_key() {
                    Some(key) => encode_datum(key),
                    None => ctx.storage.generate_id()?.to_be_bytes().to_vec(),
                };
                partition.put(&key, &tuple.encode())?;
            }

            debug!("Inserted {} row(s) into {}", tuples.len(), relation.name());
            Ok(tuples.len())
        }
    }
}
