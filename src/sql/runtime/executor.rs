use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use crate::{
    catalog::defs::{Attribute, BaseRelationSchema, RelationSchema},
    core::{BaseTuple, CompositeTuple, Datum, ErrorKind, ProjectedTuple, Row, SQLError},
    sql::{
        expression::{Predicate, Variable},
        session::context::QueryContext,
    },
    storage::{Cursor, Partition},
};

pub enum Executor {
    Scan(ScanExecutor),
    NestedLoopJoin(NestedLoopJoinExecutor),
    HashJoin(HashJoinExecutor),
    Project(ProjectExecutor),
}

/// Executor is responsible for executing a query plan.
/// It is implemented in a pull-based manner, i.e. Volcano-style.
/// The executor will be `open()`-ed, then `next()` will be called repeatedly
/// until it returns None, then `close()` will be called. Calling `next()`
/// again after None keeps returning None.
impl Executor {
    /// Acquire resources, children first.
    pub fn open(&mut self, ctx: &QueryContext) -> Result<(), SQLError> {
        match self {
            Executor::Scan(scan_exec) => scan_exec.open(ctx),
            Executor::HashJoin(hash_join_exec) => hash_join_exec.open(ctx),
            _ => {
                for child in self.children_mut() {
                    child.open(ctx)?;
                }
                Ok(())
            }
        }
    }

    pub fn next(&mut self) -> Result<Option<Row>, SQLError> {
        match self {
            Executor::Scan(scan_exec) => scan_exec.next(),
            Executor::NestedLoopJoin(nlj_exec) => nlj_exec.next(),
            Executor::HashJoin(hash_join_exec) => hash_join_exec.next(),
            Executor::Project(project_exec) => project_exec.next(),
        }
    }

    /// Restart from the first row without reopening storage.
    pub fn reinit(&mut self) -> Result<(), SQLError> {
        match self {
            Executor::Scan(scan_exec) => scan_exec.reinit(),
            Executor::NestedLoopJoin(nlj_exec) => nlj_exec.reinit(),
            Executor::HashJoin(hash_join_exec) => hash_join_exec.reinit(),
            Executor::Project(_) => Err(SQLError::new(
                ErrorKind::RuntimeError,
                "projection cannot be restarted",
            )),
        }
    }

    pub fn supports_reinit(&self) -> bool {
        match self {
            Executor::Scan(_) => true,
            Executor::NestedLoopJoin(nlj_exec) => {
                nlj_exec.left.supports_reinit() && nlj_exec.right.supports_reinit()
            }
            Executor::HashJoin(hash_join_exec) => hash_join_exec.left.supports_reinit(),
            Executor::Project(_) => false,
        }
    }

    /// Release resources, then close the children. Every child is closed
    /// even when an earlier one fails; the first failure is returned.
    pub fn close(&mut self) -> Result<(), SQLError> {
        match self {
            Executor::Scan(scan_exec) => scan_exec.close(),
            Executor::NestedLoopJoin(nlj_exec) => nlj_exec.reset(),
            Executor::HashJoin(hash_join_exec) => hash_join_exec.reset(true),
            Executor::Project(_) => {}
        }

        let mut result = Ok(());
        for child in self.children_mut() {
            let closed = child.close();
            if result.is_ok() {
                result = closed;
            }
        }
        result
    }

    pub fn children_mut<'a>(&'a mut self) -> Box<dyn Iterator<Item = &'a mut Executor> + '_> {
        match self {
            Executor::Project(project_exec) => {
                Box::new(std::iter::once(project_exec.child.as_mut()))
            }
            Executor::NestedLoopJoin(nlj_exec) => Box::new(
                std::iter::once(nlj_exec.left.as_mut())
                    .chain(std::iter::once(nlj_exec.right.as_mut())),
            ),
            Executor::HashJoin(hash_join_exec) => Box::new(
                std::iter::once(hash_join_exec.left.as_mut())
                    .chain(std::iter::once(hash_join_exec.right.as_mut())),
            ),
            Executor::Scan(_) => Box::new(std::iter::empty()),
        }
    }
}

fn not_open(relation: &BaseRelationSchema) -> SQLError {
    SQLError::new(
        ErrorKind::RuntimeError,
        format!("scan of {} is not open", relation.name()),
    )
}

/// Full scan of one relation with pushed-down scan predicates. Owns one
/// partition handle and one cursor between `open` and `close`.
pub struct ScanExecutor {
    relation: Arc<BaseRelationSchema>,
    predicates: Vec<Predicate>,
    partition: Option<Box<dyn Partition>>,
    cursor: Option<Box<dyn Cursor>>,
}

impl ScanExecutor {
    pub fn new(relation: Arc<BaseRelationSchema>, predicates: Vec<Predicate>) -> Self {
        Self {
            relation,
            predicates,
            partition: None,
            cursor: None,
        }
    }

    pub fn open(&mut self, ctx: &QueryContext) -> Result<(), SQLError> {
        let partition = ctx.storage.open_partition(self.relation.name(), false)?;
        self.cursor = Some(partition.cursor()?);
        self.partition = Some(partition);
        Ok(())
    }

    pub fn reinit(&mut self) -> Result<(), SQLError> {
        let partition = self
            .partition
            .as_ref()
            .ok_or_else(|| not_open(&self.relation))?;
        self.cursor = Some(partition.cursor()?);
        Ok(())
    }

    pub fn next(&mut self) -> Result<Option<Row>, SQLError> {
        let cursor = self
            .cursor
            .as_mut()
            .ok_or_else(|| not_open(&self.relation))?;

        'rows: while let Some((_, value)) = cursor.next_entry()? {
            let row = Row::Base(BaseTuple::decode(&self.relation, &value)?);
            for predicate in self.predicates.iter() {
                if !predicate.evaluate(&row)? {
                    continue 'rows;
                }
            }
            return Ok(Some(row));
        }

        Ok(None)
    }

    pub fn close(&mut self) {
        self.cursor = None;
        self.partition = None;
    }
}

/// Nested-loop join executor.
/// The left input is the outer side and is pulled one row at a time. The
/// right input is resumed where it stopped after each match and restarted
/// with `reinit()` once it runs out, so nothing is buffered.
pub struct NestedLoopJoinExecutor {
    pub left: Box<Executor>,
    pub right: Box<Executor>,
    predicate: Predicate,

    current_left: Option<Row>,
    exhausted: bool,
}

impl NestedLoopJoinExecutor {
    pub fn new(left: Box<Executor>, right: Box<Executor>, predicate: Predicate) -> Self {
        Self {
            left,
            right,
            predicate,
            current_left: None,
            exhausted: false,
        }
    }

    pub fn next(&mut self) -> Result<Option<Row>, SQLError> {
        if self.exhausted {
            return Ok(None);
        }

        loop {
            let left_row = match self.current_left.take() {
                Some(row) => row,
                None => match self.left.next()? {
                    Some(row) => row,
                    None => {
                        self.exhausted = true;
                        return Ok(None);
                    }
                },
            };

            while let Some(right_row) = self.right.next()? {
                if self.predicate.evaluate_join(&left_row, &right_row)? {
                    let combined = CompositeTuple::combine(left_row.clone(), right_row)?;
                    self.current_left = Some(left_row);
                    return Ok(Some(Row::Composite(combined)));
                }
            }

            // Right side is spent for this left row.
            self.right.reinit()?;
        }
    }

    pub fn reinit(&mut self) -> Result<(), SQLError> {
        self.left.reinit()?;
        self.right.reinit()?;
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.current_left = None;
        self.exhausted = false;
    }
}

/// Hash join executor.
/// Drains the right input into a hash table keyed by the predicate's right
/// operand when opened, then streams the left input and probes.
pub struct HashJoinExecutor {
    pub left: Box<Executor>,
    pub right: Box<Executor>,
    predicate: Predicate,

    table: HashMap<Datum, Vec<Row>>,
    current_left: Option<Row>,
    pending: VecDeque<Row>,
    exhausted: bool,
}

impl HashJoinExecutor {
    pub fn new(left: Box<Executor>, right: Box<Executor>, predicate: Predicate) -> Self {
        Self {
            left,
            right,
            predicate,
            table: HashMap::new(),
            current_left: None,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn open(&mut self, ctx: &QueryContext) -> Result<(), SQLError> {
        self.left.open(ctx)?;
        self.right.open(ctx)?;

        self.table.clear();
        while let Some(row) = self.right.next()? {
            let key = self.predicate.right().evaluate(&row)?;
            self.table.entry(key).or_default().push(row);
        }
        Ok(())
    }

    pub fn next(&mut self) -> Result<Option<Row>, SQLError> {
        loop {
            if let (Some(left_row), Some(right_row)) = (&self.current_left, self.pending.pop_front())
            {
                let combined = CompositeTuple::combine(left_row.clone(), right_row)?;
                return Ok(Some(Row::Composite(combined)));
            }

            if self.exhausted {
                return Ok(None);
            }

            match self.left.next()? {
                Some(left_row) => {
                    let key = self.predicate.left().evaluate(&left_row)?;
                    self.pending = self.table.get(&key).cloned().unwrap_or_default().into();
                    self.current_left = Some(left_row);
                }
                None => {
                    self.exhausted = true;
                    self.current_left = None;
                }
            }
        }
    }

    /// The build side is kept, only the probe side restarts.
    pub fn reinit(&mut self) -> Result<(), SQLError> {
        self.left.reinit()?;
        self.reset(false);
        Ok(())
    }

    fn reset(&mut self, drop_table: bool) {
        if drop_table {
            self.table.clear();
        }
        self.current_left = None;
        self.pending.clear();
        self.exhausted = false;
    }
}

pub struct ProjectExecutor {
    pub child: Box<Executor>,
    outputs: Vec<Variable>,
    output_schema: RelationSchema,
}

impl ProjectExecutor {
    pub fn new(child: Box<Executor>, outputs: Vec<Variable>) -> Self {
        let output_schema = RelationSchema::new(
            outputs
                .iter()
                .map(|output| Attribute::new(output.to_string(), output.data_type()))
                .collect(),
        );

        Self {
            child,
            outputs,
            output_schema,
        }
    }

    /// Names and types of the produced columns.
    pub fn output_schema(&self) -> &RelationSchema {
        &self.output_schema
    }

    pub fn next(&mut self) -> Result<Option<Row>, SQLError> {
        match self.child.next()? {
            Some(row) => {
                let values = self
                    .outputs
                    .iter()
                    .map(|output| output.evaluate(&row))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(Row::Projected(ProjectedTuple::new(values))))
            }
            None => Ok(None),
        }
    }
}
