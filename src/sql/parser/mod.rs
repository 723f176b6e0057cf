use sqlparser::{
    ast::{
        self, BinaryOperator, ColumnOption, Expr, Ident, ObjectName, ObjectType, Query, SelectItem,
        SetExpr, TableConstraint, TableFactor, UnaryOperator,
    },
    dialect::PostgreSqlDialect,
    parser::Parser,
};

use super::statement::{
    AttributeName, Comparison, CreateTableRequest, InsertRequest, Operand, SelectRequest,
    Statement,
};
use crate::{
    catalog::defs::Attribute,
    core::{Datum, ErrorKind, SQLError, Type},
};

/// Parse SQL string into a structured request
pub fn parse_sql(sql_text: &str) -> Result<Statement, SQLError> {
    let parser = Parser::new(&PostgreSqlDialect {});

    let statement = parser
        .try_with_sql(sql_text)
        .and_then(|mut parser| parser.parse_statement())
        .map_err(|e| SQLError::new(ErrorKind::ParseError, e.to_string()))?;

    convert_statement(&statement)
}

fn unsupported(what: impl AsRef<str>) -> SQLError {
    SQLError::new(
        ErrorKind::ParseError,
        format!("unsupported: {}", what.as_ref()),
    )
}

fn convert_statement(stmt: &ast::Statement) -> Result<Statement, SQLError> {
    match stmt {
        ast::Statement::CreateTable {
            name,
            columns,
            constraints,
            ..
        } => {
            let name = single_name(name)?;

            let mut primary_key = None;
            let mut attributes = vec![];
            for (i, col) in columns.iter().enumerate() {
                let data_type = Type::try_from(&col.data_type)?;
                for opt in col.options.iter() {
                    match &opt.option {
                        ColumnOption::Unique { is_primary: true } => {
                            set_primary_key(&mut primary_key, i)?
                        }
                        other => {
                            return Err(unsupported(format!(
                                "column option {} on {}",
                                other, col.name
                            )))
                        }
                    }
                }
                attributes.push(Attribute::new(col.name.value.clone(), data_type));
            }

            for constraint in constraints {
                match constraint {
                    TableConstraint::Unique {
                        columns: key_columns,
                        is_primary: true,
                        ..
                    } if key_columns.len() == 1 => {
                        let position = attributes
                            .iter()
                            .position(|attr| attr.name == key_columns[0].value)
                            .ok_or_else(|| {
                                SQLError::new(
                                    ErrorKind::ParseError,
                                    format!("primary key column {} not defined", key_columns[0]),
                                )
                            })?;
                        set_primary_key(&mut primary_key, position)?;
                    }
                    _ => return Err(unsupported(format!("constraint {}", constraint))),
                }
            }

            Ok(Statement::CreateTable(CreateTableRequest {
                name,
                attributes,
                primary_key,
            }))
        }

        ast::Statement::Drop {
            object_type: ObjectType::Table,
            names,
            ..
        } => match names.as_slice() {
            [name] => Ok(Statement::DropTable(single_name(name)?)),
            _ => Err(unsupported("dropping several tables at once")),
        },

        ast::Statement::Insert {
            table_name,
            columns,
            source,
            ..
        } => {
            if !columns.is_empty() {
                return Err(unsupported("insert column list"));
            }

            let rows = match source.body.as_ref() {
                SetExpr::Values(values) => values
                    .rows
                    .iter()
                    .map(|row| row.iter().map(literal).collect::<Result<Vec<_>, _>>())
                    .collect::<Result<Vec<_>, _>>()?,
                _ => return Err(unsupported("insert source other than VALUES")),
            };

            Ok(Statement::Insert(InsertRequest {
                relation: single_name(table_name)?,
                rows,
            }))
        }

        ast::Statement::Query(query) => Ok(Statement::Select(convert_query(query)?)),

        ast::Statement::ShowTables { .. } => Ok(Statement::ShowTables),

        ast::Statement::Explain { statement, .. } => match statement.as_ref() {
            ast::Statement::Query(query) => Ok(Statement::Explain(convert_query(query)?)),
            _ => Err(unsupported("EXPLAIN of a non-query statement")),
        },

        _ => Err(unsupported(stmt.to_string())),
    }
}

fn set_primary_key(primary_key: &mut Option<usize>, position: usize) -> Result<(), SQLError> {
    if primary_key.is_some() {
        return Err(unsupported("more than one primary key column"));
    }
    *primary_key = Some(position);
    Ok(())
}

fn single_name(name: &ObjectName) -> Result<String, SQLError> {
    match name.0.as_slice() {
        [ident] => Ok(ident.value.clone()),
        _ => Err(SQLError::new(
            ErrorKind::ParseError,
            format!("invalid table name: {}", name),
        )),
    }
}

fn convert_query(query: &Query) -> Result<SelectRequest, SQLError> {
    if query.with.is_some() || query.limit.is_some() || query.offset.is_some() {
        return Err(unsupported("WITH, LIMIT and OFFSET"));
    }

    let select = match query.body.as_ref() {
        SetExpr::Select(select) => select,
        _ => return Err(unsupported("set operations")),
    };

    if !select.group_by.is_empty() || select.having.is_some() {
        return Err(unsupported("aggregation"));
    }

    let mut from = vec![];
    for table in select.from.iter() {
        if !table.joins.is_empty() {
            return Err(unsupported("explicit JOIN, list the tables in FROM instead"));
        }
        match &table.relation {
            TableFactor::Table {
                name, alias: None, ..
            } => from.push(single_name(name)?),
            other => return Err(unsupported(format!("table reference {}", other))),
        }
    }
    if from.is_empty() {
        return Err(unsupported("SELECT without FROM"));
    }

    let mut select_list = vec![];
    for item in select.projection.iter() {
        match item {
            SelectItem::Wildcard(_) if select.projection.len() == 1 => {}
            SelectItem::UnnamedExpr(expr) => select_list.push(attribute_name(expr)?),
            other => return Err(unsupported(format!("select item {}", other))),
        }
    }

    let mut predicates = vec![];
    if let Some(selection) = &select.selection {
        collect_conjuncts(selection, &mut predicates)?;
    }

    let order_by = if query.order_by.is_empty() {
        None
    } else {
        Some(
            query
                .order_by
                .iter()
                .map(|item| attribute_name(&item.expr))
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    Ok(SelectRequest {
        from,
        predicates,
        select: select_list,
        distinct: select.distinct,
        order_by,
    })
}

/// Flatten `a AND b AND ...` where every leaf is an equality.
fn collect_conjuncts(expr: &Expr, predicates: &mut Vec<Comparison>) -> Result<(), SQLError> {
    match expr {
        Expr::Nested(inner) => collect_conjuncts(inner, predicates),
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            collect_conjuncts(left, predicates)?;
            collect_conjuncts(right, predicates)
        }
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } => {
            predicates.push(Comparison::new(operand(left)?, operand(right)?));
            Ok(())
        }
        _ => Err(unsupported(format!(
            "predicate {}, only conjunctions of equalities are allowed",
            expr
        ))),
    }
}

fn operand(expr: &Expr) -> Result<Operand, SQLError> {
    match expr {
        Expr::Identifier(_) | Expr::CompoundIdentifier(_) => {
            Ok(Operand::Attribute(attribute_name(expr)?))
        }
        _ => Ok(Operand::Constant(literal(expr)?)),
    }
}

fn attribute_name(expr: &Expr) -> Result<AttributeName, SQLError> {
    match expr {
        Expr::Identifier(Ident { value, .. }) => Ok(AttributeName::unqualified(value.clone())),
        Expr::CompoundIdentifier(idents) => match idents.as_slice() {
            [relation, attribute] => Ok(AttributeName::qualified(
                relation.value.clone(),
                attribute.value.clone(),
            )),
            _ => Err(unsupported(format!("attribute reference {}", expr))),
        },
        _ => Err(unsupported(format!("expression {}", expr))),
    }
}

fn literal(expr: &Expr) -> Result<Datum, SQLError> {
    match expr {
        Expr::Value(value) => Datum::try_from(value),
        Expr::Nested(inner) => literal(inner),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr: inner,
        } => match literal(inner)? {
            Datum::Int(v) => Ok(Datum::Int(-v)),
            Datum::String(_) => Err(unsupported("negated string")),
        },
        _ => Err(unsupported(format!("value {}", expr))),
    }
}
