use rusqlite::types::Value as SqlValue;

use crate::error::ValidationError;

use super::criteria::{Clause, FieldKind, FilterSpec, StatusRef, Value};
use super::page::{self, PAGE_SIZE};
use super::screen::Screen;

/// Compiled SQL query fragment with bound parameters.
#[derive(Debug)]
pub(crate) struct CompiledQuery {
    pub where_clause: String,
    pub params: Vec<SqlValue>,
    pub order_clause: String,
    pub limit_offset: String,
}

/// Translate a screen's filter specification into SQL fragments.
pub(crate) fn compile_criteria(
    screen: Screen,
    spec: &FilterSpec,
    page: u32,
) -> Result<CompiledQuery, ValidationError> {
    let target = screen.target();
    spec.check(target)?;
    let offset = page::offset(page)?;

    let mut params = Vec::new();
    let mut conditions = Vec::new();

    for clause in &spec.clauses {
        // check() guarantees the column exists
        let Some(col) = clause.field().column(target) else {
            continue;
        };
        let (sql, clause_params) = compile_clause(col, clause);
        if let Some(sql) = sql {
            conditions.push(sql);
            params.extend(clause_params);
        }
    }

    let exclusions = screen.effective_exclusions(spec);
    for (column, literals) in group_exclusions(&exclusions) {
        let placeholders = vec!["?"; literals.len()].join(", ");
        conditions.push(format!("{} NOT IN ({})", column, placeholders));
        params.extend(literals.into_iter().map(SqlValue::Text));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    Ok(CompiledQuery {
        where_clause,
        params,
        order_clause: "ORDER BY id ASC".to_string(),
        limit_offset: format!("LIMIT {} OFFSET {}", PAGE_SIZE, offset),
    })
}

fn compile_clause(col: &str, clause: &Clause) -> (Option<String>, Vec<SqlValue>) {
    let mut params = Vec::new();
    let sql = match clause {
        Clause::DateRange { start, end, .. } => {
            let mut parts = Vec::new();
            if let Some(start) = start {
                parts.push(format!("date({}) >= ?", col));
                params.push(SqlValue::Text(start.to_string()));
            }
            if let Some(end) = end {
                parts.push(format!("date({}) <= ?", col));
                params.push(SqlValue::Text(end.to_string()));
            }
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" AND "))
            }
        }
        Clause::IntRange { start, end, .. } => {
            let mut parts = Vec::new();
            if let Some(start) = start {
                parts.push(format!("{} >= ?", col));
                params.push(SqlValue::Integer(*start));
            }
            if let Some(end) = end {
                parts.push(format!("{} <= ?", col));
                params.push(SqlValue::Integer(*end));
            }
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(" AND "))
            }
        }
        Clause::TextContains { pattern, .. } => {
            if pattern.is_empty() {
                None
            } else {
                params.push(SqlValue::Text(format!("%{}%", like_escape(pattern))));
                Some(format!("{} LIKE ? ESCAPE '\\'", col))
            }
        }
        Clause::Equals { field, value } => Some(match value {
            Value::Null => format!("{} IS NULL", col),
            Value::Date(d) => {
                params.push(SqlValue::Text(d.to_string()));
                format!("date({}) = ?", col)
            }
            Value::Bool(b) => {
                params.push(SqlValue::Integer(i64::from(*b)));
                format!("{} = ?", col)
            }
            Value::Int(n) => {
                params.push(SqlValue::Integer(*n));
                format!("{} = ?", col)
            }
            Value::Text(s) => {
                params.push(SqlValue::Text(s.clone()));
                if field.kind() == FieldKind::Text {
                    format!("{} = ? COLLATE NOCASE", col)
                } else {
                    format!("{} = ?", col)
                }
            }
        }),
    };
    (sql, params)
}

/// Escape LIKE wildcards so the pattern matches literally
fn like_escape(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn status_column(status: &StatusRef) -> (&'static str, &'static str) {
    match status {
        StatusRef::Custody(s) => ("custody_status", s.as_str()),
        StatusRef::Refund(s) => ("refund_status", s.as_str()),
        StatusRef::Loss(s) => ("status", s.as_str()),
    }
}

fn group_exclusions(exclusions: &[StatusRef]) -> Vec<(&'static str, Vec<String>)> {
    let mut groups: Vec<(&'static str, Vec<String>)> = Vec::new();
    for status in exclusions {
        let (column, literal) = status_column(status);
        match groups.iter_mut().find(|(c, _)| *c == column) {
            Some((_, literals)) => literals.push(literal.to_string()),
            None => groups.push((column, vec![literal.to_string()])),
        }
    }
    groups
}
