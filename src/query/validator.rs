use super::QueryDef;
use crate::error::{InspectError, Result};
use sqlparser::ast::{Expr, SelectItem, SetExpr, Statement};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Checks that a descriptor's SQL is one `SELECT` whose output columns match
/// the declared column list, position by position.
pub struct QueryValidator {
    dialect: PostgreSqlDialect,
}

impl QueryValidator {
    pub fn new() -> Self {
        Self {
            dialect: PostgreSqlDialect {},
        }
    }

    pub fn validate(&self, query: &QueryDef) -> ValidationResult {
        let mut result = ValidationResult::default();

        let statements = match Parser::parse_sql(&self.dialect, query.sql) {
            Ok(stmts) => stmts,
            Err(e) => {
                result.errors.push(format!("SQL does not parse: {}", e));
                return result;
            }
        };

        let [Statement::Query(parsed)] = statements.as_slice() else {
            result
                .errors
                .push("Expected a single SELECT statement".to_string());
            return result;
        };

        let SetExpr::Select(select) = parsed.body.as_ref() else {
            result
                .errors
                .push("Statement body is not a plain SELECT".to_string());
            return result;
        };

        if select.projection.len() != query.width() {
            result.errors.push(format!(
                "Projection has {} columns, {} declared",
                select.projection.len(),
                query.width()
            ));
            return result;
        }

        for (position, (item, declared)) in select.projection.iter().zip(query.columns).enumerate()
        {
            match output_name(item) {
                Some(name) if name == *declared => {}
                Some(name) => result.errors.push(format!(
                    "Column {} is '{}', declared '{}'",
                    position + 1,
                    name,
                    declared
                )),
                None => result.errors.push(format!(
                    "Column {} has no derivable name, declared '{}'",
                    position + 1,
                    declared
                )),
            }
        }

        result
    }

    pub fn validate_all(&self, queries: &[QueryDef]) -> Result<()> {
        for query in queries {
            let result = self.validate(query);
            if !result.is_valid() {
                return Err(InspectError::InvalidQuery(format!(
                    "{}: {}",
                    query.name,
                    result.errors.join("; ")
                )));
            }
        }
        Ok(())
    }
}

impl Default for QueryValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn output_name(item: &SelectItem) -> Option<&str> {
    match item {
        SelectItem::ExprWithAlias { alias, .. } => Some(alias.value.as_str()),
        SelectItem::UnnamedExpr(Expr::Identifier(ident)) => Some(ident.value.as_str()),
        SelectItem::UnnamedExpr(Expr::CompoundIdentifier(parts)) => {
            parts.last().map(|ident| ident.value.as_str())
        }
        _ => None,
    }
}
