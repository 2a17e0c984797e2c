//! SQL builder helpers for photo queries.

use crate::api::search::predicate::{DatePart, Predicate};

/// Columns selected for a result row, aliased to [`PhotoRow`] field names.
///
/// [`PhotoRow`]: crate::db_utils::clickhouse_store::PhotoRow
pub const SQL_SELECT_COLUMNS: &str = "
    id,
    file_path,
    ifNull(toString(date_taken), '') AS taken_at,
    camera_make,
    camera_model,
    lens_model,
    focal_length,
    iso,
    aperture,
    width,
    height,
    time_of_day,
    season,
    focal_category,
    shooting_condition,
    colour_names,
    burst_group_id
";

pub const SQL_ORDER_CLAUSE: &str = "ORDER BY date_taken IS NULL, date_taken DESC, id ASC";

/// Bound argument for a `?` placeholder, in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlArg {
    Str(String),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlWhere {
    /// Boolean expression without the `WHERE` keyword.
    pub condition: String,
    pub args: Vec<SqlArg>,
}

impl SqlWhere {
    pub fn clause(&self) -> String {
        format!("WHERE {}", self.condition)
    }
}

pub fn build_sql_where_clause(predicate: &Predicate) -> SqlWhere {
    let mut args = Vec::new();
    let condition = render(predicate, &mut args);
    SqlWhere { condition, args }
}

fn render(predicate: &Predicate, args: &mut Vec<SqlArg>) -> String {
    match predicate {
        Predicate::All => "1".to_string(),
        Predicate::And(parts) if parts.is_empty() => "1".to_string(),
        Predicate::Or(parts) if parts.is_empty() => "0".to_string(),
        Predicate::And(parts) => join(parts, " AND ", args),
        Predicate::Or(parts) => join(parts, " OR ", args),
        Predicate::Eq(column, value) => {
            args.push(SqlArg::Str(value.clone()));
            format!("{} = ?", column.name())
        }
        Predicate::Contains(column, value) => {
            args.push(SqlArg::Str(value.clone()));
            format!("has({}, ?)", column.name())
        }
        Predicate::DatePartEq(part, value) => {
            args.push(SqlArg::Int(*value));
            let function = match part {
                DatePart::Year => "toYear",
                DatePart::Month => "toMonth",
                DatePart::Day => "toDayOfMonth",
            };
            format!("{function}(date_taken) = ?")
        }
        Predicate::IsNull(column) => format!("{} IS NULL", column.name()),
        Predicate::IsNotNull(column) => format!("{} IS NOT NULL", column.name()),
    }
}

fn join(parts: &[Predicate], separator: &str, args: &mut Vec<SqlArg>) -> String {
    let rendered: Vec<String> = parts.iter().map(|p| render(p, args)).collect();
    format!("({})", rendered.join(separator))
}
