use crate::infrastructure::persistence::{
    parameters::SqlParameter,
    schema::{ColumnRef, Table},
};

/// Composable SELECT builder for the lookup and listing queries.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    from_table: Table<'a>,
    select: Vec<Selection<'a>>,
    joins: Vec<Join<'a>>,
    where_conditions: Vec<Condition<'a>>,
    group_by: Vec<ColumnRef<'a>>,
    order_by: Vec<OrderBy<'a>>,
    limit: Option<u64>,
    offset: Option<u64>,
}

/// One entry of the SELECT list
#[derive(Debug, Clone)]
pub enum Selection<'a> {
    Column(ColumnRef<'a>),
    /// column AS alias
    Aliased {
        column: ColumnRef<'a>,
        alias: &'static str,
    },
    /// Raw SQL expression, e.g. an aggregate
    Expression {
        sql: String,
        alias: &'static str,
    },
}

/// A where condition that will be AND'ed together
#[derive(Debug, Clone)]
pub enum Condition<'a> {
    /// field = value
    Equals {
        column: ColumnRef<'a>,
        value: SqlParameter,
    },

    /// field ILIKE '%value%'
    Contains { column: ColumnRef<'a>, value: String },

    /// Combine multiple conditions with OR
    Or(Box<Condition<'a>>, Box<Condition<'a>>),
}

#[derive(Debug, Clone)]
pub struct OrderBy<'a> {
    pub column: ColumnRef<'a>,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone)]
pub struct Join<'a> {
    pub join_type: JoinType,
    pub target_table: Table<'a>,
    pub main_column: ColumnRef<'a>,
    pub target_column: ColumnRef<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum JoinType {
    Inner,
    Left,
}

impl<'a> From<Table<'a>> for QueryBuilder<'a> {
    fn from(value: Table<'a>) -> Self {
        QueryBuilder {
            from_table: value,
            select: vec![],
            joins: vec![],
            where_conditions: vec![],
            group_by: vec![],
            order_by: vec![],
            limit: None,
            offset: None,
        }
    }
}

impl<'a> QueryBuilder<'a> {
    /// Select specified columns
    pub fn select(mut self, columns: Vec<ColumnRef<'a>>) -> Self {
        self.select
            .extend(columns.into_iter().map(Selection::Column));
        self
    }

    pub fn select_as(mut self, column: ColumnRef<'a>, alias: &'static str) -> Self {
        self.select.push(Selection::Aliased { column, alias });
        self
    }

    pub fn select_expression<T: Into<String>>(mut self, sql: T, alias: &'static str) -> Self {
        self.select.push(Selection::Expression {
            sql: sql.into(),
            alias,
        });
        self
    }

    pub fn join(
        mut self,
        join_type: JoinType,
        target_table: Table<'a>,
        main_column: ColumnRef<'a>,
        target_column: ColumnRef<'a>,
    ) -> Self {
        self.joins.push(Join {
            join_type,
            target_table,
            main_column,
            target_column,
        });
        self
    }

    /// Add where condition
    pub fn where_condition(mut self, condition: Condition<'a>) -> Self {
        self.where_conditions.push(condition);
        self
    }

    pub fn where_conditions(mut self, conditions: Vec<Condition<'a>>) -> Self {
        self.where_conditions.extend(conditions);
        self
    }

    pub fn group_by(mut self, column: ColumnRef<'a>) -> Self {
        self.group_by.push(column);
        self
    }

    pub fn order_by(mut self, column: ColumnRef<'a>, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy { column, direction });
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Build the SQL query string
    pub fn build(self) -> (String, Vec<SqlParameter>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        let mut param_counter = 1;

        // SELECT clause
        sql.push_str("SELECT ");
        let columns: Vec<String> = self.select.iter().map(Selection::to_sql).collect();
        sql.push_str(&columns.join(", "));

        // FROM clause
        sql.push_str(&format!("\nFROM {}", self.from_table.qualified()));

        // JOIN clauses
        for join in &self.joins {
            let join_keyword = match join.join_type {
                JoinType::Inner => "JOIN",
                JoinType::Left => "LEFT JOIN",
            };
            sql.push_str(&format!(
                "\n{} {} ON {} = {}",
                join_keyword,
                join.target_table.qualified(),
                join.main_column.qualified(),
                join.target_column.qualified()
            ));
        }

        // WHERE clause
        if !self.where_conditions.is_empty() {
            let clauses: Vec<String> = self
                .where_conditions
                .iter()
                .map(|condition| condition.to_sql(&mut param_counter, &mut params))
                .collect();
            sql.push_str("\nWHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        // GROUP BY clause
        if !self.group_by.is_empty() {
            let columns: Vec<String> = self.group_by.iter().map(|c| c.qualified()).collect();
            sql.push_str("\nGROUP BY ");
            sql.push_str(&columns.join(", "));
        }

        // ORDER BY clause
        if !self.order_by.is_empty() {
            let order_clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|ob| {
                    let direction = match ob.direction {
                        SortDirection::Ascending => "ASC",
                        SortDirection::Descending => "DESC",
                    };
                    format!("{} {}", ob.column.qualified(), direction)
                })
                .collect();
            sql.push_str("\nORDER BY ");
            sql.push_str(&order_clauses.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!("\nLIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!("\nOFFSET {}", offset));
        }

        (sql, params)
    }
}

impl Selection<'_> {
    fn to_sql(&self) -> String {
        match self {
            Selection::Column(column) => column.qualified(),
            Selection::Aliased { column, alias } => {
                format!("{} AS \"{}\"", column.qualified(), alias)
            }
            Selection::Expression { sql, alias } => format!("{} AS \"{}\"", sql, alias),
        }
    }
}

impl Condition<'_> {
    pub fn to_sql(&self, param_counter: &mut usize, params: &mut Vec<SqlParameter>) -> String {
        match self {
            Condition::Equals { column, value } => {
                let sql = format!("{} = ${}", column.qualified(), param_counter);
                *param_counter += 1;
                params.push(value.clone());
                sql
            }

            Condition::Contains { column, value } => {
                let sql = format!("{} ILIKE ${}", column.qualified(), param_counter);
                *param_counter += 1;
                params.push(SqlParameter::Text(format!("%{}%", escape_like(value))));
                sql
            }

            Condition::Or(left, right) => {
                let left_sql = left.to_sql(param_counter, params);
                let right_sql = right.to_sql(param_counter, params);
                format!("({} OR {})", left_sql, right_sql)
            }
        }
    }
}

// LIKE wildcards in user input match literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
