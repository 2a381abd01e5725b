// ==========================================
// Andon 生产监控看板 - SQL 构建工具
// ==========================================
// 职责: 可选过滤条件的动态 SQL 拼接
// 约束: 条件与参数同步追加，值一律走占位符
// ==========================================

use rusqlite::types::Value;

/// 动态 SQL 构建器
///
/// # 示例
/// ```
/// use andon_monitor::repository::sql_builder::SqlQueryBuilder;
///
/// let (sql, params) = SqlQueryBuilder::new("SELECT * FROM production_progress")
///     .filter_if("line = ?", Some("L1"))
///     .filter_if("workshop = ?", None::<&str>)
///     .order_by("start_actual DESC")
///     .limit(20)
///     .build();
/// assert_eq!(
///     sql,
///     "SELECT * FROM production_progress WHERE line = ? ORDER BY start_actual DESC LIMIT 20"
/// );
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    select_clause: String,
    where_clauses: Vec<String>,
    params: Vec<Value>,
    order_by_clause: Option<String>,
    limit_clause: Option<usize>,
}

impl SqlQueryBuilder {
    pub fn new(select: &str) -> Self {
        Self {
            select_clause: select.to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_by_clause: None,
            limit_clause: None,
        }
    }

    /// 追加带参数的条件
    pub fn filter(mut self, condition: &str, values: impl IntoIterator<Item = Value>) -> Self {
        self.where_clauses.push(condition.to_string());
        self.params.extend(values);
        self
    }

    /// 值存在时追加单参数条件
    pub fn filter_if<S: AsRef<str>>(self, condition: &str, value: Option<S>) -> Self {
        match value {
            Some(v) => {
                let text = Value::Text(v.as_ref().to_string());
                self.filter(condition, std::iter::once(text))
            }
            None => self,
        }
    }

    pub fn order_by(mut self, order: &str) -> Self {
        self.order_by_clause = Some(order.to_string());
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit_clause = Some(n);
        self
    }

    /// 生成 SQL 与按顺序排列的参数
    pub fn build(self) -> (String, Vec<Value>) {
        let mut sql = self.select_clause;

        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(order) = self.order_by_clause {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }

        if let Some(n) = self.limit_clause {
            sql.push_str(&format!(" LIMIT {}", n));
        }

        (sql, self.params)
    }
}
