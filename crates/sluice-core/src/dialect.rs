use crate::model::{ConflictStrategy, IndexModel, SqlType, TableModel};

///
/// Dialect
///
/// Engine-specific SQL text. Handlers build their statement shapes here
/// once, at construction; `Database` builds DDL here during `init`.
///

pub trait Dialect: Send + Sync {
    fn quote(&self, ident: &str) -> String {
        format!("\"{ident}\"")
    }

    /// `count` comma-separated positional markers.
    fn placeholders(&self, count: usize) -> String {
        vec!["?"; count].join(", ")
    }

    fn insert(&self, table: &str, columns: &[&str], conflict: ConflictStrategy) -> String {
        let verb = match conflict.keyword() {
            Some(keyword) => format!("INSERT OR {keyword} INTO"),
            None => "INSERT INTO".to_string(),
        };

        format!(
            "{verb} {} ({}) VALUES ({})",
            self.quote(table),
            self.column_list(columns),
            self.placeholders(columns.len())
        )
    }

    /// SET every column, WHERE every key column.
    fn update(
        &self,
        table: &str,
        conflict: ConflictStrategy,
        columns: &[&str],
        keys: &[&str],
    ) -> String {
        let verb = match conflict.keyword() {
            Some(keyword) => format!("UPDATE OR {keyword}"),
            None => "UPDATE".to_string(),
        };
        let set = columns
            .iter()
            .map(|c| format!("{} = ?", self.quote(c)))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "{verb} {} SET {set} WHERE {}",
            self.quote(table),
            self.predicate(keys)
        )
    }

    fn delete(&self, table: &str, keys: &[&str]) -> String {
        format!(
            "DELETE FROM {} WHERE {}",
            self.quote(table),
            self.predicate(keys)
        )
    }

    fn column_type(&self, sql_type: SqlType) -> String {
        sql_type.to_string()
    }

    fn create_table(&self, table: &TableModel) -> String;

    fn create_index(&self, table: &TableModel, index: &IndexModel) -> String;

    fn drop_table(&self, table: &TableModel) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote(table.name))
    }

    fn clear_table(&self, table: &TableModel) -> String {
        format!("DELETE FROM {}", self.quote(table.name))
    }

    /// SQL run on every new connection, if any.
    fn init_connection(&self) -> Option<String> {
        None
    }

    // helpers

    fn column_list(&self, columns: &[&str]) -> String {
        columns
            .iter()
            .map(|c| self.quote(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn predicate(&self, keys: &[&str]) -> String {
        keys.iter()
            .map(|k| format!("{} = ?", self.quote(k)))
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

///
/// GenericDialect
///
/// ANSI DDL with SQLite conflict clauses. A single auto-generated integer
/// key becomes `INTEGER PRIMARY KEY AUTOINCREMENT`.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GenericDialect;

impl GenericDialect {
    fn inline_key<'a>(table: &'a TableModel) -> Option<&'a str> {
        let key = &table.primary_key;
        match key.columns {
            [column] if key.auto_generate => table
                .column(column)
                .filter(|c| c.sql_type.is_integer())
                .map(|c| c.name),
            _ => None,
        }
    }
}

impl Dialect for GenericDialect {
    fn create_table(&self, table: &TableModel) -> String {
        let inline_key = Self::inline_key(table);

        let mut parts: Vec<String> = table
            .columns
            .iter()
            .map(|column| {
                if inline_key == Some(column.name) {
                    return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", self.quote(column.name));
                }

                let mut def = format!(
                    "{} {}",
                    self.quote(column.name),
                    self.column_type(column.sql_type)
                );
                if !column.nullable {
                    def.push_str(" NOT NULL");
                }
                if let Some(default) = column.default {
                    def.push_str(" DEFAULT ");
                    def.push_str(default);
                }

                def
            })
            .collect();

        if inline_key.is_none() && !table.primary_key.is_missing() {
            parts.push(format!(
                "PRIMARY KEY ({})",
                self.column_list(table.primary_key.columns)
            ));
        }

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.quote(table.name),
            parts.join(", ")
        )
    }

    fn create_index(&self, table: &TableModel, index: &IndexModel) -> String {
        let unique = if index.unique { "UNIQUE " } else { "" };
        let columns = index
            .columns
            .iter()
            .map(|c| format!("{} {}", self.quote(c.column), c.order))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "CREATE {unique}INDEX {} ON {} ({columns})",
            self.quote(index.name),
            self.quote(table.name)
        )
    }
}
