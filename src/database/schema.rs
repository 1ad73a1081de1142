//! The fixed contribution schema.
//!
//! The schema is hard-coded: the SQL-generation prompt describes it to the
//! model and `contrib-qa init` creates it. Nothing is introspected from the
//! live database.

use std::fmt::Write;

/// A column of a schema relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: &'static str,
    /// SQL type, valid in both `PostgreSQL` and `SQLite`.
    pub sql_type: &'static str,
    /// True for the primary key.
    pub primary_key: bool,
    /// Referenced `(table, column)` for foreign keys.
    pub references: Option<(&'static str, &'static str)>,
    /// Short note for the model (format, units, coding).
    pub note: Option<&'static str>,
}

/// A relation of the contribution schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    /// Table name.
    pub name: &'static str,
    /// Alias the model must use when qualifying columns.
    pub alias: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Columns in declaration order.
    pub columns: &'static [Column],
}

impl Relation {
    /// Iterates over the foreign-key columns of this relation.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&'static str, (&'static str, &'static str))> {
        self.columns
            .iter()
            .filter_map(|c| c.references.map(|target| (c.name, target)))
    }
}

const fn col(name: &'static str, sql_type: &'static str) -> Column {
    Column {
        name,
        sql_type,
        primary_key: false,
        references: None,
        note: None,
    }
}

const fn pk(name: &'static str) -> Column {
    Column {
        name,
        sql_type: "BIGINT",
        primary_key: true,
        references: None,
        note: None,
    }
}

const fn contributor_fk() -> Column {
    Column {
        name: "contributor_id",
        sql_type: "BIGINT NOT NULL",
        primary_key: false,
        references: Some(("contributors", "contributor_id")),
        note: None,
    }
}

const fn noted(column: Column, note: &'static str) -> Column {
    Column {
        note: Some(note),
        ..column
    }
}

/// Individual contributors.
pub const CONTRIBUTORS: Relation = Relation {
    name: "contributors",
    alias: "c",
    description: "One row per individual contributor.",
    columns: &[
        pk("contributor_id"),
        noted(
            col("full_name", "TEXT NOT NULL"),
            "as filed, usually \"LAST, FIRST MIDDLE\"",
        ),
        col("first_name", "TEXT"),
        col("last_name", "TEXT"),
    ],
};

/// Mailing addresses reported with contributions.
pub const CONTRIBUTOR_ADDRESSES: Relation = Relation {
    name: "contributor_addresses",
    alias: "ca",
    description: "Addresses reported by contributors.",
    columns: &[
        pk("address_id"),
        contributor_fk(),
        col("street", "TEXT"),
        col("city", "TEXT"),
        noted(col("state", "TEXT"), "two-letter postal code, e.g. 'TX'"),
        noted(col("zip_code", "TEXT"), "5 or 9 digits, stored as text"),
    ],
};

/// Employer and occupation reported with contributions.
pub const CONTRIBUTOR_BUSINESS: Relation = Relation {
    name: "contributor_business",
    alias: "cb",
    description: "Employer and occupation reported by contributors.",
    columns: &[
        pk("business_id"),
        contributor_fk(),
        noted(col("employer", "TEXT"), "free text, e.g. 'SELF-EMPLOYED', 'RETIRED'"),
        noted(col("occupation", "TEXT"), "free text as filed"),
    ],
};

/// Individual contribution transactions.
pub const CONTRIBUTIONS: Relation = Relation {
    name: "contributions",
    alias: "ct",
    description: "One row per contribution transaction.",
    columns: &[
        pk("contribution_id"),
        contributor_fk(),
        noted(col("committee_id", "TEXT"), "FEC committee ID, e.g. 'C00401224'"),
        noted(col("amount", "NUMERIC(12,2)"), "US dollars; negative for refunds"),
        col("contribution_date", "DATE"),
        noted(col("election_cycle", "INTEGER"), "two-year cycle, e.g. 2022"),
        noted(col("transaction_type", "TEXT"), "FEC transaction type code, e.g. '15'"),
        col("memo", "TEXT"),
    ],
};

/// All relations, parents first.
pub const RELATIONS: [Relation; 4] = [
    CONTRIBUTORS,
    CONTRIBUTOR_ADDRESSES,
    CONTRIBUTOR_BUSINESS,
    CONTRIBUTIONS,
];

/// Returns the names of every relation.
#[must_use]
pub fn table_names() -> Vec<&'static str> {
    RELATIONS.iter().map(|r| r.name).collect()
}

/// Describes the schema for the SQL-generation prompt.
///
/// Lists each relation with its alias, columns, types and notes, followed
/// by the foreign-key relationships.
#[must_use]
pub fn describe() -> String {
    let mut output = String::new();

    for relation in &RELATIONS {
        let _ = writeln!(
            output,
            "{} (alias {}): {}",
            relation.name, relation.alias, relation.description
        );
        for column in relation.columns {
            let key = if column.primary_key { " PRIMARY KEY" } else { "" };
            let _ = write!(output, "  - {} {}{key}", column.name, column.sql_type);
            if let Some(note) = column.note {
                let _ = write!(output, " -- {note}");
            }
            output.push('\n');
        }
        output.push('\n');
    }

    output.push_str("Relationships:\n");
    for relation in &RELATIONS {
        for (column, (table, target)) in relation.foreign_keys() {
            let _ = writeln!(output, "  - {}.{column} -> {table}.{target}", relation.name);
        }
    }

    output
}

/// Returns DDL creating the schema.
///
/// Uses only types and constraints both `PostgreSQL` and `SQLite` accept,
/// and is idempotent (`IF NOT EXISTS`).
#[must_use]
pub fn ddl() -> String {
    let mut output = String::new();

    for relation in &RELATIONS {
        let _ = writeln!(output, "CREATE TABLE IF NOT EXISTS {} (", relation.name);
        let columns: Vec<String> = relation
            .columns
            .iter()
            .map(|c| {
                let mut line = format!("    {} {}", c.name, c.sql_type);
                if c.primary_key {
                    line.push_str(" PRIMARY KEY");
                }
                if let Some((table, target)) = c.references {
                    let _ = write!(line, " REFERENCES {table}({target})");
                }
                line
            })
            .collect();
        output.push_str(&columns.join(",\n"));
        output.push_str("\n);\n");

        for (column, _) in relation.foreign_keys() {
            let _ = writeln!(
                output,
                "CREATE INDEX IF NOT EXISTS idx_{table}_{column} ON {table}({column});",
                table = relation.name
            );
        }
        output.push('\n');
    }

    output
}
