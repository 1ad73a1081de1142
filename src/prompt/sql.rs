//! SQL-generation prompt.
//!
//! The prompt carries everything the model knows about the database: the
//! fixed schema, the dialect, and the rules the generated query must obey.

use crate::database::Dialect;
use crate::database::schema;
use std::fmt::Write;

/// Row cap the model must apply to unbounded result sets.
pub const ROW_CAP: usize = 100;

/// Version of [`SYNONYM_GROUPS`]; bump when the table changes.
pub const SYNONYM_TABLE_VERSION: u32 = 1;

/// Domain terms the model must expand into OR-chains of substring filters.
///
/// A question mentioning any term in a group matches every term in it.
pub const SYNONYM_GROUPS: &[&[&str]] = &[
    &["educator", "teacher", "professor", "instructor", "lecturer"],
    &["attorney", "lawyer", "counsel", "legal"],
    &["physician", "doctor", "surgeon", "md"],
    &["retired", "retiree"],
    &["self-employed", "self employed", "owner", "entrepreneur"],
    &["engineer", "developer", "programmer"],
];

/// Builds the SQL-generation prompt for `PostgreSQL`.
///
/// # Examples
///
/// ```
/// use contrib_qa::prompt::build_sql_prompt;
///
/// let prompt = build_sql_prompt("Top 5 employers of teachers in Ohio");
/// assert!(prompt.contains("Top 5 employers of teachers in Ohio"));
/// assert!(prompt.contains("contributor_business"));
/// ```
#[must_use]
pub fn build_sql_prompt(question: &str) -> String {
    build_sql_prompt_for(question, Dialect::Postgres)
}

/// Builds the SQL-generation prompt for the given dialect.
#[must_use]
pub fn build_sql_prompt_for(question: &str, dialect: Dialect) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are an assistant specialized in U.S. Federal Election Commission (FEC) \
         individual contribution data.\n",
    );
    let _ = writeln!(
        prompt,
        "Translate the question below into a single safe, read-only {dialect} query.\n"
    );

    let _ = writeln!(prompt, "## Question\n\"{question}\"\n");

    prompt.push_str("## Schema\n");
    prompt.push_str(&schema::describe());
    prompt.push('\n');

    prompt.push_str("## Rules\n");
    for (i, rule) in rules(dialect).iter().enumerate() {
        let _ = writeln!(prompt, "{}. {rule}", i + 1);
    }

    prompt.push_str("\nReturn only the SQL query.");
    prompt
}

fn rules(dialect: Dialect) -> Vec<String> {
    vec![
        "Output SQL only: no commentary, explanation, or markdown code fences.".to_string(),
        "Do not use positional or named placeholders ($1, ?, :name). Inline every literal value."
            .to_string(),
        "Qualify every column with its table alias (for example c.full_name, ct.amount)."
            .to_string(),
        format!(
            "Filter text with case-insensitive substring matching on a '%value%' pattern, \
             e.g. {}. Never compare text with exact equality.",
            dialect.substring_filter_example()
        ),
        synonym_rule(dialect),
        "Every aggregate (SUM, COUNT) must come with a GROUP BY over all non-aggregated \
         selected columns."
            .to_string(),
        format!(
            "If the result is not already bounded (for example by a single aggregate row), \
             add LIMIT {ROW_CAP}."
        ),
        format!("The query must run directly against {dialect} without edits."),
    ]
}

fn synonym_rule(dialect: Dialect) -> String {
    let mut rule = String::from(
        "Expand these known synonyms automatically: when the question uses any term of a \
         group, OR together substring filters for every term in that group",
    );
    let example = match dialect {
        Dialect::Postgres => {
            "(cb.occupation ILIKE '%teacher%' OR cb.occupation ILIKE '%professor%' OR ...)"
        }
        Dialect::Sqlite => {
            "(LOWER(cb.occupation) LIKE '%teacher%' OR LOWER(cb.occupation) LIKE '%professor%' OR ...)"
        }
    };
    let _ = write!(rule, ", e.g. {example}:");
    for group in SYNONYM_GROUPS {
        let _ = write!(rule, "\n   - {}", group.join(", "));
    }
    rule
}
