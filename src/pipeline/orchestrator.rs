//! Per-question pipeline.
//!
//! Each question walks a fixed sequence of stages:
//!
//! ```text
//! Idle -> BuildingSqlPrompt -> GeneratingSql -> ExecutingQuery
//!      -> BuildingSummaryPrompt -> GeneratingAnswer -> Done
//! ```
//!
//! Either model stage can end in `Failed` once the client gives up. Query
//! failures do not stop the run: the empty table flows on to the summary
//! stage, which treats it like a query that matched nothing.

use crate::core::Table;
use crate::database::QueryExecutor;
use crate::database::executor::log_failure;
use crate::error::QueryError;
use crate::model::ModelClient;
use crate::pipeline::presenter::{Notice, Presenter, Stage};
use crate::prompt::{SYNONYM_TABLE_VERSION, build_sql_prompt_for, build_summary_prompt};
use serde::Serialize;
use tracing::{debug, info};

/// A successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// SQL produced by the model, exactly as executed.
    pub sql: String,
    /// Query result; empty when the query failed.
    pub table: Table,
    /// Execution failure message, if the query failed.
    pub query_error: Option<String>,
    /// Natural-language answer.
    pub answer: String,
}

impl Answer {
    /// Returns true when the table is empty because execution failed.
    #[must_use]
    pub const fn query_failed(&self) -> bool {
        self.query_error.is_some()
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The question was blank; nothing ran.
    EmptyQuestion,
    /// The pipeline produced an answer.
    Answered(Answer),
    /// A model stage gave up.
    Failed {
        /// `GeneratingSql` or `GeneratingAnswer`.
        stage: Stage,
        /// SQL generated before the failure, if any.
        sql: Option<String>,
    },
}

impl Outcome {
    /// The answer text, if the run produced one.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Answered(answer) => Some(&answer.answer),
            _ => None,
        }
    }
}

/// Pipeline state; each variant carries what the next stage needs.
enum Step {
    Idle {
        question: String,
    },
    BuildingSqlPrompt {
        question: String,
    },
    GeneratingSql {
        question: String,
        prompt: String,
    },
    ExecutingQuery {
        question: String,
        sql: String,
    },
    BuildingSummaryPrompt {
        question: String,
        sql: String,
        table: Table,
        query_error: Option<String>,
    },
    GeneratingAnswer {
        sql: String,
        table: Table,
        query_error: Option<String>,
        prompt: String,
    },
    Finished(Outcome),
}

impl Step {
    const fn stage(&self) -> Stage {
        match self {
            Self::Idle { .. } => Stage::Idle,
            Self::BuildingSqlPrompt { .. } => Stage::BuildingSqlPrompt,
            Self::GeneratingSql { .. } => Stage::GeneratingSql,
            Self::ExecutingQuery { .. } => Stage::ExecutingQuery,
            Self::BuildingSummaryPrompt { .. } => Stage::BuildingSummaryPrompt,
            Self::GeneratingAnswer { .. } => Stage::GeneratingAnswer,
            Self::Finished(Outcome::Failed { .. }) => Stage::Failed,
            Self::Finished(_) => Stage::Done,
        }
    }
}

/// Question-answering pipeline over one model client and one connection.
pub struct Pipeline {
    model: ModelClient,
    executor: QueryExecutor,
}

impl Pipeline {
    /// Creates a pipeline from an already-configured client and executor.
    #[must_use]
    pub const fn new(model: ModelClient, executor: QueryExecutor) -> Self {
        Self { model, executor }
    }

    /// Returns true if the pipeline holds a database connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.executor.is_connected()
    }

    /// Answers one question, reporting progress to `presenter`.
    pub fn ask(&mut self, question: &str, presenter: &mut dyn Presenter) -> Outcome {
        let mut step = Step::Idle {
            question: question.to_string(),
        };

        loop {
            let stage = step.stage();
            presenter.stage(stage);

            step = match step {
                Step::Finished(outcome) => {
                    info!(?stage, "pipeline finished");
                    return outcome;
                }
                other => {
                    debug!(?stage, "entering stage");
                    self.advance(other, presenter)
                }
            };
        }
    }

    fn advance(&mut self, step: Step, presenter: &mut dyn Presenter) -> Step {
        match step {
            Step::Idle { question } => {
                if question.trim().is_empty() {
                    presenter.notice(&Notice::EmptyQuestion);
                    return Step::Finished(Outcome::EmptyQuestion);
                }
                info!(question_len = question.len(), "received question");
                Step::BuildingSqlPrompt { question }
            }

            Step::BuildingSqlPrompt { question } => {
                let prompt = build_sql_prompt_for(&question, self.executor.dialect());
                debug!(
                    prompt_len = prompt.len(),
                    synonyms = SYNONYM_TABLE_VERSION,
                    "built SQL prompt"
                );
                Step::GeneratingSql { question, prompt }
            }

            Step::GeneratingSql { question, prompt } => match self.model.invoke(&prompt) {
                Some(sql) => {
                    info!(sql = %sql, "generated SQL");
                    presenter.generated_sql(&sql);
                    Step::ExecutingQuery { question, sql }
                }
                None => {
                    presenter.notice(&Notice::SqlGenerationFailed);
                    Step::Finished(Outcome::Failed {
                        stage: Stage::GeneratingSql,
                        sql: None,
                    })
                }
            },

            Step::ExecutingQuery { question, sql } => {
                let (table, query_error) = match self.executor.run(&sql) {
                    Ok(table) => {
                        presenter.preview(&table);
                        (table, None)
                    }
                    Err(err) => {
                        log_failure(&err);
                        let notice = match &err {
                            QueryError::NotConnected => Notice::NotConnected,
                            other => Notice::QueryFailed(other.to_string()),
                        };
                        presenter.notice(&notice);
                        (Table::empty(), Some(err.to_string()))
                    }
                };
                Step::BuildingSummaryPrompt {
                    question,
                    sql,
                    table,
                    query_error,
                }
            }

            Step::BuildingSummaryPrompt {
                question,
                sql,
                table,
                query_error,
            } => {
                let prompt = build_summary_prompt(&question, &table);
                debug!(prompt_len = prompt.len(), rows = table.row_count(), "built summary prompt");
                Step::GeneratingAnswer {
                    sql,
                    table,
                    query_error,
                    prompt,
                }
            }

            Step::GeneratingAnswer {
                sql,
                table,
                query_error,
                prompt,
            } => match self.model.invoke(&prompt) {
                Some(answer) => {
                    presenter.answer(&answer);
                    Step::Finished(Outcome::Answered(Answer {
                        sql,
                        table,
                        query_error,
                        answer,
                    }))
                }
                None => {
                    presenter.notice(&Notice::AnswerGenerationFailed);
                    Step::Finished(Outcome::Failed {
                        stage: Stage::GeneratingAnswer,
                        sql: Some(sql),
                    })
                }
            },

            finished @ Step::Finished(_) => finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::core::Value;
    use crate::database::{Database, Dialect, SqliteDatabase, schema};
    use crate::error::ModelError;
    use crate::model::{ModelRequest, ModelResponse, ModelTransport, Sleeper};
    use crate::pipeline::presenter::Transcript;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Replays canned replies and records every prompt it receives.
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        replies: Arc<Mutex<VecDeque<Option<&'static str>>>>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedTransport {
        fn new(replies: &[Option<&'static str>]) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.iter().copied().collect())),
                prompts: Arc::default(),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl ModelTransport for ScriptedTransport {
        fn send(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
            self.prompts
                .lock()
                .unwrap()
                .push(request.prompt().unwrap_or_default().to_string());
            match self.replies.lock().unwrap().pop_front().flatten() {
                Some(text) => Ok(ModelResponse::text(text.to_string())),
                None => Err(ModelError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                }),
            }
        }
    }

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _duration: Duration) {}
    }

    fn client(transport: &ScriptedTransport, max_retries: u32) -> ModelClient {
        ModelClient::new(
            Box::new(transport.clone()),
            "test-model",
            RetryPolicy::with_max_retries(max_retries),
        )
        .with_sleeper(Box::new(NoSleep))
    }

    fn seeded_db() -> SqliteDatabase {
        let mut db = SqliteDatabase::in_memory().unwrap();
        db.execute_batch(&schema::ddl()).unwrap();
        db.execute_batch(
            "INSERT INTO contributors VALUES (1, 'SMITH, JOHN', 'JOHN', 'SMITH');
             INSERT INTO contributions VALUES
                 (1, 1, 'C00000001', 300, '2022-03-01', 2022, '15', NULL),
                 (2, 1, 'C00000001', 200, '2022-09-15', 2022, '15', NULL);",
        )
        .unwrap();
        db
    }

    const TOTAL_SQL: &str = "SELECT SUM(ct.amount) AS total FROM contributions ct \
        JOIN contributors c ON c.contributor_id = ct.contributor_id \
        WHERE c.full_name = 'SMITH, JOHN' AND ct.election_cycle = 2022";

    #[test]
    fn test_answers_with_single_row_result() {
        let transport = ScriptedTransport::new(&[
            Some(TOTAL_SQL),
            Some("John Smith gave $500 across two contributions in 2022."),
        ]);
        let mut pipeline = Pipeline::new(
            client(&transport, 3),
            QueryExecutor::new(Box::new(seeded_db())),
        );
        let mut transcript = Transcript::new();

        let outcome = pipeline.ask("How much did John Smith donate in 2022?", &mut transcript);

        let Outcome::Answered(answer) = outcome else {
            unreachable!("expected an answer, got {outcome:?}");
        };
        assert_eq!(answer.sql, TOTAL_SQL);
        assert_eq!(answer.table.row_count(), 1);
        assert_eq!(answer.table.get(0, "total"), Some(&Value::Int(500)));
        assert!(!answer.query_failed());
        assert!(!answer.answer.is_empty());
        assert!(!answer.answer.contains("SQL"));

        let prompts = transport.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("How much did John Smith donate in 2022?"));
        assert!(prompts[0].contains(Dialect::Sqlite.name()));
        assert!(prompts[1].contains("total"));
        assert!(prompts[1].contains("500"));
        assert!(prompts[1].contains("1 row"));

        assert_eq!(
            transcript.stages,
            vec![
                Stage::Idle,
                Stage::BuildingSqlPrompt,
                Stage::GeneratingSql,
                Stage::ExecutingQuery,
                Stage::BuildingSummaryPrompt,
                Stage::GeneratingAnswer,
                Stage::Done,
            ]
        );
        assert_eq!(transcript.sql.as_deref(), Some(TOTAL_SQL));
        assert!(transcript.table.is_some());
        assert!(transcript.notices.is_empty());
    }

    #[test]
    fn test_empty_result_uses_no_results_template() {
        let transport = ScriptedTransport::new(&[
            Some("SELECT * FROM contributor_addresses WHERE state = 'MARS'"),
            Some("No contributions from Mars were found. Try a U.S. state instead."),
        ]);
        let mut pipeline = Pipeline::new(
            client(&transport, 3),
            QueryExecutor::new(Box::new(seeded_db())),
        );

        let outcome = pipeline.ask("donations from Mars", &mut Transcript::new());

        let Outcome::Answered(answer) = outcome else {
            unreachable!("expected an answer, got {outcome:?}");
        };
        assert!(answer.table.is_empty());
        assert!(!answer.query_failed());
        assert!(!answer.answer.is_empty());
        assert!(transport.prompts()[1].contains("no matching records"));
    }

    #[test]
    fn test_blank_question_never_calls_model() {
        let transport = ScriptedTransport::new(&[]);
        let mut pipeline = Pipeline::new(client(&transport, 3), QueryExecutor::disconnected());
        let mut transcript = Transcript::new();

        let outcome = pipeline.ask("   \t", &mut transcript);

        assert_eq!(outcome, Outcome::EmptyQuestion);
        assert!(transport.prompts().is_empty());
        assert_eq!(transcript.notices, vec![Notice::EmptyQuestion]);
        assert_eq!(transcript.stages, vec![Stage::Idle, Stage::Done]);
    }

    #[test]
    fn test_sql_generation_failure() {
        let transport = ScriptedTransport::new(&[None, None]);
        let mut pipeline = Pipeline::new(
            client(&transport, 2),
            QueryExecutor::new(Box::new(seeded_db())),
        );
        let mut transcript = Transcript::new();

        let outcome = pipeline.ask("Who gave the most?", &mut transcript);

        assert_eq!(
            outcome,
            Outcome::Failed {
                stage: Stage::GeneratingSql,
                sql: None
            }
        );
        assert_eq!(transport.prompts().len(), 2);
        assert_eq!(transcript.notices, vec![Notice::SqlGenerationFailed]);
        assert_eq!(transcript.stages.last(), Some(&Stage::Failed));
        assert!(!transcript.stages.contains(&Stage::ExecutingQuery));
    }

    #[test]
    fn test_answer_generation_failure_keeps_sql() {
        let transport = ScriptedTransport::new(&[Some(TOTAL_SQL), None]);
        let mut pipeline = Pipeline::new(
            client(&transport, 1),
            QueryExecutor::new(Box::new(seeded_db())),
        );
        let mut transcript = Transcript::new();

        let outcome = pipeline.ask("How much did John Smith donate in 2022?", &mut transcript);

        assert_eq!(
            outcome,
            Outcome::Failed {
                stage: Stage::GeneratingAnswer,
                sql: Some(TOTAL_SQL.to_string())
            }
        );
        assert_eq!(outcome.answer(), None);
        assert_eq!(transcript.notices, vec![Notice::AnswerGenerationFailed]);
    }

    #[test]
    fn test_query_failure_continues_with_empty_table() {
        let transport = ScriptedTransport::new(&[
            Some("SELECT * FROM donors"),
            Some("No matching records were found."),
        ]);
        let mut pipeline = Pipeline::new(
            client(&transport, 3),
            QueryExecutor::new(Box::new(seeded_db())),
        );
        let mut transcript = Transcript::new();

        let outcome = pipeline.ask("List all donors", &mut transcript);

        let Outcome::Answered(answer) = outcome else {
            unreachable!("expected an answer, got {outcome:?}");
        };
        assert!(answer.query_failed());
        assert_eq!(answer.table, Table::empty());
        assert!(transport.prompts()[1].contains("no matching records"));
        assert!(transcript.table.is_none());
        assert!(matches!(
            transcript.notices.as_slice(),
            [Notice::QueryFailed(msg)] if msg.starts_with("SQL execution error:")
        ));
    }

    #[test]
    fn test_disconnected_pipeline_still_answers() {
        let transport = ScriptedTransport::new(&[
            Some("SELECT 1"),
            Some("I could not find any matching records."),
        ]);
        let mut pipeline = Pipeline::new(client(&transport, 3), QueryExecutor::disconnected());
        let mut transcript = Transcript::new();

        let outcome = pipeline.ask("Top donors in Ohio", &mut transcript);

        assert!(!pipeline.is_connected());
        assert!(transport.prompts()[0].contains(Dialect::Postgres.name()));
        assert_eq!(transcript.notices, vec![Notice::NotConnected]);
        let Outcome::Answered(answer) = outcome else {
            unreachable!("expected an answer, got {outcome:?}");
        };
        assert_eq!(
            answer.query_error.as_deref(),
            Some("database connection not established")
        );
    }

    #[test]
    fn test_outcome_json() {
        let outcome = Outcome::Failed {
            stage: Stage::GeneratingSql,
            sql: None,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["stage"], "generating_sql");
    }
}
