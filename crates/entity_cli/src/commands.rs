use crate::cli::{join_name, BatchLine, Cli, Command, Operation, OutputFormat};
use crate::config::{Config, StorageBackend};
use anyhow::{anyhow, Context};
use entity_core::db::open_db;
use entity_core::{
    init_logging, Entity, EntityError, EntityId, EntityRepository, EntityService, ErrorKind,
    InMemoryEntityRepository, SqliteEntityRepository,
};
use log::{error, info};
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Instant;

type DynRepository = Box<dyn EntityRepository + Send + Sync>;
type Service = EntityService<DynRepository>;

const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Successful operation result, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(EntityId),
    Found(Entity),
    Updated(EntityId),
    Deleted(EntityId),
    Listed(Vec<Entity>),
}

/// Loads configuration, wires store and service, and runs the command.
pub fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::from_env()
        .and_then(|config| config.apply_args(&cli.global))
        .context("invalid configuration")?;

    init_logging(&config.log_level, config.log_target.clone())
        .map_err(|message| anyhow!(message))
        .context("failed to initialize logging")?;
    info!(
        "event=cli_start module=cli status=ok env={} storage={} version={}",
        config.env,
        storage_label(&config.storage),
        entity_core::core_version()
    );

    let service = EntityService::new(open_store(&config.storage)?);
    let format = cli.global.format;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let status = match cli.command {
        Command::Op(op) => execute(&service, &op, format, &mut out)?,
        Command::Batch => run_batch(&service, io::stdin().lock(), format, &mut out)?,
    };

    out.flush()?;
    Ok(ExitCode::from(status))
}

fn open_store(storage: &StorageBackend) -> anyhow::Result<DynRepository> {
    match storage {
        StorageBackend::Memory => Ok(Box::new(InMemoryEntityRepository::new())),
        StorageBackend::Sqlite(path) => {
            let conn = open_db(path)
                .with_context(|| format!("failed to open database `{}`", path.display()))?;
            let repo = SqliteEntityRepository::try_new(conn)
                .with_context(|| format!("database `{}` is not usable", path.display()))?;
            Ok(Box::new(repo))
        }
    }
}

fn storage_label(storage: &StorageBackend) -> String {
    match storage {
        StorageBackend::Memory => "memory".to_string(),
        StorageBackend::Sqlite(path) => format!("sqlite:{}", path.display()),
    }
}

/// Runs one operation and renders its outcome; returns the exit status.
fn execute<W: Write>(
    service: &Service,
    op: &Operation,
    format: OutputFormat,
    out: &mut W,
) -> io::Result<u8> {
    let started_at = Instant::now();

    match dispatch(service, op) {
        Ok(outcome) => {
            info!(
                "event=operation module=cli status=ok op={} duration_ms={}",
                op.name(),
                started_at.elapsed().as_millis()
            );
            render_outcome(&outcome, format, out)?;
            Ok(0)
        }
        Err(err) => {
            report_error(op.name(), &err);
            render_error(err.kind(), &public_message(&err), format, out)?;
            Ok(exit_status(err.kind()))
        }
    }
}

pub fn dispatch<R: EntityRepository>(
    service: &EntityService<R>,
    op: &Operation,
) -> Result<Outcome, EntityError> {
    match op {
        Operation::Create { name } => service
            .create(&Entity::new(join_name(name)))
            .map(Outcome::Created),
        Operation::Get { id } => service.get_by_id(id).map(Outcome::Found),
        Operation::Update { id, name } => service
            .update(&Entity::with_id(id.clone(), join_name(name)))
            .map(|()| Outcome::Updated(id.clone())),
        Operation::Delete { id } => service.delete(id).map(|()| Outcome::Deleted(id.clone())),
        Operation::List => service.list().map(Outcome::Listed),
    }
}

/// Executes stdin lines in order; blank lines and `#` comments are skipped.
///
/// Every line runs even after a failure. The returned status is the one of the
/// first failing line, or 0.
fn run_batch<B: BufRead, W: Write>(
    service: &Service,
    input: B,
    format: OutputFormat,
    out: &mut W,
) -> io::Result<u8> {
    let mut status = 0;

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let line_status = match BatchLine::parse_line(trimmed) {
            Ok(op) => execute(service, &op, format, out)?,
            Err(err) => {
                let message = format!("line {}: {}", index + 1, first_line(&err.to_string()));
                render_error(ErrorKind::InvalidInput, &message, format, out)?;
                exit_status(ErrorKind::InvalidInput)
            }
        };

        if status == 0 {
            status = line_status;
        }
    }

    Ok(status)
}

/// Exit status for a failure kind.
pub fn exit_status(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::InvalidInput => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Conflict => 4,
    }
}

/// Internal failures are defects and get logged; classified ones are expected.
fn report_error(op: &str, err: &EntityError) {
    if err.kind() == ErrorKind::Internal {
        error!(
            "event=operation module=cli status=error op={op} error_kind={} error={err}",
            err.kind()
        );
    } else {
        info!(
            "event=operation module=cli status=rejected op={op} error_kind={}",
            err.kind()
        );
    }
}

/// Message shown to the caller; internal detail stays in the log.
fn public_message(err: &EntityError) -> String {
    match err.kind() {
        ErrorKind::Internal => INTERNAL_ERROR_MESSAGE.to_string(),
        _ => err.to_string(),
    }
}

pub fn render_outcome<W: Write>(
    outcome: &Outcome,
    format: OutputFormat,
    out: &mut W,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = match outcome {
                Outcome::Created(id) => json!({ "id": id, "status": "created" }),
                Outcome::Updated(id) => json!({ "id": id, "status": "updated" }),
                Outcome::Deleted(id) => json!({ "id": id, "status": "deleted" }),
                Outcome::Found(entity) => json!(entity),
                Outcome::Listed(entities) => json!(entities),
            };
            writeln!(out, "{value}")
        }
        OutputFormat::Text => match outcome {
            Outcome::Created(id) => writeln!(out, "created {id}"),
            Outcome::Updated(id) => writeln!(out, "updated {id}"),
            Outcome::Deleted(id) => writeln!(out, "deleted {id}"),
            Outcome::Found(entity) => write_entity_row(entity, out),
            Outcome::Listed(entities) => {
                for entity in entities {
                    write_entity_row(entity, out)?;
                }
                Ok(())
            }
        },
    }
}

fn write_entity_row<W: Write>(entity: &Entity, out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{}\t{}\t{}\t{}",
        entity.id, entity.name, entity.created_at, entity.updated_at
    )
}

fn render_error<W: Write>(
    kind: ErrorKind,
    message: &str,
    format: OutputFormat,
    out: &mut W,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => writeln!(
            out,
            "{}",
            json!({ "error": { "kind": kind.as_str(), "message": message } })
        ),
        OutputFormat::Text => {
            eprintln!("error[{kind}]: {message}");
            Ok(())
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{
        dispatch, exit_status, public_message, render_outcome, run_batch, Outcome,
        INTERNAL_ERROR_MESSAGE,
    };
    use crate::cli::{Operation, OutputFormat};
    use entity_core::{
        Entity, EntityError, EntityService, ErrorKind, InMemoryEntityRepository, RepoError,
    };

    fn words(name: &str) -> Vec<String> {
        name.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn exit_statuses_are_distinct_per_kind() {
        assert_eq!(exit_status(ErrorKind::Internal), 1);
        assert_eq!(exit_status(ErrorKind::InvalidInput), 2);
        assert_eq!(exit_status(ErrorKind::NotFound), 3);
        assert_eq!(exit_status(ErrorKind::Conflict), 4);
    }

    #[test]
    fn dispatch_runs_the_full_lifecycle() {
        let service = EntityService::new(InMemoryEntityRepository::new());

        let id = match dispatch(&service, &Operation::Create { name: words("Alice Smith") }) {
            Ok(Outcome::Created(id)) => id,
            other => panic!("unexpected outcome: {other:?}"),
        };

        let update = Operation::Update {
            id: id.clone(),
            name: words("Alicia"),
        };
        assert_eq!(
            dispatch(&service, &update).unwrap(),
            Outcome::Updated(id.clone())
        );

        match dispatch(&service, &Operation::Get { id: id.clone() }) {
            Ok(Outcome::Found(entity)) => assert_eq!(entity.name, "Alicia"),
            other => panic!("unexpected outcome: {other:?}"),
        }

        dispatch(&service, &Operation::Delete { id: id.clone() }).unwrap();
        let err = dispatch(&service, &Operation::Get { id }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn dispatch_surfaces_empty_name_as_invalid_input() {
        let service = EntityService::new(InMemoryEntityRepository::new());

        let err = dispatch(
            &service,
            &Operation::Create {
                name: vec![String::new()],
            },
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(service.list().unwrap().is_empty());
    }

    #[test]
    fn json_rendering_uses_wire_field_names() {
        let entity = Entity {
            id: "abc".to_string(),
            name: "Alice".to_string(),
            created_at: 10,
            updated_at: 20,
        };
        let mut out = Vec::new();

        render_outcome(&Outcome::Found(entity), OutputFormat::Json, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["createdAt"], 10);
        assert_eq!(value["updatedAt"], 20);
    }

    #[test]
    fn batch_keeps_going_and_reports_first_failure() {
        let repo: super::DynRepository = Box::new(InMemoryEntityRepository::new());
        let service: super::Service = EntityService::new(repo);
        let input = "# seed\ncreate Alice\n\nget missing-id\nbogus\nlist\n";
        let mut out = Vec::new();

        let status = run_batch(&service, input.as_bytes(), OutputFormat::Json, &mut out).unwrap();

        assert_eq!(status, exit_status(ErrorKind::NotFound));
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["status"], "created");
        assert_eq!(lines[1]["error"]["kind"], "not_found");
        assert_eq!(lines[2]["error"]["kind"], "invalid_input");
        assert_eq!(lines[3].as_array().unwrap().len(), 1);
    }

    #[test]
    fn batch_hands_names_to_the_service_verbatim() {
        let repo: super::DynRepository = Box::new(InMemoryEntityRepository::new());
        let service: super::Service = EntityService::new(repo);
        let input = "create Alice   Smith\ncreate -x\nupdate missing  Bob\n";
        let mut out = Vec::new();

        let status = run_batch(&service, input.as_bytes(), OutputFormat::Json, &mut out).unwrap();

        assert_eq!(status, exit_status(ErrorKind::NotFound));
        let mut names: Vec<String> = service
            .list()
            .unwrap()
            .into_iter()
            .map(|entity| entity.name)
            .collect();
        names.sort();
        assert_eq!(names, ["-x".to_string(), "Alice   Smith".to_string()]);
    }

    #[test]
    fn internal_failures_hide_their_detail_from_the_caller() {
        let internal = EntityError::from(RepoError::LockPoisoned).with_context("list entities");
        assert_eq!(public_message(&internal), INTERNAL_ERROR_MESSAGE);

        let not_found = EntityError::from(RepoError::NotFound("abc".to_string()))
            .with_context("find entity with id abc");
        assert!(public_message(&not_found).contains("abc"));
    }
}
