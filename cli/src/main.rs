use std::fs;
use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use protean_core::{
    Collection, CollectionConfig, FieldMap, ObjectSchema, Record, Value, record_from_json,
    record_to_json,
};
use protean_sqlite::SqliteDatabase;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "protean")]
#[command(about = "Store and query JSON records in self-extending SQLite tables")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Insert a JSON object, adding columns for new properties.
    Insert(InsertArgs),
    /// Print rows matching a JSON search object.
    Find(FindArgs),
    /// Print the row with the given id, or null.
    Get(GetArgs),
    /// Update the row with the given id from a JSON object.
    Update(UpdateArgs),
    /// Create or extend a table from a JSON schema document.
    Declare(DeclareArgs),
    /// Print the known fields of a table.
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
struct TableArgs {
    /// Database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table name.
    #[arg(long)]
    table: String,
    /// Collection configuration YAML.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct InsertArgs {
    #[command(flatten)]
    target: TableArgs,
    /// Record as JSON text. Read from stdin when omitted.
    #[arg(long)]
    json: Option<String>,
}

#[derive(Debug, Args)]
struct FindArgs {
    #[command(flatten)]
    target: TableArgs,
    /// Search object as JSON text. Matches every row when omitted.
    #[arg(long = "where")]
    filter: Option<String>,
}

#[derive(Debug, Args)]
struct GetArgs {
    #[command(flatten)]
    target: TableArgs,
    /// Primary key.
    #[arg(long)]
    id: String,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    #[command(flatten)]
    target: TableArgs,
    /// Primary key.
    #[arg(long)]
    id: i64,
    /// Changes as JSON text. Read from stdin when omitted.
    #[arg(long)]
    json: Option<String>,
}

#[derive(Debug, Args)]
struct DeclareArgs {
    #[command(flatten)]
    target: TableArgs,
    /// JSON schema document with a `properties` object.
    #[arg(long)]
    schema: PathBuf,
}

#[derive(Debug, Args)]
struct SchemaArgs {
    #[command(flatten)]
    target: TableArgs,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Insert(args) => run_insert(args),
        Command::Find(args) => run_find(args),
        Command::Get(args) => run_get(args),
        Command::Update(args) => run_update(args),
        Command::Declare(args) => run_declare(args),
        Command::Schema(args) => run_schema(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays valid JSON. `RUST_LOG` overrides the
/// default `warn` level.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ---------------------------------------------------------------------------
// commands
// ---------------------------------------------------------------------------

fn run_insert(args: InsertArgs) -> Result<(), String> {
    let model = read_record(args.json)?;
    let db = open_database(&args.target)?;
    let mut collection = open_collection(&db, &args.target)?;

    let stored = collection
        .insert(&model)
        .map_err(|e| format!("Insert into '{}' failed: {e}", args.target.table))?;
    print_json(&record_to_json(&stored))
}

fn run_find(args: FindArgs) -> Result<(), String> {
    let search = match args.filter {
        Some(text) => parse_record(&text)?,
        None => Record::new(),
    };
    let db = open_database(&args.target)?;
    let mut collection = open_collection(&db, &args.target)?;

    let rows = collection
        .find(&search)
        .map_err(|e| format!("Find in '{}' failed: {e}", args.target.table))?;
    let rows: Vec<serde_json::Value> = rows.iter().map(record_to_json).collect();
    print_json(&serde_json::Value::Array(rows))
}

fn run_get(args: GetArgs) -> Result<(), String> {
    let db = open_database(&args.target)?;
    let mut collection = open_collection(&db, &args.target)?;

    let row = collection
        .find_by_id(&Value::Text(args.id))
        .map_err(|e| format!("Lookup in '{}' failed: {e}", args.target.table))?;
    print_optional(row.as_ref())
}

fn run_update(args: UpdateArgs) -> Result<(), String> {
    let changes = read_record(args.json)?;
    let db = open_database(&args.target)?;
    let mut collection = open_collection(&db, &args.target)?;

    let row = collection
        .update(args.id, &changes)
        .map_err(|e| format!("Update of '{}' failed: {e}", args.target.table))?;
    print_optional(row.as_ref())
}

fn run_declare(args: DeclareArgs) -> Result<(), String> {
    let text = fs::read_to_string(&args.schema)
        .map_err(|e| format!("Failed to read schema '{}': {e}", args.schema.display()))?;
    let schema = ObjectSchema::from_json_str(&text).map_err(|e| e.to_string())?;
    let db = open_database(&args.target)?;
    let mut collection = open_collection(&db, &args.target)?;

    let fields = collection
        .declare(&schema)
        .map_err(|e| format!("Declare of '{}' failed: {e}", args.target.table))?;
    print_json(&fields_to_json(fields))
}

fn run_schema(args: SchemaArgs) -> Result<(), String> {
    let db = open_database(&args.target)?;
    let mut collection = open_collection(&db, &args.target)?;

    let fields = collection
        .ensure(&FieldMap::new())
        .map_err(|e| format!("Failed to read schema of '{}': {e}", args.target.table))?;
    print_json(&fields_to_json(fields))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_database(target: &TableArgs) -> Result<SqliteDatabase, String> {
    debug!(db = %target.db.display(), table = %target.table, "opening collection");
    SqliteDatabase::open(&target.db)
        .map_err(|e| format!("Failed to open database '{}': {e}", target.db.display()))
}

fn open_collection<'a>(
    db: &'a SqliteDatabase,
    target: &TableArgs,
) -> Result<Collection<'a, SqliteDatabase>, String> {
    let config = match &target.config {
        Some(path) => CollectionConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => CollectionConfig::default(),
    };
    db.collection_with_config(&target.table, config)
        .map_err(|e| e.to_string())
}

fn read_record(json: Option<String>) -> Result<Record, String> {
    let text = match json {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {e}"))?;
            buf
        }
    };
    parse_record(&text)
}

fn parse_record(text: &str) -> Result<Record, String> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {e}"))?;
    record_from_json(value).ok_or_else(|| "Expected a JSON object".to_string())
}

fn fields_to_json(fields: &FieldMap) -> serde_json::Value {
    fields
        .iter()
        .map(|(name, field)| {
            let mut entry = serde_json::Map::new();
            entry.insert("kind".into(), field.kind().as_str().into());
            entry.insert("not_null".into(), field.not_null().into());
            if let Some(default) = field.default_value() {
                entry.insert("default".into(), default.to_json());
            }
            (name.clone(), serde_json::Value::Object(entry))
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn print_optional(row: Option<&Record>) -> Result<(), String> {
    print_json(&row.map_or(serde_json::Value::Null, record_to_json))
}

fn print_json(value: &serde_json::Value) -> Result<(), String> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))?;
    println!("{text}");
    Ok(())
}
