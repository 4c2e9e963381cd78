// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Workspace automation, run as `cargo xtask <command>`.
//!
//! Besides wrapping the usual cargo invocations, `verify-migrations`
//! applies the embedded `SQLite` migrations to an in-memory database and
//! checks the shape the document store relies on: text primary keys, a
//! non-null `version` column, the booking to zone foreign key and the
//! booking lookup indexes. It then reverts every migration and checks that
//! nothing is left behind.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::{io, process::Output};

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{eyre::Context, Result};
use diesel::sql_types::{Integer, Text};
use diesel::{QueryableByName, RunQueryDsl, SqliteConnection};
use duct::cmd;
use std::collections::{BTreeMap, BTreeSet};
use tracing_log::AsTrace;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.verbosity.log_level_filter().as_trace())
        .without_time()
        .init();

    if let Err(err) = args.command.run() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

#[derive(Clone, Copy, Debug, Subcommand)]
enum Command {
    /// Lint, build, test and verify migrations
    CI,

    /// Build every target
    #[command(visible_alias = "b")]
    Build,

    /// Clippy, rustdoc, rustfmt and typos
    #[command(visible_alias = "l")]
    Lint,

    /// Apply rustfmt and typo fixes in place
    #[command(visible_alias = "f")]
    Fix,

    /// Run unit and doc tests
    #[command(visible_alias = "t")]
    Test,

    /// Check the `SQLite` migrations against the document store layout
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => {
                lint()?;
                build()?;
                test()?;
                verify_migrations()
            }
            Self::Build => build(),
            Self::Lint => lint(),
            Self::Fix => {
                cargo_nightly(&["fmt", "--all"])?;
                cmd!("typos", "-w").run_with_trace()?;
                Ok(())
            }
            Self::Test => test(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

fn build() -> Result<()> {
    cargo(&["build", "--all-targets", "--all-features"])
}

fn lint() -> Result<()> {
    cargo(&["clippy", "--all-targets", "--all-features", "--", "-D", "warnings"])?;
    lint_docs()?;
    cargo_nightly(&["fmt", "--all", "--check"])?;
    cmd!("typos").run_with_trace()?;
    Ok(())
}

/// Builds rustdoc for each default member with warnings denied.
fn lint_docs() -> Result<()> {
    let meta = MetadataCommand::new()
        .exec()
        .wrap_err("failed to get cargo metadata")?;

    for package in meta.workspace_default_packages() {
        let name: &str = &package.name;
        cmd("cargo", ["doc", "--no-deps", "--all-features", "--package", name])
            .env_remove("CARGO")
            .env("RUSTUP_TOOLCHAIN", "nightly")
            .env("RUSTDOCFLAGS", "--cfg docsrs -D warnings")
            .run_with_trace()?;
    }
    Ok(())
}

fn test() -> Result<()> {
    cargo(&["test", "--all-targets", "--all-features"])?;
    cargo(&["test", "--doc", "--all-features"])
}

fn cargo(args: &[&str]) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

fn cargo_nightly(args: &[&str]) -> Result<()> {
    // CARGO is inherited from the outer `cargo xtask` invocation.
    cmd("cargo", args)
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

/// Tables every document collection is stored in.
const DOCUMENT_TABLES: [(&str, &str); 2] =
    [("parking_zones", "zone_id"), ("bookings", "booking_id")];

/// Applies, inspects and reverts the embedded migrations on `:memory:`.
fn verify_migrations() -> Result<()> {
    use diesel::Connection;
    use diesel_migrations::{embed_migrations, MigrationHarness};

    const MIGRATIONS: diesel_migrations::EmbeddedMigrations =
        embed_migrations!("../crates/persistence/migrations");

    tracing::info!("Starting migration verification");

    let mut conn = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to create SQLite in-memory database")?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .wrap_err("Failed to enable foreign keys on SQLite")?;

    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to apply migrations: {}", e))?;
    tracing::info!("Migrations applied successfully");

    let schema = introspect_sqlite_schema(&mut conn)?;
    check_document_schema(&schema)?;
    tracing::info!("Document store schema verified");

    conn.revert_all_migrations(MIGRATIONS)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to revert migrations: {}", e))?;
    let reverted = introspect_sqlite_schema(&mut conn)?;
    if !reverted.tables.is_empty() {
        return Err(color_eyre::eyre::eyre!(
            "Down migrations left tables behind: {:?}",
            reverted.tables.keys().collect::<Vec<_>>()
        ));
    }

    tracing::info!("✓ Migration verification passed");
    Ok(())
}

/// Normalized schema representation
#[derive(Debug, Clone, PartialEq, Eq)]
struct Schema {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Table {
    columns: BTreeMap<String, Column>,
    primary_keys: BTreeSet<String>,
    foreign_keys: BTreeSet<ForeignKey>,
    indexes: BTreeSet<Index>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Column {
    normalized_type: String,
    nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ForeignKey {
    from_column: String,
    to_table: String,
    to_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Index {
    name: String,
    columns: Vec<String>,
}

/// Introspect `SQLite` schema
fn introspect_sqlite_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
        #[diesel(sql_type = Text)]
        to: String,
    }

    #[derive(QueryableByName)]
    struct IndexInfo {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct IndexColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
    }

    let mut schema = Schema {
        tables: BTreeMap::new(),
    };

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name"
    )
    .load(conn)
    .wrap_err("Failed to query SQLite tables")?;

    for table in tables {
        let mut table_info = Table {
            columns: BTreeMap::new(),
            primary_keys: BTreeSet::new(),
            foreign_keys: BTreeSet::new(),
            indexes: BTreeSet::new(),
        };

        let columns: Vec<ColumnInfo> =
            diesel::sql_query(format!("PRAGMA table_info({})", table.name))
                .load(conn)
                .wrap_err(format!("Failed to get columns for table {}", table.name))?;

        for col in columns {
            table_info.columns.insert(
                col.name.clone(),
                Column {
                    normalized_type: normalize_sqlite_type(&col.r#type),
                    nullable: col.notnull == 0,
                },
            );
            if col.pk > 0 {
                table_info.primary_keys.insert(col.name);
            }
        }

        let fks: Vec<ForeignKeyInfo> =
            diesel::sql_query(format!("PRAGMA foreign_key_list({})", table.name))
                .load(conn)
                .wrap_err(format!(
                    "Failed to get foreign keys for table {}",
                    table.name
                ))?;

        for fk in fks {
            table_info.foreign_keys.insert(ForeignKey {
                from_column: fk.from,
                to_table: fk.table,
                to_column: fk.to,
            });
        }

        let indexes: Vec<IndexInfo> =
            diesel::sql_query(format!("PRAGMA index_list({})", table.name))
                .load(conn)
                .wrap_err(format!("Failed to get indexes for table {}", table.name))?;

        for idx in indexes {
            // Primary key and unique autoindexes are covered above.
            if idx.name.starts_with("sqlite_autoindex_") {
                continue;
            }
            let index_columns: Vec<IndexColumnInfo> =
                diesel::sql_query(format!("PRAGMA index_info({})", idx.name))
                    .load(conn)
                    .wrap_err(format!("Failed to get index columns for {}", idx.name))?;
            table_info.indexes.insert(Index {
                name: idx.name,
                columns: index_columns.into_iter().map(|c| c.name).collect(),
            });
        }

        schema.tables.insert(table.name, table_info);
    }

    Ok(schema)
}

/// Normalize `SQLite` type affinity
fn normalize_sqlite_type(sqlite_type: &str) -> String {
    let normalized = sqlite_type.to_uppercase();
    if normalized.contains("INT") {
        "integer".to_string()
    } else if normalized.contains("REAL")
        || normalized.contains("FLOA")
        || normalized.contains("DOUB")
    {
        "real".to_string()
    } else if normalized.contains("BLOB") {
        "blob".to_string()
    } else {
        "text".to_string()
    }
}

/// Checks what the conditional-commit store relies on.
fn check_document_schema(schema: &Schema) -> Result<()> {
    for (table_name, key) in DOCUMENT_TABLES {
        let table = schema.tables.get(table_name).ok_or_else(|| {
            color_eyre::eyre::eyre!("❌ Missing document table '{table_name}'")
        })?;

        if table.primary_keys != BTreeSet::from([key.to_string()]) {
            return Err(color_eyre::eyre::eyre!(
                "❌ Table '{}' must be keyed by '{}' alone, found {:?}",
                table_name,
                key,
                table.primary_keys
            ));
        }

        let expected_version = Column {
            normalized_type: "integer".to_string(),
            nullable: false,
        };
        if table.columns.get("version") != Some(&expected_version) {
            return Err(color_eyre::eyre::eyre!(
                "❌ Table '{}' needs a non-null integer 'version' column, found {:?}",
                table_name,
                table.columns.get("version")
            ));
        }
    }

    let bookings = &schema.tables["bookings"];
    let zone_fk = ForeignKey {
        from_column: "zone_id".to_string(),
        to_table: "parking_zones".to_string(),
        to_column: "zone_id".to_string(),
    };
    if !bookings.foreign_keys.contains(&zone_fk) {
        return Err(color_eyre::eyre::eyre!(
            "❌ bookings.zone_id must reference parking_zones.zone_id, found {:?}",
            bookings.foreign_keys
        ));
    }

    let indexed: BTreeSet<&Vec<String>> = bookings.indexes.iter().map(|i| &i.columns).collect();
    for columns in [vec!["zone_id", "status"], vec!["user_id"]] {
        let columns: Vec<String> = columns.into_iter().map(str::to_string).collect();
        if !indexed.contains(&columns) {
            return Err(color_eyre::eyre::eyre!(
                "❌ bookings is missing an index on {:?}",
                columns
            ));
        }
    }

    Ok(())
}

trait ExpressionExt {
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running {:?}", self);
        self.run()
            .inspect_err(|_| tracing::error!("command failed: {:?}", self))
    }
}
