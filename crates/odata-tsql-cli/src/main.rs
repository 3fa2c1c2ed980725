//! odata-tsql CLI
//!
//! Compiles OData query options into parameterized T-SQL.

mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use odata_tsql_core::query::TableName;
use odata_tsql_core::{
    compile_filter, CompileError, CompiledQuery, CompilerOptions, FilterParser, QueryCompiler,
    QueryOptions, QueryParameter, RenderContext,
};

use crate::error::{CliError, Result};

/// Compile OData query options into T-SQL.
#[derive(Parser)]
#[command(name = "odata-tsql")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON file with compiler options.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// User name written into audit columns.
    #[arg(short, long, env = "ODATA_TSQL_USER")]
    user: Option<String>,

    /// Prefix of generated parameter names.
    #[arg(long, env = "ODATA_TSQL_PARAMETER_PREFIX")]
    parameter_prefix: Option<String>,

    /// Place each clause on its own line.
    #[arg(long)]
    pretty: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a query string into a SELECT over a table.
    Query {
        /// Table to select from.
        #[arg(short, long)]
        table: String,

        /// Query string, e.g. `$filter=Age gt 21&$orderby=Name`.
        query: String,

        /// What to print.
        #[arg(short, long, value_enum, default_value_t = Emit::Sql)]
        emit: Emit,
    },

    /// Compile a bare filter into a WHERE predicate.
    Filter {
        /// Filter text, e.g. `contains(Name,'foo')`.
        filter: String,

        /// What to print.
        #[arg(short, long, value_enum, default_value_t = Emit::Sql)]
        emit: Emit,
    },

    /// Print the structured document a filter compiles to.
    Document {
        /// Filter text.
        filter: String,

        /// Print JSON instead of the XML-like form.
        #[arg(long)]
        json: bool,
    },
}

/// Output of the compiling commands.
#[derive(Clone, Copy, ValueEnum)]
enum Emit {
    /// The statement text.
    Sql,
    /// The bound parameters as JSON.
    Params,
    /// Parameter declarations followed by the statement.
    Batch,
}

#[derive(Serialize)]
struct ParameterView<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    sql_type: &'a str,
    value: serde_json::Value,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = load_options(&cli)?;
    debug!(prefix = %options.parameter_prefix, "loaded options");

    run(cli.command, &options)?;
    Ok(())
}

fn run(command: Commands, options: &CompilerOptions) -> Result<()> {
    match command {
        Commands::Query { table, query, emit } => {
            let query_options = QueryOptions::parse(&query)?;
            let select = query_options.to_select(TableName::new(table), &FilterParser::new())?;
            let compiled = QueryCompiler::new(RenderContext::new(options)).compile(&select.into())?;
            print_compiled(&compiled, emit)
        }

        Commands::Filter { filter, emit } => {
            let compiled = compile_filter(&filter, options)?;
            print_compiled(&compiled, emit)
        }

        Commands::Document { filter, json } => {
            let document = FilterParser::new().compile_document(&filter).map_err(CompileError::from)?;
            if json {
                println!("{}", document.to_json()?);
            } else {
                println!("{document}");
            }
            Ok(())
        }
    }
}

/// Options from the config file, overridden by flags and environment.
fn load_options(cli: &Cli) -> Result<CompilerOptions> {
    let mut options = match &cli.config {
        Some(path) => read_options(path)?,
        None => CompilerOptions::default(),
    };
    if let Some(user) = &cli.user {
        options.user_name = Some(user.clone());
    }
    if let Some(prefix) = &cli.parameter_prefix {
        options.parameter_prefix.clone_from(prefix);
    }
    if cli.pretty {
        options.pretty = true;
    }
    Ok(options)
}

fn read_options(path: &Path) -> Result<CompilerOptions> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    CompilerOptions::from_json(&text).map_err(|source| CliError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

fn print_compiled(compiled: &CompiledQuery, emit: Emit) -> Result<()> {
    match emit {
        Emit::Sql => println!("{}", compiled.sql),
        Emit::Batch => println!("{}", compiled.batch()),
        Emit::Params => {
            let views: Vec<ParameterView<'_>> = compiled.parameters.iter().map(view).collect();
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
    }
    Ok(())
}

fn view(parameter: &QueryParameter) -> ParameterView<'_> {
    ParameterView {
        name: &parameter.name,
        sql_type: parameter.value.sql_type(),
        value: parameter.value.to_json(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(text: &str) -> Commands {
        Commands::Filter {
            filter: String::from(text),
            emit: Emit::Batch,
        }
    }

    #[test]
    fn test_filter_command_compiles() {
        run(filter("Age gt 21 and contains(Name, 'a')"), &CompilerOptions::default())
            .unwrap_or_else(|e| panic!("Failed to run filter command: {e}"));
    }

    #[test]
    fn test_filter_command_reports_compile_errors() {
        let options = CompilerOptions::default();
        let err = run(filter("Age gt"), &options).expect_err("incomplete filter must fail");
        assert!(matches!(err, CliError::Compile(CompileError::Parse(_))));

        let err = run(filter("Status eq Status'Active'"), &options)
            .expect_err("enum without metadata must fail");
        assert!(matches!(err, CliError::Compile(CompileError::UnsupportedType { .. })));
    }
}
