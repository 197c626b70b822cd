use std::{
    collections::{HashSet, VecDeque},
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{bail, Context};
use bebop_analysis::{
    compile_parsed,
    generator::{DumpGenerator, Generator},
    CompileOptions, Environment,
};
use bebop_foundation::{
    errors::{Diagnostic, DiagnosticSink, Label},
    source::{SourceFile, SourceFileId, SourceFileSet},
};
use bebop_syntax::ast::{parse_source, SchemaFile};
use clap::Parser;
use tracing::{error, info, metadata::LevelFilter};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Debug, Parser)]
pub struct Args {
    /// Schema files to compile. Imports are resolved relative to the
    /// importing file and loaded once each.
    #[clap(long = "schema", required = true)]
    schema: Vec<PathBuf>,

    /// Code generator to run on the validated schema.
    #[clap(long)]
    generator: Option<String>,

    /// Directory the generated output is written to. Without it, generated
    /// output goes to stdout.
    #[clap(long)]
    out_dir: Option<PathBuf>,

    /// Dotted namespace to record on the schema for generators.
    #[clap(long)]
    namespace: Option<String>,

    /// Render diagnostics as single `file:line:col: kind: message` lines
    /// instead of full source excerpts.
    #[clap(long)]
    terse_diagnostics: bool,
}

/// Returns whether the schema compiled cleanly; `Err` is reserved for host
/// failures (I/O, bad arguments), which are not schema diagnostics.
pub fn fallible_main(args: Args) -> anyhow::Result<bool> {
    let mut env = Environment::new();
    let mut sources = SourceFileSet::new();
    let mut files: Vec<(SourceFileId, SchemaFile)> = vec![];

    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    for path in &args.schema {
        queue.push_back(
            path.canonicalize()
                .with_context(|| format!("cannot resolve schema path {path:?}"))?,
        );
    }

    let mut loaded: HashSet<PathBuf> = HashSet::new();
    while let Some(path) = queue.pop_front() {
        if !loaded.insert(path.clone()) {
            continue;
        }
        let source = fs::read_to_string(&path)
            .with_context(|| format!("cannot read schema file {path:?}"))?;
        let filename = pretty_file_name(&path);
        let id = sources.add(SourceFile::new(filename, path.clone(), source));
        let ast = parse_source(id, &sources.get(id).source, &mut env);

        for import in &ast.imports {
            let target = path
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(&import.path);
            match target.canonicalize() {
                Ok(target) => queue.push_back(target),
                Err(io_error) => env.emit(
                    Diagnostic::error(
                        id,
                        format!("cannot resolve import `{}`: {io_error}", import.path),
                    )
                    .with_label(Label::primary(import.span, "imported here")),
                ),
            }
        }
        files.push((id, ast));
    }
    info!(source_file_count = sources.len());

    let result = compile_parsed(
        &mut env,
        &files,
        &CompileOptions {
            namespace: args.namespace.clone(),
        },
    );

    for diagnostic in std::mem::take(&mut env.diagnostics) {
        if args.terse_diagnostics {
            eprintln!("{}", diagnostic.to_terse_string(&sources));
        } else {
            diagnostic
                .emit_to_stderr(&sources)
                .context("cannot render diagnostic")?;
        }
    }

    let schema = match result {
        Ok(schema) => schema,
        Err(_) => {
            error!("compilation failed, no output produced");
            return Ok(false);
        }
    };
    info!(definitions = schema.definitions.len(), "schema validated");

    if let Some(name) = &args.generator {
        let mut generator = find_generator(name)?;
        let output = generator.emit(&schema, &env);
        match &args.out_dir {
            Some(out_dir) => {
                fs::create_dir_all(out_dir)
                    .with_context(|| format!("cannot create output directory {out_dir:?}"))?;
                let out_path = out_dir.join(format!("schema.{name}.txt"));
                fs::write(&out_path, output)
                    .with_context(|| format!("cannot write generated output to {out_path:?}"))?;
                generator
                    .write_auxiliary_files(out_dir)
                    .context("cannot write auxiliary runtime files")?;
            }
            None => print!("{output}"),
        }
    }

    Ok(true)
}

fn find_generator(name: &str) -> anyhow::Result<Box<dyn Generator>> {
    match name {
        "dump" => Ok(Box::new(DumpGenerator)),
        _ => bail!("unknown generator `{name}`; available generators: dump"),
    }
}

fn pretty_file_name(path: &Path) -> String {
    let cwd = std::env::current_dir().unwrap_or_default();
    path.strip_prefix(&cwd)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr)
                .with_filter(
                    EnvFilter::builder()
                        .with_default_directive(LevelFilter::WARN.into())
                        .from_env_lossy(),
                ),
        )
        .init();

    let args = Args::parse();
    match fallible_main(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            error!("{error:?}");
            ExitCode::FAILURE
        }
    }
}
