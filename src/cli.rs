//! Command line front end: check | schema | ast
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgGroup, Args, Parser, Subcommand};
use colored::Colorize;
use json_tmpl::{CompileOptions, ParseError, Schema, ValidationError, compile_with, path_de};
use rayon::prelude::*;
use serde_json::Value;

use crate::jq_exec::JqFilter;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate and normalize JSON documents against a TypeScript-like template
#[derive(Parser, Debug)]
#[command(name = "json-tmpl", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,

    /// JSON file with compile options (e.g. {"max_depth": 32})
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// maximum template nesting; overrides the config file
    #[arg(long, global = true)]
    max_depth: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate documents and print their normalized form
    Check(CheckOut),
    /// print the JSON Schema equivalent of a template
    Schema(SchemaOut),
    /// print the compiled template tree
    Ast(AstOut),
}

#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("template_source").required(true).args(["template", "template_file"])))]
struct TemplateSettings {
    /// template text, e.g. '{ name: string; age?: number <int> }'
    #[arg(long, short)]
    template: Option<String>,

    /// file holding the template text
    #[arg(long)]
    template_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON); output follows suit
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns or '-' for stdin
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    template: TemplateSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// output file for normalized documents (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// only report failures
    #[arg(long)]
    quiet: bool,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    template: TemplateSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct AstOut {
    #[command(flatten)]
    template: TemplateSettings,
}

/// One input document with a human-readable origin.
struct Document {
    source: String,
    value: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TemplateSettings {
    fn load(&self, options: &CompileOptions) -> Result<Schema> {
        let text = match (&self.template, &self.template_file) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read template file {}", path.display()))?,
            (None, None) => bail!("a template is required (--template or --template-file)"),
        };
        compile_with(&text, options).map_err(|err| anyhow!(render_parse_error(&text, &err)))
    }
}

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let jq = self.jq_expr.as_deref().map(JqFilter::compile).transpose()?;
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;

        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = read_source(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;

            let mut raw = Vec::new();
            if self.ndjson {
                for (i, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let value = serde_json::from_str::<Value>(line)
                        .with_context(|| format!("failed to parse JSON ({source_path_str}:{})", i + 1))?;
                    raw.push((format!("{source_path_str}:{}", i + 1), value));
                }
            } else {
                let value = serde_json::from_str::<Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                raw.push((source_path_str.clone(), value));
            }

            for (origin, value) in raw {
                let value = match self.json_pointer.as_deref() {
                    None => value,
                    Some(pointer) => value
                        .pointer(pointer)
                        .cloned()
                        .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {origin}"))?,
                };
                match jq.as_ref() {
                    None => documents.push(Document { source: origin, value }),
                    Some(jq) => {
                        let outputs = jq
                            .run(&value)
                            .with_context(|| format!("failed to apply jq expression to {origin}"))?;
                        for (j, value) in outputs.into_iter().enumerate() {
                            documents.push(Document { source: format!("{origin}#{j}"), value });
                        }
                    }
                }
            }
        }
        Ok(documents)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    fn compile_options(&self) -> Result<CompileOptions> {
        let mut options = match self.config.as_ref() {
            None => CompileOptions::default(),
            Some(path) => {
                let src = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                path_de::from_str_with_path::<CompileOptions>(&src)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
        };
        if let Some(max_depth) = self.max_depth {
            options.max_depth = max_depth;
        }
        Ok(options)
    }

    /// `Ok(false)` when at least one document failed validation.
    pub fn run(&self) -> Result<bool> {
        let options = self.compile_options()?;
        match &self.cmd {
            Command::Check(target) => {
                let schema = target.template.load(&options)?;
                let documents = target.input_settings.load_documents()?;
                tracing::info!(documents = documents.len(), "checking documents");

                let results: Vec<Result<Value, ValidationError>> =
                    documents.par_iter().map(|doc| schema.parse(&doc.value)).collect();

                let mut normalized = Vec::new();
                let mut failures = 0usize;
                for (doc, result) in documents.iter().zip(results) {
                    match result {
                        Ok(value) => normalized.push(value),
                        Err(error) => {
                            failures += 1;
                            report_failure(&doc.source, &error);
                        }
                    }
                }
                tracing::info!(passed = normalized.len(), failed = failures, "check finished");

                if !target.quiet {
                    let rendered = render_documents(&normalized, target.input_settings.ndjson)?;
                    write_output(target.out.as_deref(), &rendered)?;
                }
                Ok(failures == 0)
            }
            Command::Schema(target) => {
                let schema = target.template.load(&options)?;
                let schema_src = serde_json::to_string_pretty(&schema.to_json_schema())?;
                write_output(target.out.as_deref(), &schema_src)?;
                Ok(true)
            }
            Command::Ast(target) => {
                let schema = target.template.load(&options)?;
                println!("{:#?}", schema.ast());
                Ok(true)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn read_source(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path)
}

fn render_documents(values: &[Value], ndjson: bool) -> Result<String> {
    if ndjson {
        let mut out = String::new();
        for value in values {
            out.push_str(&serde_json::to_string(value)?);
            out.push('\n');
        }
        return Ok(out);
    }
    match values {
        [single] => Ok(serde_json::to_string_pretty(single)?),
        many => Ok(serde_json::to_string_pretty(many)?),
    }
}

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            if !contents.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn report_failure(source: &str, error: &ValidationError) {
    let path = if error.path.is_empty() { "<root>" } else { error.path.as_str() };
    eprintln!(
        "{} {} {} {}",
        "✗".red().bold(),
        source.bold(),
        path.yellow(),
        error.message,
    );
    eprintln!("    {} {}", "value:".dimmed(), error.value);
}

/// Message plus the offending template line with a caret under the offset.
fn render_parse_error(template: &str, error: &ParseError) -> String {
    let offset = error.offset().min(template.len());
    let line_start = template[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end = template[offset..].find('\n').map_or(template.len(), |i| offset + i);
    let line_no = template[..line_start].matches('\n').count() + 1;
    let column = template[line_start..offset].chars().count();
    format!(
        "{error} (line {line_no}, column {})\n  {}\n  {}{}",
        column + 1,
        &template[line_start..line_end],
        " ".repeat(column),
        "^".red().bold(),
    )
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if !has_glob_chars(pattern) {
            out.push(PathBuf::from(pattern));
            continue;
        }
        let before = out.len();
        for entry in glob::glob(pattern)? {
            out.push(entry?);
        }
        if out.len() == before {
            bail!("glob pattern matched no files: {pattern}");
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_error_points_at_the_token() {
        let template = "{\n  a: strin\n}";
        let err = json_tmpl::compile(template).unwrap_err();
        colored::control::set_override(false);
        let rendered = render_parse_error(template, &err);
        assert!(rendered.starts_with("Unknown primitive symbol 'strin' (line 2, column 6)"));
        assert!(rendered.ends_with("    a: strin\n       ^"));
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "-"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.json"), PathBuf::from("-")]);
    }

    #[test]
    fn empty_glob_is_an_error() {
        assert!(resolve_file_path_patterns(["/definitely/not/here/*.json"]).is_err());
    }

    #[test]
    fn renders_single_and_ndjson_output() {
        let one = render_documents(&[json!({ "a": 1 })], false).unwrap();
        assert_eq!(one, "{\n  \"a\": 1\n}");
        let many = render_documents(&[json!(1), json!(2)], true).unwrap();
        assert_eq!(many, "1\n2\n");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        CommandLineInterface::command().debug_assert();
    }
}
