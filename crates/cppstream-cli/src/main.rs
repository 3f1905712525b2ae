//! protoc-gen-cppstream - C++ field ID headers for streaming protobuf writers
//!
//! Normally started by `protoc` (`--cppstream_out=DIR`): a
//! `CodeGeneratorRequest` arrives on stdin and the `CodeGeneratorResponse`
//! leaves on stdout. With `--descriptor-set` it runs standalone on the output
//! of `protoc --descriptor_set_out` and writes the headers itself.

use anyhow::{bail, Context, Result};
use clap::Parser;
use cppstream_core::{plugin, Error as CoreError, HeaderFile, HeaderGenerator, HeaderStats};
use std::fs;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, trace, Level};
use tracing_subscriber::EnvFilter;

/// Generate C++ field ID headers from protobuf descriptors
#[derive(Parser, Debug)]
#[command(name = "protoc-gen-cppstream")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Read a FileDescriptorSet from this file instead of a plugin request on stdin
    #[arg(long, value_name = "FILE")]
    descriptor_set: Option<PathBuf>,

    /// Output directory for generated headers
    #[arg(short, long, default_value = ".", requires = "descriptor_set")]
    output: PathBuf,

    /// Source file to generate a header for; repeatable (default: every file in the set)
    #[arg(short, long = "file", value_name = "NAME", requires = "descriptor_set")]
    files: Vec<String>,

    /// Plugin parameter string, as protoc would pass it
    #[arg(long, requires = "descriptor_set")]
    parameter: Option<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dry run - don't write files, just show what would be generated
    #[arg(long, requires = "descriptor_set")]
    dry_run: bool,

    /// Overwrite existing files
    #[arg(long, requires = "descriptor_set")]
    force: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the plugin response, so logs go to stderr
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let generator = HeaderGenerator::new();

    match cli.descriptor_set {
        Some(ref path) => run_standalone(cli, path, &generator),
        None => run_plugin(&generator),
    }
}

/// Print every diagnostic of a failed generation, then the error itself
fn report(err: &anyhow::Error) {
    if let Some(log) = err.downcast_ref::<CoreError>().and_then(CoreError::diagnostics) {
        for diagnostic in log {
            eprintln!("{}", diagnostic);
        }
    }
    eprintln!("error: {:#}", err);
}

/// Plugin mode: request on stdin, response on stdout
fn run_plugin(generator: &HeaderGenerator) -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("Failed to read CodeGeneratorRequest from stdin")?;

    trace!("Read {} bytes from stdin", input.len());

    let output = process_request(&input, generator)?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&output)
        .context("Failed to write CodeGeneratorResponse to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;

    Ok(())
}

/// Decode a request, generate, and encode the response
fn process_request(input: &[u8], generator: &HeaderGenerator) -> Result<Vec<u8>> {
    let request = plugin::decode_request(input)?;
    debug!(
        "Request: {} file(s) to generate, {} descriptor(s), parameter '{}'",
        request.file_to_generate.len(),
        request.proto_file.len(),
        request.parameter()
    );

    let headers = plugin::generate_headers(&request, generator)?;
    print_summary(&headers);

    let response = plugin::build_response(request.parameter(), headers);
    Ok(plugin::encode_response(&response)?)
}

/// Standalone mode: FileDescriptorSet in, header files on disk
fn run_standalone(cli: &Cli, descriptor_set: &Path, generator: &HeaderGenerator) -> Result<()> {
    if !descriptor_set.is_file() {
        bail!("Descriptor set does not exist: {}", descriptor_set.display());
    }

    let data = fs::read(descriptor_set)
        .with_context(|| format!("Failed to read descriptor set: {}", descriptor_set.display()))?;

    let request =
        plugin::request_from_descriptor_set(&data, &cli.files, cli.parameter.as_deref())
            .with_context(|| format!("Failed to decode descriptor set: {}", descriptor_set.display()))?;

    for name in &cli.files {
        if !request.proto_file.iter().any(|f| f.name() == name) {
            bail!("{} is not part of {}", name, descriptor_set.display());
        }
    }

    let headers = plugin::generate_headers(&request, generator)?;
    print_summary(&headers);

    let outputs = plan_outputs(&cli.output, &headers, cli.force)?;

    if cli.dry_run {
        for (path, header) in &outputs {
            println!("Would write: {}", path.display());
            if cli.verbose > 0 {
                println!("---");
                println!("{}", header.content);
                println!("---");
            }
        }
        return Ok(());
    }

    for (path, header) in &outputs {
        store_header(path, header)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn print_summary(headers: &[HeaderFile]) {
    let mut total = HeaderStats::default();
    for header in headers {
        total += header.stats;
    }
    info!(
        "Summary: {} header(s), {} messages, {} enums, {} fields",
        headers.len(),
        total.messages,
        total.enums,
        total.fields
    );
}

/// Join a generated file name onto the output directory, refusing names
/// that would land outside of it
fn resolve_output_path(output_dir: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    let escapes = relative.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });

    if escapes || relative.as_os_str().is_empty() {
        bail!(
            "path traversal detected: '{}' would escape output directory",
            name
        );
    }

    Ok(output_dir.join(relative))
}

/// Pairs every header with its destination under `output_dir`.
///
/// Nothing is written here: a name escaping the directory, or an existing
/// file without `force`, fails the whole batch before the first write.
fn plan_outputs<'h>(
    output_dir: &Path,
    headers: &'h [HeaderFile],
    force: bool,
) -> Result<Vec<(PathBuf, &'h HeaderFile)>> {
    let mut outputs = Vec::with_capacity(headers.len());

    for header in headers {
        let path = resolve_output_path(output_dir, &header.name)?;
        if !force && path.exists() {
            bail!(
                "{} already exists, pass --force to replace it",
                path.display()
            );
        }
        outputs.push((path, header));
    }

    Ok(outputs)
}

fn store_header(path: &Path, header: &HeaderFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create {} for {}", dir.display(), header.name))?;
    }
    fs::write(path, &header.content)
        .with_context(|| format!("Cannot write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use prost::Message;
    use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
    use prost_types::field_descriptor_proto::{Label, Type};
    use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};
    use tempfile::TempDir;

    fn descriptor(name: &str, field_type: i32) -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some(name.to_string()),
            package: Some("android.test".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Sample".to_string()),
                field: vec![FieldDescriptorProto {
                    name: Some("count".to_string()),
                    number: Some(1),
                    r#type: Some(field_type),
                    label: Some(Label::Optional as i32),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn write_descriptor_set(dir: &Path, files: Vec<FileDescriptorProto>) -> PathBuf {
        let path = dir.join("set.pb");
        fs::write(&path, FileDescriptorSet { file: files }.encode_to_vec()).unwrap();
        path
    }

    #[test]
    fn test_process_request() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["a/sample.proto".to_string()],
            parameter: Some("experimental_allow_proto3_optional".to_string()),
            proto_file: vec![descriptor("a/sample.proto", Type::Int32 as i32)],
            ..Default::default()
        };

        let output = process_request(&request.encode_to_vec(), &HeaderGenerator::new()).unwrap();
        let response = CodeGeneratorResponse::decode(output.as_slice()).unwrap();

        assert_eq!(response.file.len(), 1);
        assert_eq!(response.file[0].name(), "a/sample.proto.h");
        assert!(response.file[0]
            .content()
            .contains("const uint64_t COUNT = 0x0000010500000001ULL;"));
        assert_eq!(response.supported_features, Some(1));
    }

    #[test]
    fn test_process_request_failure_carries_diagnostics() {
        let request = CodeGeneratorRequest {
            file_to_generate: vec!["bad.proto".to_string()],
            proto_file: vec![descriptor("bad.proto", 42)],
            ..Default::default()
        };

        let err = process_request(&request.encode_to_vec(), &HeaderGenerator::new()).unwrap_err();
        let log = err
            .downcast_ref::<CoreError>()
            .and_then(CoreError::diagnostics)
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.iter().next().unwrap().to_string(),
            "bad.proto: android.test.Sample.count: unknown field type (42)"
        );
    }

    #[test]
    fn test_standalone_writes_headers() {
        let temp_dir = TempDir::new().unwrap();
        let set = write_descriptor_set(
            temp_dir.path(),
            vec![
                descriptor("frameworks/one.proto", Type::Int32 as i32),
                descriptor("two.proto", Type::String as i32),
            ],
        );
        let out = temp_dir.path().join("out");

        let cli = Cli::parse_from([
            "protoc-gen-cppstream",
            "--descriptor-set",
            set.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--file",
            "frameworks/one.proto",
        ]);
        run(&cli).unwrap();

        let header = fs::read_to_string(out.join("frameworks/one.proto.h")).unwrap();
        assert!(header.contains("#ifndef ANDROID_FRAMEWORKS_ONE_PROTO_STREAM_H"));
        assert!(!out.join("two.proto.h").exists());

        // second run without --force refuses to overwrite
        assert!(run(&cli).is_err());
    }

    #[test]
    fn test_standalone_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let set = write_descriptor_set(
            temp_dir.path(),
            vec![descriptor("one.proto", Type::Int32 as i32)],
        );
        let out = temp_dir.path().join("out");

        let cli = Cli::parse_from([
            "protoc-gen-cppstream",
            "--descriptor-set",
            set.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
            "--dry-run",
        ]);
        run(&cli).unwrap();

        assert!(!out.exists());
    }

    #[test]
    fn test_standalone_unknown_file() {
        let temp_dir = TempDir::new().unwrap();
        let set = write_descriptor_set(
            temp_dir.path(),
            vec![descriptor("one.proto", Type::Int32 as i32)],
        );

        let cli = Cli::parse_from([
            "protoc-gen-cppstream",
            "--descriptor-set",
            set.to_str().unwrap(),
            "--file",
            "missing.proto",
            "--dry-run",
        ]);
        let err = run(&cli).unwrap_err();
        assert!(err.to_string().contains("missing.proto"));
    }

    #[test]
    fn test_resolve_output_path() {
        let out = Path::new("/tmp/out");
        assert_eq!(
            resolve_output_path(out, "a/b.proto.h").unwrap(),
            PathBuf::from("/tmp/out/a/b.proto.h")
        );
        assert!(resolve_output_path(out, "../escape.proto.h").is_err());
        assert!(resolve_output_path(out, "a/../../escape.proto.h").is_err());
        assert!(resolve_output_path(out, "/etc/passwd").is_err());
        assert!(resolve_output_path(out, "").is_err());
    }

    #[test]
    fn test_existing_output_blocks_every_write() {
        let temp_dir = TempDir::new().unwrap();
        let set = write_descriptor_set(
            temp_dir.path(),
            vec![
                descriptor("a.proto", Type::Int32 as i32),
                descriptor("b.proto", Type::Int32 as i32),
            ],
        );
        let out = temp_dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("b.proto.h"), "kept").unwrap();

        let args = [
            "protoc-gen-cppstream",
            "--descriptor-set",
            set.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ];
        let err = run(&Cli::parse_from(args)).unwrap_err();
        assert!(err.to_string().contains("b.proto.h"));
        assert!(!out.join("a.proto.h").exists());
        assert_eq!(fs::read_to_string(out.join("b.proto.h")).unwrap(), "kept");

        let forced: Vec<&str> = args.iter().copied().chain(["--force"]).collect();
        run(&Cli::parse_from(forced)).unwrap();
        assert!(out.join("a.proto.h").exists());
        assert!(fs::read_to_string(out.join("b.proto.h"))
            .unwrap()
            .contains("namespace Sample {"));
    }

    #[test]
    fn test_plan_outputs_rejects_escaping_names() {
        let temp_dir = TempDir::new().unwrap();
        let headers = vec![
            HeaderFile {
                name: "ok.proto.h".to_string(),
                content: String::new(),
                stats: HeaderStats::default(),
            },
            HeaderFile {
                name: "../evil.proto.h".to_string(),
                content: String::new(),
                stats: HeaderStats::default(),
            },
        ];

        assert!(plan_outputs(temp_dir.path(), &headers, true).is_err());
        assert!(!temp_dir.path().join("ok.proto.h").exists());

        let planned = plan_outputs(temp_dir.path(), &headers[..1], false).unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].0, temp_dir.path().join("ok.proto.h"));
    }

    #[test]
    fn test_standalone_flags_need_descriptor_set() {
        assert!(Cli::try_parse_from(["protoc-gen-cppstream"]).is_ok());
        for flag in ["--force", "--dry-run"] {
            assert!(Cli::try_parse_from(["protoc-gen-cppstream", flag]).is_err());
        }
        assert!(Cli::try_parse_from(["protoc-gen-cppstream", "--output", "out"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
