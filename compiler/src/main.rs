use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use clap::{Arg, App};
use tracing::{debug, info, Level};

use codegen::{compile_source, GeneratorOptions};

struct Options {
    out_dir: PathBuf,
    asm_only: bool,
    run: bool,
    generator: GeneratorOptions,
}

fn verbosity(occurrences: u64) -> Level {
    match occurrences {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/* Runs an external tool, found through `PATH`, and fails unless it succeeds. */
fn run_tool(name: &str, args: &[&Path]) -> Result<()> {
    let tool = which::which(name)
        .with_context(|| format!("couldn't find `{}` in PATH", name))?;
    debug!(tool = %tool.display(), ?args, "running");

    let status = Command::new(&tool)
        .args(args)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("failed to start `{}`", name))?;

    if !status.success() {
        bail!("`{}` failed ({})", name, status);
    }
    Ok(())
}

/* Returns the exit status of the program when it was asked to run. */
fn compile(input: &str, options: &Options) -> Result<Option<i32>> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("couldn't read {}", input))?;

    let asm = compile_source(input, &source, options.generator)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let stem = Path::new(input).file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("out");

    fs::create_dir_all(&options.out_dir)
        .with_context(|| format!("couldn't create {}", options.out_dir.display()))?;

    let asm_path = options.out_dir.join(format!("{}.asm", stem));
    fs::write(&asm_path, &asm)
        .with_context(|| format!("couldn't write {}", asm_path.display()))?;
    info!(path = %asm_path.display(), "wrote assembly");

    if options.asm_only {
        return Ok(None);
    }

    let obj_path = options.out_dir.join(format!("{}.o", stem));
    let exe_path = options.out_dir.join(stem);

    run_tool("nasm", &[Path::new("-felf64"), asm_path.as_path(), Path::new("-o"), obj_path.as_path()])?;
    run_tool("ld", &[obj_path.as_path(), Path::new("-o"), exe_path.as_path()])?;
    info!(path = %exe_path.display(), "linked executable");

    if !options.run {
        return Ok(None);
    }

    let status = Command::new(&exe_path)
        .status()
        .with_context(|| format!("couldn't run {}", exe_path.display()))?;
    info!(%status, "program exited");

    Ok(Some(status.code().unwrap_or(1)))
}

fn main() {
    let matches = App::new("moltenc")
        .version("0.1")
        .about("Compiles molten source files to x86-64 NASM assembly")
        .arg(Arg::with_name("input")
            .help("The source file")
            .required(true)
            .index(1))
        .arg(Arg::with_name("out-dir")
            .short("o")
            .long("out-dir")
            .takes_value(true)
            .default_value("build")
            .help("Directory receiving the assembly, object and executable"))
        .arg(Arg::with_name("asm-only")
            .short("a")
            .long("asm-only")
            .help("Stop after writing the assembly"))
        .arg(Arg::with_name("run")
            .short("r")
            .long("run")
            .help("Run the executable and exit with its status"))
        .arg(Arg::with_name("no-comments")
            .long("no-comments")
            .help("Don't annotate the generated assembly"))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .help("Log more (repeat for more detail)"))
        .get_matches();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(verbosity(matches.occurrences_of("verbose")))
        .with_writer(std::io::stderr)
        .init();

    let input = matches.value_of("input").unwrap_or_default();
    let options = Options {
        out_dir: PathBuf::from(matches.value_of("out-dir").unwrap_or("build")),
        asm_only: matches.is_present("asm-only"),
        run: matches.is_present("run"),
        generator: GeneratorOptions {comments: !matches.is_present("no-comments")},
    };

    let code = match compile(input, &options) {
        Ok(Some(code)) => code,
        Ok(None) => 0,
        Err(e) => {
            eprintln!("{:#}", e);
            1
        },
    };

    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(verbosity(0), Level::WARN);
        assert_eq!(verbosity(1), Level::INFO);
        assert_eq!(verbosity(2), Level::DEBUG);
        assert_eq!(verbosity(5), Level::TRACE);
    }

    #[test]
    fn asm_only_writes_the_assembly_file() {
        let dir = std::env::temp_dir().join(format!("moltenc-test-{}", std::process::id()));
        let input = dir.join("exit.mltn");
        fs::create_dir_all(&dir).unwrap();
        fs::write(&input, "syscall(60, 3);").unwrap();

        let options = Options {
            out_dir: dir.join("build"),
            asm_only: true,
            run: false,
            generator: GeneratorOptions::default(),
        };
        let status = compile(input.to_str().unwrap(), &options).unwrap();
        assert_eq!(status, None);

        let asm = fs::read_to_string(dir.join("build").join("exit.asm")).unwrap();
        assert!(asm.starts_with("global _start"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn compilation_errors_are_reported_with_their_position() {
        let dir = std::env::temp_dir().join(format!("moltenc-err-{}", std::process::id()));
        let input = dir.join("bad.mltn");
        fs::create_dir_all(&dir).unwrap();
        fs::write(&input, "break;").unwrap();

        let options = Options {
            out_dir: dir.join("build"),
            asm_only: true,
            run: false,
            generator: GeneratorOptions::default(),
        };
        let err = compile(input.to_str().unwrap(), &options).unwrap_err();
        assert!(err.to_string().ends_with("bad.mltn:1:1: can't break when not in a loop"));

        fs::remove_dir_all(&dir).unwrap();
    }
}
