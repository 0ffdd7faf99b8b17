mod args;
mod driver_error;

use args::Args;
use driver_error::{DriverError, Result};
use minicc::names::NameFactory;
use minicc::{codegen, emission, lexer, parser, semantic_analysis, tacky};

use std::fs;
use std::path::Path;
use std::process::{exit, Command};

use anyhow::Context;
use tempfile::TempPath;

/// Runs `gcc -E -P` over the input. The returned guard owns the `.i` file
/// and removes it when dropped, on error paths included.
fn preprocess(args: &Args) -> Result<TempPath> {
    let mut preprocessed = args.input.clone();
    preprocessed.set_extension("i");

    let status = Command::new("gcc")
        .arg("-E")
        .arg("-P")
        .arg(&args.input)
        .arg("-o")
        .arg(&preprocessed)
        .status()?;
    let guard = TempPath::from_path(preprocessed);
    if !status.success() {
        return Err(DriverError::PreprocessorFailed(status.code()));
    }
    Ok(guard)
}

fn assemble(asm_file: &Path, args: &Args) -> Result<()> {
    let mut out_file = args.input.clone();
    out_file.set_extension("");

    let status = Command::new("gcc")
        .arg(asm_file)
        .arg("-o")
        .arg(&out_file)
        .status()?;
    if !status.success() {
        return Err(DriverError::AssemblerFailed(status.code()));
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    if !fs::exists(&args.input)? {
        let filename = args.input.to_string_lossy().to_string();
        return Err(DriverError::InputFileDoesNotExist(filename).into());
    }

    let preprocessed = preprocess(&args)?;
    let source = fs::read_to_string(&preprocessed).context("reading preprocessed file")?;
    drop(preprocessed);

    let tokens = lexer::lex(&source).map_err(DriverError::from)?;
    if args.lex {
        dbg!(tokens);
        return Ok(());
    }

    let ast = parser::parse(&tokens).map_err(DriverError::from)?;
    if args.parse {
        dbg!(ast);
        return Ok(());
    }

    let mut names = NameFactory::new();
    let (validated_ast, env) =
        semantic_analysis::validate(ast, &mut names).map_err(DriverError::from)?;
    if args.validate {
        dbg!(validated_ast);
        return Ok(());
    }

    let tacky = tacky::emit_tacky(validated_ast, &mut names);
    if args.tacky {
        dbg!(tacky);
        return Ok(());
    }

    let asm_ast = codegen::codegen(tacky);
    if args.codegen {
        dbg!(asm_ast);
        return Ok(());
    }

    let mut asm_file = args.input.clone();
    asm_file.set_extension("s");
    fs::write(&asm_file, emission::emit(&asm_ast, &env).to_string())
        .context("writing assembly file")?;

    if args.emission {
        return Ok(());
    }

    // From here on the .s file is an intermediate; drop it however we leave.
    let asm_guard = TempPath::from_path(asm_file);
    assemble(&asm_guard, &args)?;
    drop(asm_guard);

    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("minicc: {err:#}");
        let code = err
            .downcast_ref::<DriverError>()
            .map_or(1, DriverError::exit_code);
        exit(code);
    }
}
