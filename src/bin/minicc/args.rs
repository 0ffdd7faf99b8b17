use std::env;
use std::path::PathBuf;
use std::process::exit;

#[allow(clippy::struct_excessive_bools)]
#[derive(Default)]
pub struct Args {
    pub lex: bool,
    pub parse: bool,
    pub validate: bool,
    pub tacky: bool,
    pub codegen: bool,
    pub emission: bool,
    pub input: PathBuf,
}

impl Args {
    pub fn parse() -> Self {
        let mut args = Self::default();
        let mut input_file = None;

        for arg in env::args().skip(1) {
            match arg.as_str() {
                "--lex" => args.lex = true,
                "--parse" => args.parse = true,
                "--validate" => args.validate = true,
                "--tacky" => args.tacky = true,
                "--codegen" => args.codegen = true,
                "-S" | "--emission" => args.emission = true,
                "-h" | "--help" => Self::usage(0),
                _ => {
                    if input_file.is_some() {
                        Self::usage(1);
                    }
                    input_file = Some(PathBuf::from(arg));
                }
            }
        }

        let stop_flags = [
            args.lex,
            args.parse,
            args.validate,
            args.tacky,
            args.codegen,
            args.emission,
        ];
        if stop_flags.into_iter().filter(|flag| *flag).count() > 1 {
            eprintln!("at most one stop-after option may be given");
            Self::usage(1);
        }

        args.input = input_file.unwrap_or_else(|| Self::usage(1));
        args
    }

    fn usage(code: i32) -> ! {
        let cmd0 = env::args().next().unwrap_or_else(|| "minicc".to_owned());
        print!(
            "Usage: {cmd0} [OPTIONS] FILE\n\n\
             Options:\n\
             \x20 -h, --help        Show this message\n\
             \x20     --lex         Stop after lexing\n\
             \x20     --parse       Stop after parsing\n\
             \x20     --validate    Stop after semantic analysis\n\
             \x20     --tacky       Stop after producing the TAC IR\n\
             \x20     --codegen     Stop after code generation\n\
             \x20 -S, --emission    Emit assembly, but do not assemble or link\n"
        );

        exit(code)
    }
}
