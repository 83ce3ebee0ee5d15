mod assemble;
mod encode;
mod error;
mod msg;
mod parser;
mod segment;
mod symbol;
mod writer;

use std::path::Path;
use std::process::ExitCode;

use color_print::cprintln;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input assembly file
    input: String,

    /// Output base name (defaults to the input name without its extension)
    #[clap(short, long)]
    output: Option<String>,
}

fn main() -> ExitCode {
    use clap::Parser;

    let args: Args = Args::parse();

    let src = match std::fs::read_to_string(&args.input) {
        Ok(src) => src,
        Err(err) => {
            cprintln!("<red,bold>error</>: cannot read `{}`: {}", args.input, err);
            return ExitCode::FAILURE;
        }
    };

    let lines: Vec<parser::Line> = src
        .lines()
        .enumerate()
        .map(|(idx, raw)| parser::Line::new(idx, raw))
        .collect();

    let mut asm = assemble::Assembler::new();
    let out = asm.assemble(&lines);
    asm.diags.print(&args.input);
    asm.diags.summary();

    let Some(out) = out else {
        return ExitCode::FAILURE;
    };

    let base = match &args.output {
        Some(name) => name.clone(),
        None => Path::new(&args.input)
            .with_extension("")
            .to_string_lossy()
            .into_owned(),
    };
    match writer::write(&base, &out) {
        Ok(files) => {
            for file in files {
                println!("  > {file}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            cprintln!("<red,bold>error</>: cannot write output: {}", err);
            ExitCode::FAILURE
        }
    }
}
