use std::env;
use std::process;

use log::{debug, error};
use stackc::machine::Machine;
use stackc::{CompilerConf, compile};

static USAGE: &str = r#"
usage: stackc [--run] <expr>

options:
    --run   also execute the generated code and print the result

examples:
    stackc "3 + 4 * 5"
    stackc --run "100 / 5 / 2"
"#;

struct Args {
  run: bool,
  expr: String,
}

fn parse_args() -> Option<Args> {
  let mut run = false;
  let mut expr = None;

  for arg in env::args().skip(1) {
    match arg.as_str() {
      "--run" => run = true,
      _ if expr.is_none() => expr = Some(arg),
      _ => return None,
    }
  }

  expr.map(|expr| Args { run, expr })
}

fn main() {
  if let Err(err) = simple_logger::SimpleLogger::new().env().init() {
    eprintln!("failed to initialise logger: {err}");
  }

  let Some(args) = parse_args() else {
    eprintln!("{USAGE}");
    process::exit(1);
  };

  let conf = CompilerConf::default();
  debug!("compiling {:?} with {conf:?}", args.expr);

  let compiled = match compile(&args.expr, &conf) {
    Ok(compiled) => compiled,
    Err(err) => {
      eprintln!("{}", err.caret(&args.expr));
      process::exit(1);
    }
  };

  print!("{}", compiled.program);

  if args.run {
    match Machine::new().run(&compiled.program) {
      Ok(value) => println!("; result = {value}"),
      Err(err) => {
        error!("execution failed: {err}");
        eprintln!("{err}");
        process::exit(1);
      }
    }
  }
}
