use std::{env, fs, process::ExitCode, str::FromStr};

use num_bigint::BigInt;
use pyfloordiv::{
    Level, NBool, Object, ProfilingTracer, RunError, Runtime, RuntimeConfig, StderrTracer, Value,
    floordiv::{legacy, modern},
};

const USAGE: &str = "usage: pyfloordiv [--legacy | --modern] [--config FILE] [--trace] [--profile] [--bool] [--json] LHS RHS";

/// Options collected from the command line.
#[derive(Debug, Default)]
struct Options {
    level: Option<Level>,
    config: Option<String>,
    trace: bool,
    profile: bool,
    as_bool: bool,
    json: bool,
    operands: Vec<String>,
}

fn main() -> ExitCode {
    let options = match parse_args(env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("error: {err}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };
    let mut config = match load_config(options.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = options.level {
        config.level = level;
    }
    let level = config.level;

    let [lhs, rhs] = options.operands.as_slice() else {
        eprintln!("error: expected two operands\n{USAGE}");
        return ExitCode::FAILURE;
    };
    let operands = parse_literal(lhs, level).and_then(|l| Ok((l, parse_literal(rhs, level)?)));
    let (lhs, rhs) = match operands {
        Ok(pair) => pair,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut rt = if options.trace {
        Runtime::with_tracer(config, StderrTracer::new())
    } else if options.profile {
        Runtime::with_tracer(config, ProfilingTracer::new())
    } else {
        Runtime::new(config)
    };

    let outcome = run(&mut rt, &lhs, &rhs, options.as_bool, options.json);
    if let Some(tracer) = rt.tracer::<ProfilingTracer>() {
        eprintln!("{}", tracer.report());
    }
    match outcome {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Divides the operands and renders the result as the output line.
fn run(rt: &mut Runtime, lhs: &Object, rhs: &Object, as_bool: bool, json: bool) -> Result<String, RunError> {
    let a = rt.alloc(lhs)?;
    let b = match rt.alloc(rhs) {
        Ok(b) => b,
        Err(err) => {
            rt.drop_value(a);
            return Err(err);
        }
    };

    let output = if as_bool {
        divide_to_bool(rt, &a, &b).map(|truth| {
            if json {
                truth.to_string()
            } else if truth {
                "True".to_owned()
            } else {
                "False".to_owned()
            }
        })
    } else {
        divide(rt, &a, &b).and_then(|v| {
            let rendered = if json {
                serde_json::to_string(&rt.to_object(&v)).map_err(|e| RunError::internal(e.to_string()))
            } else {
                Ok(rt.repr(&v))
            };
            rt.drop_value(v);
            rendered
        })
    };
    rt.drop_value(a);
    rt.drop_value(b);
    output
}

fn divide(rt: &mut Runtime, a: &Value, b: &Value) -> Result<Value, RunError> {
    match rt.level() {
        Level::Legacy => legacy::object_object(rt, a, b),
        Level::Modern => modern::object_object(rt, a, b),
    }
}

fn divide_to_bool(rt: &mut Runtime, a: &Value, b: &Value) -> Result<bool, RunError> {
    let result = match rt.level() {
        Level::Legacy => legacy::nbool_object_object(rt, a, b),
        Level::Modern => modern::nbool_object_object(rt, a, b),
    };
    match result {
        NBool::True => Ok(true),
        NBool::False => Ok(false),
        NBool::Exception => Err(rt
            .take_pending()
            .unwrap_or_else(|| RunError::internal("failure reported without a pending error"))),
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--legacy" => options.level = Some(Level::Legacy),
            "--modern" => options.level = Some(Level::Modern),
            "--config" => {
                let path = args.next().ok_or("--config requires a file path")?;
                options.config = Some(path);
            }
            "--trace" => options.trace = true,
            "--profile" => options.profile = true,
            "--bool" => options.as_bool = true,
            "--json" => options.json = true,
            // negative numbers are operands, not flags
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            _ => options.operands.push(arg),
        }
    }
    if options.trace && options.profile {
        return Err("--trace and --profile are exclusive".to_owned());
    }
    Ok(options)
}

fn load_config(path: Option<&str>) -> Result<RuntimeConfig, String> {
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };
    let json = fs::read_to_string(path).map_err(|e| format!("reading {path}: {e}"))?;
    RuntimeConfig::from_json(&json).map_err(|e| e.to_string())
}

/// Parses a Python literal for the given level.
fn parse_literal(text: &str, level: Level) -> Result<Object, String> {
    match text {
        "None" => return Ok(Object::None),
        "True" => return Ok(Object::Bool(true)),
        "False" => return Ok(Object::Bool(false)),
        _ => {}
    }
    if let Some(digits) = text.strip_suffix(['L', 'l']) {
        if level == Level::Modern {
            return Err(format!("long literal {text} is not valid for the modern level"));
        }
        return BigInt::from_str(digits)
            .map(Object::Long)
            .map_err(|_| format!("invalid long literal {text}"));
    }
    if let Ok(bi) = BigInt::from_str(text) {
        return Ok(match i64::try_from(&bi) {
            Ok(i) => Object::Int(i),
            Err(_) => Object::Long(bi),
        });
    }
    text.parse::<f64>()
        .map(Object::Float)
        .map_err(|_| format!("cannot parse literal {text}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals() {
        assert_eq!(parse_literal("-7", Level::Legacy), Ok(Object::Int(-7)));
        assert_eq!(parse_literal("7L", Level::Legacy), Ok(Object::Long(BigInt::from(7))));
        assert!(parse_literal("7L", Level::Modern).is_err());
        assert_eq!(
            parse_literal("9223372036854775808", Level::Modern),
            Ok(Object::Long(BigInt::from(1u64 << 63)))
        );
        assert_eq!(parse_literal("True", Level::Modern), Ok(Object::Bool(true)));
        assert!(matches!(parse_literal("-0.0", Level::Modern), Ok(Object::Float(f)) if f.is_sign_negative()));
        assert!(matches!(parse_literal("inf", Level::Modern), Ok(Object::Float(f)) if f.is_infinite()));
        assert!(parse_literal("seven", Level::Modern).is_err());
    }

    #[test]
    fn args() {
        let args = ["--legacy", "--bool", "-7", "2"].map(str::to_owned);
        let options = parse_args(args.into_iter()).unwrap();
        assert_eq!(options.level, Some(Level::Legacy));
        assert!(options.as_bool);
        assert_eq!(options.operands, ["-7", "2"]);
        assert!(parse_args(["--trace", "--profile"].map(str::to_owned).into_iter()).is_err());
    }

    #[test]
    fn run_renders_results_and_errors() {
        let mut rt = Runtime::new(RuntimeConfig::legacy());
        assert_eq!(
            run(&mut rt, &Object::Int(i64::MIN), &Object::Int(-1), false, false),
            Ok("9223372036854775808L".to_owned())
        );
        assert_eq!(run(&mut rt, &Object::Int(1), &Object::Int(2), true, false), Ok("False".to_owned()));
        assert_eq!(run(&mut rt, &Object::Float(7.0), &Object::Int(2), false, true), Ok(r#"{"Float":3.0}"#.to_owned()));
        let err = run(&mut rt, &Object::Int(1), &Object::None, false, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TypeError: unsupported operand type(s) for //: 'int' and 'NoneType'"
        );
        assert_eq!(rt.heap_stats().live_objects, 0);
    }
}
