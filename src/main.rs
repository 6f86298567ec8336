use erdalchemy::codegen::{GeneratorOptions, generate};
use erdalchemy::diagram::Diagram;
use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <diagram.json> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  -o, --output <file>     Output file (default: stdout)");
        eprintln!("  -c, --cascade <policy>  Cascade policy for one-to-many collections");
        process::exit(1);
    }

    let input_path = &args[1];
    let mut output_path: Option<String> = None;
    let mut cascade: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                i += 1;
                if i < args.len() {
                    output_path = Some(args[i].clone());
                }
            }
            "-c" | "--cascade" => {
                i += 1;
                if i < args.len() {
                    cascade = Some(args[i].clone());
                }
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input = match fs::read_to_string(input_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", input_path, e);
            process::exit(1);
        }
    };

    let parsed: Diagram = match serde_json::from_str(&input) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to parse {}: {}", input_path, e);
            process::exit(1);
        }
    };

    let models = match generate(&parsed, &GeneratorOptions { cascade }) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Generation failed: {}", e);
            process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &models) {
                eprintln!("Failed to write {}: {}", path, e);
                process::exit(1);
            }
        }
        None => print!("{}", models),
    }
}
