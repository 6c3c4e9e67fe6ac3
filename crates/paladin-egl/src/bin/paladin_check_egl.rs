use std::{env, fs};

use paladin_egl::{compile_json, graph_digest};

fn main() {
    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: paladin_check_egl <graph.json>");
        std::process::exit(2);
    };
    if args.next().is_some() {
        eprintln!("usage: paladin_check_egl <graph.json>");
        std::process::exit(2);
    }

    let text = match fs::read_to_string(&path) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("failed to read `{path}`: {err}");
            std::process::exit(2);
        }
    };

    match compile_json(&text) {
        Ok(graph) => {
            let digest = match graph_digest(&graph) {
                Ok(d) => d,
                Err(err) => {
                    eprintln!("failed to serialize `{path}`: {err}");
                    std::process::exit(1);
                }
            };
            println!(
                "ok(egl): nodes={} edges={} final_claims={} digest={}",
                graph.nodes().len(),
                graph.edges().len(),
                graph.final_claims().len(),
                digest
            );
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
