// Offline check of the reply contract: run only the parser over a reply
// saved from the model, without any network call.

use anyhow::{Context, Result};
use deepcatch_lib::services::detection::{apply_reply, seed_result};

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!(
            "Usage:\n  cargo run --bin parse_reply -- <reply.txt> [--input <original.txt>]\n\nNotes:\n  - Without --input the seeded defaults come from an empty request text."
        );
        return Ok(());
    }

    let reply_path = &args[1];
    let reply = std::fs::read_to_string(reply_path)
        .with_context(|| format!("read reply failed: {}", reply_path))?;
    let input = match parse_arg_value(&args, "--input") {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("read input failed: {}", path))?,
        None => String::new(),
    };

    let mut result = seed_result(input.trim(), 0.0);
    let matched = apply_reply(&mut result, &reply);

    eprintln!("Fields taken from reply: {:?}", matched);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
