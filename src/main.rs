use anyhow::{bail, Context, Result};
use deepcatch_lib::api::check_text;
use deepcatch_lib::models::{AnalysisResult, AnalyzeRequest, HighlightSeverity};
use deepcatch_lib::services::{get_api_key, ConfigStore, DEFAULT_PROVIDER};
use deepcatch_lib::{build_analyzer, config_store, init_logging};
use std::io::Read;

const USAGE: &str = "Usage:
  deepcatch [--text <text> | --file <path>] [--json] [--out <json_path>]
  deepcatch config show
  deepcatch config set-key <api_key>
  deepcatch config delete-key
  deepcatch config set-url <chat_completions_url>

Reads the content to analyze from --text, --file, or stdin.

Environment:
  DEEPSEEK_API_KEY       API key for the remote model (or store it in the config file)
  DEEPSEEK_API_URL       Override the chat completions endpoint
  DEEPCATCH_CONFIG_DIR   Directory holding config.json
  DEEPCATCH_DISABLE_FILE_LOG=1  Log to stderr only";

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn read_input(args: &[String]) -> Result<String> {
    if let Some(text) = parse_arg_value(args, "--text") {
        return Ok(text);
    }
    if let Some(path) = parse_arg_value(args, "--file") {
        return std::fs::read_to_string(&path).with_context(|| format!("read file failed: {}", path));
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("read stdin failed")?;
    Ok(buf)
}

fn print_summary(result: &AnalysisResult) {
    let meta = &result.metadata;
    println!("Verdict: {} (class: {})", result.verdict, result.verdict_class());
    println!("Confidence: {}%", result.confidence);
    println!("Explanation: {}", result.explanation);
    println!();
    match result.input_type_class() {
        Some(class) if class.as_str() != meta.input_type => {
            println!("Input type: {} (class: {})", meta.input_type, class)
        }
        _ => println!("Input type: {}", meta.input_type),
    }
    println!("Suspicious elements: {}", meta.suspicious_elements);
    println!(
        "URLs found: {}",
        if meta.urls_found.is_empty() { "none".to_string() } else { meta.urls_found.join(", ") }
    );
    println!(
        "Senders/domains: {}",
        if meta.senders_domains.is_empty() { "none".to_string() } else { meta.senders_domains.join(", ") }
    );
    println!("Analysis time: {:.2}s", meta.analysis_time);

    let spans = result.highlight_spans();
    if !spans.is_empty() {
        println!();
        println!("Highlighted spans: {}", spans.len());
        for span in spans {
            let tag = match span.severity {
                HighlightSeverity::High => "HIGH",
                HighlightSeverity::Medium => "MED ",
            };
            println!("  [{}] {}", tag, span.text.replace('\n', " "));
        }
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// `deepcatch config ...`. Returns the text to print.
fn run_config_command(store: &ConfigStore, args: &[String]) -> Result<String> {
    match args.first().map(String::as_str) {
        None | Some("show") => {
            let config = store.load()?;
            let key = get_api_key(&config, DEFAULT_PROVIDER)
                .map(|k| mask_key(&k))
                .unwrap_or_else(|| "not set".to_string());
            Ok(format!(
                "Config file: {}\nModel: {}\nEndpoint: {}\nAPI key ({}): {}",
                store.config_file().display(),
                config.provider.model,
                config.provider.base_url.as_deref().unwrap_or("default"),
                DEFAULT_PROVIDER,
                key
            ))
        }
        Some("set-key") => {
            let key = args.get(1).map(|k| k.trim()).filter(|k| !k.is_empty());
            let Some(key) = key else {
                bail!("missing <api_key>\n\n{}", USAGE);
            };
            store.set_api_key(DEFAULT_PROVIDER, key)?;
            Ok(format!("Saved API key for {}", DEFAULT_PROVIDER))
        }
        Some("delete-key") => {
            store.delete_api_key(DEFAULT_PROVIDER)?;
            Ok(format!("Removed API key for {}", DEFAULT_PROVIDER))
        }
        Some("set-url") => {
            let url = args.get(1).map(|u| u.trim()).filter(|u| !u.is_empty());
            let Some(url) = url else {
                bail!("missing <chat_completions_url>\n\n{}", USAGE);
            };
            if !url.starts_with("http://") && !url.starts_with("https://") {
                bail!("endpoint must be an http(s) URL: {}", url);
            }
            store.set_provider_url(url)?;
            Ok(format!("Saved endpoint {}", url))
        }
        Some(other) => bail!("unknown config command: {}\n\n{}", other, USAGE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    if args.get(1).map(String::as_str) == Some("config") {
        let store = config_store().context("no config directory available; set DEEPCATCH_CONFIG_DIR")?;
        println!("{}", run_config_command(&store, &args[2..])?);
        return Ok(());
    }

    let as_json = has_flag(&args, "--json");
    let out_path = parse_arg_value(&args, "--out");
    let text = read_input(&args)?;

    init_logging();
    let analyzer = build_analyzer().context("failed to load configuration")?;

    let result = match check_text(&analyzer, AnalyzeRequest { text }).await {
        Ok(result) => result,
        Err(err) => {
            if as_json {
                println!("{}", serde_json::to_string_pretty(&err)?);
            }
            bail!("{}", err.body.detail);
        }
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if let Some(out_path) = out_path {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&out_path, json).with_context(|| format!("write out failed: {}", out_path))?;
        eprintln!("Wrote JSON: {}", out_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_set_key_then_show_masks_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        run_config_command(&store, &args(&["set-key", "sk-1234567890abcdef"])).unwrap();
        assert_eq!(
            store.get_api_key(DEFAULT_PROVIDER).unwrap(),
            Some("sk-1234567890abcdef".to_string())
        );

        let shown = run_config_command(&store, &args(&["show"])).unwrap();
        assert!(!shown.contains("sk-1234567890abcdef"));

        run_config_command(&store, &args(&["delete-key"])).unwrap();
        assert_eq!(store.get_api_key(DEFAULT_PROVIDER).unwrap(), None);
    }

    #[test]
    fn test_config_set_url_is_validated_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        assert!(run_config_command(&store, &args(&["set-url", "ftp://x"])).is_err());
        assert!(run_config_command(&store, &args(&["set-url"])).is_err());

        run_config_command(&store, &args(&["set-url", "http://localhost:8080/v1/chat/completions"]))
            .unwrap();
        assert_eq!(
            store.load().unwrap().provider.base_url.as_deref(),
            Some("http://localhost:8080/v1/chat/completions")
        );
    }

    #[test]
    fn test_config_unknown_command_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());
        assert!(run_config_command(&store, &args(&["rotate"])).is_err());
        assert!(run_config_command(&store, &args(&["set-key", "  "])).is_err());
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("short"), "****");
        assert_eq!(mask_key("sk-1234567890abcdef"), "sk-1...cdef");
    }
}
