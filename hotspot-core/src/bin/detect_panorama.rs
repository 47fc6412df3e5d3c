// Detect building hotspots in a panorama and store them as <out>/<session>.json
use anyhow::{bail, Context};
use hotspot_core::{
    new_session_id, DetectionOutcome, DetectorConfig, HotspotDetector, HotspotStore,
    JsonFileStore, DEFAULT_PROMPT,
};
use std::fs;
use std::sync::Arc;

struct Args {
    image_path: String,
    session_id: Option<String>,
    out_dir: String,
    prompt_file: Option<String>,
}

fn usage() {
    eprintln!("Usage: detect-panorama <IMAGE_PATH> [--session <ID>] [--out <DIR>] [--prompt-file <FILE>]");
    eprintln!("\nOptions:");
    eprintln!("  --session <ID>        Session id to store under (default: new UUID)");
    eprintln!("  --out <DIR>           Directory for hotspot JSON (default: data/processed)");
    eprintln!("  --prompt-file <FILE>  Instruction prompt (default: built-in building prompt)");
    eprintln!("\nEnvironment:");
    eprintln!("  OPENAI_API_KEY, VISION_MODEL, VISION_BACKUP_MODEL, VISION_API_BASE, VISION_MAX_DIMENSION");
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> anyhow::Result<Option<Args>> {
    let mut image_path = None;
    let mut session_id = None;
    let mut out_dir = "data/processed".to_string();
    let mut prompt_file = None;

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--session" => session_id = Some(argv.next().context("--session needs a value")?),
            "--out" => out_dir = argv.next().context("--out needs a value")?,
            "--prompt-file" => prompt_file = Some(argv.next().context("--prompt-file needs a value")?),
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            _ if image_path.is_none() => image_path = Some(arg),
            _ => bail!("Unexpected argument: {}", arg),
        }
    }

    Ok(image_path.map(|image_path| Args {
        image_path,
        session_id,
        out_dir,
        prompt_file,
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Some(args) = parse_args(std::env::args().skip(1))? else {
        usage();
        return Ok(());
    };

    println!("🏙️  Panorama Hotspot Detection");
    println!("==============================\n");

    let prompt = match &args.prompt_file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read prompt file {}", path))?,
        None => DEFAULT_PROMPT.to_string(),
    };

    let image_bytes = fs::read(&args.image_path)
        .with_context(|| format!("Failed to read image {}", args.image_path))?;
    println!("📂 Loaded {} ({} bytes)", args.image_path, image_bytes.len());

    let config = DetectorConfig::from_env()?;
    let detector = HotspotDetector::from_config(&config)?;
    let store = Arc::new(JsonFileStore::new(&args.out_dir));
    let session_id = args.session_id.unwrap_or_else(new_session_id);

    println!(
        "🤖 Running detection (model: {}, backup: {})...\n",
        config.primary_model,
        config.backup_model.as_deref().unwrap_or("none")
    );

    let report = detector
        .detect_and_store(store.clone(), &session_id, &image_bytes, &prompt)
        .await?;

    match report.outcome {
        DetectionOutcome::Detected => {
            println!("✅ {} hotspots in {:.2}s\n", report.hotspots.len(), report.execution_time_ms as f64 / 1000.0);
            println!("{}", "=".repeat(60));
            for hotspot in &report.hotspots {
                println!(
                    "  {:>3}  yaw {:>8.2}°  pitch {:>7.2}°  ([{}, {}])",
                    hotspot.label, hotspot.yaw, hotspot.pitch, hotspot.y_norm, hotspot.x_norm
                );
            }
            println!("{}", "=".repeat(60));
            println!("\n💾 Saved to: {}", store.path_for(&session_id)?.display());
            println!("🔑 Session: {}", session_id);
        }
        DetectionOutcome::DecodeFailure => println!("❌ Could not decode {}", args.image_path),
        DetectionOutcome::ModelUnavailable => println!("❌ Vision model unavailable (primary and backup failed)"),
        DetectionOutcome::EmptyResponse => println!("⚠️  Model returned no text"),
        DetectionOutcome::NoPointsFound => println!("⚠️  No structured points found in model response"),
    }

    // Existing record, if any, is left untouched when nothing was found
    if report.outcome != DetectionOutcome::Detected {
        let existing = store.load(&session_id)?;
        if !existing.is_empty() {
            println!("ℹ️  Kept {} previously stored hotspots for {}", existing.len(), session_id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> impl Iterator<Item = String> {
        args.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args_defaults() {
        let args = parse_args(argv(&["pano.jpg"])).unwrap().unwrap();
        assert_eq!(args.image_path, "pano.jpg");
        assert!(args.session_id.is_none());
        assert_eq!(args.out_dir, "data/processed");
    }

    #[test]
    fn test_parse_args_options() {
        let args = parse_args(argv(&["--session", "abc", "pano.jpg", "--out", "/tmp/h", "--prompt-file", "p.txt"]))
            .unwrap()
            .unwrap();
        assert_eq!(args.session_id.as_deref(), Some("abc"));
        assert_eq!(args.out_dir, "/tmp/h");
        assert_eq!(args.prompt_file.as_deref(), Some("p.txt"));
    }

    #[test]
    fn test_parse_args_help_and_missing_image() {
        assert!(parse_args(argv(&["--help"])).unwrap().is_none());
        assert!(parse_args(argv(&[])).unwrap().is_none());
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(argv(&["--session"])).is_err());
        assert!(parse_args(argv(&["--bogus", "x"])).is_err());
        assert!(parse_args(argv(&["a.jpg", "b.jpg"])).is_err());
    }
}
