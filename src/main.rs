use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use log::{error, info};
use rayon::prelude::*;
use serde_json::Value;

use heightlines::config::Settings;

fn process(path: &Path, out_dir: &Path, settings: &Settings) -> anyhow::Result<PathBuf> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    // text that is not JSON at all still goes through recovery
    let value = serde_json::from_str(&text).unwrap_or(Value::Null);

    let (report, timings) = heightlines::contour(&value, settings)
        .with_context(|| format!("failed to contour {}", path.display()))?;

    for t in &timings {
        info!("{}: {:10} {:8.1} ms", path.display(), t.name, t.ms);
    }
    if report.salvaged {
        info!(
            "{}: recovered a {}x{} grid from damaged input",
            path.display(),
            report.width,
            report.height
        );
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "grid".into());
    let out = out_dir.join(format!("{stem}.contours.json"));
    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(&out, json).with_context(|| format!("failed to write {}", out.display()))?;
    info!(
        "{} -> {} ({} lines)",
        path.display(),
        out.display(),
        report.line_count()
    );
    Ok(out)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    // optional leading step, then optional output directory, then inputs
    let mut rest = args.as_slice();
    let mut settings = Settings::default();
    if let Some(step) = rest.first().and_then(|s| s.parse::<f64>().ok()) {
        settings.step = step;
        rest = &rest[1..];
    }
    let out_dir = match rest {
        [dir, inputs @ ..] if !inputs.is_empty() && !dir.ends_with(".json") => {
            rest = inputs;
            PathBuf::from(dir)
        }
        _ => PathBuf::from("artifacts"),
    };
    if rest.is_empty() {
        bail!("usage: heightlines [step] [out_dir] <grid.json>...");
    }
    settings.validate()?;

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    info!(
        "contouring {} grid(s) at step {} into {}",
        rest.len(),
        settings.step,
        out_dir.display()
    );

    let failures = rest
        .par_iter()
        .map(PathBuf::from)
        .filter_map(|path| process(&path, &out_dir, &settings).err().map(|e| (path, e)))
        .inspect(|(path, e)| error!("{}: {e:#}", path.display()))
        .count();

    if failures > 0 {
        bail!("{failures} of {} grid(s) failed", rest.len());
    }
    info!("done");
    Ok(())
}
