use std::path::Path;

use voxreel_media::check_tool;
use voxreel_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();

    println!(
        "voxreel-selfcheck: starting with store_dir={}",
        config.store_dir.display()
    );
    ensure_store_dir(&config.store_dir).await?;
    ensure_tool(&config.ffmpeg_bin)?;
    ensure_tool(&config.ffprobe_bin)?;
    ensure_env_present(&["GEMINI_API_KEY", "TTS_API_KEY"])?;

    println!("voxreel-selfcheck: ok");
    Ok(())
}

async fn ensure_store_dir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("store dir {} not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}

fn ensure_tool(name: &str) -> anyhow::Result<()> {
    let path = check_tool(name).map_err(|e| anyhow::anyhow!("{}", e))?;
    println!("voxreel-selfcheck: {} -> {}", name, path.display());
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}
