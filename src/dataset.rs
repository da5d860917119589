use crate::config::Settings;
use crate::source::{table_path, TABLES};
use anyhow::{anyhow, bail, Context, Result};
use flate2::read::GzDecoder;
use reqwest::Client;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tracing::info;

pub fn archive_url(base_url: &str, table: &str) -> String {
    format!("{}/{}.tsv.gz", base_url.trim_end_matches('/'), table)
}

pub async fn refresh(settings: &Settings) -> Result<()> {
    tokio::fs::create_dir_all(&settings.data_dir)
        .await
        .with_context(|| format!("Failed to create {}", settings.data_dir.display()))?;

    let client = Client::new();
    let mut joinset = JoinSet::new();
    for table in TABLES {
        let client = client.clone();
        let url = archive_url(&settings.dataset_url, table);
        let target = table_path(&settings.data_dir, table);
        joinset.spawn(async move { fetch_table(&client, table, &url, target).await });
    }

    while let Some(res) = joinset.join_next().await {
        res.map_err(|e| anyhow!("Download task panicked: {}", e))??;
    }
    info!("Dataset refreshed in {}", settings.data_dir.display());
    Ok(())
}

async fn fetch_table(client: &Client, table: &str, url: &str, target: PathBuf) -> Result<()> {
    info!("Downloading {}", table);
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to request {}", url))?;
    if !response.status().is_success() {
        bail!("Failed to download {}. Status: {}", url, response.status());
    }

    let archive = target.with_extension("tsv.gz.part");
    let mut file = tokio::fs::File::create(&archive)
        .await
        .with_context(|| format!("Failed to create {}", archive.display()))?;
    let mut written = 0u64;
    let streamed = async {
        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("Failed to read body of {}", url))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok::<(), anyhow::Error>(())
    }
    .await;
    drop(file);
    if let Err(e) = streamed {
        let _ = tokio::fs::remove_file(&archive).await;
        return Err(e);
    }
    info!("Unpacking {} ({} bytes)", table, written);

    let gz = archive.clone();
    let unpacked = tokio::task::spawn_blocking(move || -> Result<()> {
        let file = File::open(&gz).with_context(|| format!("Failed to open {}", gz.display()))?;
        unpack(BufReader::new(file), &target)
    })
    .await
    .map_err(|e| anyhow!("Unpacking {} panicked: {}", table, e))?;
    let _ = tokio::fs::remove_file(&archive).await;
    unpacked
}

pub fn unpack<R: Read>(gz: R, target: &Path) -> Result<()> {
    let partial = target.with_extension("tsv.part");
    let written = write_partial(gz, &partial, target);
    if written.is_err() {
        let _ = std::fs::remove_file(&partial);
    }
    written?;
    std::fs::rename(&partial, target)
        .with_context(|| format!("Failed to move {} into place", partial.display()))?;
    Ok(())
}

fn write_partial<R: Read>(gz: R, partial: &Path, target: &Path) -> Result<()> {
    let mut decoder = GzDecoder::new(gz);
    let mut out = BufWriter::new(
        File::create(partial).with_context(|| format!("Failed to create {}", partial.display()))?,
    );
    io::copy(&mut decoder, &mut out)
        .with_context(|| format!("Corrupt archive for {}", target.display()))?;
    out.into_inner()
        .map_err(|e| anyhow!("Failed to flush {}: {}", partial.display(), e.error()))?;
    Ok(())
}
