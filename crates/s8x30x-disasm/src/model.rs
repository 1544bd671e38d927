use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use s8x30x::ihex;
use s8x30x::{SymbolTable, WideMemory};

/// One ROM image, either raw binary or Intel hex.
#[derive(Debug, Clone)]
pub struct Image {
    pub name: String,
    pub base: u32,
    pub bytes: Vec<u8>,
    pub kind: &'static str, // "raw" or "ihex"
}

impl Image {
    pub fn end(&self) -> u32 {
        self.base + self.bytes.len() as u32
    }
}

fn looks_like_hex(path: &Path, data: &[u8]) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase());
    matches!(ext.as_deref(), Some("hex" | "ihex" | "ihx"))
        || data.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b':')
}

pub fn load_image(path: &Path, base: Option<u32>) -> Result<Image> {
    let img = read_image(path, base)?;
    debug!(name = %img.name, kind = img.kind, base = img.base, len = img.bytes.len(), "image loaded");
    Ok(img)
}

fn read_image(path: &Path, base: Option<u32>) -> Result<Image> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    if looks_like_hex(path, &data) {
        let img = ihex::parse(&data).with_context(|| format!("parsing {}", path.display()))?;
        let base = base.unwrap_or_else(|| img.origin.map_or(0, u32::from));
        Ok(Image { name, base, bytes: img.bytes, kind: "ihex" })
    } else {
        anyhow::ensure!(data.len() <= ihex::MAX_IMAGE, "{} is larger than 64 KiB", path.display());
        Ok(Image { name, base: base.unwrap_or(0), bytes: data, kind: "raw" })
    }
}

/// Loads several chip images and stacks them; in order MSB, LSB, then any
/// fast I/O select PROM.
pub fn load_channels(paths: &[impl AsRef<Path>]) -> Result<WideMemory> {
    let mut channels = Vec::with_capacity(paths.len());
    for p in paths {
        channels.push(load_image(p.as_ref(), None)?.bytes);
    }
    Ok(WideMemory::new(channels)?)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelKV {
    pub addr: u32,
    pub name: String,
}

pub fn load_labels(path: &Path) -> Result<SymbolTable> {
    let txt = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let v: Vec<LabelKV> = serde_json::from_str(&txt).with_context(|| format!("parsing {}", path.display()))?;
    Ok(v.into_iter().map(|kv| (kv.addr, kv.name)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("s8x30x_{}_{name}", std::process::id()));
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn raw_image_uses_given_base() {
        let path = scratch("raw.bin", &[0, 1, 2, 3]);
        let img = load_image(&path, Some(0x100)).unwrap();
        assert_eq!(img.kind, "raw");
        assert_eq!(img.base, 0x100);
        assert_eq!(img.end(), 0x104);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn hex_image_takes_origin_from_first_record() {
        let path = scratch("img.hex", b":0300300002337A1E\n:00000001FF\n");
        let img = load_image(&path, None).unwrap();
        assert_eq!(img.kind, "ihex");
        assert_eq!(img.base, 0x30);
        assert_eq!(img.bytes, vec![0x02, 0x33, 0x7a]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn channels_must_agree_in_length() {
        let a = scratch("a.bin", &[0, 1]);
        let b = scratch("b.bin", &[0]);
        let err = load_channels(&[&a, &b]).unwrap_err();
        assert!(err.to_string().contains("expected 2"), "{err}");
        let _ = std::fs::remove_file(&a);
        let _ = std::fs::remove_file(&b);
    }

    #[test]
    fn labels_from_json() {
        let path = scratch("labels.json", br#"[{"addr": 16, "name": "start"}]"#);
        let syms = load_labels(&path).unwrap();
        assert_eq!(syms.get(&16).map(String::as_str), Some("start"));
        let _ = std::fs::remove_file(&path);
    }
}
