use std::env;

use serde::{Deserialize, Serialize};

use crate::config::SorterConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorInfo {
    pub os: String,
    pub arch: String,
    pub current_dir: Option<String>,
    pub trash_supported: bool,
    pub chunk_capacity: usize,
    pub image_extensions: Vec<String>,
    pub video_extensions: Vec<String>,
    pub document_extensions: Vec<String>,
    pub notes: Vec<String>,
}

pub fn collect_doctor_info(config: &SorterConfig) -> DoctorInfo {
    let current_dir = env::current_dir()
        .ok()
        .map(|path| path.to_string_lossy().to_string());
    let trash_supported = cfg!(any(
        target_os = "windows",
        target_os = "macos",
        all(unix, not(any(target_os = "ios", target_os = "android")))
    ));

    let mut notes = vec![
        "Scan results are held in memory only; nothing is written to disk.".to_string(),
        "Inventory order is sorted by name within each chunk, not across chunks.".to_string(),
    ];
    if !trash_supported {
        notes.push("No platform trash on this target; use permanent deletion.".to_string());
    }
    if cfg!(target_os = "linux") {
        notes.push(
            "Trash uses the freedesktop.org layout: $XDG_DATA_HOME/Trash, or .Trash-$UID per volume."
                .to_string(),
        );
    }

    DoctorInfo {
        os: env::consts::OS.to_string(),
        arch: env::consts::ARCH.to_string(),
        current_dir,
        trash_supported,
        chunk_capacity: config.chunk_capacity,
        image_extensions: config.classifier.image_extensions.clone(),
        video_extensions: config.classifier.video_extensions.clone(),
        document_extensions: config.classifier.document_extensions.clone(),
        notes,
    }
}
