//! Build a `DecisionInput` from a CV detector output directory
//!
//! Expected layout:
//! ```text
//! cv_output/
//!   scene.jpg          top-down image or video
//!   detections.json    manifest (scene_id, timestamp, detections[])
//!   crops/             per-object crops, obj-001.jpg ...
//! ```
//!
//! A missing or unparseable manifest aborts the load. Records are never
//! skipped individually.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::error::{OverwatchError, Result};
use crate::core::types::{
    DroneState, ObjectOfInterest, OperatorInstruction, PixelBox, PixelPoint, Polygon, SceneContext,
};
use crate::pipeline::DecisionInput;

pub const MANIFEST_FILE: &str = "detections.json";
pub const CROPS_DIR: &str = "crops";

const SCENE_PREFIXES: [&str; 4] = ["scene.", "topdown.", "overview.", "frame."];
const MEDIA_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "mp4", "avi"];
const CROP_EXTENSIONS: [&str; 3] = ["jpg", "png", "jpeg"];

/// Everything the detector does not supply
#[derive(Debug, Clone)]
pub struct IntakeOptions {
    pub instruction: OperatorInstruction,
    pub drone_state: DroneState,
    pub venue_scale_ft_per_px: Option<f64>,
    pub restricted_zones: Option<Vec<Polygon>>,
}

impl Default for IntakeOptions {
    fn default() -> Self {
        Self {
            instruction: OperatorInstruction::new(""),
            drone_state: DroneState {
                position_px: PixelPoint::new(500.0, 500.0),
                altitude_ft: 150.0,
                heading_deg: 0.0,
                zoom_level: 1.0,
            },
            venue_scale_ft_per_px: None,
            restricted_zones: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Manifest {
    scene_id: Option<String>,
    timestamp: Option<String>,
    #[serde(default)]
    detections: Vec<Detection>,
}

fn default_confidence() -> f64 {
    0.5
}

#[derive(Debug, Deserialize)]
struct Detection {
    object_id: String,
    label: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
    crop_filename: Option<String>,
    bbox: PixelBox,
    center: Option<PixelPoint>,
    track_id: Option<String>,
    #[serde(default)]
    risk_hints: BTreeMap<String, f64>,
    notes: Option<String>,
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// File names directly under `dir`, sorted
fn file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Locate the top-down scene media
///
/// Known stems first, then any media extension, else `scene.jpg` even if
/// absent.
pub fn find_scene_media(dir: &Path) -> Result<PathBuf> {
    let names = file_names(dir)?;

    for prefix in SCENE_PREFIXES {
        if let Some(name) = names.iter().find(|n| n.starts_with(prefix)) {
            return Ok(dir.join(name));
        }
    }
    for ext in MEDIA_EXTENSIONS {
        let suffix = format!(".{ext}");
        if let Some(name) = names.iter().find(|n| n.ends_with(&suffix)) {
            return Ok(dir.join(name));
        }
    }
    Ok(dir.join("scene.jpg"))
}

/// Resolve a crop image: the named file, then `<object_id>.<ext>`
pub fn find_crop(dir: &Path, crop_filename: Option<&str>, object_id: &str) -> PathBuf {
    let crops = dir.join(CROPS_DIR);
    if let Some(name) = crop_filename {
        let named = crops.join(name);
        if named.exists() {
            return named;
        }
    }
    CROP_EXTENSIONS
        .iter()
        .map(|ext| crops.join(format!("{object_id}.{ext}")))
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| crops.join(format!("{object_id}.jpg")))
}

/// Load a CV output directory into a pipeline payload
pub fn load_cv_output(dir: &Path, options: &IntakeOptions) -> Result<DecisionInput> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Err(OverwatchError::MissingManifest(manifest_path));
    }

    let content = fs::read_to_string(&manifest_path)?;
    let malformed = |reason: String| OverwatchError::MalformedManifest {
        path: manifest_path.clone(),
        reason,
    };
    let manifest: Manifest = serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?;

    let mut objects = Vec::with_capacity(manifest.detections.len());
    for det in manifest.detections {
        if !(0.0..=1.0).contains(&det.confidence) {
            return Err(malformed(format!(
                "detection '{}' has confidence {} outside [0, 1]",
                det.object_id, det.confidence
            )));
        }
        let crop = find_crop(dir, det.crop_filename.as_deref(), &det.object_id);
        objects.push(ObjectOfInterest {
            topdown_center: det.center.unwrap_or_else(|| det.bbox.center()),
            crop_media_path: Some(path_string(&crop)),
            object_id: det.object_id,
            label: det.label,
            confidence: det.confidence,
            topdown_bbox: det.bbox,
            track_id: det.track_id,
            risk_hints: det.risk_hints,
            notes: det.notes,
        });
    }

    let scene_id = manifest.scene_id.unwrap_or_else(|| {
        dir.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scene".to_string())
    });
    let timestamp = manifest
        .timestamp
        .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string());

    let scene = SceneContext {
        scene_id,
        topdown_media_path: Some(path_string(&find_scene_media(dir)?)),
        timestamp: Some(timestamp),
        venue_map_scale_ft_per_px: options.venue_scale_ft_per_px,
        restricted_zones: options.restricted_zones.clone(),
        drone_state: options.drone_state.clone(),
    };

    tracing::info!(
        dir = %dir.display(),
        scene = %scene.scene_id,
        detections = objects.len(),
        "Loaded CV output"
    );

    Ok(DecisionInput {
        scene,
        objects,
        instruction: options.instruction.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "scene_id": "rally-14h",
        "timestamp": "2026-02-20T14:00:00",
        "detections": [
            {
                "object_id": "obj-001",
                "label": "suspicious_person",
                "confidence": 0.82,
                "crop_filename": "person.png",
                "bbox": [430, 340, 30, 40],
                "center": [445, 360],
                "track_id": "trk-101",
                "risk_hints": {"loitering": 0.8}
            },
            {
                "object_id": "obj-002",
                "label": "bag",
                "bbox": [100, 200, 31, 41]
            }
        ]
    }"#;

    fn cv_dir(manifest: Option<&str>) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        if let Some(body) = manifest {
            fs::write(dir.path().join(MANIFEST_FILE), body).unwrap();
        }
        fs::create_dir(dir.path().join(CROPS_DIR)).unwrap();
        dir
    }

    #[test]
    fn test_loads_manifest_with_defaults() {
        let dir = cv_dir(Some(MANIFEST));
        fs::write(dir.path().join("topdown.png"), b"").unwrap();
        fs::write(dir.path().join("crops/person.png"), b"").unwrap();
        fs::write(dir.path().join("crops/obj-002.png"), b"").unwrap();

        let input = load_cv_output(dir.path(), &IntakeOptions::default()).unwrap();
        assert_eq!(input.scene.scene_id, "rally-14h");
        assert_eq!(input.scene.timestamp.as_deref(), Some("2026-02-20T14:00:00"));
        assert!(input.scene.topdown_media_path.unwrap().ends_with("topdown.png"));
        assert_eq!(input.scene.drone_state.altitude_ft, 150.0);

        let person = &input.objects[0];
        assert!(person.crop_media_path.as_deref().unwrap().ends_with("person.png"));
        assert_eq!(person.track_id.as_deref(), Some("trk-101"));

        let bag = &input.objects[1];
        assert_eq!(bag.confidence, 0.5);
        assert_eq!(bag.topdown_center, PixelPoint::new(115.0, 220.0));
        assert!(bag.crop_media_path.as_deref().unwrap().ends_with("obj-002.png"));
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let dir = cv_dir(None);
        let result = load_cv_output(dir.path(), &IntakeOptions::default());
        assert!(matches!(result, Err(OverwatchError::MissingManifest(_))));
    }

    #[test]
    fn test_malformed_manifest_aborts_load() {
        let dir = cv_dir(Some(r#"{"detections": [{"object_id": "x"}]}"#));
        let result = load_cv_output(dir.path(), &IntakeOptions::default());
        assert!(matches!(result, Err(OverwatchError::MalformedManifest { .. })));
    }

    #[test]
    fn test_out_of_range_confidence_is_malformed() {
        let dir = cv_dir(Some(
            r#"{"detections": [{"object_id": "x", "label": "bag", "confidence": 1.4, "bbox": [0, 0, 2, 2]}]}"#,
        ));
        let result = load_cv_output(dir.path(), &IntakeOptions::default());
        assert!(matches!(result, Err(OverwatchError::MalformedManifest { .. })));
    }

    #[test]
    fn test_scene_id_falls_back_to_directory_name() {
        let dir = cv_dir(Some(r#"{"detections": []}"#));
        let input = load_cv_output(dir.path(), &IntakeOptions::default()).unwrap();
        let dir_name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(input.scene.scene_id, dir_name);
        assert!(input.scene.timestamp.is_some());
        assert!(input.scene.topdown_media_path.unwrap().ends_with("scene.jpg"));
    }

    #[test]
    fn test_crop_falls_back_to_object_id() {
        let dir = cv_dir(None);
        let crop = find_crop(dir.path(), Some("missing.jpg"), "obj-9");
        assert_eq!(crop, dir.path().join("crops").join("obj-9.jpg"));
    }

    #[test]
    fn test_scene_media_extension_fallback() {
        let dir = cv_dir(None);
        fs::write(dir.path().join("capture.mp4"), b"").unwrap();
        let media = find_scene_media(dir.path()).unwrap();
        assert_eq!(media, dir.path().join("capture.mp4"));
    }
}
