//! Path conventions: video extensions, output folders, file manager commands

use std::path::{Path, PathBuf};

/// Extensions treated as videos when listing a folder (lowercase, no dot)
pub const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm"];

/// Name of the folder that receives exported clips, next to the sources
pub const GENERATED_DIR_NAME: &str = "generated";

/// Default location of the detector model, relative to the working directory
pub const DEFAULT_MODEL_PATH: &str = "models/yolov8n.onnx";

pub struct PathUtils;

impl PathUtils {
    /// Whether the file has one of the video extensions, case-insensitively
    pub fn is_video_file(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// Folder for exported clips of a source folder
    pub fn generated_dir(source_folder: &Path) -> PathBuf {
        source_folder.join(GENERATED_DIR_NAME)
    }

    /// Folder holding a source video; `.` for bare file names
    pub fn parent_dir(path: &Path) -> PathBuf {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Program and arguments that show `path` in the platform file manager
    pub fn reveal_command(path: &Path) -> (String, Vec<String>) {
        Self::reveal_command_for(std::env::consts::OS, path)
    }

    pub fn reveal_command_for(os: &str, path: &Path) -> (String, Vec<String>) {
        match os {
            "windows" => (
                "explorer".to_string(),
                vec![format!("/select,{}", path.display())],
            ),
            "macos" => (
                "open".to_string(),
                vec!["-R".to_string(), path.display().to_string()],
            ),
            _ => (
                "xdg-open".to_string(),
                vec![Self::parent_dir(path).display().to_string()],
            ),
        }
    }

    /// Human-readable file size
    pub fn format_file_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        assert!(PathUtils::is_video_file(Path::new("clip.mp4")));
        assert!(PathUtils::is_video_file(Path::new("CLIP.MKV")));
        assert!(PathUtils::is_video_file(Path::new("/a/b/c.webm")));
        assert!(!PathUtils::is_video_file(Path::new("notes.txt")));
        assert!(!PathUtils::is_video_file(Path::new("mp4")));
    }

    #[test]
    fn test_generated_and_parent_dirs() {
        assert_eq!(
            PathUtils::generated_dir(Path::new("/videos")),
            PathBuf::from("/videos/generated")
        );
        assert_eq!(PathUtils::parent_dir(Path::new("clip.mp4")), PathBuf::from("."));
        assert_eq!(PathUtils::parent_dir(Path::new("/v/clip.mp4")), PathBuf::from("/v"));
    }

    #[test]
    fn test_reveal_commands_per_platform() {
        let path = Path::new("/v/clip.mp4");

        let (program, args) = PathUtils::reveal_command_for("windows", path);
        assert_eq!(program, "explorer");
        assert_eq!(args, vec!["/select,/v/clip.mp4".to_string()]);

        let (program, args) = PathUtils::reveal_command_for("macos", path);
        assert_eq!(program, "open");
        assert_eq!(args, vec!["-R".to_string(), "/v/clip.mp4".to_string()]);

        let (program, args) = PathUtils::reveal_command_for("linux", path);
        assert_eq!(program, "xdg-open");
        assert_eq!(args, vec!["/v".to_string()]);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(PathUtils::format_file_size(512), "512 B");
        assert_eq!(PathUtils::format_file_size(1536), "1.50 KB");
        assert_eq!(PathUtils::format_file_size(5 * 1024 * 1024), "5.00 MB");
    }
}
