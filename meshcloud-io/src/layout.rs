//! Fixed output locations

use std::path::{Path, PathBuf};

/// Default output directory, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// File name of the extracted vertex table
pub const VERTICES_FILE: &str = "vertices.csv";

/// Directory that receives per-frame animation renders
pub const FRAME_DIR: &str = "plt_render";

/// Paths of every artefact written under an output root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root itself; exported texture copies land here
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/vertices.csv`
    pub fn vertices_csv(&self) -> PathBuf {
        self.root.join(VERTICES_FILE)
    }

    /// `<root>/plt_render`
    pub fn frame_dir(&self) -> PathBuf {
        self.root.join(FRAME_DIR)
    }

    /// `<root>/plt_render/frame_0007.png` for index 7
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.frame_dir().join(frame_file_name(index))
    }

    /// Static 3D scatter render
    pub fn static_render(&self) -> PathBuf {
        self.root.join("scatter_3d.png")
    }

    /// 2D projection render
    pub fn projection_render(&self) -> PathBuf {
        self.root.join("projection_2d.png")
    }

    /// Live preview surface, overwritten every frame
    pub fn preview(&self) -> PathBuf {
        self.root.join("preview.png")
    }
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

/// Four-digit zero-padded frame file name
pub fn frame_file_name(index: usize) -> String {
    format!("frame_{:04}.png", index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = OutputLayout::default();
        assert_eq!(layout.vertices_csv(), Path::new("output/vertices.csv"));
        assert_eq!(layout.frame_path(7), Path::new("output/plt_render/frame_0007.png"));
        assert_eq!(layout.frame_path(1234), Path::new("output/plt_render/frame_1234.png"));
    }

    #[test]
    fn test_frame_file_name_padding() {
        assert_eq!(frame_file_name(0), "frame_0000.png");
        assert_eq!(frame_file_name(42), "frame_0042.png");
    }
}
