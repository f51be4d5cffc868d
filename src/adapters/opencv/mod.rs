// OpenCV adapter - Visual trackers and frame overlays

pub mod mat;
pub mod overlay;
pub mod tracker;

pub use overlay::OpenCvAnnotator;
pub use tracker::{OpenCvTracker, OpenCvTrackerFactory};

#[cfg(test)]
mod tests;
