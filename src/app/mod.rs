// Application layer - Use case interactors

pub mod container;
pub mod cut_interactor;
pub mod detect_interactor;
pub mod editor;
pub mod fetch_interactor;
pub mod inspect_interactor;
pub mod library_interactor;
pub mod preview_interactor;
pub mod track_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use cut_interactor::{CutInteractor, CutOptions, CutSelection};
pub use detect_interactor::{DetectInteractor, DetectOptions, DetectReport};
pub use editor::ClipEditor;
pub use fetch_interactor::{FetchModelInteractor, FetchModelOptions, FetchModelReport};
pub use inspect_interactor::{InspectInteractor, InspectRequest, InspectResponse};
pub use library_interactor::LibraryInteractor;
pub use preview_interactor::{PreviewInteractor, PreviewOptions, PreviewReport};
pub use track_interactor::{TrackInteractor, TrackOptions, TrackReport};
