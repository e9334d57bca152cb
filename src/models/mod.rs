pub mod slide;

pub use slide::{
    GeneratePdfRequest, MergedDocument, PageLayout, RenderJob, RenderedPage, MERGED_FILENAME,
};
