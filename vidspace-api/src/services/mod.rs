mod convert;
mod video_access;

pub use convert::request_context;
pub use video_access::VideoAccessApi;
