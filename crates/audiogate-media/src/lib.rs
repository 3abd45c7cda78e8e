//! # audiogate-media
//!
//! Produces the audio files that tokens are issued for. The actual
//! download and transcode is delegated to an external tool.

pub mod fetcher;
pub mod ytdlp;

pub use fetcher::MediaFetcher;
pub use ytdlp::YtDlpFetcher;
