pub mod client;

pub use client::{BatchReport, DownloadEntry, Downloader, FetchOutcome, DEFAULT_CONCURRENCY};
