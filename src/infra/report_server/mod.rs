mod client;

pub use client::ReportServerClient;
