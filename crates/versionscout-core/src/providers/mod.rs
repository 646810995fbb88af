// Provider implementations - GitHub is the only one for now
pub mod github;

pub use github::{format_release_date, GitHubProvider};
